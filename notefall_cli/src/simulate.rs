use notefall_chart::Chart;
use notefall_core::config::SessionConfig;
use notefall_core::error::SessionError;
use notefall_core::gameplay::result::PlayResult;
use notefall_core::gameplay::{GameplayEvent, GameplaySession};
use notefall_core::replay::Replay;

/// Slack after the last note before a stuck simulation is cut off.
const RUNOUT_MS: i64 = 10_000;

/// Runs a session at a fixed frame rate until it fails or completes.
/// Without a replay the chart is autoplayed. Breaks are skipped.
pub fn run_simulation(
    chart: Chart,
    mut config: SessionConfig,
    replay: Option<Replay>,
    frame_ms: f64,
) -> Result<PlayResult, SessionError> {
    let mut session = match replay {
        Some(replay) => GameplaySession::with_replay(chart, config, None, replay)?,
        None => {
            config.modifiers.autoplay = true;
            GameplaySession::new(chart, config, None)?
        }
    };

    // The chart passed validation, so this stays in range.
    let limit = session.chart().duration_ms() + RUNOUT_MS;

    session.initialize();
    while !session.state().is_terminal() {
        if session.is_on_break() {
            session.request_skip();
        }
        session.update(frame_ms);
        for event in session.drain_events() {
            log_event(&event);
        }
        if session.current_time() > limit {
            log::warn!("session still {:?} at {}ms, stopping", session.state(), session.current_time());
            break;
        }
    }

    Ok(session.result())
}

fn log_event(event: &GameplayEvent) {
    match event {
        GameplayEvent::Judged(v) => log::trace!(
            "{}ms lane {} {:?} {:?} ({:+}ms)",
            v.time,
            v.lane,
            v.phase,
            v.judgment,
            v.offset_ms
        ),
        GameplayEvent::ComboBroken { combo } => log::info!("combo of {combo} broken"),
        GameplayEvent::Failed | GameplayEvent::Completed => log::info!("{event:?}"),
        other => log::debug!("{other:?}"),
    }
}
