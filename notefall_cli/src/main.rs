mod simulate;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use notefall_chart::load_chart_json_from_path;
use notefall_core::config::{Modifiers, SessionConfig};
use notefall_core::replay::{decode, encode, generate_autoplay};

#[derive(Debug, Parser)]
#[command(name = "notefall")]
#[command(about = "Headless notefall gameplay tools", long_about = None)]
struct Cli {
    /// Log more (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plays a chart without audio or video and prints the result as JSON.
    Simulate {
        chart: PathBuf,
        /// Replay to drive input; a generated autoplay is used otherwise.
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Session config JSON; missing fields keep their defaults.
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 16.0)]
        frame_ms: f64,
    },
    /// Writes a replay that hits every note on time.
    Autoplay {
        chart: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Prints a replay's header and frame statistics.
    Inspect { replay: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Command::Simulate {
            chart,
            replay,
            config,
            frame_ms,
        } => {
            if !(frame_ms > 0.0) {
                anyhow::bail!("--frame-ms must be positive, got {frame_ms}");
            }
            let chart_data = load_chart_json_from_path(&chart)?;
            let config = match config {
                Some(path) => load_config(&path)?,
                None => SessionConfig::default(),
            };
            let replay = replay.map(|path| read_replay(&path)).transpose()?;

            let result = simulate::run_simulation(chart_data, config, replay, frame_ms)
                .with_context(|| format!("simulation failed: {}", chart.display()))?;
            let json =
                serde_json::to_string_pretty(&result).context("failed to serialize result")?;
            println!("{json}");
        }
        Command::Autoplay { chart, output } => {
            let chart_data = load_chart_json_from_path(&chart)?;
            let config = SessionConfig::default();
            let replay = generate_autoplay(&chart_data, -config.start_delay_ms, Modifiers::default());

            let out_path = output.unwrap_or_else(|| default_output_path(&chart));
            let bytes = encode(&replay).context("failed to encode replay")?;
            fs::write(&out_path, bytes)
                .with_context(|| format!("failed to write: {}", out_path.display()))?;
            println!("{} ({} frames)", out_path.display(), replay.frames.len());
        }
        Command::Inspect { replay } => {
            let data = read_replay(&replay)?;
            let presses: u32 = data
                .frames
                .iter()
                .scan(0u32, |prev, f| {
                    let pressed = (f.keys.0 & !*prev).count_ones();
                    *prev = f.keys.0;
                    Some(pressed)
                })
                .sum();
            let lanes = data
                .frames
                .iter()
                .filter_map(|f| f.keys.highest_lane())
                .max()
                .map_or(0, |l| l + 1);

            println!("modifiers: {:?}", data.modifiers);
            println!("origin:    {}ms", data.origin_ms);
            println!("end:       {}ms", data.end_ms());
            println!("frames:    {}", data.frames.len());
            println!("presses:   {presses}");
            println!("lanes:     {lanes}");
        }
    }

    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<SessionConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {}", path.display()))?;
    Ok(config)
}

fn read_replay(path: &Path) -> anyhow::Result<notefall_core::replay::Replay> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read replay: {}", path.display()))?;
    decode(&bytes).with_context(|| format!("failed to decode replay: {}", path.display()))
}

fn default_output_path(input: &Path) -> PathBuf {
    let mut out = input.to_path_buf();
    out.set_extension("nfr");
    out
}
