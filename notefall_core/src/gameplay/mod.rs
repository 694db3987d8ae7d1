pub mod events;
pub mod judge;
pub mod judgment;
pub mod pool;
pub mod result;
pub mod ruleset;
pub mod score;
pub mod session;

pub use events::GameplayEvent;
pub use judgment::{HitPhase, Judgment, JudgmentTable, JudgmentWindow, Verdict};
pub use pool::{HitObject, ObjectId, ObjectPool, ObjectState};
pub use ruleset::{ruleset_for, Ruleset, VisibleNote};
pub use score::{ScoreProcessor, ScoreState};
pub use session::{GameplaySession, SessionState};
