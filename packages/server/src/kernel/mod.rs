//! Kernel module - server infrastructure and dependencies.

pub mod clock;
pub mod deps;
pub mod keywords;
pub mod live_events;
pub mod rate_gate;
pub mod test_dependencies;
pub mod traits;

pub use clock::SystemClock;
pub use deps::{BoardHarvester, PostgresPostingStore, ServerDeps};
pub use keywords::SkillKeywordExtractor;
pub use live_events::{LiveEventChannel, StreamMessage};
pub use rate_gate::{RateAction, RateGate, RatePolicy};
pub use test_dependencies::TestDependencies;
pub use traits::*;
