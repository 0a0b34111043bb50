pub mod config;
pub mod engine;
pub mod error;
pub mod progress;
pub mod purge;
pub mod storage;

pub use config::PurgeConfig;
pub use engine::{PurgeEngine, PurgeResult};
pub use error::Error;
pub use progress::{ProgressReporter, SilentReporter};
pub use purge::SnapshotQuery;
