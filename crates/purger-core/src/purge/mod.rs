pub mod commands;
pub mod query;
pub mod tree;

pub use commands::PurgeCommands;
pub use query::SnapshotQuery;
