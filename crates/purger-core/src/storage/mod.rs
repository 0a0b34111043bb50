pub mod models;
pub mod queries;
pub mod session;
pub mod sqlite;

pub use session::BatchSession;
pub use sqlite::Database;
