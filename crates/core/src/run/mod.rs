//! Run records: the durable, externally visible side of a pipeline execution.

mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteRunStore;
pub use store::{CreateRunRequest, RunError, RunField, RunFilter, RunStore};
pub use types::{ApprovalAction, RunRecord, RunStatus};
