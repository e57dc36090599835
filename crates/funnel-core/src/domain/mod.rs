//! Domain model (ids, task state, errors, compile requests, switches).

pub mod errors;
pub mod ids;
pub mod request;
pub mod state;
pub mod switches;

pub use errors::{ErrorKind, FunnelError};
pub use ids::{BuildId, TaskId};
pub use request::{BuildManifest, CompileOptions, CompileRequest};
pub use state::TaskState;
pub use switches::{BuildSwitches, RuntimeStamp};
