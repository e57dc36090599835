//! TaskRunner port - the operation the admission queue gates.

use async_trait::async_trait;

use crate::domain::FunnelError;

/// Executes one admitted task.
///
/// The queue decides *when* `run` is called and never looks at the result
/// beyond "did it settle". Implementations must be shareable across the
/// tasks running at once.
///
/// # Example
/// ```ignore
/// struct Echo;
///
/// #[async_trait]
/// impl TaskRunner for Echo {
///     type Task = String;
///     type Output = String;
///
///     async fn run(&self, task: String) -> Result<String, FunnelError> {
///         Ok(task)
///     }
/// }
/// ```
#[async_trait]
pub trait TaskRunner: Send + Sync + 'static {
    type Task: Send + 'static;
    type Output: Send + 'static;

    async fn run(&self, task: Self::Task) -> Result<Self::Output, FunnelError>;
}
