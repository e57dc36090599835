use serde::{Deserialize, Serialize};

/// Point-in-time view of an admission queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub max_parallel: usize,
    pub submitted: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl QueueCounts {
    /// Nothing waiting and nothing running.
    pub fn is_idle(&self) -> bool {
        self.pending == 0 && self.in_flight == 0
    }

    pub fn settled(&self) -> u64 {
        self.succeeded + self.failed
    }
}
