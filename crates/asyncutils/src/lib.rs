//! Cooperative scheduling helpers.
//!
//! Long scans run as a handful of futures joined on one task. Nothing in
//! them blocks, but a tight loop over cached content never hits a real
//! suspension point either. [`YieldEvery`] paces such loops with Tokio's
//! [`yield_now`], so the other futures on the same task get a turn.

pub use tokio::task::yield_now;

/// Counts units of work and yields every `every` of them.
///
/// An interval of zero never yields.
#[derive(Debug, Clone)]
pub struct YieldEvery {
    every: usize,
    count: usize,
}

impl YieldEvery {
    pub fn new(every: usize) -> Self {
        Self { every, count: 0 }
    }

    /// Record one unit of work, yielding if the interval was reached.
    pub async fn tick(&mut self) {
        self.count += 1;
        if self.every > 0 && self.count.is_multiple_of(self.every) {
            yield_now().await;
        }
    }

    /// Units of work recorded so far.
    pub fn count(&self) -> usize {
        self.count
    }
}
