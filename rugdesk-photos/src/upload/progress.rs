//! Upload progress snapshots
//!
//! A snapshot belongs to exactly one upload call. It is emitted once at the
//! start and once after each completed batch, never per file.

use serde::Serialize;

/// Progress of one upload call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UploadProgress {
    /// Files in the call
    pub total: usize,
    /// Files uploaded so far
    pub completed: usize,
    /// `round(completed / total × 100)`
    pub percentage: u8,
    /// 1-based index of the last completed batch, 0 before the first
    pub current_batch: usize,
    pub total_batches: usize,
}

impl UploadProgress {
    /// Snapshot before any batch has run
    pub fn start(total: usize, total_batches: usize) -> Self {
        Self {
            total,
            completed: 0,
            percentage: 0,
            current_batch: 0,
            total_batches,
        }
    }

    /// Advance past a completed batch of `batch_len` files
    pub fn record_batch(&mut self, batch_index: usize, batch_len: usize) {
        self.current_batch = batch_index;
        self.completed = (self.completed + batch_len).min(self.total);
        self.percentage = percentage(self.completed, self.total);
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total
    }
}

fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

/// Number of batches needed for `total` files
pub fn batch_count(total: usize, batch_size: usize) -> usize {
    total.div_ceil(batch_size.max(1))
}
