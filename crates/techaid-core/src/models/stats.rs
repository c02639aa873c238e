//! Count summaries.

use serde::{Deserialize, Serialize};

use super::enums::Status;

/// Per-status counts over a filtered ticket set.
///
/// `total == active + not_active + completed` holds for every value built
/// through [`StatusCounts::record`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: u64,
    pub active: u64,
    pub not_active: u64,
    pub completed: u64,
}

impl StatusCounts {
    pub fn record(&mut self, status: Status) {
        self.total += 1;
        match status {
            Status::Active => self.active += 1,
            Status::NotActive => self.not_active += 1,
            Status::Completed => self.completed += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.total == self.active + self.not_active + self.completed
    }
}

impl FromIterator<Status> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = Status>>(iter: I) -> Self {
        let mut counts = StatusCounts::default();
        for status in iter {
            counts.record(status);
        }
        counts
    }
}
