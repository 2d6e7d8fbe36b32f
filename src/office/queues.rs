use crate::models::{ServiceType, SERVICE_TYPE_COUNT};
use rand::seq::SliceRandom;
use rand::Rng;

/// Waiting-customer counts, one per service type.
///
/// Only reachable through the office's queue guard.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueueBoard {
    lengths: [usize; SERVICE_TYPE_COUNT],
}

impl QueueBoard {
    /// Add one waiting customer, returning the new length
    pub fn enqueue(&mut self, service: ServiceType) -> usize {
        let length = &mut self.lengths[service.index()];
        *length += 1;
        *length
    }

    /// Remove one waiting customer, returning the new length.
    /// `None` when that queue is already empty.
    pub fn take(&mut self, service: ServiceType) -> Option<usize> {
        let length = &mut self.lengths[service.index()];
        *length = length.checked_sub(1)?;
        Some(*length)
    }

    pub fn all_empty(&self) -> bool {
        self.lengths.iter().all(|length| *length == 0)
    }

    pub fn non_empty(&self) -> Vec<ServiceType> {
        ServiceType::ALL
            .into_iter()
            .filter(|service| self.lengths[service.index()] > 0)
            .collect()
    }

    /// Uniform choice among the non-empty queues
    pub fn pick_non_empty<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<ServiceType> {
        self.non_empty().choose(rng).copied()
    }

    pub fn length(&self, service: ServiceType) -> usize {
        self.lengths[service.index()]
    }

    pub fn lengths(&self) -> [usize; SERVICE_TYPE_COUNT] {
        self.lengths
    }

    pub fn total(&self) -> usize {
        self.lengths.iter().sum()
    }
}
