use std::collections::{HashSet, VecDeque};

pub const DEFAULT_TABU_CAPACITY: usize = 50;

/// Bounded FIFO memory of recently accepted solution fingerprints
#[derive(Debug, Clone)]
pub struct TabuList {
    capacity: usize,
    order: VecDeque<u64>,
    members: HashSet<u64>,
}

impl TabuList {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity + 1),
            members: HashSet::with_capacity(capacity + 1),
        }
    }

    pub fn contains(&self, fingerprint: u64) -> bool {
        self.members.contains(&fingerprint)
    }

    /// Remembers `fingerprint`, evicting the oldest entry once over capacity
    pub fn insert(&mut self, fingerprint: u64) {
        if !self.members.insert(fingerprint) {
            return;
        }
        self.order.push_back(fingerprint);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
