use std::collections::VecDeque;

use crate::wrapping_number::{sequence_distance, sequence_greater_than, sequence_less_than};

/// Sliding window of the most recent invoke-once sequences executed for
/// one sender. Sequences older than the window are treated as already seen.
pub struct OnceWindow {
    // ascending in wrapping order
    seen: VecDeque<u16>,
    capacity: usize,
}

impl OnceWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, sequence: u16) -> bool {
        for seen in self.seen.iter().rev() {
            if *seen == sequence {
                return true;
            }
            if sequence_less_than(*seen, sequence) {
                return false;
            }
        }
        false
    }

    /// Records `sequence`. Returns `false` if it was already seen or is too
    /// old to tell.
    pub fn insert(&mut self, sequence: u16) -> bool {
        if let Some(newest) = self.seen.back() {
            if sequence_distance(sequence, *newest) as usize >= self.capacity
                && !sequence_greater_than(sequence, *newest)
            {
                return false;
            }
        }
        if self.contains(sequence) {
            return false;
        }

        let mut index = self.seen.len();
        while index > 0 && sequence_less_than(sequence, self.seen[index - 1]) {
            index -= 1;
        }
        self.seen.insert(index, sequence);

        while self.seen.len() > self.capacity {
            self.seen.pop_front();
        }
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
