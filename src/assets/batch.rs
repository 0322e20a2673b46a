/// Result of settling one load against the barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settle {
    /// Belongs to a superseded or already settled generation; discard it.
    Stale,
    Pending { remaining: usize },
    /// The last outstanding load of the current generation.
    Complete,
}

/// All-or-nothing join over one load generation. A new `begin` supersedes
/// every load still in flight from earlier generations.
#[derive(Debug, Clone, Default)]
pub struct LoadBatch {
    generation: u64,
    expected: usize,
    settled: usize,
}

impl LoadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation expecting `expected` settlements.
    pub fn begin(&mut self, expected: usize) -> u64 {
        self.generation += 1;
        self.expected = expected;
        self.settled = 0;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn remaining(&self) -> usize {
        self.expected.saturating_sub(self.settled)
    }

    pub fn is_complete(&self) -> bool {
        self.settled >= self.expected
    }

    pub fn accepts(&self, generation: u64) -> bool {
        generation == self.generation && !self.is_complete()
    }

    /// Counts one load of `generation` as settled, success or failure alike.
    pub fn settle(&mut self, generation: u64) -> Settle {
        if !self.accepts(generation) {
            return Settle::Stale;
        }
        self.settled += 1;
        if self.is_complete() {
            Settle::Complete
        } else {
            Settle::Pending {
                remaining: self.remaining(),
            }
        }
    }

    /// Marks every outstanding load as settled. Their results will arrive as
    /// stale. Returns how many were abandoned.
    pub fn give_up(&mut self) -> usize {
        let abandoned = self.remaining();
        self.settled = self.expected;
        abandoned
    }
}
