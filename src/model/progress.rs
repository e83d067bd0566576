/// Rescue counters and the win latch. Once won, nothing changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GameProgress {
    found: usize,
    total: usize,
    won: bool,
}

impl GameProgress {
    pub fn new(total: usize) -> Self {
        Self { found: 0, total, won: false }
    }

    pub fn found(&self) -> usize {
        self.found
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn all_found(&self) -> bool {
        self.found >= self.total
    }

    /// Count one more baby as found
    pub fn record_found(&mut self) {
        if self.won || self.found >= self.total {
            return;
        }
        self.found += 1;
        tracing::info!(found = self.found, total = self.total, "baby panda found");
    }

    /// Latch the win when every baby is found and all of them are with the parent.
    /// Returns true only on the tick the game is won.
    pub fn evaluate(&mut self, all_with_parent: bool) -> bool {
        if self.won {
            return false;
        }
        if self.all_found() && all_with_parent {
            self.won = true;
            tracing::info!(total = self.total, "all baby pandas rescued");
            return true;
        }
        false
    }
}
