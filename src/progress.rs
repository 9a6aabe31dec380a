use serde::Serialize;

/// Counts rounds played and won in the current session
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    played: u32,
    won: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProgressSnapshot {
    pub played: u32,
    pub won: u32,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, won: bool) {
        if won {
            self.won += 1;
        }
        self.played += 1;
    }

    pub fn reset(&mut self) {
        self.played = 0;
        self.won = 0;
    }

    pub fn played(&self) -> u32 {
        self.played
    }

    pub fn won(&self) -> u32 {
        self.won
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            played: self.played,
            won: self.won,
        }
    }
}
