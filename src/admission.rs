//! One-shot concurrency allowance.
//!
//! The budget is spent while the admission list is built, before any work is
//! dispatched. A slot is never handed back when a unit finishes, so a file
//! refused here is not retried later in the same run.

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Unbounded,
    Remaining(usize),
}

#[derive(Debug, Clone)]
pub struct Admission {
    budget: Budget,
}

impl Admission {
    /// Any negative maximum means no limit.
    pub fn new(max: i64) -> Self {
        let budget = usize::try_from(max)
            .map(Budget::Remaining)
            .unwrap_or(Budget::Unbounded);
        Self { budget }
    }

    pub fn unbounded() -> Self {
        Self {
            budget: Budget::Unbounded,
        }
    }

    pub fn budget(&self) -> Budget {
        self.budget
    }

    /// Spends one slot, or reports that none is left.
    pub fn try_admit(&mut self) -> bool {
        match self.budget {
            Budget::Unbounded => true,
            Budget::Remaining(0) => false,
            Budget::Remaining(n) => {
                self.budget = Budget::Remaining(n - 1);
                true
            }
        }
    }

    /// Splits candidates, in order, into admitted and refused.
    pub fn partition(mut self, candidates: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<PathBuf>) {
        candidates
            .into_iter()
            .partition(|_| self.try_admit())
    }
}

impl Default for Admission {
    fn default() -> Self {
        Self::unbounded()
    }
}
