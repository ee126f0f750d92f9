/// Ordered, capped sequence of hints for a single round.
///
/// Reveals are monotonic and saturate at `max_hints`; calling `reveal` past
/// the cap leaves the ladder unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct HintLadder {
    hints: Vec<String>,
    max_hints: usize,
    revealed: usize,
}

impl HintLadder {
    /// The cap is clamped to the number of hints actually supplied.
    pub fn new(hints: Vec<String>, max_hints: usize) -> Self {
        let max_hints = max_hints.min(hints.len());
        Self {
            hints,
            max_hints,
            revealed: 0,
        }
    }

    pub fn peek_next(&self) -> Option<&str> {
        if self.revealed < self.max_hints {
            self.hints.get(self.revealed).map(String::as_str)
        } else {
            None
        }
    }

    pub fn reveal(&mut self) -> Option<&str> {
        if self.revealed >= self.max_hints {
            return None;
        }
        self.revealed += 1;
        self.hints.get(self.revealed - 1).map(String::as_str)
    }

    pub fn revealed(&self) -> usize {
        self.revealed
    }

    pub fn max_hints(&self) -> usize {
        self.max_hints
    }

    pub fn is_exhausted(&self) -> bool {
        self.revealed >= self.max_hints
    }

    pub fn revealed_hints(&self) -> &[String] {
        &self.hints[..self.revealed]
    }
}
