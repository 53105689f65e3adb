//! Episode outcomes

use serde::{Deserialize, Serialize};

/// Result of submitting a move, seen from the learning agent's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Draw,
    OpponentWin,
    AgentWin,
}

impl Outcome {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}
