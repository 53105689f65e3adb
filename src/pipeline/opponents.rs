//! Opponents the agent can train against

use rand::{SeedableRng, random, rngs::StdRng, seq::IndexedRandom};

use crate::{
    Error, Result,
    ports::Opponent,
    strategy::StrategyChain,
    tictactoe::{BoardState, Player},
};

/// Uniformly random player
pub struct RandomOpponent {
    name: String,
    rng: StdRng,
}

impl RandomOpponent {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_seed(name, random())
    }

    pub fn with_seed(name: impl Into<String>, seed: u64) -> Self {
        Self {
            name: name.into(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Opponent for RandomOpponent {
    fn select_move(&mut self, state: &BoardState, _mark: Player) -> Result<usize> {
        state
            .available_actions()
            .choose(&mut self.rng)
            .copied()
            .ok_or(Error::GameOver)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

/// Player driven by a [`StrategyChain`]
pub struct RuleBasedOpponent {
    name: String,
    chain: StrategyChain,
    rng: StdRng,
}

impl RuleBasedOpponent {
    pub fn new(name: impl Into<String>, chain: StrategyChain) -> Self {
        Self {
            name: name.into(),
            chain,
            rng: StdRng::seed_from_u64(random()),
        }
    }

    /// Completes its own lines, otherwise plays at random.
    pub fn random_player() -> Self {
        Self::new("random", StrategyChain::random_player())
    }

    /// Wins, blocks and sets up forks.
    pub fn sophisticated() -> Self {
        Self::new("sophisticated", StrategyChain::sophisticated())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl Opponent for RuleBasedOpponent {
    fn select_move(&mut self, state: &BoardState, mark: Player) -> Result<usize> {
        self.chain
            .play(state, mark, &mut self.rng)
            .ok_or(Error::GameOver)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_opponent_plays_free_cells() {
        let mut opponent = RandomOpponent::with_seed("r", 3);
        let state = BoardState::from_string("XOXOX....").unwrap();
        for _ in 0..20 {
            let cell = opponent.select_move(&state, Player::O).unwrap();
            assert!(state.available_actions().contains(&cell));
        }
    }

    #[test]
    fn test_full_board_is_game_over() {
        let full = BoardState::from_string("XOXXOOOXX").unwrap();
        let mut random = RandomOpponent::with_seed("r", 3);
        let mut rules = RuleBasedOpponent::sophisticated().with_seed(3);
        assert!(matches!(random.select_move(&full, Player::X), Err(Error::GameOver)));
        assert!(matches!(rules.select_move(&full, Player::X), Err(Error::GameOver)));
    }

    #[test]
    fn test_rule_based_blocks() {
        let mut opponent = RuleBasedOpponent::sophisticated().with_seed(1);
        let state = BoardState::from_string("OO..X....").unwrap();
        assert_eq!(opponent.select_move(&state, Player::X).unwrap(), 2);
        assert_eq!(opponent.name(), "sophisticated");
    }
}
