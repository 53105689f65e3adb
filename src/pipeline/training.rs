//! Training pipeline for learning agents

use log::{debug, info};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Error, Result,
    episode::EpisodeController,
    ports::{Observer, Opponent},
    tictactoe::{Action, Outcome},
};

/// Who makes the first move of each game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Opener {
    #[default]
    Opponent,
    Agent,
    Alternate,
    /// Coin flip per game
    Random,
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training games
    pub num_games: usize,

    /// Seeds the agent, the opponent and the opener coin
    pub seed: Option<u64>,

    pub opener: Opener,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_games: 500,
            seed: None,
            opener: Opener::default(),
        }
    }
}

/// Result of a training run, counted from the agent's side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub total_games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub draw_rate: f64,
    pub loss_rate: f64,
}

impl TrainingResult {
    pub fn new(total_games: usize, wins: usize, draws: usize, losses: usize) -> Self {
        let rate = |count: usize| {
            if total_games > 0 {
                count as f64 / total_games as f64
            } else {
                0.0
            }
        };

        Self {
            total_games,
            wins,
            draws,
            losses,
            win_rate: rate(wins),
            draw_rate: rate(draws),
            loss_rate: rate(losses),
        }
    }

    fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let count = |wanted: Outcome| outcomes.iter().filter(|&&o| o == wanted).count();
        Self::new(
            outcomes.len(),
            count(Outcome::AgentWin),
            count(Outcome::Draw),
            count(Outcome::OpponentWin),
        )
    }

    /// The same tally counted from the opponent's side.
    pub fn swap_sides(&self) -> Self {
        Self::new(self.total_games, self.losses, self.draws, self.wins)
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Plays repeated episodes and lets the agent learn from each move.
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
    rng: StdRng,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(2)),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            config,
            observers: Vec::new(),
            rng,
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Train `agent` against `opponent` for the configured number of games.
    pub fn run(
        &mut self,
        agent: &mut EpisodeController,
        opponent: &mut dyn Opponent,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed);
            opponent.set_rng_seed(seed.wrapping_add(1));
        }
        info!(
            "training {} against {} for {} games",
            agent.engine().kind().name(),
            opponent.name(),
            self.config.num_games
        );

        let total = self.config.num_games;
        self.notify(|o| o.on_training_start(total))?;
        let mut outcomes = Vec::with_capacity(self.config.num_games);
        for game in 0..self.config.num_games {
            self.notify(|o| o.on_game_start(game))?;
            let agent_opens = self.agent_opens(game);
            let outcome = self.play_game(game, agent, opponent, agent_opens)?;
            self.notify(|o| o.on_game_end(game, outcome))?;
            outcomes.push(outcome);
        }
        self.notify(|o| o.on_training_end())?;

        Ok(TrainingResult::from_outcomes(&outcomes))
    }

    /// Let two agents play each other; `first` always opens.
    ///
    /// Each agent sees the other's moves as opponent moves, so both learn.
    /// The two may share one table. The result is counted from `first`'s side.
    ///
    /// # Errors
    ///
    /// Fails if both agents play the same mark or use different board sizes.
    pub fn run_self_play(
        &mut self,
        first: &mut EpisodeController,
        second: &mut EpisodeController,
    ) -> Result<TrainingResult> {
        if first.mark() == second.mark() {
            return Err(Error::InvalidConfiguration {
                message: format!("both agents play {}", first.mark()),
            });
        }
        if first.config().board_size != second.config().board_size {
            return Err(Error::InvalidConfiguration {
                message: "self-play agents use different board sizes".to_string(),
            });
        }
        if let Some(seed) = self.config.seed {
            first.set_rng_seed(seed);
            second.set_rng_seed(seed.wrapping_add(1));
        }
        info!("self-play for {} games", self.config.num_games);

        let total = self.config.num_games;
        self.notify(|o| o.on_training_start(total))?;
        let mut outcomes = Vec::with_capacity(self.config.num_games);
        for game in 0..self.config.num_games {
            self.notify(|o| o.on_game_start(game))?;
            let outcome = self.play_self_play_game(game, first, second)?;
            self.notify(|o| o.on_game_end(game, outcome))?;
            outcomes.push(outcome);
        }
        self.notify(|o| o.on_training_end())?;

        Ok(TrainingResult::from_outcomes(&outcomes))
    }

    fn agent_opens(&mut self, game: usize) -> bool {
        match self.config.opener {
            Opener::Opponent => false,
            Opener::Agent => true,
            Opener::Alternate => game % 2 == 1,
            Opener::Random => self.rng.random_bool(0.5),
        }
    }

    fn notify<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut dyn Observer) -> Result<()>,
    {
        for observer in &mut self.observers {
            f(observer.as_mut())?;
        }
        Ok(())
    }

    fn notify_agent_move(
        &mut self,
        game: usize,
        step: usize,
        agent: &EpisodeController,
    ) -> Result<()> {
        if let Some(action) = agent.last_agent_action() {
            let state = agent.state();
            self.notify(|o| o.on_agent_move(game, step, state, action.index))?;
        }
        Ok(())
    }

    fn play_game(
        &mut self,
        game: usize,
        agent: &mut EpisodeController,
        opponent: &mut dyn Opponent,
        agent_opens: bool,
    ) -> Result<Outcome> {
        agent.reset_episode();
        let mut step = 0;

        let mut outcome = Outcome::InProgress;
        if agent_opens {
            outcome = agent.agent_move()?;
            self.notify_agent_move(game, step, agent)?;
            step += 1;
        }

        while !outcome.is_terminal() {
            let before = agent.state().occupied_count();
            let cell = opponent.select_move(agent.state(), agent.opponent_mark())?;
            outcome = agent.apply_opponent_move(Action::new(cell, agent.opponent_mark()))?;

            match agent.state().occupied_count() - before {
                0 => return Err(Error::InvalidMove { position: cell }),
                2 => {
                    self.notify_agent_move(game, step, agent)?;
                    step += 1;
                }
                _ => {}
            }
        }

        debug!("game {game}: {outcome:?}");
        Ok(outcome)
    }

    fn play_self_play_game(
        &mut self,
        game: usize,
        first: &mut EpisodeController,
        second: &mut EpisodeController,
    ) -> Result<Outcome> {
        first.reset_episode();
        second.reset_episode();

        let mut outcome = first.agent_move()?;
        let mut step = 0;
        loop {
            self.notify_agent_move(game, step, first)?;
            step += 1;

            let cell = first.last_agent_action().ok_or(Error::GameOver)?.index;
            let reply = second.apply_opponent_move(Action::new(cell, first.mark()))?;
            if outcome.is_terminal() {
                break;
            }

            let cell = second.last_agent_action().ok_or(Error::GameOver)?.index;
            outcome = first.apply_opponent_move(Action::new(cell, second.mark()))?;
            if reply.is_terminal() {
                break;
            }
        }

        debug!("self-play game {game}: {outcome:?}");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::AgentConfig,
        pipeline::{MetricsObserver, RandomOpponent, RuleBasedOpponent},
        q_learning::{EngineKind, SharedQTable},
        tictactoe::Player,
    };

    fn agent(kind: EngineKind) -> EpisodeController {
        EpisodeController::new(AgentConfig::new(kind)).unwrap()
    }

    fn config(num_games: usize, opener: Opener) -> TrainingConfig {
        TrainingConfig {
            num_games,
            seed: Some(42),
            opener,
        }
    }

    #[test]
    fn test_training_pipeline() {
        let mut pipeline = TrainingPipeline::new(config(10, Opener::Opponent));
        let mut agent = agent(EngineKind::QLearning);
        let mut opponent = RandomOpponent::new("random");

        let result = pipeline.run(&mut agent, &mut opponent).unwrap();

        assert_eq!(result.total_games, 10);
        assert_eq!(result.wins + result.draws + result.losses, 10);
        assert!(!agent.table().snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_alternating_opener() {
        let mut pipeline = TrainingPipeline::new(config(6, Opener::Alternate));
        let mut agent = agent(EngineKind::Sarsa);
        let mut opponent = RuleBasedOpponent::random_player();

        let result = pipeline.run(&mut agent, &mut opponent).unwrap();
        assert_eq!(result.total_games, 6);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let run = || {
            let mut pipeline = TrainingPipeline::new(config(20, Opener::Random));
            let mut agent = agent(EngineKind::SarsaLambda);
            let mut opponent = RuleBasedOpponent::sophisticated();
            let result = pipeline.run(&mut agent, &mut opponent).unwrap();
            (result, agent.table().snapshot().unwrap())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_self_play_with_shared_table() {
        let table = SharedQTable::default();
        let mut first = EpisodeController::with_table(
            AgentConfig::default().with_mark(Player::X),
            table.clone(),
        )
        .unwrap();
        let mut second =
            EpisodeController::with_table(AgentConfig::default().with_mark(Player::O), table.clone())
                .unwrap();

        let mut pipeline = TrainingPipeline::new(config(25, Opener::Agent));
        let result = pipeline.run_self_play(&mut first, &mut second).unwrap();

        assert_eq!(result.total_games, 25);
        assert_eq!(result.wins + result.draws + result.losses, 25);
        assert!(table.snapshot().unwrap().nonzero_count() > 0);
        assert_eq!(first.state(), second.state());
    }

    #[test]
    fn test_self_play_rejects_same_mark() {
        let mut a = agent(EngineKind::QLearning);
        let mut b = agent(EngineKind::QLearning);
        let mut pipeline = TrainingPipeline::new(config(1, Opener::Agent));
        assert!(pipeline.run_self_play(&mut a, &mut b).is_err());
    }

    #[test]
    fn test_observers_see_every_game() {
        let mut pipeline = TrainingPipeline::new(config(8, Opener::Opponent))
            .with_observer(Box::new(MetricsObserver::new()));
        let mut agent = agent(EngineKind::QLearning);
        let mut opponent = RandomOpponent::new("random");
        let result = pipeline.run(&mut agent, &mut opponent).unwrap();
        assert_eq!(result.total_games, 8);
    }

    #[test]
    fn test_result_rates() {
        let result = TrainingResult::new(4, 2, 1, 1);
        assert_eq!(result.win_rate, 0.5);
        assert_eq!(result.draw_rate, 0.25);
        assert_eq!(TrainingResult::new(0, 0, 0, 0).loss_rate, 0.0);

        let other = result.swap_sides();
        assert_eq!((other.wins, other.losses), (1, 2));
        assert_eq!(other.loss_rate, 0.5);
    }
}
