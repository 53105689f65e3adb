use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tictactoe_rl::{
    EpisodeController, Result,
    app::AgentConfig,
    pipeline::{
        JsonlObserver, Observation, Observer, Opener, RandomOpponent,
        RuleBasedOpponent, TrainingConfig, TrainingPipeline, TrainingResult,
    },
    q_learning::{EngineKind, QTable, SharedQTable},
    tictactoe::{BoardState, Outcome, Player},
};

/// Forwards game ends into a shared log the test can inspect afterwards.
struct OutcomeLog(Arc<Mutex<Vec<Outcome>>>);

impl Observer for OutcomeLog {
    fn on_game_end(&mut self, _game: usize, outcome: Outcome) -> Result<()> {
        self.0.lock().unwrap().push(outcome);
        Ok(())
    }
}

/// Counts agent moves whose board already shows the agent's mark.
struct MoveCheck {
    mark: Player,
    moves: Arc<Mutex<usize>>,
}

impl Observer for MoveCheck {
    fn on_agent_move(
        &mut self,
        _game: usize,
        _step: usize,
        state: &BoardState,
        cell: usize,
    ) -> Result<()> {
        assert_eq!(state.cell(cell).and_then(|c| c.to_player()), Some(self.mark));
        *self.moves.lock().unwrap() += 1;
        Ok(())
    }
}

fn agent(kind: EngineKind, seed: u64) -> EpisodeController {
    EpisodeController::new(AgentConfig::new(kind).with_seed(seed)).unwrap()
}

#[test]
fn every_engine_trains_against_the_heuristic_opponent() {
    for kind in [EngineKind::QLearning, EngineKind::Sarsa, EngineKind::SarsaLambda] {
        let mut agent = agent(kind, 21);
        let mut opponent = RuleBasedOpponent::sophisticated();
        let mut pipeline = TrainingPipeline::new(TrainingConfig {
            num_games: 40,
            seed: Some(5),
            opener: Opener::Alternate,
        });

        let result = pipeline.run(&mut agent, &mut opponent).unwrap();
        assert_eq!(result.total_games, 40);
        assert_eq!(result.wins + result.draws + result.losses, 40);
        assert!(!agent.table().snapshot().unwrap().is_empty(), "{kind:?}");
    }
}

#[test]
fn observers_see_agent_moves_and_outcomes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let moves = Arc::new(Mutex::new(0));
    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_games: 25,
        seed: Some(2),
        opener: Opener::Random,
    })
    .with_observer(Box::new(OutcomeLog(Arc::clone(&log))))
    .with_observer(Box::new(MoveCheck {
        mark: Player::O,
        moves: Arc::clone(&moves),
    }));

    let mut agent = agent(EngineKind::Sarsa, 4);
    let mut opponent = RandomOpponent::with_seed("uniform", 6);
    let result = pipeline.run(&mut agent, &mut opponent).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 25);
    assert!(log.iter().all(|o| o.is_terminal()));
    assert_eq!(
        log.iter().filter(|&&o| o == Outcome::AgentWin).count(),
        result.wins
    );
    assert!(*moves.lock().unwrap() >= 25);
}

#[test]
fn self_play_shares_one_table() {
    let table = SharedQTable::new(QTable::default());
    let mut x = EpisodeController::with_table(
        AgentConfig::new(EngineKind::QLearning).with_mark(Player::X),
        table.clone(),
    )
    .unwrap();
    let mut o = EpisodeController::with_table(
        AgentConfig::new(EngineKind::QLearning).with_mark(Player::O),
        table.clone(),
    )
    .unwrap();

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_games: 30,
        seed: Some(12),
        opener: Opener::Agent,
    });
    let result = pipeline.run_self_play(&mut x, &mut o).unwrap();

    assert_eq!(result.total_games, 30);
    assert_eq!(x.state(), o.state());
    assert!(!table.snapshot().unwrap().is_empty());
    assert!(x.table().ptr_eq(o.table()));
}

#[test]
fn self_play_needs_opposite_marks() {
    let mut a = agent(EngineKind::Sarsa, 1);
    let mut b = agent(EngineKind::Sarsa, 2);
    let mut pipeline = TrainingPipeline::new(TrainingConfig::default());
    assert!(pipeline.run_self_play(&mut a, &mut b).is_err());
}

#[test]
fn jsonl_log_and_summary_are_written() {
    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("games.jsonl");
    let summary_path = dir.path().join("summary.json");

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_games: 10,
        seed: Some(3),
        opener: Opener::Opponent,
    })
    .with_observer(Box::new(JsonlObserver::new(&log_path).unwrap()));

    let mut agent = agent(EngineKind::SarsaLambda, 8);
    let mut opponent = RuleBasedOpponent::random_player();
    let result = pipeline.run(&mut agent, &mut opponent).unwrap();
    drop(pipeline);

    let text = std::fs::read_to_string(&log_path).unwrap();
    let games: Vec<Observation> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(games.len(), 10);
    assert!(games.iter().all(|g| !g.steps.is_empty()));

    result.save(&summary_path).unwrap();
    let loaded = TrainingResult::load(&summary_path).unwrap();
    assert_eq!(loaded.total_games, result.total_games);
    assert_eq!(loaded.wins, result.wins);
    assert!((loaded.win_rate - result.win_rate).abs() < 1e-12);
}
