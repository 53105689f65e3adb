//! Integration tests for the application container.
//!
//! An in-memory repository keeps these tests off the filesystem; fixed seeds
//! keep them deterministic.

use std::path::Path;

use tictactoe_rl::{
    adapters::{InMemoryRepository, JobReport},
    app::{AgentConfig, App},
    pipeline::{RuleBasedOpponent, TrainingConfig, TrainingPipeline},
    q_learning::EngineKind,
    tictactoe::{Action, Outcome, Player},
};

fn play_out(agent: &mut tictactoe_rl::EpisodeController) -> Outcome {
    let mut outcome = Outcome::InProgress;
    while !outcome.is_terminal() {
        let cell = agent.state().available_actions()[0];
        outcome = agent
            .apply_opponent_move(Action::new(cell, agent.opponent_mark()))
            .unwrap();
    }
    outcome
}

#[test]
fn test_app_with_in_memory_repository() {
    let repo = InMemoryRepository::new();
    let app = App::for_testing()
        .with_repository(repo.clone())
        .with_default_seed(42)
        .build();

    let mut agent = app
        .create_agent(AgentConfig::new(EngineKind::QLearning))
        .unwrap();
    play_out(&mut agent);

    let path = Path::new("test_agent");
    app.save_table(agent.table(), path).unwrap();
    assert!(repo.contains(path));

    let loaded = app
        .load_agent(AgentConfig::new(EngineKind::QLearning), path)
        .unwrap();
    assert_eq!(
        loaded.table().snapshot().unwrap(),
        agent.table().snapshot().unwrap()
    );
}

#[test]
fn test_deterministic_training_with_seed() {
    let run = || {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .with_default_seed(7)
            .build();
        let mut agent = app
            .create_agent(AgentConfig::new(EngineKind::SarsaLambda))
            .unwrap();
        let mut opponent = RuleBasedOpponent::random_player().with_seed(8);
        let mut pipeline = TrainingPipeline::new(TrainingConfig {
            num_games: 30,
            ..TrainingConfig::default()
        });
        let result = pipeline.run(&mut agent, &mut opponent).unwrap();
        (result, agent.table().snapshot().unwrap())
    };

    let (first_result, first_table) = run();
    let (second_result, second_table) = run();
    assert_eq!(first_result, second_result);
    assert_eq!(first_table, second_table);
}

#[test]
fn test_independent_agents_do_not_share_state() {
    let app = App::for_testing()
        .with_repository(InMemoryRepository::new())
        .with_default_seed(1)
        .build();
    let mut a = app.create_agent(AgentConfig::default()).unwrap();
    let b = app.create_agent(AgentConfig::default()).unwrap();

    a.apply_opponent_move(Action::new(4, Player::X)).unwrap();
    assert!(b.state().is_empty());
    assert!(b.table().snapshot().unwrap().is_empty());
    assert!(!a.table().ptr_eq(b.table()));
}

#[test]
fn test_worker_uses_the_app_repository() {
    let repo = InMemoryRepository::new();
    let app = App::for_testing().with_repository(repo.clone()).build();
    let mut agent = app
        .create_agent(AgentConfig::new(EngineKind::Sarsa).with_seed(3))
        .unwrap();
    play_out(&mut agent);

    let worker = app.persistence_worker().unwrap();
    worker.save(agent.table(), "worker_table").unwrap();
    assert!(worker.recv_report().unwrap().is_success());
    worker.load(agent.table(), "nowhere").unwrap();
    assert!(matches!(
        worker.recv_report().unwrap(),
        JobReport::NotFound { .. }
    ));
    worker.shutdown().unwrap();

    assert!(repo.contains(Path::new("worker_table")));
    assert_eq!(repo.count(), 1);
}
