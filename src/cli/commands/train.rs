//! Train command - run training games and persist the learned table

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::{
    adapters::JobReport,
    app::App,
    cli::{
        config::AgentArgs,
        output::{format_number, format_rate, print_kv, print_section},
    },
    pipeline::{
        JsonlObserver, Opener, Opponent, ProgressObserver, RandomOpponent, RuleBasedOpponent,
        TrainingConfig, TrainingPipeline, TrainingResult,
    },
    tictactoe::Player,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpponentArg {
    /// Uniformly random cells
    Uniform,
    /// Completes its own lines, otherwise random
    Random,
    /// Full heuristic chain
    Sophisticated,
    /// A second learning agent sharing the table
    #[value(name = "self")]
    SelfPlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OpenerArg {
    Opponent,
    Agent,
    Alternate,
    Random,
}

impl From<OpenerArg> for Opener {
    fn from(arg: OpenerArg) -> Self {
        match arg {
            OpenerArg::Opponent => Opener::Opponent,
            OpenerArg::Agent => Opener::Agent,
            OpenerArg::Alternate => Opener::Alternate,
            OpenerArg::Random => Opener::Random,
        }
    }
}

#[derive(Parser, Debug)]
#[command(about = "Train an agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    #[command(flatten)]
    pub agent: AgentArgs,

    /// Opponent to train against
    #[arg(long, short = 'o', value_enum, default_value = "random")]
    pub opponent: OpponentArg,

    /// Number of training games
    #[arg(long, short = 'g', default_value_t = 500)]
    pub games: usize,

    /// Who opens each game
    #[arg(long, value_enum, default_value = "opponent")]
    pub opener: OpenerArg,

    /// Value table file; loaded first when it exists, written after training
    #[arg(long, short = 't', default_value = "q_table.msgpack")]
    pub table: PathBuf,

    /// Optional file for JSONL observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    training: &'a TrainingResult,
    engine: &'static str,
    opponent: String,
    seed: Option<u64>,
    states: usize,
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let app = App::new();
    let config = args.agent.to_config()?;
    let mut agent = app.create_agent(config.clone())?;

    let worker = app.persistence_worker()?;
    worker.load(agent.table(), &args.table)?;
    match worker.recv_report()? {
        JobReport::Failed { message, .. } => {
            println!("Starting from an empty table ({message})");
        }
        report => println!("{report}"),
    }

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_games: args.games,
        seed: config.seed,
        opener: args.opener.into(),
    });
    if !args.quiet {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("creating observation file {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let (result, opponent_name) = match args.opponent {
        OpponentArg::SelfPlay => {
            let partner_config = config.clone().with_mark(config.opponent_mark());
            let mut partner = app.create_agent_with_table(partner_config, agent.table().clone())?;
            // The agent playing X opens; the tally is kept from our agent's side.
            let result = if agent.mark() == Player::X {
                pipeline.run_self_play(&mut agent, &mut partner)?
            } else {
                pipeline.run_self_play(&mut partner, &mut agent)?.swap_sides()
            };
            (result, "self".to_string())
        }
        kind => {
            let mut opponent = build_opponent(kind)?;
            let result = pipeline.run(&mut agent, opponent.as_mut())?;
            (result, opponent.name().to_string())
        }
    };

    worker.save(agent.table(), &args.table)?;
    let saved = worker.recv_report()?;
    if !saved.is_success() {
        return Err(anyhow!("{saved}"));
    }
    let states = agent.table().snapshot()?.len();

    print_section("Training Summary");
    print_kv("Engine", config.engine.name());
    print_kv("Opponent", &opponent_name);
    print_kv("Games", &format_number(result.total_games));
    print_kv("Wins", &format!("{} ({})", result.wins, format_rate(result.win_rate)));
    print_kv("Draws", &format!("{} ({})", result.draws, format_rate(result.draw_rate)));
    print_kv("Losses", &format!("{} ({})", result.losses, format_rate(result.loss_rate)));
    print_kv("States", &format_number(states));
    print_kv("Table", &args.table.display().to_string());

    if let Some(path) = &args.summary {
        let summary = TrainingSummaryFile {
            training: &result,
            engine: config.engine.name(),
            opponent: opponent_name,
            seed: config.seed,
            states,
        };
        let file = std::fs::File::create(path)
            .with_context(|| format!("creating summary file {}", path.display()))?;
        serde_json::to_writer_pretty(file, &summary)?;
    }

    worker.shutdown()?;
    Ok(())
}

fn build_opponent(kind: OpponentArg) -> Result<Box<dyn Opponent>> {
    Ok(match kind {
        OpponentArg::Uniform => Box::new(RandomOpponent::new("uniform")),
        OpponentArg::Random => Box::new(RuleBasedOpponent::random_player()),
        OpponentArg::Sophisticated => Box::new(RuleBasedOpponent::sophisticated()),
        OpponentArg::SelfPlay => return Err(anyhow!("self-play has no fixed opponent")),
    })
}
