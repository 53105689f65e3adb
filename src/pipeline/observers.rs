//! Observer implementations for training runs

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::Observer,
    tictactoe::{BoardState, Outcome},
};

/// One agent move as recorded by [`JsonlObserver`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    pub step: usize,
    /// Board after the move
    pub state: String,
    pub cell: usize,
}

/// One finished game as written by [`JsonlObserver`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub game: usize,
    pub outcome: String,
    pub steps: Vec<StepObservation>,
}

/// Progress bar with a running win/draw/loss tally
#[derive(Default)]
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    wins: usize,
    draws: usize,
    losses: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    fn tally(&self) -> String {
        format!("{} D:{} L:{}", self.wins, self.draws, self.losses)
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (W:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(&mut self, game: usize, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::AgentWin => self.wins += 1,
            Outcome::OpponentWin => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(game as u64 + 1);
            pb.set_message(self.tally());
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.tally());
        }
        Ok(())
    }
}

/// Outcome counts and game lengths from the agent's point of view
#[derive(Debug, Default)]
pub struct MetricsObserver {
    wins: usize,
    draws: usize,
    losses: usize,
    agent_moves: Vec<usize>,
}

/// Summary of training metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub wins: usize,
    pub draws: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub avg_agent_moves: f64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_games(&self) -> usize {
        self.wins + self.draws + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        match self.total_games() {
            0 => 0.0,
            n => self.wins as f64 / n as f64,
        }
    }

    /// Mean number of agent moves per game
    pub fn avg_agent_moves(&self) -> f64 {
        if self.agent_moves.is_empty() {
            0.0
        } else {
            self.agent_moves.iter().sum::<usize>() as f64 / self.agent_moves.len() as f64
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.total_games(),
            wins: self.wins,
            draws: self.draws,
            losses: self.losses,
            win_rate: self.win_rate(),
            avg_agent_moves: self.avg_agent_moves(),
        }
    }
}

impl Observer for MetricsObserver {
    fn on_game_start(&mut self, _game: usize) -> Result<()> {
        self.agent_moves.push(0);
        Ok(())
    }

    fn on_agent_move(
        &mut self,
        _game: usize,
        _step: usize,
        _state: &BoardState,
        _cell: usize,
    ) -> Result<()> {
        if let Some(last) = self.agent_moves.last_mut() {
            *last += 1;
        }
        Ok(())
    }

    fn on_game_end(&mut self, _game: usize, outcome: Outcome) -> Result<()> {
        match outcome {
            Outcome::AgentWin => self.wins += 1,
            Outcome::OpponentWin => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::InProgress => {}
        }
        Ok(())
    }
}

/// Writes one JSON object per game
pub struct JsonlObserver {
    writer: BufWriter<File>,
    steps: Vec<StepObservation>,
}

impl JsonlObserver {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            steps: Vec::new(),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_game_start(&mut self, _game: usize) -> Result<()> {
        self.steps.clear();
        Ok(())
    }

    fn on_agent_move(
        &mut self,
        _game: usize,
        step: usize,
        state: &BoardState,
        cell: usize,
    ) -> Result<()> {
        self.steps.push(StepObservation {
            step,
            state: state.encode(),
            cell,
        });
        Ok(())
    }

    fn on_game_end(&mut self, game: usize, outcome: Outcome) -> Result<()> {
        let observation = Observation {
            game,
            outcome: format!("{outcome:?}"),
            steps: std::mem::take(&mut self.steps),
        };
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
