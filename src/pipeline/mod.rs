//! Training pipeline abstractions
//!
//! - Training an agent against rule-based or random opponents
//! - Self-play between two agents
//! - Observers recording progress and outcomes

pub mod observers;
pub mod opponents;
pub mod training;

pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver,
    StepObservation,
};
pub use opponents::{RandomOpponent, RuleBasedOpponent};
pub use training::{Opener, TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Observer, Opponent};
