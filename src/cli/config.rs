//! Agent flags shared by CLI commands

use anyhow::{Result, anyhow};
use clap::{Args, ValueEnum};

use crate::{
    app::AgentConfig,
    q_learning::{EngineKind, UpdateRule},
    tictactoe::Player,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineArg {
    #[value(name = "q-learning", alias = "q")]
    QLearning,
    Sarsa,
    #[value(name = "sarsa-lambda", alias = "lambda")]
    SarsaLambda,
}

impl From<EngineArg> for EngineKind {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::QLearning => EngineKind::QLearning,
            EngineArg::Sarsa => EngineKind::Sarsa,
            EngineArg::SarsaLambda => EngineKind::SarsaLambda,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UpdateRuleArg {
    Assign,
    Accumulate,
}

impl From<UpdateRuleArg> for UpdateRule {
    fn from(arg: UpdateRuleArg) -> Self {
        match arg {
            UpdateRuleArg::Assign => UpdateRule::Assign,
            UpdateRuleArg::Accumulate => UpdateRule::Accumulate,
        }
    }
}

pub(crate) fn parse_player_token(value: &str, flag: &str) -> Result<Player> {
    match value.trim().to_ascii_lowercase().as_str() {
        "x" | "first" | "p1" => Ok(Player::X),
        "o" | "second" | "p2" => Ok(Player::O),
        other => Err(anyhow!(
            "Invalid value '{other}' for {flag} (expected 'x' or 'o')"
        )),
    }
}

/// Learning agent configuration flags
#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Learning rule
    #[arg(long, short = 'e', value_enum, default_value = "q-learning")]
    pub engine: EngineArg,

    /// Board side length
    #[arg(long, default_value_t = 3)]
    pub size: usize,

    /// Mark the agent plays (`x` or `o`)
    #[arg(long, default_value = "o")]
    pub mark: String,

    /// Probability of playing the greedy move
    #[arg(long, default_value_t = 0.9)]
    pub epsilon: f64,

    /// Learning rate α
    #[arg(long, default_value_t = 0.1)]
    pub alpha: f64,

    /// Discount γ
    #[arg(long, default_value_t = 0.9)]
    pub gamma: f64,

    /// Trace decay λ (SARSA(λ) only)
    #[arg(long, default_value_t = 0.7)]
    pub lambda: f64,

    /// How Q-learning writes its correction
    #[arg(long, value_enum, default_value = "assign")]
    pub update_rule: UpdateRuleArg,

    #[arg(long, default_value_t = 1.0)]
    pub win_reward: f64,

    /// Reward for leaving the opponent a one-move win
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    pub threat_penalty: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,
}

impl AgentArgs {
    pub fn to_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig::new(self.engine.into())
            .with_board_size(self.size)
            .with_mark(parse_player_token(&self.mark, "--mark")?)
            .with_epsilon(self.epsilon)
            .with_learning_rate(self.alpha)
            .with_discount(self.gamma)
            .with_lambda(self.lambda)
            .with_update_rule(self.update_rule.into())
            .with_rewards(self.win_reward, self.threat_penalty);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        agent: AgentArgs,
    }

    #[test]
    fn test_defaults_match_agent_config() {
        let harness = Harness::parse_from(["test"]);
        assert_eq!(harness.agent.to_config().unwrap(), AgentConfig::default());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let harness = Harness::parse_from([
            "test",
            "--engine",
            "sarsa-lambda",
            "--mark",
            "x",
            "--threat-penalty",
            "-0.3",
            "--seed",
            "7",
        ]);
        let config = harness.agent.to_config().unwrap();
        assert_eq!(config.engine, EngineKind::SarsaLambda);
        assert_eq!(config.mark, Player::X);
        assert_eq!(config.params.threat_penalty, -0.3);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        let harness = Harness::parse_from(["test", "--epsilon", "1.5"]);
        assert!(harness.agent.to_config().is_err());
        assert!(parse_player_token("z", "--mark").is_err());
    }
}
