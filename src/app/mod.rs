//! Application layer with dependency injection container.
//!
//! ```text
//! App ──owns──▶ TableRepository (MsgPackRepository, InMemoryRepository)
//!  │
//!  └─creates──▶ EpisodeController ──▶ SharedQTable + Engine
//! ```
//!
//! # Usage
//!
//! ```
//! use tictactoe_rl::app::{App, AgentConfig};
//! use tictactoe_rl::adapters::InMemoryRepository;
//!
//! let app = App::for_testing()
//!     .with_repository(InMemoryRepository::new())
//!     .with_default_seed(42)
//!     .build();
//! let agent = app.create_agent(AgentConfig::default())?;
//! # Ok::<(), tictactoe_rl::Error>(())
//! ```

pub mod config;
pub mod container;

pub use config::AgentConfig;
pub use container::{App, AppBuilder};
