//! Dependency injection container.
//!
//! The container owns the persistence adapter and wires agents to it.

use std::{path::Path, sync::Arc};

use log::warn;

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::{MsgPackRepository, PersistenceWorker},
    episode::EpisodeController,
    ports::TableRepository,
    q_learning::{QTable, SharedQTable},
};

/// Application with dependency injection.
///
/// # Examples
///
/// ```
/// use tictactoe_rl::app::{App, AgentConfig};
/// use tictactoe_rl::q_learning::EngineKind;
///
/// let app = App::new();
/// let config = AgentConfig::new(EngineKind::Sarsa).with_seed(42);
/// let agent = app.create_agent(config)?;
/// assert_eq!(agent.engine().kind(), EngineKind::Sarsa);
/// # Ok::<(), tictactoe_rl::Error>(())
/// ```
pub struct App {
    repository: Arc<dyn TableRepository + Send + Sync>,
    /// Seed for agents whose config has none (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create an app backed by [`MsgPackRepository`] with no default seed.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(MsgPackRepository::new()),
            default_seed: None,
        }
    }

    /// Builder for an app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn repository(&self) -> Arc<dyn TableRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    fn seeded(&self, mut config: AgentConfig) -> AgentConfig {
        if config.seed.is_none() {
            config.seed = self.default_seed;
        }
        config
    }

    /// Create an agent with a fresh table.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn create_agent(&self, config: AgentConfig) -> Result<EpisodeController> {
        EpisodeController::new(self.seeded(config))
    }

    /// Create an agent learning into an existing table.
    pub fn create_agent_with_table(
        &self,
        config: AgentConfig,
        table: SharedQTable,
    ) -> Result<EpisodeController> {
        EpisodeController::with_table(self.seeded(config), table)
    }

    /// Create an agent whose table is restored from `path`.
    ///
    /// A missing file yields a fresh table. A file that fails to load is
    /// logged and also yields a fresh table.
    pub fn load_agent(&self, config: AgentConfig, path: &Path) -> Result<EpisodeController> {
        let mut agent = self.create_agent(config)?;
        self.load_into(agent.table(), path)?;
        agent.reset_episode();
        Ok(agent)
    }

    /// Read the table stored at `path`.
    pub fn load_table(&self, path: &Path) -> Result<Option<QTable>> {
        self.repository.load(path)
    }

    /// Replace the contents of `table` with the one stored at `path`.
    ///
    /// Returns whether a table was loaded. Decoding failures are logged and
    /// leave `table` unchanged; only a poisoned lock is an error.
    pub fn load_into(&self, table: &SharedQTable, path: &Path) -> Result<bool> {
        let loaded = match self.repository.load(path) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => return Ok(false),
            Err(e) => {
                warn!("keeping current table, load from {} failed: {e}", path.display());
                return Ok(false);
            }
        };

        let expected = table.with(|t| t.board_size())?;
        if loaded.board_size() != expected {
            warn!(
                "keeping current table, {} holds a {}x{} table",
                path.display(),
                loaded.board_size(),
                loaded.board_size()
            );
            return Ok(false);
        }
        table.replace(loaded)?;
        Ok(true)
    }

    /// Snapshot `table` and write it to `path`.
    pub fn save_table(&self, table: &SharedQTable, path: &Path) -> Result<()> {
        let snapshot = table.snapshot()?;
        self.repository.save(&snapshot, path)
    }

    /// Start a background persistence thread sharing this app's repository.
    pub fn persistence_worker(&self) -> Result<PersistenceWorker> {
        PersistenceWorker::spawn(self.repository())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use tictactoe_rl::app::AppBuilder;
/// use tictactoe_rl::adapters::InMemoryRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
#[derive(Default)]
pub struct AppBuilder {
    repository: Option<Arc<dyn TableRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository<R: TableRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.repository = Some(Arc::new(repo));
        self
    }

    /// Seed used by agents whose config carries none.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app; falls back to [`MsgPackRepository`].
    pub fn build(self) -> App {
        App {
            repository: self
                .repository
                .unwrap_or_else(|| Arc::new(MsgPackRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryRepository,
        q_learning::EngineKind,
        tictactoe::{Action, BoardState, Player},
    };

    fn test_app(repo: &InMemoryRepository) -> App {
        App::for_testing()
            .with_repository(repo.clone())
            .with_default_seed(42)
            .build()
    }

    #[test]
    fn test_app_creates_agent() {
        let app = App::new();
        let agent = app.create_agent(AgentConfig::new(EngineKind::SarsaLambda));
        assert!(agent.is_ok());
    }

    #[test]
    fn test_app_applies_default_seed() {
        let app = App::for_testing().with_default_seed(42).build();
        let agent = app.create_agent(AgentConfig::default()).unwrap();
        assert_eq!(agent.config().seed, Some(42));
    }

    #[test]
    fn test_config_seed_overrides_app_default() {
        let app = App::for_testing().with_default_seed(42).build();
        let agent = app
            .create_agent(AgentConfig::default().with_seed(123))
            .unwrap();
        assert_eq!(agent.config().seed, Some(123));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let app = App::new();
        assert!(
            app.create_agent(AgentConfig::default().with_epsilon(3.0))
                .is_err()
        );
    }

    #[test]
    fn test_save_and_load_agent() {
        let repo = InMemoryRepository::new();
        let app = test_app(&repo);
        let path = Path::new("agent");

        let mut agent = app.create_agent(AgentConfig::default()).unwrap();
        agent
            .apply_opponent_move(Action::new(4, Player::X))
            .unwrap();
        app.save_table(agent.table(), path).unwrap();

        let restored = app.load_agent(AgentConfig::default(), path).unwrap();
        assert_eq!(
            restored.table().snapshot().unwrap(),
            agent.table().snapshot().unwrap()
        );
        assert!(restored.state().is_empty());
    }

    #[test]
    fn test_load_missing_keeps_fresh_table() {
        let repo = InMemoryRepository::new();
        let app = test_app(&repo);
        let agent = app
            .load_agent(AgentConfig::default(), Path::new("missing"))
            .unwrap();
        assert!(agent.table().snapshot().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_load_keeps_current_table() {
        let repo = InMemoryRepository::new();
        repo.insert_raw(Path::new("bad"), vec![0xff; 3]);
        let app = test_app(&repo);

        let table = SharedQTable::default();
        table
            .with(|t| t.get_or_create(&BoardState::default())[0] = 0.5)
            .unwrap();
        let before = table.snapshot().unwrap();

        assert!(!app.load_into(&table, Path::new("bad")).unwrap());
        assert_eq!(table.snapshot().unwrap(), before);
    }
}
