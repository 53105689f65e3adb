//! Ports (trait boundaries) for external dependencies.
//!
//! The domain owns these traits; adapters and the training pipeline
//! implement them.

pub mod observer;
pub mod opponent;
pub mod repository;

pub use observer::Observer;
pub use opponent::Opponent;
pub use repository::TableRepository;
