pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod importer;
pub mod library;
pub mod panel;

pub use app::{Confirmation, LogEntry, LogLevel, QuickSpawn};
pub use cache::CacheService;
pub use config::StoreLocation;
pub use error::{QuickSpawnError, Result};
pub use host::{EntitySnapshot, Host, ObjectKind, PickedFile, SceneObject};
pub use importer::{ImportAction, ImportOutcome, SetupReport};
pub use library::{AppState, Category, Character, ImportMode};
