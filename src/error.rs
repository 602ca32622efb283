use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuickSpawnError {
    #[error("Category name cannot be empty.")]
    EmptyCategoryName,

    #[error("Category '{name}' already exists.")]
    DuplicateCategory { name: String },

    #[error("Collection '{collection}' already exists in category '{category}'.")]
    DuplicateCharacter { collection: String, category: String },

    #[error("Cannot add the currently open file as a library. It has to be done outside of the file.")]
    SelfReference,

    #[error("No category at index {0}")]
    CategoryIndex(usize),

    #[error("No collection at index {0}")]
    CharacterIndex(usize),

    #[error("Nothing is waiting for confirmation")]
    NoPendingConfirmation,

    #[error("{0}")]
    Import(String),

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl QuickSpawnError {
    /// Validation failures are raised before anything is mutated or written.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            QuickSpawnError::Import(_) | QuickSpawnError::Persistence(_)
        )
    }
}

pub type Result<T, E = QuickSpawnError> = std::result::Result<T, E>;
