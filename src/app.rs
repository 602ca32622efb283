use crate::{
    cache::CacheService,
    config::StoreLocation,
    error::{QuickSpawnError, Result},
    host::{Host, PickedFile},
    importer::{self, ImportOutcome},
    library::{AppState, Category, Character, ImportMode},
};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::{debug, error, info, warn};

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    RemoveCategory { index: usize, name: String },
    RemoveCharacter { index: usize, collection: String, category: String },
    ClearEverything,
}

impl Confirmation {
    pub fn title(&self) -> &'static str {
        match self {
            Confirmation::RemoveCategory { .. } => "Remove Category",
            Confirmation::RemoveCharacter { .. } => "Remove Collection",
            Confirmation::ClearEverything => "Clear Everything",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Confirmation::RemoveCategory { name, .. } => {
                format!("Remove category '{name}' and all its collections?")
            }
            Confirmation::RemoveCharacter {
                collection,
                category,
                ..
            } => format!("Remove '{collection}' from '{category}'?"),
            Confirmation::ClearEverything => "Remove all categories and collections?".to_string(),
        }
    }
}

pub struct QuickSpawn {
    state: AppState,
    cache: CacheService,
    pending: Option<Confirmation>,
    redraw: bool,
    logs: Vec<LogEntry>,
    log_path: Option<PathBuf>,
}

impl QuickSpawn {
    pub fn initialize() -> anyhow::Result<Self> {
        let location = StoreLocation::resolve()?;
        Self::open(&location)
    }

    pub fn open(location: &StoreLocation) -> anyhow::Result<Self> {
        let cache = CacheService::at(location);
        if cache.ensure_initialized()? {
            info!(path = %cache.path().display(), "created quickspawn store");
        }
        let mut session = Self::with_cache(cache);
        session.log_path = Some(location.log_path());
        session.load_replay();
        Ok(session)
    }

    pub fn with_cache(cache: CacheService) -> Self {
        Self {
            state: AppState::new(),
            cache,
            pending: None,
            redraw: false,
            logs: Vec::new(),
            log_path: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn cache(&self) -> &CacheService {
        &self.cache
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn pending(&self) -> Option<&Confirmation> {
        self.pending.as_ref()
    }

    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn load_replay(&mut self) {
        self.state.clear();
        self.state.categories.extend(self.cache.get_categories());
        self.state.characters.extend(self.cache.get_characters());
        self.state.import_mode = self.cache.get_import_mode();
        self.pending = None;
        self.redraw = true;
        debug!(
            categories = self.state.categories.len(),
            characters = self.state.characters.len(),
            "replayed quickspawn store"
        );
    }

    pub fn add_category(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(QuickSpawnError::EmptyCategoryName));
        }
        if self.state.has_category(name) {
            return Err(self.fail(QuickSpawnError::DuplicateCategory {
                name: name.to_string(),
            }));
        }

        self.state.categories.push(Category::new(name));
        self.redraw = true;
        self.persist_categories()?;
        self.log_info(format!("Added category: {name}"));
        Ok(())
    }

    pub fn request_remove_category(&mut self, index: usize) -> Result<()> {
        let Some(category) = self.state.categories.get(index) else {
            return Err(self.fail(QuickSpawnError::CategoryIndex(index)));
        };
        self.pending = Some(Confirmation::RemoveCategory {
            index,
            name: category.name.clone(),
        });
        Ok(())
    }

    pub fn remove_category(&mut self, index: usize) -> Result<()> {
        let Some((removed, dropped)) = self.state.remove_category_cascade(index) else {
            return Err(self.fail(QuickSpawnError::CategoryIndex(index)));
        };
        self.redraw = true;
        self.persist_categories()?;
        self.persist_characters()?;
        debug!(category = %removed.name, dropped = dropped.len(), "cascaded category removal");
        self.log_info(format!(
            "Removed category '{}' and its associated collections.",
            removed.name
        ));
        Ok(())
    }

    pub fn add_character(
        &mut self,
        picked: &PickedFile,
        category: &str,
        current_file: Option<&Path>,
    ) -> Result<()> {
        if current_file
            .map(|current| picked.points_into(current))
            .unwrap_or(false)
        {
            return Err(self.fail(QuickSpawnError::SelfReference));
        }
        if self.state.has_character(&picked.filename, category) {
            return Err(self.fail(QuickSpawnError::DuplicateCharacter {
                collection: picked.filename.clone(),
                category: category.to_string(),
            }));
        }

        self.state.characters.push(Character {
            name: picked.basename(),
            filepath: picked.directory.clone(),
            collection: picked.filename.clone(),
            category: category.to_string(),
        });
        self.redraw = true;
        self.persist_characters()?;
        self.log_info(format!("Added {} to {category}", picked.filename));
        Ok(())
    }

    pub fn add_picked(&mut self, picked: &PickedFile, category: &str, host: &dyn Host) -> Result<()> {
        let current = host.current_file();
        self.add_character(picked, category, current.as_deref())
    }

    pub fn request_remove_character(&mut self, index: usize) -> Result<()> {
        let Some(character) = self.state.characters.get(index) else {
            return Err(self.fail(QuickSpawnError::CharacterIndex(index)));
        };
        self.pending = Some(Confirmation::RemoveCharacter {
            index,
            collection: character.collection.clone(),
            category: character.category.clone(),
        });
        Ok(())
    }

    pub fn remove_character(&mut self, index: usize) -> Result<()> {
        if index >= self.state.characters.len() {
            return Err(self.fail(QuickSpawnError::CharacterIndex(index)));
        }
        let removed = self.state.characters.remove(index);
        self.redraw = true;
        self.persist_characters()?;
        self.log_info(format!("Removed collection: {}", removed.collection));
        Ok(())
    }

    pub fn toggle_expand(&mut self, index: usize) -> Result<bool> {
        let Some(category) = self.state.categories.get_mut(index) else {
            return Err(self.fail(QuickSpawnError::CategoryIndex(index)));
        };
        category.is_expanded = !category.is_expanded;
        let expanded = category.is_expanded;
        self.redraw = true;
        self.persist_categories()?;
        Ok(expanded)
    }

    pub fn set_generate_override(&mut self, index: usize, enabled: bool) -> Result<()> {
        let Some(category) = self.state.categories.get_mut(index) else {
            return Err(self.fail(QuickSpawnError::CategoryIndex(index)));
        };
        category.generate_override = enabled;
        self.redraw = true;
        self.persist_categories()
    }

    pub fn set_import_mode(&mut self, mode: ImportMode) -> Result<()> {
        self.state.import_mode = mode;
        self.redraw = true;
        if let Err(err) = self.cache.save_import_mode(mode) {
            return Err(self.persistence_failed(err));
        }
        debug!(mode = %mode, "import mode changed");
        Ok(())
    }

    pub fn request_clear_everything(&mut self) {
        self.pending = Some(Confirmation::ClearEverything);
    }

    pub fn clear_everything(&mut self) -> Result<()> {
        self.state.clear();
        self.redraw = true;
        if let Err(err) = self.cache.clear_lists() {
            return Err(self.persistence_failed(err));
        }
        self.log_info("All categories and collections have been cleared.".to_string());
        Ok(())
    }

    pub fn confirm(&mut self) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Err(QuickSpawnError::NoPendingConfirmation);
        };
        match pending {
            Confirmation::RemoveCategory { index, name } => {
                let index = self.resolve_category(index, &name)?;
                self.remove_category(index)
            }
            Confirmation::RemoveCharacter {
                index,
                collection,
                category,
            } => {
                let index = self.resolve_character(index, &collection, &category)?;
                self.remove_character(index)
            }
            Confirmation::ClearEverything => self.clear_everything(),
        }
    }

    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn import_character(&mut self, index: usize, host: &mut dyn Host) -> Result<ImportOutcome> {
        let Some(character) = self.state.characters.get(index).cloned() else {
            return Err(self.fail(QuickSpawnError::CharacterIndex(index)));
        };
        let category = self.state.category_for(&character).cloned();
        match importer::import_character(
            host,
            &character,
            category.as_ref(),
            self.state.import_mode,
        ) {
            Ok(outcome) => {
                self.log_info(outcome.message());
                if outcome.setup.is_some() {
                    self.log_info("Setup successful".to_string());
                }
                Ok(outcome)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    pub fn log_info(&mut self, message: String) {
        self.push_log(LogLevel::Info, message);
    }

    pub fn log_warn(&mut self, message: String) {
        self.push_log(LogLevel::Warn, message);
    }

    pub fn log_error(&mut self, message: String) {
        self.push_log(LogLevel::Error, message);
    }

    fn resolve_category(&self, index: usize, name: &str) -> Result<usize> {
        if self
            .state
            .categories
            .get(index)
            .map(|category| category.name == name)
            .unwrap_or(false)
        {
            return Ok(index);
        }
        self.state
            .categories
            .iter()
            .position(|category| category.name == name)
            .ok_or(QuickSpawnError::CategoryIndex(index))
    }

    fn resolve_character(&self, index: usize, collection: &str, category: &str) -> Result<usize> {
        let matches =
            |character: &Character| character.collection == collection && character.category == category;
        if self.state.characters.get(index).map(matches).unwrap_or(false) {
            return Ok(index);
        }
        self.state
            .characters
            .iter()
            .position(matches)
            .ok_or(QuickSpawnError::CharacterIndex(index))
    }

    fn persist_categories(&mut self) -> Result<()> {
        if let Err(err) = self.cache.save_categories(&self.state.categories) {
            return Err(self.persistence_failed(err));
        }
        Ok(())
    }

    fn persist_characters(&mut self) -> Result<()> {
        if let Err(err) = self.cache.save_characters(&self.state.characters) {
            return Err(self.persistence_failed(err));
        }
        Ok(())
    }

    fn persistence_failed(&mut self, err: anyhow::Error) -> QuickSpawnError {
        self.log_error(format!("Could not save QuickSpawn data: {err:#}"));
        QuickSpawnError::Persistence(err)
    }

    fn fail(&mut self, err: QuickSpawnError) -> QuickSpawnError {
        self.log_error(err.to_string());
        err
    }

    fn push_log(&mut self, level: LogLevel, message: String) {
        match level {
            LogLevel::Info => info!("{message}"),
            LogLevel::Warn => warn!("{message}"),
            LogLevel::Error => error!("{message}"),
        }

        if let Some(path) = &self.log_path {
            let _ = append_log_file(path, level, &message);
        }

        self.logs.push(LogEntry { level, message });
        if self.logs.len() > LOG_CAPACITY {
            let overflow = self.logs.len() - LOG_CAPACITY;
            self.logs.drain(0..overflow);
        }
    }
}

fn log_level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error => "ERROR",
    }
}

fn append_log_file(path: &Path, level: LogLevel, message: &str) -> std::io::Result<()> {
    let label = log_level_label(level);
    let stamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_default();
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "[{stamp}] [{label}] {message}")
}
