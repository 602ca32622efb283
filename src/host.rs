use anyhow::Result;
use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PickedFile {
    pub directory: String,
    pub filename: String,
    pub filepath: String,
}

impl PickedFile {
    pub fn new(directory: &str, filename: &str, filepath: &str) -> Self {
        Self {
            directory: directory.to_string(),
            filename: filename.to_string(),
            filepath: filepath.to_string(),
        }
    }

    pub fn basename(&self) -> String {
        Path::new(&self.filepath)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.filename.clone())
    }

    /// Browsing inside a library yields paths like `/lib/hero.blend/Collection/Hero`.
    pub fn source_blend(&self) -> Option<PathBuf> {
        if is_blend(Path::new(&self.filename)) {
            return Some(Path::new(&self.directory).join(&self.filename));
        }
        Path::new(&self.filepath)
            .ancestors()
            .find(|candidate| is_blend(candidate))
            .map(Path::to_path_buf)
    }

    pub fn points_into(&self, current_file: &Path) -> bool {
        if current_file.as_os_str().is_empty() {
            return false;
        }
        self.source_blend()
            .map(|source| source == current_file)
            .unwrap_or(false)
    }
}

fn is_blend(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("blend"))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Armature,
    Mesh,
    Empty,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneObject {
    pub name: String,
    pub kind: ObjectKind,
}

impl SceneObject {
    pub fn new(name: &str, kind: ObjectKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
        }
    }

    /// Armatures named like a template rig do not count as characters.
    pub fn is_character_rig(&self) -> bool {
        self.kind == ObjectKind::Armature && !is_metarig(&self.name)
    }
}

pub fn is_metarig(name: &str) -> bool {
    name.to_lowercase().contains("metarig")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitySnapshot {
    pub collections: BTreeSet<String>,
    pub texts: BTreeSet<String>,
    pub armatures: BTreeSet<String>,
}

impl EntitySnapshot {
    pub fn added_since(&self, before: &EntitySnapshot) -> EntitySnapshot {
        EntitySnapshot {
            collections: self.collections.difference(&before.collections).cloned().collect(),
            texts: self.texts.difference(&before.texts).cloned().collect(),
            armatures: self.armatures.difference(&before.armatures).cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty() && self.texts.is_empty() && self.armatures.is_empty()
    }
}

pub trait Host {
    fn current_file(&self) -> Option<PathBuf>;

    fn append(&mut self, collection: &str, directory: &str) -> Result<()>;
    fn link(&mut self, collection: &str, directory: &str) -> Result<()>;
    fn make_override(&mut self) -> Result<()>;

    fn snapshot(&self) -> EntitySnapshot;
    fn collection_objects(&self, collection: &str) -> Vec<SceneObject>;
    fn collection_children(&self, collection: &str) -> Vec<String>;
    /// Excludes a collection from the view layer. Returns false when it is not found.
    fn exclude_collection(&mut self, collection: &str) -> bool;

    fn text(&self, name: &str) -> Option<String>;
    fn create_text(&mut self, name: &str, body: &str, as_module: bool) -> Result<String>;
    fn replace_text(&mut self, name: &str, body: &str) -> Result<()>;
    fn set_armature_property(&mut self, armature: &str, key: &str, value: &str) -> Result<()>;
    fn run_script(&mut self, text: &str) -> Result<()>;
}
