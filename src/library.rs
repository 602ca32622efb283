use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default = "default_true")]
    pub is_expanded: bool,
    /// Records written before this toggle existed lack the field.
    #[serde(default = "default_true")]
    pub generate_override: bool,
}

impl Category {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_expanded: true,
            generate_override: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    #[serde(default)]
    pub name: String,
    pub filepath: String,
    pub collection: String,
    /// Name of the owning category. May dangle.
    pub category: String,
}

impl Character {
    pub fn belongs_to(&self, category: &str) -> bool {
        self.category == category
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportMode {
    #[default]
    Append,
    Link,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ImportMode::Append => "APPEND",
            ImportMode::Link => "LINK",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPEND" => Some(ImportMode::Append),
            "LINK" => Some(ImportMode::Link),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImportMode::Append => "Append",
            ImportMode::Link => "Link",
        }
    }
}

impl fmt::Display for ImportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub categories: Vec<Category>,
    pub characters: Vec<Character>,
    pub import_mode: ImportMode,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_category(&self, name: &str) -> bool {
        let wanted = name.to_lowercase();
        self.categories
            .iter()
            .any(|category| category.name.to_lowercase() == wanted)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.name == name)
    }

    pub fn category_for(&self, character: &Character) -> Option<&Category> {
        self.category(&character.category)
    }

    /// Collection names compare case-insensitively, category names exactly.
    pub fn has_character(&self, collection: &str, category: &str) -> bool {
        let wanted = collection.to_lowercase();
        self.characters.iter().any(|character| {
            character.belongs_to(category) && character.collection.to_lowercase() == wanted
        })
    }

    pub fn characters_in(&self, category: &str) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .characters
            .iter()
            .enumerate()
            .filter(|(_, character)| character.belongs_to(category))
            .map(|(index, _)| index)
            .collect();
        indices.sort_by_key(|index| self.characters[*index].collection.to_lowercase());
        indices
    }

    pub fn dangling_characters(&self) -> Vec<&Character> {
        self.characters
            .iter()
            .filter(|character| self.category_for(character).is_none())
            .collect()
    }

    pub fn remove_category_cascade(&mut self, index: usize) -> Option<(Category, Vec<Character>)> {
        if index >= self.categories.len() {
            return None;
        }
        let removed = self.categories.remove(index);
        let name = removed.name.clone();
        let mut dropped = Vec::new();
        let mut kept = Vec::with_capacity(self.characters.len());
        for character in self.characters.drain(..) {
            if character.belongs_to(&name) {
                dropped.push(character);
            } else {
                kept.push(character);
            }
        }
        self.characters = kept;
        Some((removed, dropped))
    }

    pub fn clear(&mut self) {
        self.categories.clear();
        self.characters.clear();
    }
}

fn default_true() -> bool {
    true
}
