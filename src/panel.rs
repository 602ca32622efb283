use crate::library::{AppState, ImportMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelRow {
    ImportMode(ImportMode),
    AddCategory,
    CategoryHeader {
        index: usize,
        name: String,
        expanded: bool,
    },
    AddCollection {
        category: String,
    },
    /// `index` points into the character list, not into the sorted view.
    Character {
        index: usize,
        label: String,
    },
    ClearEverything,
}

impl PanelRow {
    pub fn text(&self) -> String {
        match self {
            PanelRow::ImportMode(mode) => format!("Import Mode: {}", mode.label()),
            PanelRow::AddCategory => "Add Category".to_string(),
            PanelRow::CategoryHeader { name, .. } => name.clone(),
            PanelRow::AddCollection { .. } => "Add Collection".to_string(),
            PanelRow::Character { label, .. } => label.clone(),
            PanelRow::ClearEverything => "Clear Everything".to_string(),
        }
    }

    pub fn expand_icon(expanded: bool) -> &'static str {
        if expanded {
            "TRIA_DOWN"
        } else {
            "TRIA_RIGHT"
        }
    }
}

pub fn build(state: &AppState) -> Vec<PanelRow> {
    let mut rows = vec![PanelRow::ImportMode(state.import_mode), PanelRow::AddCategory];

    for (index, category) in state.categories.iter().enumerate() {
        rows.push(PanelRow::CategoryHeader {
            index,
            name: category.name.clone(),
            expanded: category.is_expanded,
        });
        if !category.is_expanded {
            continue;
        }
        rows.push(PanelRow::AddCollection {
            category: category.name.clone(),
        });
        for character_index in state.characters_in(&category.name) {
            rows.push(PanelRow::Character {
                index: character_index,
                label: state.characters[character_index].collection.clone(),
            });
        }
    }

    rows.push(PanelRow::ClearEverything);
    rows
}
