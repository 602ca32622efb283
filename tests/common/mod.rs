#![allow(dead_code)]

use anyhow::{bail, Result};
use quickspawn::{EntitySnapshot, Host, ObjectKind, SceneObject};
use std::{
    collections::{BTreeMap, BTreeSet},
    path::PathBuf,
};

/// What importing one library collection brings into the file.
#[derive(Debug, Clone, Default)]
pub struct LibraryAsset {
    pub objects: Vec<(String, ObjectKind)>,
    pub children: Vec<String>,
    pub armature: Option<String>,
    pub texts: Vec<(String, String)>,
}

#[derive(Debug, Clone, Default)]
pub struct FakeCollection {
    pub objects: Vec<SceneObject>,
    pub children: Vec<String>,
}

/// In-memory stand-in for the host editor that records every call.
#[derive(Debug, Default)]
pub struct FakeHost {
    pub current: Option<PathBuf>,
    pub library: BTreeMap<String, LibraryAsset>,
    pub collections: BTreeMap<String, FakeCollection>,
    pub texts: BTreeMap<String, String>,
    pub modules: BTreeSet<String>,
    pub armatures: BTreeMap<String, BTreeMap<String, String>>,
    pub excluded: Vec<String>,
    pub ran: Vec<String>,
    pub calls: Vec<String>,
    pub fail_append: bool,
    pub fail_link: bool,
    pub fail_override: bool,
    pub fail_run: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, collection: &str, asset: LibraryAsset) -> Self {
        self.library.insert(collection.to_string(), asset);
        self
    }

    fn instantiate(&mut self, collection: &str) -> Result<()> {
        let Some(asset) = self.library.get(collection).cloned() else {
            bail!("collection '{collection}' not found in library");
        };

        let armature = asset
            .armature
            .as_ref()
            .map(|name| unique_name(name, |candidate| self.armatures.contains_key(candidate)));
        if let Some(armature) = &armature {
            self.armatures.insert(armature.clone(), BTreeMap::new());
        }

        let objects = asset
            .objects
            .iter()
            .map(|(name, kind)| {
                let name = match (kind, &armature) {
                    (ObjectKind::Armature, Some(armature)) => armature.clone(),
                    _ => name.clone(),
                };
                SceneObject::new(&name, *kind)
            })
            .collect();

        let mut children = Vec::new();
        for child in &asset.children {
            let name = unique_name(child, |candidate| self.collections.contains_key(candidate));
            self.collections.insert(name.clone(), FakeCollection::default());
            children.push(name);
        }

        let name = unique_name(collection, |candidate| self.collections.contains_key(candidate));
        self.collections
            .insert(name, FakeCollection { objects, children });

        // Linked libraries share their text blocks between instances.
        for (text, body) in &asset.texts {
            self.texts.entry(text.clone()).or_insert_with(|| body.clone());
        }
        Ok(())
    }
}

fn unique_name(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}.{n:03}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl Host for FakeHost {
    fn current_file(&self) -> Option<PathBuf> {
        self.current.clone()
    }

    fn append(&mut self, collection: &str, directory: &str) -> Result<()> {
        self.calls.push(format!("append {collection} from {directory}"));
        if self.fail_append {
            bail!("append refused");
        }
        self.instantiate(collection)
    }

    fn link(&mut self, collection: &str, directory: &str) -> Result<()> {
        self.calls.push(format!("link {collection} from {directory}"));
        if self.fail_link {
            bail!("link refused");
        }
        self.instantiate(collection)
    }

    fn make_override(&mut self) -> Result<()> {
        self.calls.push("make_override".to_string());
        if self.fail_override {
            bail!("not overridable");
        }
        Ok(())
    }

    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            collections: self.collections.keys().cloned().collect(),
            texts: self.texts.keys().cloned().collect(),
            armatures: self.armatures.keys().cloned().collect(),
        }
    }

    fn collection_objects(&self, collection: &str) -> Vec<SceneObject> {
        self.collections
            .get(collection)
            .map(|entry| entry.objects.clone())
            .unwrap_or_default()
    }

    fn collection_children(&self, collection: &str) -> Vec<String> {
        self.collections
            .get(collection)
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn exclude_collection(&mut self, collection: &str) -> bool {
        if !self.collections.contains_key(collection) {
            return false;
        }
        self.excluded.push(collection.to_string());
        true
    }

    fn text(&self, name: &str) -> Option<String> {
        self.texts.get(name).cloned()
    }

    fn create_text(&mut self, name: &str, body: &str, as_module: bool) -> Result<String> {
        let name = unique_name(name, |candidate| self.texts.contains_key(candidate));
        self.texts.insert(name.clone(), body.to_string());
        if as_module {
            self.modules.insert(name.clone());
        }
        Ok(name)
    }

    fn replace_text(&mut self, name: &str, body: &str) -> Result<()> {
        let Some(text) = self.texts.get_mut(name) else {
            bail!("no text named {name}");
        };
        *text = body.to_string();
        Ok(())
    }

    fn set_armature_property(&mut self, armature: &str, key: &str, value: &str) -> Result<()> {
        let Some(props) = self.armatures.get_mut(armature) else {
            bail!("no armature named {armature}");
        };
        props.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn run_script(&mut self, text: &str) -> Result<()> {
        if self.fail_run {
            bail!("script raised");
        }
        self.ran.push(text.to_string());
        Ok(())
    }
}

pub const RIG_SCRIPT: &str = "rig_id = \"orig0001\"\nrig_name = \"RIG-Hero\"\n";

/// A rigged character collection with a widget sub-collection and a UI script.
pub fn rigged_hero() -> LibraryAsset {
    LibraryAsset {
        objects: vec![
            ("RIG-Hero".to_string(), ObjectKind::Armature),
            ("Hero_body".to_string(), ObjectKind::Mesh),
        ],
        children: vec!["WGTS_Hero".to_string(), "Hero_geo".to_string()],
        armature: Some("RIG-Hero".to_string()),
        texts: vec![("RIG-Hero_ui.py".to_string(), RIG_SCRIPT.to_string())],
    }
}

pub fn plain_props() -> LibraryAsset {
    LibraryAsset {
        objects: vec![("Crate".to_string(), ObjectKind::Mesh)],
        ..LibraryAsset::default()
    }
}
