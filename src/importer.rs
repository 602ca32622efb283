use crate::{
    error::{QuickSpawnError, Result},
    host::{is_metarig, EntitySnapshot, Host, SceneObject},
    library::{Category, Character, ImportMode},
};
use anyhow::Context;
use tracing::{debug, warn};

const UI_SCRIPT_SUFFIX: &str = "_ui.py";
const RIG_ID_MARKER: &str = "rig_id = \"";
const RIG_ID_PROPERTY: &str = "rig_id";
const RIG_ID_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportAction {
    Appended,
    Linked,
    LinkedAndOverridden,
}

impl ImportAction {
    pub fn label(self) -> &'static str {
        match self {
            ImportAction::Appended => "Appended",
            ImportAction::Linked => "Linked",
            ImportAction::LinkedAndOverridden => "Linked and overridden",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub action: ImportAction,
    pub name: String,
    pub rig: Option<SceneObject>,
    pub setup: Option<SetupReport>,
}

impl ImportOutcome {
    pub fn is_character(&self) -> bool {
        self.rig.is_some()
    }

    pub fn message(&self) -> String {
        let kind = if self.is_character() {
            "character"
        } else {
            "collection"
        };
        format!("{} {kind}: {}", self.action.label(), self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub excluded: Vec<String>,
    pub armature: Option<String>,
    pub script: Option<String>,
    pub rig_id: Option<String>,
    pub ran_script: bool,
    pub failures: Vec<String>,
}

pub fn import_character(
    host: &mut dyn Host,
    character: &Character,
    category: Option<&Category>,
    mode: ImportMode,
) -> Result<ImportOutcome> {
    let before = host.snapshot();

    let action = match mode {
        ImportMode::Append => {
            host.append(&character.collection, &character.filepath)
                .map_err(|err| {
                    QuickSpawnError::Import(format!("Could not append collection: {err:#}"))
                })?;
            ImportAction::Appended
        }
        ImportMode::Link => {
            host.link(&character.collection, &character.filepath)
                .map_err(|err| {
                    QuickSpawnError::Import(format!(
                        "Error linking collection. It may contain datablocks that are not overridable and thus duplicate. Output: {err:#}"
                    ))
                })?;
            if category.map(|category| category.generate_override).unwrap_or(false) {
                host.make_override().map_err(|err| {
                    QuickSpawnError::Import(format!("Error making override: {err:#}"))
                })?;
                ImportAction::LinkedAndOverridden
            } else {
                ImportAction::Linked
            }
        }
    };

    let added = host.snapshot().added_since(&before);
    let rig = find_rig(host, &added);
    let setup = rig
        .as_ref()
        .map(|(collection, _)| setup_character(host, collection, &added, action));

    Ok(ImportOutcome {
        action,
        name: character.name.clone(),
        rig: rig.map(|(_, object)| object),
        setup,
    })
}

fn find_rig(host: &dyn Host, added: &EntitySnapshot) -> Option<(String, SceneObject)> {
    for collection in &added.collections {
        if let Some(object) = host
            .collection_objects(collection)
            .into_iter()
            .find(SceneObject::is_character_rig)
        {
            debug!(rig = %object.name, collection = %collection, "imported collection is a character");
            return Some((collection.clone(), object));
        }
    }
    None
}

fn setup_character(
    host: &mut dyn Host,
    collection: &str,
    added: &EntitySnapshot,
    action: ImportAction,
) -> SetupReport {
    let mut report = SetupReport::default();

    for child in host.collection_children(collection) {
        if !child.to_lowercase().contains("wgt") {
            continue;
        }
        if host.exclude_collection(&child) {
            report.excluded.push(child);
        } else {
            note_failure(&mut report, format!("widget collection not in view layer: {child}"));
        }
    }

    let Some(armature) = added.armatures.iter().find(|name| !is_metarig(name)).cloned() else {
        return report;
    };
    report.armature = Some(armature.clone());

    report.script = match pick_ui_script(host, &armature, added, action) {
        Ok(script) => script,
        Err(err) => {
            note_failure(&mut report, format!("rig script copy failed: {err:#}"));
            None
        }
    };

    if let Some(script) = report.script.clone() {
        let rig_id = rig_id_for(&armature);
        match bind_rig_script(host, &armature, &script, &rig_id) {
            Ok(()) => {
                report.rig_id = Some(rig_id);
                report.ran_script = true;
            }
            Err(err) => note_failure(&mut report, format!("rig script setup failed: {err:#}")),
        }
    }

    report
}

fn pick_ui_script(
    host: &mut dyn Host,
    armature: &str,
    added: &EntitySnapshot,
    action: ImportAction,
) -> anyhow::Result<Option<String>> {
    let instance_script = format!("{armature}{UI_SCRIPT_SUFFIX}");

    if let Some(text) = added.texts.iter().find(|name| name.contains(UI_SCRIPT_SUFFIX)) {
        return match action {
            ImportAction::Appended => Ok(Some(text.clone())),
            ImportAction::LinkedAndOverridden => {
                let body = host.text(text).context("read linked rig script")?;
                let name = host.create_text(&instance_script, &body, true)?;
                Ok(Some(name))
            }
            ImportAction::Linked => Ok(None),
        };
    }

    // A second instance of an already linked rig brings no new text blocks.
    if added.texts.is_empty() && action == ImportAction::LinkedAndOverridden {
        let original = format!("{}{UI_SCRIPT_SUFFIX}", base_name(armature));
        let Some(body) = host.text(&original) else {
            return Ok(None);
        };
        let name = host.create_text(&instance_script, &body, true)?;
        return Ok(Some(name));
    }

    Ok(None)
}

fn bind_rig_script(
    host: &mut dyn Host,
    armature: &str,
    script: &str,
    rig_id: &str,
) -> anyhow::Result<()> {
    host.set_armature_property(armature, RIG_ID_PROPERTY, rig_id)?;
    let body = host.text(script).context("rig script disappeared")?;
    let rebound = rebind_script(&body, armature, rig_id).context("rig script has no rig_id")?;
    host.replace_text(script, &rebound)?;
    host.run_script(script)?;
    Ok(())
}

/// Points a rig UI script at one armature instance and gives it its own id.
pub fn rebind_script(body: &str, armature: &str, rig_id: &str) -> Option<String> {
    let base = base_name(armature);
    let text = if base == armature {
        body.to_string()
    } else {
        body.replace(base, armature)
    };
    let start = text.find(RIG_ID_MARKER)? + RIG_ID_MARKER.len();
    let len = text[start..].find('"')?;
    let previous = &text[start..start + len];
    if previous.is_empty() {
        let mut rebound = text.clone();
        rebound.insert_str(start, rig_id);
        return Some(rebound);
    }
    Some(text.replace(previous, rig_id))
}

pub fn rig_id_for(armature: &str) -> String {
    let key = armature.to_lowercase().replace(' ', "");
    let hex = blake3::hash(key.as_bytes()).to_hex();
    hex.as_str()[..RIG_ID_LEN].to_string()
}

fn base_name(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn note_failure(report: &mut SetupReport, message: String) {
    warn!("character setup: {message}");
    report.failures.push(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rig_ids_differ_per_instance_and_ignore_case() {
        let first = rig_id_for("Hero Rig");
        assert_eq!(first.len(), RIG_ID_LEN);
        assert_eq!(first, rig_id_for("hero rig"));
        assert_eq!(first, rig_id_for("HeroRig"));
        assert_ne!(first, rig_id_for("Hero Rig.001"));
    }

    #[test]
    fn rebind_renames_armature_and_replaces_id() {
        let body = "rig_id = \"abc123\"\nname = \"RIG-Hero\"\nif obj.data.get('rig_id') == \"abc123\":\n";
        let rebound = rebind_script(body, "RIG-Hero.001", "feedface").unwrap();
        assert!(rebound.contains("rig_id = \"feedface\""));
        assert!(rebound.contains("name = \"RIG-Hero.001\""));
        assert!(!rebound.contains("abc123"));
    }

    #[test]
    fn rebind_leaves_names_alone_for_first_instance() {
        let body = "rig_id = \"abc\"\nname = \"RIG-Hero\"\n";
        let rebound = rebind_script(body, "RIG-Hero", "xyz").unwrap();
        assert_eq!(rebound, "rig_id = \"xyz\"\nname = \"RIG-Hero\"\n");
    }

    #[test]
    fn rebind_fills_an_empty_id_slot() {
        let rebound = rebind_script("rig_id = \"\"\n", "Rig", "id1").unwrap();
        assert_eq!(rebound, "rig_id = \"id1\"\n");
    }

    #[test]
    fn rebind_requires_a_rig_id_line() {
        assert!(rebind_script("print('hi')", "Rig", "id").is_none());
    }

    #[test]
    fn outcome_message_names_the_kind() {
        let outcome = ImportOutcome {
            action: ImportAction::LinkedAndOverridden,
            name: "hero.blend".to_string(),
            rig: None,
            setup: None,
        };
        assert_eq!(outcome.message(), "Linked and overridden collection: hero.blend");
    }
}
