use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::access_gate::AccessGateSpec;
use crate::camera::CameraTimelineSpec;
use crate::content::AppSlot;
use crate::content::ContentEntry;
use crate::content::FolderSpec;
use crate::desktop::DesktopItem;
use crate::desktop::DockEntry;
use crate::desktop::ItemTarget;
use crate::error::ShellInitError;
use crate::login::LoginSpec;
use crate::modal::ModalKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaId {
    Child,
    Engineer,
    Guard,
    Programmer,
    Lawyer,
}

impl PersonaId {
    pub const ALL: [PersonaId; 5] = [
        Self::Child,
        Self::Engineer,
        Self::Guard,
        Self::Programmer,
        Self::Lawyer,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Child => "child",
            Self::Engineer => "engineer",
            Self::Guard => "guard",
            Self::Programmer => "programmer",
            Self::Lawyer => "lawyer",
        }
    }

    pub fn from_id(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|persona| persona.id().eq_ignore_ascii_case(value.trim()))
    }

    fn builtin_yaml(self) -> &'static str {
        match self {
            Self::Child => include_str!("../personas/child.yaml"),
            Self::Engineer => include_str!("../personas/engineer.yaml"),
            Self::Guard => include_str!("../personas/guard.yaml"),
            Self::Programmer => include_str!("../personas/programmer.yaml"),
            Self::Lawyer => include_str!("../personas/lawyer.yaml"),
        }
    }
}

/// Everything that differs between persona pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaTable {
    pub id: PersonaId,
    pub title: String,
    /// Whether the page plays feedback cues.
    #[serde(default)]
    pub cues: bool,
    pub modals: Vec<ModalKind>,
    pub dock: BTreeMap<AppSlot, DockEntry>,
    pub apps: BTreeMap<AppSlot, ContentEntry>,
    #[serde(default)]
    pub desktop: Vec<DesktopItem>,
    #[serde(default)]
    pub folders: BTreeMap<String, FolderSpec>,
    #[serde(default)]
    pub documents: BTreeMap<String, ContentEntry>,
    #[serde(default)]
    pub gate: Option<AccessGateSpec>,
    #[serde(default)]
    pub timeline: Option<CameraTimelineSpec>,
    #[serde(default)]
    pub login: Option<LoginSpec>,
}

impl PersonaTable {
    pub fn from_yaml(source_name: &str, text: &str) -> Result<Self, ShellInitError> {
        serde_yaml::from_str(text).map_err(|source| ShellInitError::Parse {
            persona: source_name.to_string(),
            source,
        })
    }

    pub fn builtin(persona: PersonaId) -> Result<Self, ShellInitError> {
        Self::from_yaml(persona.id(), persona.builtin_yaml())
    }

    /// Loads `<dir>/<persona>.yaml` when present, the built-in table
    /// otherwise, and validates the result.
    pub fn load(persona: PersonaId, dir: Option<&Path>) -> Result<Self, ShellInitError> {
        let table = match dir.map(|dir| dir.join(format!("{}.yaml", persona.id()))) {
            Some(path) if path.is_file() => {
                let text = fs::read_to_string(&path).map_err(|source| ShellInitError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "persona table override");
                Self::from_yaml(&path.display().to_string(), &text)?
            }
            _ => Self::builtin(persona)?,
        };
        table.validate()?;
        Ok(table)
    }

    pub fn declares(&self, modal: ModalKind) -> bool {
        self.modals.contains(&modal)
    }

    pub fn validate(&self) -> Result<(), ShellInitError> {
        for modal in ModalKind::REQUIRED {
            if !self.declares(modal) {
                return Err(ShellInitError::MissingModal { modal });
            }
        }
        for slot in AppSlot::ALL {
            if !self.dock.contains_key(&slot) || !self.apps.contains_key(&slot) {
                return Err(ShellInitError::MissingApp { slot });
            }
        }
        for item in &self.desktop {
            self.check_item(item, &self.folders)?;
        }
        for (id, folder) in &self.folders {
            self.check_modal(folder.modal, &format!("folder `{id}`"))?;
        }
        self.check_gate()?;
        self.check_timeline()?;
        for (slot, entry) in &self.apps {
            if entry.body.hosts_access_panel() && self.gate.is_none() {
                return Err(ShellInitError::OrphanWidget {
                    slot: *slot,
                    widget: "access panel",
                });
            }
            if entry.body.hosts_camera_console() && self.timeline.is_none() {
                return Err(ShellInitError::OrphanWidget {
                    slot: *slot,
                    widget: "camera console",
                });
            }
        }
        Ok(())
    }

    fn check_modal(&self, modal: ModalKind, referenced_by: &str) -> Result<(), ShellInitError> {
        if self.declares(modal) {
            Ok(())
        } else {
            Err(ShellInitError::UndeclaredModal {
                modal,
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_item(
        &self,
        item: &DesktopItem,
        folders: &BTreeMap<String, FolderSpec>,
    ) -> Result<(), ShellInitError> {
        let referenced_by = format!("desktop item `{}`", item.name);
        match &item.target {
            ItemTarget::Folder { folder } => {
                let Some(spec) = folders.get(folder) else {
                    return Err(ShellInitError::UnknownFolder {
                        folder: folder.clone(),
                        referenced_by,
                    });
                };
                self.check_modal(spec.modal, &referenced_by)
            }
            ItemTarget::Document { modal, .. } => self.check_modal(*modal, &referenced_by),
        }
    }

    fn check_gate(&self) -> Result<(), ShellInitError> {
        let Some(gate) = &self.gate else {
            return Ok(());
        };
        if gate.fields.is_empty() {
            return Err(ShellInitError::EmptyGate);
        }
        let mut seen = BTreeSet::new();
        for field in &gate.fields {
            if !seen.insert(field.id.as_str()) {
                return Err(ShellInitError::DuplicateField {
                    field: field.id.clone(),
                });
            }
            if field.secret.is_empty() {
                return Err(ShellInitError::EmptySecret {
                    field: field.id.clone(),
                });
            }
        }
        // The reward may open folders it brings along as well as existing ones.
        let mut folders = self.folders.clone();
        folders.extend(gate.reward.folders.clone());
        for (id, folder) in &gate.reward.folders {
            self.check_modal(folder.modal, &format!("folder `{id}`"))?;
        }
        self.check_item(&gate.reward.item, &folders)
    }

    fn check_timeline(&self) -> Result<(), ShellInitError> {
        let Some(timeline) = &self.timeline else {
            return Ok(());
        };
        if timeline.days.is_empty() {
            return Err(ShellInitError::EmptyTimeline);
        }
        if !timeline
            .days
            .iter()
            .any(|day| day.date == timeline.default_date)
        {
            return Err(ShellInitError::UnknownDefaultDate {
                date: timeline.default_date,
            });
        }
        let cameras: BTreeSet<&str> = timeline
            .cameras
            .iter()
            .map(|camera| camera.id.as_str())
            .collect();
        for day in &timeline.days {
            if let Some(camera) = day.cameras.keys().find(|id| !cameras.contains(id.as_str())) {
                return Err(ShellInitError::UnknownCamera {
                    camera: camera.clone(),
                    date: day.date,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn every_builtin_table_parses_and_validates() {
        for persona in PersonaId::ALL {
            let table = PersonaTable::builtin(persona).expect("builtin parses");
            assert_eq!(table.id, persona);
            table.validate().expect("builtin validates");
        }
    }

    #[test]
    fn only_the_child_page_has_cues_login_and_gate() {
        for persona in PersonaId::ALL {
            let table = PersonaTable::builtin(persona).expect("builtin parses");
            let child = persona == PersonaId::Child;
            assert_eq!(table.cues, child, "{}", persona.id());
            assert_eq!(table.login.is_some(), child, "{}", persona.id());
            assert_eq!(table.gate.is_some(), child, "{}", persona.id());
            assert_eq!(
                table.timeline.is_some(),
                persona == PersonaId::Guard,
                "{}",
                persona.id()
            );
        }
    }

    #[test]
    fn persona_ids_round_trip() {
        for persona in PersonaId::ALL {
            assert_eq!(PersonaId::from_id(persona.id()), Some(persona));
        }
        assert_eq!(PersonaId::from_id(" Guard "), Some(PersonaId::Guard));
        assert_eq!(PersonaId::from_id("pilot"), None);
    }

    #[test]
    fn missing_document_modal_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Engineer).expect("builtin parses");
        table.modals.retain(|modal| *modal != ModalKind::Document);
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::MissingModal {
                modal: ModalKind::Document
            })
        ));
    }

    #[test]
    fn missing_dock_slot_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Lawyer).expect("builtin parses");
        table.dock.remove(&AppSlot::App3);
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::MissingApp {
                slot: AppSlot::App3
            })
        ));
    }

    #[test]
    fn desktop_item_with_unknown_folder_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Engineer).expect("builtin parses");
        table.folders.clear();
        let err = table.validate().expect_err("must fail");
        assert!(matches!(err, ShellInitError::UnknownFolder { .. }));
        assert!(err.to_string().contains("unknown folder"));
    }

    #[test]
    fn report_folder_requires_its_modal() {
        let mut table = PersonaTable::builtin(PersonaId::Programmer).expect("builtin parses");
        table.modals.retain(|modal| *modal != ModalKind::ReportFolder);
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::UndeclaredModal {
                modal: ModalKind::ReportFolder,
                ..
            })
        ));
    }

    #[test]
    fn duplicate_code_field_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Child).expect("builtin parses");
        let gate = table.gate.as_mut().expect("child gate");
        let first = gate.fields[0].clone();
        gate.fields.push(first);
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::DuplicateField { .. })
        ));
    }

    #[test]
    fn access_panel_without_gate_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Child).expect("builtin parses");
        table.gate = None;
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::OrphanWidget {
                widget: "access panel",
                ..
            })
        ));
    }

    #[test]
    fn camera_day_with_unknown_camera_is_fatal() {
        let mut table = PersonaTable::builtin(PersonaId::Guard).expect("builtin parses");
        let timeline = table.timeline.as_mut().expect("guard timeline");
        timeline.cameras.retain(|camera| camera.id != "camera4");
        assert!(matches!(
            table.validate(),
            Err(ShellInitError::UnknownCamera { camera, .. }) if camera == "camera4"
        ));
    }

    #[test]
    fn malformed_yaml_reports_the_source() {
        let err = PersonaTable::from_yaml("broken", "id: [").expect_err("must fail");
        assert!(err.to_string().contains("`broken`"));
    }

    #[test]
    fn override_directory_replaces_the_builtin_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut table = PersonaTable::builtin(PersonaId::Engineer).expect("builtin parses");
        table.title = "Переопределено".to_string();
        let yaml = serde_yaml::to_string(&table).expect("serialize");
        let mut file = fs::File::create(dir.path().join("engineer.yaml")).expect("create");
        file.write_all(yaml.as_bytes()).expect("write");

        let loaded = PersonaTable::load(PersonaId::Engineer, Some(dir.path())).expect("load");
        assert_eq!(loaded.title, "Переопределено");

        let fallback = PersonaTable::load(PersonaId::Lawyer, Some(dir.path())).expect("load");
        assert_eq!(fallback.id, PersonaId::Lawyer);
    }

    #[test]
    fn builtin_documents_are_distinct_from_the_default() {
        let table = PersonaTable::builtin(PersonaId::Engineer).expect("builtin parses");
        let note = table.documents.get("forest-note").expect("forest note");
        assert_eq!(note.title, "посмотреть в лесу.txt");
        assert_ne!(
            note.title,
            crate::content::RegistryDefaults::default().document.title
        );
    }
}
