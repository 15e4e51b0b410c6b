use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::content::AppSlot;
use crate::content::ContentEntry;
use crate::content::FolderSpec;
use crate::modal::ModalKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockEntry {
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_document_modal() -> ModalKind {
    ModalKind::Document
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemTarget {
    Folder {
        folder: String,
    },
    Document {
        document: String,
        #[serde(default = "default_document_modal")]
        modal: ModalKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopItem {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub target: ItemTarget,
}

/// A desktop item together with the folders and documents it exposes.
/// Registering a grant is how content appears after initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopGrant {
    pub item: DesktopItem,
    #[serde(default)]
    pub folders: BTreeMap<String, FolderSpec>,
    #[serde(default)]
    pub documents: BTreeMap<String, ContentEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Desktop {
    pub dock: Vec<(AppSlot, DockEntry)>,
    pub items: Vec<DesktopItem>,
}

impl Desktop {
    pub fn contains(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    pub fn dock_label(&self, slot: AppSlot) -> Option<&str> {
        self.dock
            .iter()
            .find(|(candidate, _)| *candidate == slot)
            .map(|(_, entry)| entry.label.as_str())
    }
}
