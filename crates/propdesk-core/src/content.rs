use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::modal::ModalKind;

pub const DEFAULT_DOCUMENT_ID: &str = "hello";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    App,
    Document,
    CameraTab,
}

impl Surface {
    pub fn label(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Document => "document",
            Self::CameraTab => "camera tab",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppSlot {
    App1,
    App2,
    App3,
    App4,
}

impl AppSlot {
    pub const ALL: [AppSlot; 4] = [Self::App1, Self::App2, Self::App3, Self::App4];

    pub fn id(self) -> &'static str {
        match self {
            Self::App1 => "app1",
            Self::App2 => "app2",
            Self::App3 => "app3",
            Self::App4 => "app4",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.id() == id)
    }

    pub fn index(self) -> usize {
        match self {
            Self::App1 => 0,
            Self::App2 => 1,
            Self::App3 => 2,
            Self::App4 => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Neutral,
    Info,
    Success,
    Warning,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub text: String,
    #[serde(default)]
    pub tone: Tone,
}

/// One renderable unit of a window body. The live variants (`AccessPanel`,
/// `CameraConsole`, `SoundSettings`) carry no data: the renderer fills them
/// from shell state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        text: String,
    },
    Paragraph {
        text: String,
    },
    Notice {
        #[serde(default)]
        tone: Tone,
        text: String,
    },
    List {
        items: Vec<String>,
    },
    Divider,
    Code {
        language: String,
        #[serde(default)]
        filename: Option<String>,
        source: String,
    },
    LogRecord {
        stamp: String,
        level: String,
        #[serde(default)]
        tone: Tone,
        lines: Vec<LogLine>,
    },
    Mail {
        from: String,
        date: String,
        subject: String,
        paragraphs: Vec<String>,
        signature: String,
        #[serde(default)]
        footer: Option<String>,
    },
    AccessPanel,
    CameraConsole,
    SoundSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenderPayload(pub Vec<Block>);

impl RenderPayload {
    pub fn text(text: &str) -> Self {
        Self(vec![Block::Paragraph {
            text: text.to_string(),
        }])
    }

    pub fn blocks(&self) -> &[Block] {
        &self.0
    }

    pub fn hosts_access_panel(&self) -> bool {
        self.0.iter().any(|block| matches!(block, Block::AccessPanel))
    }

    pub fn hosts_camera_console(&self) -> bool {
        self.0.iter().any(|block| matches!(block, Block::CameraConsole))
    }

    pub fn hosts_sound_settings(&self) -> bool {
        self.0.iter().any(|block| matches!(block, Block::SoundSettings))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub title: String,
    #[serde(default)]
    pub body: RenderPayload,
}

impl ContentEntry {
    pub fn new(title: &str, body: &str) -> Self {
        Self {
            title: title.to_string(),
            body: RenderPayload::text(body),
        }
    }
}

fn default_folder_modal() -> ModalKind {
    ModalKind::Folder
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderItem {
    pub label: String,
    #[serde(default)]
    pub icon: Option<String>,
    /// Item without a document opens the default `hello` document.
    #[serde(default)]
    pub document: Option<String>,
}

impl FolderItem {
    pub fn document_id(&self) -> &str {
        self.document.as_deref().unwrap_or(DEFAULT_DOCUMENT_ID)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSpec {
    pub title: String,
    #[serde(default = "default_folder_modal")]
    pub modal: ModalKind,
    #[serde(default)]
    pub items: Vec<FolderItem>,
}

/// Fallback entries used on lookup misses. Lookups never fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryDefaults {
    pub app: ContentEntry,
    pub document: ContentEntry,
    pub camera_tab: ContentEntry,
}

impl Default for RegistryDefaults {
    fn default() -> Self {
        Self {
            app: ContentEntry::new("Приложение", "Содержимое приложения"),
            document: ContentEntry::new("привет.txt", "привет"),
            camera_tab: ContentEntry::new("Камера", "Нет сигнала"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentRegistry {
    apps: BTreeMap<AppSlot, ContentEntry>,
    documents: BTreeMap<String, ContentEntry>,
    camera_tabs: BTreeMap<String, ContentEntry>,
    folders: BTreeMap<String, FolderSpec>,
    defaults: RegistryDefaults,
}

impl ContentRegistry {
    pub fn new(defaults: RegistryDefaults) -> Self {
        Self {
            defaults,
            ..Self::default()
        }
    }

    /// Total lookup: a miss returns the surface's default entry.
    pub fn resolve(&self, surface: Surface, identifier: &str) -> &ContentEntry {
        let hit = match surface {
            Surface::App => AppSlot::from_id(identifier).and_then(|slot| self.apps.get(&slot)),
            Surface::Document => self.documents.get(identifier),
            Surface::CameraTab => self.camera_tabs.get(identifier),
        };
        match hit {
            Some(entry) => entry,
            None => {
                tracing::debug!(
                    surface = surface.label(),
                    identifier,
                    "content lookup miss, using default"
                );
                self.default_for(surface)
            }
        }
    }

    pub fn app(&self, slot: AppSlot) -> &ContentEntry {
        self.apps.get(&slot).unwrap_or(&self.defaults.app)
    }

    pub fn default_for(&self, surface: Surface) -> &ContentEntry {
        match surface {
            Surface::App => &self.defaults.app,
            Surface::Document => &self.defaults.document,
            Surface::CameraTab => &self.defaults.camera_tab,
        }
    }

    pub fn contains(&self, surface: Surface, identifier: &str) -> bool {
        match surface {
            Surface::App => AppSlot::from_id(identifier)
                .map(|slot| self.apps.contains_key(&slot))
                .unwrap_or(false),
            Surface::Document => self.documents.contains_key(identifier),
            Surface::CameraTab => self.camera_tabs.contains_key(identifier),
        }
    }

    pub fn insert_app(&mut self, slot: AppSlot, entry: ContentEntry) {
        self.apps.insert(slot, entry);
    }

    /// Later inserts are visible to every subsequent lookup; nothing caches
    /// resolved entries by identifier.
    pub fn insert_document(&mut self, identifier: &str, entry: ContentEntry) {
        self.documents.insert(identifier.to_string(), entry);
    }

    pub fn insert_camera_tab(&mut self, identifier: &str, entry: ContentEntry) {
        self.camera_tabs.insert(identifier.to_string(), entry);
    }

    pub fn insert_folder(&mut self, identifier: &str, folder: FolderSpec) {
        self.folders.insert(identifier.to_string(), folder);
    }

    pub fn folder(&self, identifier: &str) -> Option<&FolderSpec> {
        self.folders.get(identifier)
    }

    pub fn document_ids(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> ContentRegistry {
        let mut registry = ContentRegistry::new(RegistryDefaults::default());
        registry.insert_document(
            "forest-note",
            ContentEntry::new("посмотреть в лесу.txt", "отчет"),
        );
        registry.insert_app(AppSlot::App2, ContentEntry::new("Почтовый клиент", "📧 ПИСЕМ НЕТ"));
        registry
    }

    #[test]
    fn registered_document_resolves_to_its_own_title() {
        let registry = registry();
        let entry = registry.resolve(Surface::Document, "forest-note");
        assert_eq!(entry.title, "посмотреть в лесу.txt");
        assert_ne!(entry, registry.default_for(Surface::Document));
    }

    #[test]
    fn unknown_identifiers_fall_back_per_surface() {
        let registry = registry();
        assert_eq!(registry.resolve(Surface::Document, "xyz").title, "привет.txt");
        assert_eq!(
            registry.resolve(Surface::Document, "xyz").body,
            RenderPayload::text("привет")
        );
        assert_eq!(registry.resolve(Surface::App, "app9").title, "Приложение");
        assert_eq!(registry.resolve(Surface::App, "app1").title, "Приложение");
        assert_eq!(registry.resolve(Surface::CameraTab, "camera7").title, "Камера");
        assert_eq!(registry.resolve(Surface::Document, "").title, "привет.txt");
    }

    #[test]
    fn app_lookup_by_string_and_slot_agree() {
        let registry = registry();
        assert_eq!(
            registry.resolve(Surface::App, "app2"),
            registry.app(AppSlot::App2)
        );
    }

    #[test]
    fn documents_inserted_later_become_resolvable() {
        let mut registry = registry();
        assert!(!registry.contains(Surface::Document, "secret-data"));
        registry.insert_document("secret-data", ContentEntry::new("секретные_данные.txt", "ok"));
        assert_eq!(
            registry.resolve(Surface::Document, "secret-data").title,
            "секретные_данные.txt"
        );
    }

    #[test]
    fn folder_item_without_document_points_at_hello() {
        let item = FolderItem {
            label: "привет.txt".to_string(),
            icon: None,
            document: None,
        };
        assert_eq!(item.document_id(), DEFAULT_DOCUMENT_ID);
    }

    #[test]
    fn payload_blocks_deserialize_from_tagged_yaml() {
        let yaml = r#"
- kind: heading
  text: "Редактор кода"
- kind: code
  language: python
  filename: main.py
  source: print("Привет мир")
- kind: divider
- kind: access_panel
"#;
        let payload: RenderPayload = serde_yaml::from_str(yaml).expect("payload");
        assert_eq!(payload.blocks().len(), 4);
        assert!(payload.hosts_access_panel());
        assert!(!payload.hosts_camera_console());
        assert!(matches!(
            &payload.blocks()[1],
            Block::Code { filename: Some(name), .. } if name == "main.py"
        ));
    }
}
