use std::collections::BTreeMap;
use std::collections::VecDeque;

use crate::access_gate::AccessGate;
use crate::camera::CameraTimeline;
use crate::config::SoundConfig;
use crate::config::TimingConfig;
use crate::content::AppSlot;
use crate::content::ContentEntry;
use crate::content::ContentRegistry;
use crate::content::FolderSpec;
use crate::content::RegistryDefaults;
use crate::content::RenderPayload;
use crate::desktop::Desktop;
use crate::desktop::DesktopGrant;
use crate::desktop::ItemTarget;
use crate::error::ShellInitError;
use crate::login::LoginGate;
use crate::modal::ModalKind;
use crate::modal::ModalStack;
use crate::persona::PersonaId;
use crate::persona::PersonaTable;
use crate::sound::SoundSettings;

pub const ACTIVITY_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Lock,
    Desktop,
}

impl Screen {
    pub fn label(self) -> &'static str {
        match self {
            Self::Lock => "Lock",
            Self::Desktop => "Desktop",
        }
    }
}

/// Content last rendered into a modal region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalView {
    App { slot: AppSlot, entry: ContentEntry },
    Folder { id: String, spec: FolderSpec },
    Document { id: String, entry: ContentEntry },
}

impl ModalView {
    pub fn title(&self) -> &str {
        match self {
            Self::App { entry, .. } | Self::Document { entry, .. } => &entry.title,
            Self::Folder { spec, .. } => &spec.title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityLevel {
    Debug,
    Info,
    Warn,
}

impl ActivityLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySource {
    Shell,
    Gate,
    Camera,
    Login,
}

impl ActivitySource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Shell => "shell",
            Self::Gate => "gate",
            Self::Camera => "camera",
            Self::Login => "login",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityEntry {
    pub seq: u64,
    pub level: ActivityLevel,
    pub source: ActivitySource,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn record(&mut self, level: ActivityLevel, source: ActivitySource, message: String) {
        let entry = ActivityEntry {
            seq: self.next_seq,
            level,
            source,
            message,
        };
        self.next_seq += 1;

        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.next_seq = 1;
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ActivityEntry> {
        self.buf.iter()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Created,
    /// An item with the same name is already on the desktop.
    AlreadyPresent,
    Rejected,
}

/// All state of one persona page.
#[derive(Debug, Clone)]
pub struct DeskState {
    pub persona: PersonaId,
    pub title: String,
    pub screen: Screen,
    pub login: Option<LoginGate>,
    pub desktop: Desktop,
    pub modals: ModalStack,
    pub views: BTreeMap<ModalKind, ModalView>,
    pub registry: ContentRegistry,
    pub gate: Option<AccessGate>,
    pub timeline: Option<CameraTimeline>,
    pub sound: SoundSettings,
    pub timing: TimingConfig,
    pub activity: ActivityLog,
}

impl DeskState {
    pub fn new(
        table: PersonaTable,
        timing: TimingConfig,
        sound: &SoundConfig,
    ) -> Result<Self, ShellInitError> {
        table.validate()?;

        let mut registry = ContentRegistry::new(RegistryDefaults::default());
        for (slot, entry) in &table.apps {
            registry.insert_app(*slot, entry.clone());
        }
        for (id, entry) in &table.documents {
            registry.insert_document(id, entry.clone());
        }
        for (id, folder) in &table.folders {
            registry.insert_folder(id, folder.clone());
        }
        if let Some(timeline) = &table.timeline {
            for camera in &timeline.cameras {
                registry.insert_camera_tab(
                    &camera.id,
                    ContentEntry {
                        title: camera.label.clone(),
                        body: RenderPayload::default(),
                    },
                );
            }
        }

        let desktop = Desktop {
            dock: table
                .dock
                .iter()
                .map(|(slot, entry)| (*slot, entry.clone()))
                .collect(),
            items: table.desktop.clone(),
        };
        let login = table.login.as_ref().map(LoginGate::new);
        let screen = if login.is_some() {
            Screen::Lock
        } else {
            Screen::Desktop
        };

        tracing::debug!(persona = table.id.id(), screen = screen.label(), "desk state ready");
        Ok(Self {
            persona: table.id,
            title: table.title.clone(),
            screen,
            login,
            desktop,
            modals: ModalStack::new(table.modals.iter().copied()),
            views: BTreeMap::new(),
            registry,
            gate: table.gate.as_ref().map(AccessGate::new),
            timeline: table.timeline.as_ref().map(CameraTimeline::new),
            sound: SoundSettings::new(table.cues, sound),
            timing,
            activity: ActivityLog::new(ACTIVITY_CAPACITY),
        })
    }

    pub fn visible_view(&self) -> Option<&ModalView> {
        self.modals
            .visible()
            .and_then(|modal| self.views.get(&modal))
    }

    pub fn gate_panel_visible(&self) -> bool {
        matches!(
            self.visible_view(),
            Some(ModalView::App { entry, .. }) if entry.body.hosts_access_panel()
        )
    }

    pub fn camera_console_visible(&self) -> bool {
        matches!(
            self.visible_view(),
            Some(ModalView::App { entry, .. }) if entry.body.hosts_camera_console()
        )
    }

    pub fn log(&mut self, level: ActivityLevel, source: ActivitySource, message: String) {
        self.activity.record(level, source, message);
    }

    /// Puts a new item on the desktop and makes its folders and documents
    /// resolvable. An item whose name is already present is left alone.
    pub fn register_grant(&mut self, grant: DesktopGrant) -> GrantOutcome {
        if self.desktop.contains(&grant.item.name) {
            return GrantOutcome::AlreadyPresent;
        }
        let opens = match &grant.item.target {
            ItemTarget::Folder { folder } => grant
                .folders
                .get(folder)
                .or_else(|| self.registry.folder(folder))
                .map(|spec| spec.modal),
            ItemTarget::Document { modal, .. } => Some(*modal),
        };
        let declared = opens.map(|modal| self.modals.is_declared(modal)).unwrap_or(false)
            && grant
                .folders
                .values()
                .all(|folder| self.modals.is_declared(folder.modal));
        if !declared {
            tracing::warn!(item = %grant.item.name, "desktop item rejected: unknown target");
            self.log(
                ActivityLevel::Warn,
                ActivitySource::Shell,
                format!("desktop item `{}` rejected", grant.item.name),
            );
            return GrantOutcome::Rejected;
        }
        for (id, folder) in grant.folders {
            self.registry.insert_folder(&id, folder);
        }
        for (id, entry) in grant.documents {
            self.registry.insert_document(&id, entry);
        }
        self.log(
            ActivityLevel::Info,
            ActivitySource::Shell,
            format!("desktop item `{}` created", grant.item.name),
        );
        self.desktop.items.push(grant.item);
        GrantOutcome::Created
    }
}
