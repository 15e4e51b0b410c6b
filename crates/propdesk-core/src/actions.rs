use crate::content::AppSlot;
use crate::desktop::DesktopGrant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The overlay area outside every modal.
    Backdrop,
    ModalContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
        }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
            meta: false,
        }
    }

    /// Ctrl+W or Cmd+W.
    pub fn is_close_chord(&self) -> bool {
        (self.ctrl || self.meta) && matches!(self.key, Key::Char('w') | Key::Char('W'))
    }

    pub fn dismisses(&self) -> bool {
        self.key == Key::Escape || self.is_close_chord()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    OpenApp(AppSlot),
    OpenDesktopItem(usize),
    /// Item of the folder currently shown.
    OpenFolderItem(usize),
    OpenDocument(String),
    CloseModal,
    OverlayClick(ClickTarget),
    Key(KeyChord),
    SetCodeInput { field: String, value: String },
    SetDateSelector(String),
    LoadCameraHistory,
    SetSoundEnabled(bool),
    SetSoundVolume(u8),
    OpenLoginPrompt,
    CloseLoginPrompt,
    SetLoginInput(String),
    SubmitLogin,
}

/// Deferred work handed back to the shell. Each token carries the
/// generation it was issued for; a token whose generation is no longer
/// current is dropped when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimerToken {
    ModalSettle { generation: u64 },
    CameraFeed { camera: String, generation: u64 },
    LoadButtonReset { generation: u64 },
    LoginRedirect,
    LoginErrorClear { generation: u64 },
}

impl TimerToken {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ModalSettle { .. } => "modal settle",
            Self::CameraFeed { .. } => "camera feed",
            Self::LoadButtonReset { .. } => "load button reset",
            Self::LoginRedirect => "login redirect",
            Self::LoginErrorClear { .. } => "login error clear",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeAction {
    TimerFired(TimerToken),
    /// Load camera history for a `YYYY-MM-DD` date.
    SelectDate(String),
    AddDesktopItem(DesktopGrant),
}
