use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    App,
    Folder,
    ReportFolder,
    Document,
    TaskDocument,
}

impl ModalKind {
    pub const REQUIRED: [ModalKind; 3] = [Self::App, Self::Folder, Self::Document];

    pub fn label(self) -> &'static str {
        match self {
            Self::App => "app",
            Self::Folder => "folder",
            Self::ReportFolder => "report folder",
            Self::Document => "document",
            Self::TaskDocument => "task document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Animation {
    Enter,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalPhase {
    Closed,
    Opening { modal: ModalKind, generation: u64 },
    Open { modal: ModalKind },
    Closing { modal: ModalKind, generation: u64 },
}

impl ModalPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Closed => "Closed",
            Self::Opening { .. } => "Opening",
            Self::Open { .. } => "Open",
            Self::Closing { .. } => "Closing",
        }
    }

    pub fn modal(self) -> Option<ModalKind> {
        match self {
            Self::Closed => None,
            Self::Opening { modal, .. } | Self::Open { modal } | Self::Closing { modal, .. } => {
                Some(modal)
            }
        }
    }
}

/// Result of a `show` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shown {
    pub modal: ModalKind,
    pub hidden: Option<ModalKind>,
    /// Generation of the enter transition to settle, `None` when a pending
    /// close was cancelled and the target went straight to `Open`.
    pub settle: Option<u64>,
}

/// Single-slot modal controller. At most one modal is visible; transient
/// phases carry the generation they were entered with so that a late
/// settle for an older transition is ignored.
#[derive(Debug, Clone)]
pub struct ModalStack {
    phase: ModalPhase,
    generation: u64,
    declared: BTreeSet<ModalKind>,
}

impl ModalStack {
    pub fn new(declared: impl IntoIterator<Item = ModalKind>) -> Self {
        Self {
            phase: ModalPhase::Closed,
            generation: 0,
            declared: declared.into_iter().collect(),
        }
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn visible(&self) -> Option<ModalKind> {
        self.phase.modal()
    }

    pub fn is_declared(&self, modal: ModalKind) -> bool {
        self.declared.contains(&modal)
    }

    pub fn declared(&self) -> impl Iterator<Item = ModalKind> + '_ {
        self.declared.iter().copied()
    }

    /// Re-running `show` on the visible modal restarts the enter sequence.
    /// During `Closing` the pending close is abandoned and the target is
    /// `Open` immediately.
    pub fn show(&mut self, modal: ModalKind) -> Option<Shown> {
        if !self.is_declared(modal) {
            tracing::warn!(modal = modal.label(), "show for undeclared modal ignored");
            return None;
        }
        let previous = self.phase;
        self.generation += 1;
        let (phase, settle) = match previous {
            ModalPhase::Closing { .. } => (ModalPhase::Open { modal }, None),
            _ => (
                ModalPhase::Opening {
                    modal,
                    generation: self.generation,
                },
                Some(self.generation),
            ),
        };
        self.phase = phase;
        tracing::debug!(
            from = previous.label(),
            to = phase.label(),
            modal = modal.label(),
            generation = self.generation,
            "modal show"
        );
        Some(Shown {
            modal,
            hidden: previous.modal().filter(|shown| *shown != modal),
            settle,
        })
    }

    /// Returns the closing generation, or `None` when there is nothing to
    /// close (already `Closed` or already `Closing`).
    pub fn hide(&mut self) -> Option<(ModalKind, u64)> {
        let modal = match self.phase {
            ModalPhase::Opening { modal, .. } | ModalPhase::Open { modal } => modal,
            ModalPhase::Closed | ModalPhase::Closing { .. } => return None,
        };
        self.generation += 1;
        self.phase = ModalPhase::Closing {
            modal,
            generation: self.generation,
        };
        tracing::debug!(
            modal = modal.label(),
            generation = self.generation,
            "modal hide"
        );
        Some((modal, self.generation))
    }

    /// Completes the transient phase entered with `generation`. Stale
    /// generations leave the phase untouched and return `false`.
    pub fn settle(&mut self, generation: u64) -> bool {
        match self.phase {
            ModalPhase::Opening {
                modal,
                generation: current,
            } if current == generation => {
                self.phase = ModalPhase::Open { modal };
                true
            }
            ModalPhase::Closing {
                generation: current,
                ..
            } if current == generation => {
                self.phase = ModalPhase::Closed;
                true
            }
            _ => {
                tracing::debug!(
                    generation,
                    phase = self.phase.label(),
                    "stale modal settle dropped"
                );
                false
            }
        }
    }
}
