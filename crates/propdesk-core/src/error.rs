use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::content::AppSlot;
use crate::modal::ModalKind;

/// Reasons a persona shell refuses to start. Nothing else in the core is
/// fallible: lookups fall back to defaults and wrong codes are plain state.
#[derive(Debug, Error)]
pub enum ShellInitError {
    #[error("failed to read persona table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("persona table `{persona}` is malformed: {source}")]
    Parse {
        persona: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("required {} modal is not declared", .modal.label())]
    MissingModal { modal: ModalKind },
    #[error("{referenced_by} opens the undeclared {} modal", .modal.label())]
    UndeclaredModal {
        modal: ModalKind,
        referenced_by: String,
    },
    #[error("dock slot {} has no title or content", .slot.id())]
    MissingApp { slot: AppSlot },
    #[error("{referenced_by} refers to unknown folder `{folder}`")]
    UnknownFolder {
        folder: String,
        referenced_by: String,
    },
    #[error("app {} hosts a {widget} but the persona defines none", .slot.id())]
    OrphanWidget { slot: AppSlot, widget: &'static str },
    #[error("access gate has no code fields")]
    EmptyGate,
    #[error("code field `{field}` is declared twice")]
    DuplicateField { field: String },
    #[error("code field `{field}` has an empty secret")]
    EmptySecret { field: String },
    #[error("camera timeline has no days")]
    EmptyTimeline,
    #[error("default camera date {date} has no record")]
    UnknownDefaultDate { date: NaiveDate },
    #[error("camera day {date} refers to unknown camera `{camera}`")]
    UnknownCamera { camera: String, date: NaiveDate },
}
