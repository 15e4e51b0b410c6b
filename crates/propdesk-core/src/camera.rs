use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;

use crate::content::Tone;

pub const HISTORY_TITLE: &str = "История событий";
pub const ANOMALY_CAPTION: &str = "⚠️ АНОМАЛИЯ НА КАМЕРЕ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ️",
            Self::Success => "✅",
            Self::Warning => "⚠️",
            Self::Danger => "🚨",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Self::Info => Tone::Info,
            Self::Success => Tone::Success,
            Self::Warning => Tone::Warning,
            Self::Danger => Tone::Danger,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub time: String,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraState {
    #[default]
    Normal,
    Anomalous,
}

/// Per-day flags for one camera. Cameras missing from a day are normal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDayState {
    #[serde(default)]
    pub state: CameraState,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub glitch: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub label: String,
    #[serde(default)]
    pub upload_area: bool,
    pub events: Vec<TimelineEvent>,
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraDayState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraTimelineSpec {
    pub default_date: NaiveDate,
    pub cameras: Vec<CameraSpec>,
    pub days: Vec<TimelineDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Noise {
    Low,
    High,
}

/// A rendered camera frame. Everything here follows from `(day, camera)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFrame {
    pub state: CameraState,
    pub stamp: NaiveDate,
    pub noise: Noise,
    pub glitch: bool,
    pub caption: Option<String>,
    pub border: Tone,
}

impl FeedFrame {
    fn compose(stamp: NaiveDate, day: &CameraDayState) -> Self {
        let anomalous = day.state == CameraState::Anomalous;
        Self {
            state: day.state,
            stamp,
            noise: if anomalous || day.glitch {
                Noise::High
            } else {
                Noise::Low
            },
            glitch: day.glitch,
            caption: match &day.caption {
                Some(caption) => Some(caption.clone()),
                None if anomalous => Some(ANOMALY_CAPTION.to_string()),
                None => None,
            },
            border: if anomalous { Tone::Danger } else { Tone::Success },
        }
    }

    pub fn stamp_label(&self) -> String {
        self.stamp.format("%d.%m.%y").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedView {
    Idle,
    Loading,
    Live(FeedFrame),
}

impl FeedView {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Загрузка кадра...",
            Self::Loading => "Загрузка...",
            Self::Live(_) => "REC",
        }
    }
}

/// A feed refresh to schedule; it applies only while `generation` is
/// still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRefresh {
    pub camera: String,
    pub generation: u64,
}

#[derive(Debug, Clone)]
pub struct CameraTimeline {
    cameras: Vec<CameraSpec>,
    days: BTreeMap<NaiveDate, TimelineDay>,
    default_date: NaiveDate,
    date_selector: String,
    selected: NaiveDate,
    generation: u64,
    events: Vec<TimelineEvent>,
    upload_area_visible: bool,
    feeds: BTreeMap<String, FeedView>,
    load_busy: bool,
    load_generation: u64,
}

impl CameraTimeline {
    /// Callers validate that `default_date` is one of the days.
    pub fn new(spec: &CameraTimelineSpec) -> Self {
        let days: BTreeMap<NaiveDate, TimelineDay> = spec
            .days
            .iter()
            .map(|day| (day.date, day.clone()))
            .collect();
        let mut timeline = Self {
            cameras: spec.cameras.clone(),
            days,
            default_date: spec.default_date,
            date_selector: spec.default_date.to_string(),
            selected: spec.default_date,
            generation: 0,
            events: Vec::new(),
            upload_area_visible: false,
            feeds: BTreeMap::new(),
            load_busy: false,
            load_generation: 0,
        };
        timeline.reset_view();
        timeline
    }

    pub fn cameras(&self) -> &[CameraSpec] {
        &self.cameras
    }

    pub fn days(&self) -> impl Iterator<Item = &TimelineDay> {
        self.days.values()
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn selected_day(&self) -> Option<&TimelineDay> {
        self.days.get(&self.selected)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn upload_area_visible(&self) -> bool {
        self.upload_area_visible
    }

    pub fn date_selector(&self) -> &str {
        &self.date_selector
    }

    pub fn set_date_selector(&mut self, value: &str) {
        self.date_selector = value.to_string();
    }

    pub fn history_title(&self) -> String {
        match self.selected_day() {
            Some(day) => format!("{HISTORY_TITLE} - {}", day.label),
            None => HISTORY_TITLE.to_string(),
        }
    }

    pub fn feed(&self, camera: &str) -> Option<&FeedView> {
        self.feeds.get(camera)
    }

    pub fn load_busy(&self) -> bool {
        self.load_busy
    }

    pub fn camera_state(&self, camera: &str) -> CameraState {
        self.selected_day()
            .and_then(|day| day.cameras.get(camera))
            .map(|state| state.state)
            .unwrap_or_default()
    }

    /// Restores the console as first rendered: default date, its history,
    /// idle feeds. In-flight refreshes become stale.
    pub fn reset_view(&mut self) {
        self.generation += 1;
        self.date_selector = self.default_date.to_string();
        self.apply_day(self.default_date);
        self.load_busy = false;
        self.feeds = self
            .cameras
            .iter()
            .map(|camera| (camera.id.clone(), FeedView::Idle))
            .collect();
    }

    /// Selects the day for `date` (`YYYY-MM-DD`). Unknown or unparsable
    /// dates leave everything untouched and return `None`.
    pub fn select_date(&mut self, date: &str) -> Option<Vec<FeedRefresh>> {
        let parsed = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
        if !self.days.contains_key(&parsed) {
            tracing::debug!(date, "no camera history for date");
            return None;
        }
        self.generation += 1;
        self.apply_day(parsed);
        self.date_selector = parsed.to_string();
        for feed in self.feeds.values_mut() {
            *feed = FeedView::Loading;
        }
        tracing::debug!(date, generation = self.generation, "camera day selected");
        Some(
            self.cameras
                .iter()
                .map(|camera| FeedRefresh {
                    camera: camera.id.clone(),
                    generation: self.generation,
                })
                .collect(),
        )
    }

    /// Applies a finished refresh. A refresh issued for an older selection
    /// is discarded and `false` is returned.
    pub fn feed_ready(&mut self, camera: &str, generation: u64) -> bool {
        if generation != self.generation {
            tracing::debug!(
                camera,
                generation,
                current = self.generation,
                "stale feed refresh dropped"
            );
            return false;
        }
        let Some(day) = self.days.get(&self.selected) else {
            return false;
        };
        let flags = day.cameras.get(camera).cloned().unwrap_or_default();
        let frame = FeedFrame::compose(day.date, &flags);
        match self.feeds.get_mut(camera) {
            Some(feed) => {
                *feed = FeedView::Live(frame);
                true
            }
            None => false,
        }
    }

    /// Marks the load button busy. The returned stamp is what the matching
    /// reset must carry; day selections do not touch it.
    pub fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load_busy = true;
        self.load_generation
    }

    /// Re-enables the load button unless a later load took over.
    pub fn finish_load(&mut self, generation: u64) -> bool {
        if !self.load_busy || generation != self.load_generation {
            return false;
        }
        self.load_busy = false;
        true
    }

    fn apply_day(&mut self, date: NaiveDate) {
        if let Some(day) = self.days.get(&date) {
            self.selected = date;
            self.events = day.events.clone();
            self.upload_area_visible = day.upload_area;
        }
    }
}
