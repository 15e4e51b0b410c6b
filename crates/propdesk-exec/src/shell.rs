use propdesk_core::config::Config;
use propdesk_core::modal::Animation;
use propdesk_core::modal::ModalKind;
use propdesk_core::reduce;
use propdesk_core::DeskAction;
use propdesk_core::DeskEffect;
use propdesk_core::DeskState;
use propdesk_core::PersonaId;
use propdesk_core::PersonaTable;
use propdesk_core::RuntimeAction;
use propdesk_core::ShellInitError;
use propdesk_core::UserAction;

use crate::cues::CuePort;
use crate::timers::FeedLatency;
use crate::timers::TimerQueue;

/// Modal animation in progress, as last requested by the reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAnimation {
    pub modal: ModalKind,
    pub animation: Animation,
    pub until_ms: u64,
}

/// Drives one persona page: feeds actions to the reducer and carries out
/// the effects it returns against a virtual clock.
pub struct DesktopShell {
    state: DeskState,
    timers: TimerQueue,
    cues: Box<dyn CuePort>,
    latency: FeedLatency,
    now_ms: u64,
    frame_requested: bool,
    focused: Option<ModalKind>,
    animation: Option<ActiveAnimation>,
}

impl DesktopShell {
    pub fn new(
        table: PersonaTable,
        config: &Config,
        cues: Box<dyn CuePort>,
        latency: FeedLatency,
    ) -> Result<Self, ShellInitError> {
        let state = DeskState::new(table, config.timing, &config.sound)?;
        tracing::info!(
            persona = state.persona.id(),
            screen = state.screen.label(),
            "shell started"
        );
        Ok(Self {
            state,
            timers: TimerQueue::new(),
            cues,
            latency,
            now_ms: 0,
            frame_requested: true,
            focused: None,
            animation: None,
        })
    }

    /// Loads the persona table, preferring an override in `persona_dir`.
    pub fn for_persona(
        persona: PersonaId,
        config: &Config,
        cues: Box<dyn CuePort>,
        latency: FeedLatency,
    ) -> Result<Self, ShellInitError> {
        let table = PersonaTable::load(persona, config.shell.persona_dir.as_deref())?;
        Self::new(table, config, cues, latency)
    }

    pub fn state(&self) -> &DeskState {
        &self.state
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn focused(&self) -> Option<ModalKind> {
        self.focused
    }

    pub fn animation(&self) -> Option<ActiveAnimation> {
        self.animation
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Returns whether a redraw was requested since the last call.
    pub fn take_frame_request(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }

    pub fn dispatch(&mut self, action: DeskAction) {
        let effects = reduce(&mut self.state, action);
        self.execute(effects);
    }

    pub fn user(&mut self, action: UserAction) {
        self.dispatch(DeskAction::User(action));
    }

    /// Programmatic history load for a `YYYY-MM-DD` date.
    pub fn load_camera_history(&mut self, date: &str) {
        self.dispatch(DeskAction::Runtime(RuntimeAction::SelectDate(
            date.to_string(),
        )));
    }

    /// Moves the clock to `now_ms`, firing every timer due on the way in
    /// order. Timers scheduled by a firing timer fire too if they fall due
    /// before `now_ms`. The clock never moves backwards.
    pub fn advance_to(&mut self, now_ms: u64) {
        while let Some((due_ms, token)) = self.timers.pop_due(now_ms) {
            self.now_ms = self.now_ms.max(due_ms);
            self.dispatch(DeskAction::Runtime(RuntimeAction::TimerFired(token)));
        }
        self.now_ms = self.now_ms.max(now_ms);
        if matches!(self.animation, Some(active) if active.until_ms <= self.now_ms) {
            self.animation = None;
            self.frame_requested = true;
        }
    }

    pub fn advance_by(&mut self, ms: u64) {
        self.advance_to(self.now_ms.saturating_add(ms));
    }

    fn execute(&mut self, effects: Vec<DeskEffect>) {
        for effect in effects {
            match effect {
                DeskEffect::RequestFrame => self.frame_requested = true,
                DeskEffect::PlayCue { cue, volume } => {
                    if let Err(err) = self.cues.play(cue, volume) {
                        tracing::warn!(cue = cue.label(), %err, "cue playback failed");
                    }
                }
                DeskEffect::FocusModal(modal) => self.focused = Some(modal),
                DeskEffect::Animate {
                    modal,
                    animation,
                    duration_ms,
                } => {
                    self.animation = Some(ActiveAnimation {
                        modal,
                        animation,
                        until_ms: self.now_ms.saturating_add(duration_ms),
                    });
                }
                DeskEffect::Schedule { delay, timer } => {
                    let due_ms = self.now_ms.saturating_add(self.latency.delay_ms(delay));
                    tracing::trace!(timer = timer.label(), due_ms, "timer scheduled");
                    self.timers.schedule(due_ms, timer);
                }
            }
        }
        if self.state.modals.visible().is_none() {
            self.focused = None;
        }
    }
}
