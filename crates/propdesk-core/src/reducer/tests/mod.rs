use pretty_assertions::assert_eq;

pub(super) use super::reduce;
pub(super) use super::DeskEffect;
pub(super) use super::TimerDelay;
pub(super) use crate::actions::ClickTarget;
pub(super) use crate::actions::DeskAction;
pub(super) use crate::actions::Key;
pub(super) use crate::actions::KeyChord;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::TimerToken;
pub(super) use crate::actions::UserAction;
pub(super) use crate::camera::CameraState;
pub(super) use crate::camera::FeedView;
pub(super) use crate::config::SoundConfig;
pub(super) use crate::config::TimingConfig;
pub(super) use crate::content::AppSlot;
pub(super) use crate::content::Block;
pub(super) use crate::content::ContentEntry;
pub(super) use crate::desktop::DesktopGrant;
pub(super) use crate::desktop::DesktopItem;
pub(super) use crate::desktop::ItemTarget;
pub(super) use crate::modal::Animation;
pub(super) use crate::modal::ModalKind;
pub(super) use crate::modal::ModalPhase;
pub(super) use crate::persona::PersonaId;
pub(super) use crate::persona::PersonaTable;
pub(super) use crate::sound::Cue;
pub(super) use crate::state::ActivitySource;
pub(super) use crate::state::DeskState;
pub(super) use crate::state::ModalView;
pub(super) use crate::state::Screen;

mod modal_lifecycle;
mod sound_cues;

fn state(persona: PersonaId) -> DeskState {
    DeskState::new(
        PersonaTable::builtin(persona).expect("builtin table"),
        TimingConfig::default(),
        &SoundConfig::default(),
    )
    .expect("desk state")
}

/// Persona state with the lock screen already passed.
fn desktop(persona: PersonaId) -> DeskState {
    let mut state = state(persona);
    state.screen = Screen::Desktop;
    state
}

fn run_user(state: &mut DeskState, action: UserAction) -> Vec<DeskEffect> {
    reduce(state, DeskAction::User(action))
}

fn run_runtime(state: &mut DeskState, action: RuntimeAction) -> Vec<DeskEffect> {
    reduce(state, DeskAction::Runtime(action))
}

fn fire(state: &mut DeskState, timer: TimerToken) -> Vec<DeskEffect> {
    run_runtime(state, RuntimeAction::TimerFired(timer))
}

fn timers(effects: &[DeskEffect]) -> Vec<TimerToken> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            DeskEffect::Schedule { timer, .. } => Some(timer.clone()),
            _ => None,
        })
        .collect()
}

fn cues(effects: &[DeskEffect]) -> Vec<Cue> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            DeskEffect::PlayCue { cue, .. } => Some(*cue),
            _ => None,
        })
        .collect()
}

/// Fires every modal settle scheduled by `effects`.
fn settle(state: &mut DeskState, effects: &[DeskEffect]) {
    for timer in timers(effects) {
        if matches!(timer, TimerToken::ModalSettle { .. }) {
            fire(state, timer);
        }
    }
}

fn open_app(state: &mut DeskState, slot: AppSlot) {
    let effects = run_user(state, UserAction::OpenApp(slot));
    settle(state, &effects);
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });
}

fn desktop_index(state: &DeskState, name: &str) -> usize {
    state
        .desktop
        .items
        .iter()
        .position(|item| item.name == name)
        .expect("desktop item")
}

fn visible_title(state: &DeskState) -> Option<String> {
    state.visible_view().map(|view| view.title().to_string())
}
