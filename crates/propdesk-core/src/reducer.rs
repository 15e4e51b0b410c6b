use super::actions::ClickTarget;
use super::actions::DeskAction;
use super::actions::Key;
use super::actions::RuntimeAction;
use super::actions::TimerToken;
use super::actions::UserAction;
use super::content::Surface;
use super::desktop::ItemTarget;
use super::login::SubmitOutcome;
use super::modal::Animation;
use super::modal::ModalKind;
use super::sound::Cue;
use super::state::ActivityLevel;
use super::state::ActivitySource;
use super::state::DeskState;
use super::state::GrantOutcome;
use super::state::ModalView;
use super::state::Screen;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDelay {
    Fixed(u64),
    /// Uniformly chosen between the bounds, inclusive.
    Jitter { min_ms: u64, max_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeskEffect {
    RequestFrame,
    PlayCue { cue: Cue, volume: u8 },
    FocusModal(ModalKind),
    Animate {
        modal: ModalKind,
        animation: Animation,
        duration_ms: u64,
    },
    Schedule { delay: TimerDelay, timer: TimerToken },
}

pub fn reduce(state: &mut DeskState, action: DeskAction) -> Vec<DeskEffect> {
    match action {
        DeskAction::User(user) => match state.screen {
            Screen::Lock => reduce_lock(state, user),
            Screen::Desktop => reduce_user(state, user),
        },
        DeskAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_lock(state: &mut DeskState, action: UserAction) -> Vec<DeskEffect> {
    let Some(login) = state.login.as_mut() else {
        return Vec::new();
    };
    let changed = match action {
        UserAction::OpenLoginPrompt => login.open_prompt(),
        UserAction::CloseLoginPrompt | UserAction::OverlayClick(ClickTarget::Backdrop) => {
            login.close_prompt()
        }
        UserAction::Key(chord) if chord.key == Key::Escape => login.close_prompt(),
        UserAction::SetLoginInput(value) => login.set_input(&value),
        UserAction::SubmitLogin => return submit_login(state),
        UserAction::Key(chord) if chord.key == Key::Enter => return submit_login(state),
        _ => false,
    };
    if changed {
        vec![DeskEffect::RequestFrame]
    } else {
        Vec::new()
    }
}

fn submit_login(state: &mut DeskState) -> Vec<DeskEffect> {
    let Some(login) = state.login.as_mut() else {
        return Vec::new();
    };
    match login.submit() {
        SubmitOutcome::Accepted => {
            state.log(
                ActivityLevel::Info,
                ActivitySource::Login,
                "password accepted".to_string(),
            );
            vec![
                DeskEffect::Schedule {
                    delay: TimerDelay::Fixed(state.timing.login_redirect_ms),
                    timer: TimerToken::LoginRedirect,
                },
                DeskEffect::RequestFrame,
            ]
        }
        SubmitOutcome::Rejected { generation } => {
            state.log(
                ActivityLevel::Info,
                ActivitySource::Login,
                "password rejected".to_string(),
            );
            vec![
                DeskEffect::Schedule {
                    delay: TimerDelay::Fixed(state.timing.login_error_ms),
                    timer: TimerToken::LoginErrorClear { generation },
                },
                DeskEffect::RequestFrame,
            ]
        }
        SubmitOutcome::Ignored => Vec::new(),
    }
}

fn reduce_user(state: &mut DeskState, action: UserAction) -> Vec<DeskEffect> {
    let mut effects = Vec::new();
    match action {
        UserAction::OpenApp(slot) => {
            push_cue(state, Cue::Click, &mut effects);
            let entry = state.registry.app(slot).clone();
            if entry.body.hosts_access_panel() {
                if let Some(gate) = state.gate.as_mut() {
                    gate.reset_inputs();
                }
            }
            if entry.body.hosts_camera_console() {
                if let Some(timeline) = state.timeline.as_mut() {
                    timeline.reset_view();
                }
            }
            state.views.insert(ModalKind::App, ModalView::App { slot, entry });
            show_modal(state, ModalKind::App, &mut effects);
        }
        UserAction::OpenDesktopItem(index) => {
            let Some(item) = state.desktop.items.get(index).cloned() else {
                return Vec::new();
            };
            push_cue(state, Cue::Click, &mut effects);
            match item.target {
                ItemTarget::Folder { folder } => {
                    let Some(spec) = state.registry.folder(&folder).cloned() else {
                        tracing::warn!(folder = %folder, "desktop item points at a missing folder");
                        return effects;
                    };
                    let modal = spec.modal;
                    state
                        .views
                        .insert(modal, ModalView::Folder { id: folder, spec });
                    show_modal(state, modal, &mut effects);
                }
                ItemTarget::Document { document, modal } => {
                    open_document(state, &document, modal, &mut effects);
                }
            }
        }
        UserAction::OpenFolderItem(index) => {
            let document = match state.visible_view() {
                Some(ModalView::Folder { spec, .. }) => spec
                    .items
                    .get(index)
                    .map(|item| item.document_id().to_string()),
                _ => None,
            };
            let Some(document) = document else {
                return Vec::new();
            };
            push_cue(state, Cue::Click, &mut effects);
            open_document(state, &document, ModalKind::Document, &mut effects);
        }
        UserAction::OpenDocument(document) => {
            open_document(state, &document, ModalKind::Document, &mut effects);
        }
        UserAction::CloseModal => {
            if state.modals.visible().is_some() {
                push_cue(state, Cue::Click, &mut effects);
            }
            hide_modal(state, &mut effects);
        }
        UserAction::OverlayClick(ClickTarget::Backdrop) => hide_modal(state, &mut effects),
        UserAction::OverlayClick(ClickTarget::ModalContent) => {}
        UserAction::Key(chord) => {
            if chord.dismisses() {
                hide_modal(state, &mut effects);
            }
        }
        UserAction::SetCodeInput { field, value } => {
            if !state.gate_panel_visible() {
                return Vec::new();
            }
            set_code_input(state, &field, &value, &mut effects);
        }
        UserAction::SetDateSelector(value) => {
            if !state.camera_console_visible() {
                return Vec::new();
            }
            if let Some(timeline) = state.timeline.as_mut() {
                timeline.set_date_selector(&value);
                effects.push(DeskEffect::RequestFrame);
            }
        }
        UserAction::LoadCameraHistory => {
            if !state.camera_console_visible() {
                return Vec::new();
            }
            let Some(timeline) = state.timeline.as_ref() else {
                return Vec::new();
            };
            if timeline.load_busy() {
                return Vec::new();
            }
            let date = timeline.date_selector().to_string();
            select_date(state, &date, true, &mut effects);
        }
        UserAction::SetSoundEnabled(enabled) => {
            state.sound.enabled = enabled;
            effects.push(DeskEffect::RequestFrame);
        }
        UserAction::SetSoundVolume(volume) => {
            state.sound.set_volume(volume);
            effects.push(DeskEffect::RequestFrame);
        }
        UserAction::OpenLoginPrompt
        | UserAction::CloseLoginPrompt
        | UserAction::SetLoginInput(_)
        | UserAction::SubmitLogin => {}
    }
    effects
}

fn reduce_runtime(state: &mut DeskState, action: RuntimeAction) -> Vec<DeskEffect> {
    let mut effects = Vec::new();
    match action {
        RuntimeAction::TimerFired(token) => timer_fired(state, token, &mut effects),
        RuntimeAction::SelectDate(date) => select_date(state, &date, false, &mut effects),
        RuntimeAction::AddDesktopItem(grant) => {
            if state.register_grant(grant) == GrantOutcome::Created {
                effects.push(DeskEffect::RequestFrame);
            }
        }
    }
    effects
}

fn timer_fired(state: &mut DeskState, token: TimerToken, effects: &mut Vec<DeskEffect>) {
    let applied = match &token {
        TimerToken::ModalSettle { generation } => state.modals.settle(*generation),
        TimerToken::CameraFeed { camera, generation } => {
            let applied = state
                .timeline
                .as_mut()
                .map(|timeline| timeline.feed_ready(camera, *generation))
                .unwrap_or(false);
            if !applied {
                state.log(
                    ActivityLevel::Debug,
                    ActivitySource::Camera,
                    format!("stale refresh for {camera} discarded"),
                );
            }
            applied
        }
        TimerToken::LoadButtonReset { generation } => state
            .timeline
            .as_mut()
            .map(|timeline| timeline.finish_load(*generation))
            .unwrap_or(false),
        TimerToken::LoginRedirect => {
            let ready = state
                .login
                .as_ref()
                .map(|login| login.locked_in())
                .unwrap_or(false);
            if ready && state.screen == Screen::Lock {
                state.screen = Screen::Desktop;
                true
            } else {
                false
            }
        }
        TimerToken::LoginErrorClear { generation } => state
            .login
            .as_mut()
            .map(|login| login.clear_error(*generation))
            .unwrap_or(false),
    };
    tracing::debug!(timer = token.label(), applied, "timer fired");
    if applied {
        effects.push(DeskEffect::RequestFrame);
    }
}

fn open_document(
    state: &mut DeskState,
    document: &str,
    modal: ModalKind,
    effects: &mut Vec<DeskEffect>,
) {
    // Resolved at activation time so items granted later need no registration.
    let entry = state.registry.resolve(Surface::Document, document).clone();
    state.views.insert(
        modal,
        ModalView::Document {
            id: document.to_string(),
            entry,
        },
    );
    show_modal(state, modal, effects);
}

fn show_modal(state: &mut DeskState, modal: ModalKind, effects: &mut Vec<DeskEffect>) {
    let Some(shown) = state.modals.show(modal) else {
        return;
    };
    if let Some(generation) = shown.settle {
        effects.push(DeskEffect::Animate {
            modal,
            animation: Animation::Enter,
            duration_ms: state.timing.modal_enter_ms,
        });
        effects.push(DeskEffect::Schedule {
            delay: TimerDelay::Fixed(state.timing.modal_enter_ms),
            timer: TimerToken::ModalSettle { generation },
        });
    }
    effects.push(DeskEffect::FocusModal(modal));
    push_cue(state, Cue::Enable, effects);
    effects.push(DeskEffect::RequestFrame);
}

fn hide_modal(state: &mut DeskState, effects: &mut Vec<DeskEffect>) {
    let Some((modal, generation)) = state.modals.hide() else {
        return;
    };
    effects.push(DeskEffect::Animate {
        modal,
        animation: Animation::Exit,
        duration_ms: state.timing.modal_exit_ms,
    });
    effects.push(DeskEffect::Schedule {
        delay: TimerDelay::Fixed(state.timing.modal_exit_ms),
        timer: TimerToken::ModalSettle { generation },
    });
    effects.push(DeskEffect::RequestFrame);
}

fn set_code_input(state: &mut DeskState, field: &str, value: &str, effects: &mut Vec<DeskEffect>) {
    let Some(gate) = state.gate.as_mut() else {
        return;
    };
    let Some(outcome) = gate.set_input(field, value) else {
        return;
    };
    let reward = outcome.rising_edge.then(|| gate.reward().clone());
    if let Some(cue) = outcome.cue {
        push_cue(state, cue, effects);
    }
    if let Some(reward) = reward {
        if state.register_grant(reward) == GrantOutcome::Created {
            state.log(
                ActivityLevel::Info,
                ActivitySource::Gate,
                "level 2 access unlocked".to_string(),
            );
            push_cue(state, Cue::Notification, effects);
        }
    }
    effects.push(DeskEffect::RequestFrame);
}

fn select_date(state: &mut DeskState, date: &str, from_button: bool, effects: &mut Vec<DeskEffect>) {
    let timing = state.timing;
    let Some(timeline) = state.timeline.as_mut() else {
        return;
    };
    let Some(refreshes) = timeline.select_date(date) else {
        return;
    };
    for refresh in refreshes {
        effects.push(DeskEffect::Schedule {
            delay: TimerDelay::Jitter {
                min_ms: timing.feed_latency_min_ms,
                max_ms: timing.feed_latency_max_ms,
            },
            timer: TimerToken::CameraFeed {
                camera: refresh.camera,
                generation: refresh.generation,
            },
        });
    }
    if from_button {
        let generation = timeline.begin_load();
        effects.push(DeskEffect::Schedule {
            delay: TimerDelay::Fixed(timing.load_busy_ms),
            timer: TimerToken::LoadButtonReset { generation },
        });
    }
    let title = timeline.history_title();
    state.log(ActivityLevel::Info, ActivitySource::Camera, title);
    effects.push(DeskEffect::RequestFrame);
}

fn push_cue(state: &DeskState, cue: Cue, effects: &mut Vec<DeskEffect>) {
    if state.sound.audible() {
        effects.push(DeskEffect::PlayCue {
            cue,
            volume: state.sound.volume,
        });
    }
}

#[cfg(test)]
mod tests;
