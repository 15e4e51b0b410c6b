use super::*;
use pretty_assertions::assert_eq;

#[test]
fn opening_an_app_animates_focuses_and_settles() {
    let mut state = desktop(PersonaId::Engineer);
    let effects = run_user(&mut state, UserAction::OpenApp(AppSlot::App1));

    assert_eq!(
        effects,
        vec![
            DeskEffect::Animate {
                modal: ModalKind::App,
                animation: Animation::Enter,
                duration_ms: 300,
            },
            DeskEffect::Schedule {
                delay: TimerDelay::Fixed(300),
                timer: TimerToken::ModalSettle { generation: 1 },
            },
            DeskEffect::FocusModal(ModalKind::App),
            DeskEffect::RequestFrame,
        ]
    );
    assert_eq!(state.modals.phase().label(), "Opening");

    settle(&mut state, &effects);
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });
    assert_eq!(visible_title(&state).as_deref(), Some("Настройки"));
}

#[test]
fn showing_another_modal_hides_the_open_one() {
    let mut state = desktop(PersonaId::Engineer);
    let folder = desktop_index(&state, "Документы");
    let effects = run_user(&mut state, UserAction::OpenDesktopItem(folder));
    settle(&mut state, &effects);
    assert_eq!(state.modals.visible(), Some(ModalKind::Folder));

    let effects = run_user(&mut state, UserAction::OpenFolderItem(1));
    settle(&mut state, &effects);
    assert_eq!(
        state.modals.phase(),
        ModalPhase::Open {
            modal: ModalKind::Document
        }
    );
    assert_eq!(visible_title(&state).as_deref(), Some("посмотреть в лесу.txt"));
}

#[test]
fn showing_the_same_modal_twice_leaves_it_open() {
    let mut state = desktop(PersonaId::Engineer);
    let first = run_user(&mut state, UserAction::OpenApp(AppSlot::App2));
    let second = run_user(&mut state, UserAction::OpenApp(AppSlot::App2));
    settle(&mut state, &first);
    assert_eq!(state.modals.phase().label(), "Opening");
    settle(&mut state, &second);
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });
}

#[test]
fn closing_with_nothing_open_has_no_effects() {
    let mut state = desktop(PersonaId::Engineer);
    assert!(run_user(&mut state, UserAction::CloseModal).is_empty());
    assert!(run_user(&mut state, UserAction::Key(KeyChord::plain(Key::Escape))).is_empty());
    assert!(run_user(&mut state, UserAction::OverlayClick(ClickTarget::Backdrop)).is_empty());
    assert_eq!(state.modals.phase(), ModalPhase::Closed);
}

#[test]
fn close_runs_the_exit_animation_before_closing() {
    let mut state = desktop(PersonaId::Engineer);
    open_app(&mut state, AppSlot::App4);
    let effects = run_user(&mut state, UserAction::CloseModal);
    assert!(effects.contains(&DeskEffect::Animate {
        modal: ModalKind::App,
        animation: Animation::Exit,
        duration_ms: 200,
    }));
    assert!(matches!(
        effects.iter().find(|effect| matches!(effect, DeskEffect::Schedule { .. })),
        Some(DeskEffect::Schedule {
            delay: TimerDelay::Fixed(200),
            ..
        })
    ));
    assert_eq!(state.modals.phase().label(), "Closing");
    settle(&mut state, &effects);
    assert_eq!(state.modals.phase(), ModalPhase::Closed);
}

#[test]
fn escape_and_close_chord_dismiss_but_plain_keys_do_not() {
    let mut state = desktop(PersonaId::Lawyer);
    open_app(&mut state, AppSlot::App2);
    assert!(run_user(&mut state, UserAction::Key(KeyChord::plain(Key::Char('w')))).is_empty());
    assert!(run_user(&mut state, UserAction::Key(KeyChord::ctrl('q'))).is_empty());

    let effects = run_user(&mut state, UserAction::Key(KeyChord::ctrl('w')));
    assert_eq!(state.modals.phase().label(), "Closing");
    settle(&mut state, &effects);

    open_app(&mut state, AppSlot::App2);
    let effects = run_user(&mut state, UserAction::Key(KeyChord::plain(Key::Escape)));
    settle(&mut state, &effects);
    assert_eq!(state.modals.phase(), ModalPhase::Closed);
}

#[test]
fn clicks_inside_a_modal_never_reach_the_backdrop() {
    let mut state = desktop(PersonaId::Lawyer);
    open_app(&mut state, AppSlot::App1);
    assert!(run_user(&mut state, UserAction::OverlayClick(ClickTarget::ModalContent)).is_empty());
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });

    run_user(&mut state, UserAction::OverlayClick(ClickTarget::Backdrop));
    assert_eq!(state.modals.phase().label(), "Closing");
}

#[test]
fn show_during_closing_wins_over_the_pending_close() {
    let mut state = desktop(PersonaId::Engineer);
    open_app(&mut state, AppSlot::App1);
    let closing = run_user(&mut state, UserAction::CloseModal);

    let reopened = run_user(&mut state, UserAction::OpenApp(AppSlot::App3));
    assert!(timers(&reopened).is_empty());
    assert!(reopened.contains(&DeskEffect::FocusModal(ModalKind::App)));
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });

    settle(&mut state, &closing);
    assert_eq!(state.modals.phase(), ModalPhase::Open { modal: ModalKind::App });
    assert_eq!(visible_title(&state).as_deref(), Some("Лаборатория"));
}

#[test]
fn second_close_during_closing_is_ignored() {
    let mut state = desktop(PersonaId::Engineer);
    open_app(&mut state, AppSlot::App1);
    run_user(&mut state, UserAction::CloseModal);
    assert!(run_user(&mut state, UserAction::Key(KeyChord::plain(Key::Escape))).is_empty());
}
