use super::*;
use pretty_assertions::assert_eq;

#[test]
fn child_page_clicks_and_enables_on_open() {
    let mut state = desktop(PersonaId::Child);
    let effects = run_user(&mut state, UserAction::OpenApp(AppSlot::App3));
    assert_eq!(cues(&effects), vec![Cue::Click, Cue::Enable]);
    assert!(effects.contains(&DeskEffect::PlayCue {
        cue: Cue::Click,
        volume: 50,
    }));
}

#[test]
fn close_button_clicks_but_escape_is_silent() {
    let mut state = desktop(PersonaId::Child);
    open_app(&mut state, AppSlot::App2);
    let effects = run_user(&mut state, UserAction::CloseModal);
    assert_eq!(cues(&effects), vec![Cue::Click]);
    settle(&mut state, &effects);

    open_app(&mut state, AppSlot::App2);
    let effects = run_user(&mut state, UserAction::Key(KeyChord::plain(Key::Escape)));
    assert!(cues(&effects).is_empty());
}

#[test]
fn disabling_sound_silences_every_cue() {
    let mut state = desktop(PersonaId::Child);
    run_user(&mut state, UserAction::SetSoundEnabled(false));
    let effects = run_user(&mut state, UserAction::OpenApp(AppSlot::App1));
    assert!(cues(&effects).is_empty());
    assert!(effects.contains(&DeskEffect::FocusModal(ModalKind::App)));
}

#[test]
fn volume_is_clamped_and_carried_on_cues() {
    let mut state = desktop(PersonaId::Child);
    run_user(&mut state, UserAction::SetSoundVolume(180));
    assert_eq!(state.sound.volume, 100);
    run_user(&mut state, UserAction::SetSoundVolume(20));
    let effects = run_user(&mut state, UserAction::OpenApp(AppSlot::App4));
    assert!(effects.contains(&DeskEffect::PlayCue {
        cue: Cue::Enable,
        volume: 20,
    }));
}

#[test]
fn pages_without_cues_never_play() {
    for persona in [
        PersonaId::Engineer,
        PersonaId::Guard,
        PersonaId::Programmer,
        PersonaId::Lawyer,
    ] {
        let mut state = desktop(persona);
        let effects = run_user(&mut state, UserAction::OpenApp(AppSlot::App1));
        assert!(cues(&effects).is_empty(), "{}", persona.id());
    }
}
