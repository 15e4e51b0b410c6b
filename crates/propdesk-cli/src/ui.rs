use std::io;
use std::sync::OnceLock;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;

use propdesk_core::camera::CameraState;
use propdesk_core::camera::CameraTimeline;
use propdesk_core::camera::FeedView;
use propdesk_core::camera::Noise;
use propdesk_core::content;
use propdesk_core::content::AppSlot;
use propdesk_core::content::ContentRegistry;
use propdesk_core::content::FolderSpec;
use propdesk_core::content::RenderPayload;
use propdesk_core::content::Surface;
use propdesk_core::content::Tone;
use propdesk_core::login::LoginStatus;
use propdesk_core::modal::ModalPhase;
use propdesk_core::sound::MAX_VOLUME;
use propdesk_core::ClickTarget;
use propdesk_core::DeskState;
use propdesk_core::Key;
use propdesk_core::KeyChord;
use propdesk_core::ModalView;
use propdesk_core::PersonaId;
use propdesk_core::Screen;
use propdesk_core::UserAction;
use propdesk_exec::shell::DesktopShell;

use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

const CODE_THEME: &str = "base16-ocean.dark";
const TILE_WIDTH: u16 = 24;
const TILE_HEIGHT: u16 = 3;
const VOLUME_STEP: u8 = 5;
const IDLE_POLL_MS: u64 = 250;

fn get_syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn get_theme_set() -> &'static ThemeSet {
    THEME_SET.get_or_init(ThemeSet::load_defaults)
}

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            crossterm::cursor::Show
        );
    }
}

pub fn run(shell: DesktopShell) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        crossterm::cursor::Hide
    )?;
    let _guard = TuiGuard; // restores the terminal on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, shell).map_err(|e| e.into())
}

/// Screen regions from the last frame, used to route mouse clicks.
#[derive(Debug, Default, Clone)]
struct HitAreas {
    modal: Option<Rect>,
    close_button: Option<Rect>,
    folder_items: Vec<Rect>,
    dock: Vec<(AppSlot, Rect)>,
    items: Vec<Rect>,
    login_button: Option<Rect>,
    prompt: Option<Rect>,
}

/// Terminal-side interaction state. Nothing here affects the simulation.
#[derive(Debug, Default)]
struct UiState {
    desktop_cursor: usize,
    folder_cursor: usize,
    panel_row: usize,
    scroll: u16,
    show_activity: bool,
    seen_generation: u64,
    hits: HitAreas,
    dirty: bool,
    quit: bool,
}

impl UiState {
    /// Resets per-window cursors whenever the modal stack moved on.
    fn sync(&mut self, state: &DeskState) {
        let generation = state.modals.generation();
        if generation != self.seen_generation {
            self.seen_generation = generation;
            self.folder_cursor = 0;
            self.panel_row = 0;
            self.scroll = 0;
            self.dirty = true;
        }
        let items = state.desktop.items.len();
        if items > 0 && self.desktop_cursor >= items {
            self.desktop_cursor = items - 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PanelControl {
    CodeField(String),
    Sound,
}

fn panel_controls(state: &DeskState) -> Vec<PanelControl> {
    let Some(ModalView::App { entry, .. }) = state.visible_view() else {
        return Vec::new();
    };
    let mut controls = Vec::new();
    for block in entry.body.blocks() {
        match block {
            content::Block::AccessPanel => {
                if let Some(gate) = &state.gate {
                    controls.extend(
                        gate.fields()
                            .iter()
                            .map(|field| PanelControl::CodeField(field.id.clone())),
                    );
                }
            }
            content::Block::SoundSettings if state.sound.available => {
                controls.push(PanelControl::Sound);
            }
            _ => {}
        }
    }
    controls
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn poll_timeout(shell: &DesktopShell, now_ms: u64) -> Duration {
    let wait = shell
        .next_timer_due()
        .map(|due| due.saturating_sub(now_ms))
        .unwrap_or(IDLE_POLL_MS)
        .min(IDLE_POLL_MS);
    Duration::from_millis(wait)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut shell: DesktopShell) -> io::Result<()> {
    let started = Instant::now();
    let mut ui = UiState {
        dirty: true,
        ..UiState::default()
    };

    while !ui.quit {
        shell.advance_to(elapsed_ms(started));
        ui.sync(shell.state());

        if shell.take_frame_request() || ui.dirty {
            terminal.draw(|f| draw(f, &shell, &mut ui))?;
            ui.dirty = false;
        }

        if event::poll(poll_timeout(&shell, elapsed_ms(started)))? {
            match event::read()? {
                Event::Key(key) => handle_key(key, &mut shell, &mut ui),
                Event::Mouse(mouse) => handle_mouse(mouse, &mut shell, &mut ui),
                Event::Resize(_, _) => ui.dirty = true,
                _ => {}
            }
        }
    }
    tracing::info!(persona = shell.state().persona.id(), "shell closed");
    Ok(())
}

fn chord_for(key: &KeyEvent) -> Option<KeyChord> {
    let code = match key.code {
        KeyCode::Esc => Key::Escape,
        KeyCode::Enter => Key::Enter,
        KeyCode::Char(c) => Key::Char(c),
        _ => return None,
    };
    Some(KeyChord {
        key: code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        meta: key
            .modifiers
            .intersects(KeyModifiers::SUPER | KeyModifiers::META),
    })
}

fn text_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
        {
            Some(c)
        }
        _ => None,
    }
}

fn step(cursor: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (cursor + 1) % len
    } else {
        (cursor + len - 1) % len
    }
}

fn handle_key(key: KeyEvent, shell: &mut DesktopShell, ui: &mut UiState) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    ui.dirty = true;
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        ui.quit = true;
        return;
    }
    match shell.state().screen {
        Screen::Lock => handle_lock_key(key, shell, ui),
        Screen::Desktop if shell.state().modals.visible().is_some() => {
            handle_modal_key(key, shell, ui)
        }
        Screen::Desktop => handle_desktop_key(key, shell, ui),
    }
}

fn handle_lock_key(key: KeyEvent, shell: &mut DesktopShell, ui: &mut UiState) {
    let (prompt_open, mut input) = match shell.state().login.as_ref() {
        Some(login) => (login.prompt_open(), login.input().to_string()),
        None => return,
    };
    if !prompt_open {
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => shell.user(UserAction::OpenLoginPrompt),
            KeyCode::Char('q') => ui.quit = true,
            _ => {}
        }
        return;
    }
    if key.code == KeyCode::Backspace {
        input.pop();
        shell.user(UserAction::SetLoginInput(input));
    } else if let Some(c) = text_char(&key) {
        input.push(c);
        shell.user(UserAction::SetLoginInput(input));
    } else if let Some(chord) = chord_for(&key) {
        shell.user(UserAction::Key(chord));
    }
}

fn handle_desktop_key(key: KeyEvent, shell: &mut DesktopShell, ui: &mut UiState) {
    let items = shell.state().desktop.items.len();
    match key.code {
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            if let Some(slot) = AppSlot::ALL.get(index) {
                shell.user(UserAction::OpenApp(*slot));
            }
        }
        KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
            ui.desktop_cursor = step(ui.desktop_cursor, items, false);
        }
        KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
            ui.desktop_cursor = step(ui.desktop_cursor, items, true);
        }
        KeyCode::Enter if items > 0 => {
            shell.user(UserAction::OpenDesktopItem(ui.desktop_cursor));
        }
        KeyCode::Char('a') => ui.show_activity = !ui.show_activity,
        KeyCode::Char('q') => ui.quit = true,
        _ => {}
    }
}

fn handle_modal_key(key: KeyEvent, shell: &mut DesktopShell, ui: &mut UiState) {
    if let Some(chord) = chord_for(&key) {
        if chord.dismisses() {
            shell.user(UserAction::Key(chord));
            return;
        }
    }
    let state = shell.state();
    let action = match state.visible_view() {
        Some(ModalView::Folder { spec, .. }) => folder_key(&key, spec.items.len(), ui),
        Some(ModalView::App { entry, .. }) if entry.body.hosts_camera_console() => {
            match state.timeline.as_ref() {
                Some(timeline) => camera_key(&key, timeline, ui),
                None => scroll_key(&key, ui),
            }
        }
        Some(ModalView::App { .. }) => panel_key(&key, state, ui),
        _ => scroll_key(&key, ui),
    };
    if let Some(action) = action {
        shell.user(action);
    }
}

fn scroll_key(key: &KeyEvent, ui: &mut UiState) -> Option<UserAction> {
    match key.code {
        KeyCode::Up => ui.scroll = ui.scroll.saturating_sub(1),
        KeyCode::Down => ui.scroll = ui.scroll.saturating_add(1),
        KeyCode::PageUp => ui.scroll = ui.scroll.saturating_sub(10),
        KeyCode::PageDown => ui.scroll = ui.scroll.saturating_add(10),
        KeyCode::Home => ui.scroll = 0,
        _ => {}
    }
    None
}

fn folder_key(key: &KeyEvent, len: usize, ui: &mut UiState) -> Option<UserAction> {
    match key.code {
        KeyCode::Up => ui.folder_cursor = step(ui.folder_cursor, len, false),
        KeyCode::Down | KeyCode::Tab => ui.folder_cursor = step(ui.folder_cursor, len, true),
        KeyCode::Enter if len > 0 => return Some(UserAction::OpenFolderItem(ui.folder_cursor)),
        _ => {}
    }
    None
}

fn camera_key(key: &KeyEvent, timeline: &CameraTimeline, ui: &mut UiState) -> Option<UserAction> {
    let mut selector = timeline.date_selector().to_string();
    match key.code {
        KeyCode::Enter => Some(UserAction::LoadCameraHistory),
        KeyCode::Backspace => {
            selector.pop();
            Some(UserAction::SetDateSelector(selector))
        }
        KeyCode::Char('[') | KeyCode::Char(']') => {
            let dates: Vec<String> = timeline.days().map(|day| day.date.to_string()).collect();
            let current = dates
                .iter()
                .position(|date| *date == selector)
                .or_else(|| {
                    let selected = timeline.selected().to_string();
                    dates.iter().position(|date| *date == selected)
                })
                .unwrap_or(0);
            let next = step(current, dates.len(), key.code == KeyCode::Char(']'));
            dates.get(next).cloned().map(UserAction::SetDateSelector)
        }
        _ => match text_char(key) {
            Some(c) if c.is_ascii_digit() || c == '-' => {
                selector.push(c);
                Some(UserAction::SetDateSelector(selector))
            }
            _ => scroll_key(key, ui),
        },
    }
}

fn panel_key(key: &KeyEvent, state: &DeskState, ui: &mut UiState) -> Option<UserAction> {
    let controls = panel_controls(state);
    let Some(control) = controls.get(ui.panel_row) else {
        return scroll_key(key, ui);
    };
    match key.code {
        KeyCode::Up => {
            ui.panel_row = step(ui.panel_row, controls.len(), false);
            return None;
        }
        KeyCode::Down | KeyCode::Tab => {
            ui.panel_row = step(ui.panel_row, controls.len(), true);
            return None;
        }
        _ => {}
    }
    match control {
        PanelControl::CodeField(id) => {
            let mut value = state
                .gate
                .as_ref()
                .and_then(|gate| gate.field(id))
                .map(|field| field.input().to_string())
                .unwrap_or_default();
            if key.code == KeyCode::Backspace {
                value.pop();
            } else if let Some(c) = text_char(key) {
                value.push(c);
            } else {
                return None;
            }
            Some(UserAction::SetCodeInput {
                field: id.clone(),
                value,
            })
        }
        PanelControl::Sound => match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                Some(UserAction::SetSoundEnabled(!state.sound.enabled))
            }
            KeyCode::Left | KeyCode::Char('-') => Some(UserAction::SetSoundVolume(
                state.sound.volume.saturating_sub(VOLUME_STEP),
            )),
            KeyCode::Right | KeyCode::Char('+') => Some(UserAction::SetSoundVolume(
                state.sound.volume.saturating_add(VOLUME_STEP).min(MAX_VOLUME),
            )),
            _ => None,
        },
    }
}

fn handle_mouse(mouse: MouseEvent, shell: &mut DesktopShell, ui: &mut UiState) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    ui.dirty = true;
    let at = Position::new(mouse.column, mouse.row);
    let hits = &ui.hits;
    let action = match shell.state().screen {
        Screen::Lock => match hits.prompt {
            Some(prompt) if prompt.contains(at) => Some(UserAction::OverlayClick(ClickTarget::ModalContent)),
            Some(_) => Some(UserAction::OverlayClick(ClickTarget::Backdrop)),
            None => hits
                .login_button
                .filter(|button| button.contains(at))
                .map(|_| UserAction::OpenLoginPrompt),
        },
        Screen::Desktop => match hits.modal {
            Some(modal) => {
                if hits.close_button.is_some_and(|button| button.contains(at)) {
                    Some(UserAction::CloseModal)
                } else if let Some(index) = hits.folder_items.iter().position(|r| r.contains(at)) {
                    Some(UserAction::OpenFolderItem(index))
                } else if modal.contains(at) {
                    Some(UserAction::OverlayClick(ClickTarget::ModalContent))
                } else {
                    Some(UserAction::OverlayClick(ClickTarget::Backdrop))
                }
            }
            None => {
                if let Some((slot, _)) = hits.dock.iter().find(|(_, r)| r.contains(at)) {
                    Some(UserAction::OpenApp(*slot))
                } else {
                    hits.items
                        .iter()
                        .position(|r| r.contains(at))
                        .map(UserAction::OpenDesktopItem)
                }
            }
        },
    };
    if let Some(action) = action {
        if let UserAction::OpenDesktopItem(index) = action {
            ui.desktop_cursor = index;
        }
        shell.user(action);
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    accent_alt: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    panel_bg: Color,
    selected_bg: Color,
}

fn palette_for(persona: PersonaId) -> UiPalette {
    let base = UiPalette {
        accent: Color::Cyan,
        accent_alt: Color::Blue,
        success: Color::Green,
        warning: Color::Yellow,
        danger: Color::Red,
        muted: Color::DarkGray,
        border: Color::Gray,
        panel_bg: Color::Black,
        selected_bg: Color::DarkGray,
    };
    match persona {
        PersonaId::Child => UiPalette {
            accent: Color::LightMagenta,
            accent_alt: Color::LightCyan,
            border: Color::Magenta,
            selected_bg: Color::Rgb(58, 0, 58),
            ..base
        },
        PersonaId::Engineer => UiPalette {
            accent: Color::LightYellow,
            accent_alt: Color::LightRed,
            border: Color::Yellow,
            selected_bg: Color::Rgb(42, 28, 0),
            ..base
        },
        PersonaId::Guard => UiPalette {
            accent: Color::LightGreen,
            accent_alt: Color::Green,
            border: Color::LightGreen,
            selected_bg: Color::Rgb(8, 32, 10),
            ..base
        },
        PersonaId::Programmer => UiPalette {
            accent: Color::LightBlue,
            accent_alt: Color::LightCyan,
            border: Color::LightBlue,
            selected_bg: Color::Rgb(18, 28, 42),
            ..base
        },
        PersonaId::Lawyer => base,
    }
}

fn tone_color(tone: Tone, palette: UiPalette) -> Color {
    match tone {
        Tone::Neutral => Color::Reset,
        Tone::Info => palette.accent_alt,
        Tone::Success => palette.success,
        Tone::Warning => palette.warning,
        Tone::Danger => palette.danger,
    }
}

fn draw(f: &mut ratatui::Frame, shell: &DesktopShell, ui: &mut UiState) {
    ui.hits = HitAreas::default();
    let state = shell.state();
    let palette = palette_for(state.persona);
    let area = f.area();
    f.render_widget(
        Block::default().style(Style::default().bg(palette.panel_bg)),
        area,
    );
    match state.screen {
        Screen::Lock => render_lock(f, area, state, palette, ui),
        Screen::Desktop => render_desktop(f, area, state, palette, ui),
    }
}

fn render_lock(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DeskState,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let Some(login) = state.login.as_ref() else {
        return;
    };
    let card = centered_rect(50, 40, area);
    let mut lines = vec![
        Line::from(Span::styled(
            state.title.clone(),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("🔒 Рабочая станция заблокирована"),
        Line::from(""),
    ];
    let button_row = lines.len() as u16;
    lines.push(Line::from(Span::styled(
        "[ Войти ]",
        Style::default()
            .fg(palette.accent_alt)
            .add_modifier(Modifier::BOLD),
    )));
    if let Some(hint) = &login.hint {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            hint.clone(),
            Style::default().fg(palette.muted),
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border));
    let inner = block.inner(card);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(block),
        card,
    );
    ui.hits.login_button = Some(Rect::new(
        inner.x,
        inner.y.saturating_add(button_row),
        inner.width,
        1,
    ));

    if !login.prompt_open() {
        return;
    }
    let prompt = centered_rect(40, 24, area);
    f.render_widget(Clear, prompt);
    let masked: String = login.input().chars().map(|_| '•').collect();
    let mut prompt_lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::raw("Пароль: "),
            Span::styled(
                format!("{masked}▏"),
                Style::default().bg(palette.selected_bg),
            ),
        ]),
        Line::from(""),
    ];
    if let Some(message) = login.message() {
        let color = match login.status() {
            LoginStatus::Accepted => palette.success,
            _ => palette.danger,
        };
        prompt_lines.push(Line::from(Span::styled(
            message,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
    }
    let border = match login.status() {
        LoginStatus::Rejected { .. } => palette.danger,
        LoginStatus::Accepted => palette.success,
        LoginStatus::Idle => palette.accent,
    };
    f.render_widget(
        Paragraph::new(prompt_lines)
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(" Введите пароль "),
            ),
        prompt,
    );
    ui.hits.prompt = Some(prompt);
}

fn render_desktop(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DeskState,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Length(1),
        ])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            format!(" {} ", state.title),
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {}", state.persona.id()),
            Style::default().fg(palette.muted),
        ),
    ]);
    f.render_widget(Paragraph::new(title), chunks[0]);

    let desk_area = if ui.show_activity {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);
        render_activity(f, cols[1], state, palette);
        cols[0]
    } else {
        chunks[1]
    };
    render_icons(f, desk_area, state, palette, ui);
    render_dock(f, chunks[2], state, palette, ui);
    render_help(f, chunks[3], state, palette);

    if let Some(modal) = state.modals.phase().modal() {
        if let Some(view) = state.views.get(&modal) {
            render_modal(f, chunks[1], state, view, palette, ui);
        }
    }
}

fn render_icons(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DeskState,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.muted))
        .title(" Рабочий стол ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let columns = (inner.width / TILE_WIDTH).max(1);
    for (index, item) in state.desktop.items.iter().enumerate() {
        let col = index as u16 % columns;
        let row = index as u16 / columns;
        let tile = Rect::new(
            inner.x + col * TILE_WIDTH,
            inner.y + row * TILE_HEIGHT,
            TILE_WIDTH.saturating_sub(1).min(inner.width),
            TILE_HEIGHT,
        );
        if tile.bottom() > inner.bottom() {
            break;
        }
        let selected = index == ui.desktop_cursor && state.modals.visible().is_none();
        let style = if selected {
            Style::default()
                .fg(palette.accent)
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let icon = item.icon.as_deref().unwrap_or("📄");
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(
                format!("{icon} {}", item.name),
                style,
            )))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(if selected {
                        palette.accent
                    } else {
                        palette.border
                    })),
            ),
            tile,
        );
        ui.hits.items.push(tile);
    }
}

fn render_dock(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DeskState,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);
    let active = match state.visible_view() {
        Some(ModalView::App { slot, .. }) => Some(*slot),
        _ => None,
    };
    for (slot, rect) in AppSlot::ALL.into_iter().zip(slots.iter()) {
        let entry = state
            .desktop
            .dock
            .iter()
            .find(|(dock_slot, _)| *dock_slot == slot)
            .map(|(_, entry)| entry);
        let label = match entry {
            Some(entry) => format!(
                "{} {} {}",
                slot.index() + 1,
                entry.icon.as_deref().unwrap_or(""),
                entry.label
            ),
            None => format!("{} {}", slot.index() + 1, state.registry.app(slot).title),
        };
        let color = if active == Some(slot) {
            palette.accent
        } else {
            palette.border
        };
        f.render_widget(
            Paragraph::new(label).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color)),
            ),
            *rect,
        );
        ui.hits.dock.push((slot, *rect));
    }
}

fn render_help(f: &mut ratatui::Frame, area: Rect, state: &DeskState, palette: UiPalette) {
    let text = match state.visible_view() {
        None => "1-4 приложения · ←/→ Enter ярлыки · a журнал · q выход",
        Some(ModalView::Folder { .. }) => "↑/↓ Enter открыть · Esc / Ctrl+W закрыть",
        Some(ModalView::App { entry, .. }) if entry.body.hosts_camera_console() => {
            "[ ] дата · цифры ввод · Enter загрузить · Esc закрыть"
        }
        Some(ModalView::App { entry, .. })
            if entry.body.hosts_access_panel() || entry.body.hosts_sound_settings() =>
        {
            "↑/↓ поле · ввод кода · пробел звук · ←/→ громкость · Esc закрыть"
        }
        Some(_) => "↑/↓ прокрутка · Esc / Ctrl+W закрыть",
    };
    f.render_widget(
        Paragraph::new(Span::styled(text, Style::default().fg(palette.muted))),
        area,
    );
}

fn render_activity(f: &mut ratatui::Frame, area: Rect, state: &DeskState, palette: UiPalette) {
    let rows = area.height.saturating_sub(2) as usize;
    let mut lines: Vec<Line> = state
        .activity
        .iter()
        .rev()
        .take(rows)
        .map(|entry| {
            let color = match entry.level {
                propdesk_core::ActivityLevel::Debug => palette.muted,
                propdesk_core::ActivityLevel::Info => palette.accent_alt,
                propdesk_core::ActivityLevel::Warn => palette.warning,
            };
            Line::from(vec![
                Span::styled(
                    format!("#{} {} ", entry.seq, entry.source.label()),
                    Style::default().fg(color),
                ),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();
    lines.reverse();
    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.muted))
                .title(" Журнал "),
        ),
        area,
    );
}

fn render_modal(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &DeskState,
    view: &ModalView,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let phase = state.modals.phase();
    let settled = matches!(phase, ModalPhase::Open { .. });
    let rect = if settled {
        centered_rect(80, 86, area)
    } else {
        centered_rect(68, 72, area)
    };
    f.render_widget(Clear, rect);
    let border = if settled { palette.accent } else { palette.muted };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(Span::styled(
            format!(" {} ", view.title()),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .title_top(Line::from(" [x] ").right_aligned());
    let inner = block.inner(rect);
    f.render_widget(block, rect);
    ui.hits.modal = Some(rect);
    ui.hits.close_button = Some(Rect::new(rect.right().saturating_sub(6), rect.y, 5, 1));

    match view {
        ModalView::Folder { spec, .. } => render_folder(f, inner, spec, palette, ui),
        ModalView::App { entry, .. } | ModalView::Document { entry, .. } => {
            let lines = body_lines(&entry.body, state, palette, ui.panel_row);
            f.render_widget(
                Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((ui.scroll, 0)),
                inner,
            );
        }
    }
}

fn render_folder(
    f: &mut ratatui::Frame,
    area: Rect,
    spec: &FolderSpec,
    palette: UiPalette,
    ui: &mut UiState,
) {
    let mut lines = Vec::new();
    for (index, item) in spec.items.iter().enumerate() {
        let row = area.y.saturating_add(index as u16);
        if row >= area.bottom() {
            break;
        }
        let style = if index == ui.folder_cursor {
            Style::default()
                .fg(palette.accent)
                .bg(palette.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let icon = item.icon.as_deref().unwrap_or("📄");
        lines.push(Line::from(Span::styled(
            format!(" {icon} {}", item.label),
            style,
        )));
        ui.hits.folder_items.push(Rect::new(area.x, row, area.width, 1));
    }
    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            " Папка пуста",
            Style::default().fg(palette.muted),
        )));
    }
    f.render_widget(Paragraph::new(lines), area);
}

fn body_lines(
    body: &RenderPayload,
    state: &DeskState,
    palette: UiPalette,
    panel_row: usize,
) -> Vec<Line<'static>> {
    let mut out = Vec::new();
    let mut control = 0usize;
    for block in body.blocks() {
        match block {
            content::Block::Heading { text } => {
                out.push(Line::from(Span::styled(
                    text.clone(),
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::BOLD),
                )));
                out.push(Line::from(""));
            }
            content::Block::Paragraph { text } => {
                out.extend(text.lines().map(|line| Line::from(line.to_string())));
                out.push(Line::from(""));
            }
            content::Block::Notice { tone, text } => {
                let style = Style::default()
                    .fg(tone_color(*tone, palette))
                    .add_modifier(Modifier::BOLD);
                for line in text.lines() {
                    out.push(Line::from(vec![
                        Span::styled("▌ ", style),
                        Span::styled(line.to_string(), style),
                    ]));
                }
                out.push(Line::from(""));
            }
            content::Block::List { items } => {
                out.extend(items.iter().map(|item| Line::from(format!("  • {item}"))));
                out.push(Line::from(""));
            }
            content::Block::Divider => {
                out.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(palette.muted),
                )));
            }
            content::Block::Code {
                language,
                filename,
                source,
            } => render_code_block(&mut out, source, language, filename.as_deref(), palette),
            content::Block::LogRecord {
                stamp,
                level,
                tone,
                lines,
            } => {
                out.push(Line::from(vec![
                    Span::styled(format!("[{stamp}] "), Style::default().fg(palette.muted)),
                    Span::styled(
                        level.clone(),
                        Style::default()
                            .fg(tone_color(*tone, palette))
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
                for line in lines {
                    out.push(Line::from(Span::styled(
                        format!("  {}", line.text),
                        Style::default().fg(tone_color(line.tone, palette)),
                    )));
                }
                out.push(Line::from(""));
            }
            content::Block::Mail {
                from,
                date,
                subject,
                paragraphs,
                signature,
                footer,
            } => {
                let label = Style::default().fg(palette.muted);
                out.push(Line::from(vec![Span::styled("От: ", label), Span::raw(from.clone())]));
                out.push(Line::from(vec![Span::styled("Дата: ", label), Span::raw(date.clone())]));
                out.push(Line::from(vec![
                    Span::styled("Тема: ", label),
                    Span::styled(subject.clone(), Style::default().add_modifier(Modifier::BOLD)),
                ]));
                out.push(Line::from(""));
                for paragraph in paragraphs {
                    out.push(Line::from(paragraph.clone()));
                    out.push(Line::from(""));
                }
                out.extend(signature.lines().map(|line| Line::from(line.to_string())));
                if let Some(footer) = footer {
                    out.push(Line::from(""));
                    out.push(Line::from(Span::styled(footer.clone(), label)));
                }
                out.push(Line::from(""));
            }
            content::Block::AccessPanel => {
                if let Some(gate) = &state.gate {
                    let tone = if gate.all_unlocked() {
                        Tone::Success
                    } else {
                        Tone::Warning
                    };
                    out.push(Line::from(Span::styled(
                        gate.banner().to_string(),
                        Style::default()
                            .fg(tone_color(tone, palette))
                            .add_modifier(Modifier::BOLD),
                    )));
                    out.push(Line::from(""));
                    for field in gate.fields() {
                        let selected = control == panel_row;
                        control += 1;
                        let input_style = if selected {
                            Style::default().bg(palette.selected_bg).fg(palette.accent)
                        } else {
                            Style::default().bg(palette.selected_bg)
                        };
                        out.push(Line::from(vec![
                            Span::raw(if selected { "› " } else { "  " }),
                            Span::raw(format!("{:<14}", field.label)),
                            Span::styled(format!(" {:<16}", field.input()), input_style),
                            Span::raw(format!(" {}", field.status().symbol())),
                        ]));
                    }
                    out.push(Line::from(""));
                }
            }
            content::Block::CameraConsole => {
                if let Some(timeline) = &state.timeline {
                    camera_lines(&mut out, timeline, &state.registry, palette);
                }
            }
            content::Block::SoundSettings => {
                if !state.sound.available {
                    out.push(Line::from(Span::styled(
                        "🔇 Звуковые эффекты недоступны",
                        Style::default().fg(palette.muted),
                    )));
                    continue;
                }
                let selected = control == panel_row;
                control += 1;
                let filled = usize::from(state.sound.volume / VOLUME_STEP);
                let empty = usize::from(MAX_VOLUME / VOLUME_STEP).saturating_sub(filled);
                let switch = if state.sound.enabled { "[вкл]" } else { "[выкл]" };
                let style = if selected {
                    Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                out.push(Line::from(vec![
                    Span::raw(if selected { "› " } else { "  " }),
                    Span::styled(format!("🔊 Звук {switch}  Громкость "), style),
                    Span::styled("█".repeat(filled), Style::default().fg(palette.accent_alt)),
                    Span::styled("░".repeat(empty), Style::default().fg(palette.muted)),
                    Span::raw(format!(" {}%", state.sound.volume)),
                ]));
                out.push(Line::from(""));
            }
        }
    }
    out
}

fn camera_lines(
    out: &mut Vec<Line<'static>>,
    timeline: &CameraTimeline,
    registry: &ContentRegistry,
    palette: UiPalette,
) {
    let button = if timeline.load_busy() {
        Span::styled("[ Загрузка... ]", Style::default().fg(palette.muted))
    } else {
        Span::styled(
            "[ Загрузить ]",
            Style::default()
                .fg(palette.accent_alt)
                .add_modifier(Modifier::BOLD),
        )
    };
    out.push(Line::from(vec![
        Span::raw("Дата: "),
        Span::styled(
            format!("{}▏", timeline.date_selector()),
            Style::default().bg(palette.selected_bg),
        ),
        Span::raw("  "),
        button,
    ]));
    let known: Vec<String> = timeline
        .days()
        .map(|day| day.date.format("%d.%m").to_string())
        .collect();
    out.push(Line::from(Span::styled(
        format!("Записи: {}", known.join(" · ")),
        Style::default().fg(palette.muted),
    )));
    out.push(Line::from(""));

    out.push(Line::from(Span::styled(
        timeline.history_title(),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )));
    for event in timeline.events() {
        out.push(Line::from(vec![
            Span::raw(format!("{} ", event.severity.icon())),
            Span::styled(format!("{} ", event.time), Style::default().fg(palette.muted)),
            Span::styled(
                event.message.clone(),
                Style::default().fg(tone_color(event.severity.tone(), palette)),
            ),
        ]));
    }
    if timeline.upload_area_visible() {
        out.push(Line::from(""));
        out.push(Line::from(Span::styled(
            "📤 Область загрузки дополнительных фотографий",
            Style::default().fg(palette.success),
        )));
    }
    out.push(Line::from(""));

    for camera in timeline.cameras() {
        let Some(feed) = timeline.feed(&camera.id) else {
            continue;
        };
        let title = registry.resolve(Surface::CameraTab, &camera.id).title.clone();
        match feed {
            FeedView::Live(frame) => {
                let color = tone_color(frame.border, palette);
                let state = match frame.state {
                    CameraState::Normal => "норма",
                    CameraState::Anomalous => "АНОМАЛИЯ",
                };
                let noise = match frame.noise {
                    Noise::Low => "шум низкий",
                    Noise::High => "шум высокий",
                };
                out.push(Line::from(vec![
                    Span::styled(
                        format!("● {} ", feed.label()),
                        Style::default().fg(palette.danger),
                    ),
                    Span::styled(
                        title,
                        Style::default().fg(color).add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  {} · {} · {}", frame.stamp_label(), state, noise),
                        Style::default().fg(color),
                    ),
                ]));
                if frame.glitch {
                    out.push(Line::from(Span::styled(
                        "    ▒▓░ помехи ░▓▒",
                        Style::default().fg(palette.danger),
                    )));
                }
                if let Some(caption) = &frame.caption {
                    out.push(Line::from(Span::styled(
                        format!("    {caption}"),
                        Style::default()
                            .fg(palette.warning)
                            .add_modifier(Modifier::BOLD),
                    )));
                }
            }
            _ => {
                out.push(Line::from(vec![
                    Span::raw(format!("  {title} ")),
                    Span::styled(feed.label(), Style::default().fg(palette.muted)),
                ]));
            }
        }
    }
}

fn render_code_block(
    out: &mut Vec<Line<'static>>,
    source: &str,
    language: &str,
    filename: Option<&str>,
    palette: UiPalette,
) {
    out.push(Line::from(Span::styled(
        format!("  {} ({language})", filename.unwrap_or("")),
        Style::default().fg(palette.muted),
    )));
    let ps = get_syntax_set();
    let syntax = ps
        .find_syntax_by_token(language)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let Some(theme) = get_theme_set().themes.get(CODE_THEME) else {
        out.extend(source.lines().map(|line| {
            Line::from(Span::styled(
                format!("  {line}"),
                Style::default().fg(palette.accent_alt),
            ))
        }));
        return;
    };
    let mut h = HighlightLines::new(syntax, theme);
    for line in LinesWithEndings::from(source) {
        let ranges: Vec<(syntect::highlighting::Style, &str)> =
            h.highlight_line(line, ps).unwrap_or_default();
        let mut spans = vec![Span::raw("  ")];
        for (style, text) in ranges {
            let fg = Color::Rgb(style.foreground.r, style.foreground.g, style.foreground.b);
            spans.push(Span::styled(
                text.trim_end_matches('\n').to_string(),
                Style::default().fg(fg).bg(palette.selected_bg),
            ));
        }
        out.push(Line::from(spans));
    }
    out.push(Line::from(""));
}

fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    r: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use propdesk_core::config::Config;
    use propdesk_core::config::SoundConfig;
    use propdesk_core::config::TimingConfig;
    use propdesk_core::content::ContentEntry;
    use propdesk_core::content::RegistryDefaults;
    use propdesk_core::PersonaTable;
    use propdesk_exec::cues::SilentCues;
    use propdesk_exec::timers::FeedLatency;
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    use super::*;

    fn shell(persona: PersonaId) -> DesktopShell {
        DesktopShell::for_persona(
            persona,
            &Config::default(),
            Box::new(SilentCues),
            FeedLatency::seeded(3),
        )
        .expect("builtin persona starts")
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn screen_text(shell: &DesktopShell, ui: &mut UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("test terminal");
        terminal.draw(|f| draw(f, shell, ui)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn close_chord_maps_ctrl_w() {
        let chord = chord_for(&KeyEvent::new(KeyCode::Char('w'), KeyModifiers::CONTROL))
            .expect("chord");
        assert!(chord.is_close_chord());
        assert_eq!(chord_for(&press(KeyCode::Left)), None);
    }

    #[test]
    fn digit_keys_open_dock_apps() {
        let mut shell = shell(PersonaId::Engineer);
        let mut ui = UiState::default();
        handle_key(press(KeyCode::Char('2')), &mut shell, &mut ui);
        match shell.state().visible_view() {
            Some(ModalView::App { slot, .. }) => assert_eq!(*slot, AppSlot::App2),
            other => panic!("expected app view, got {other:?}"),
        }
    }

    #[test]
    fn typing_in_the_access_panel_sets_the_selected_field() {
        let mut shell = shell(PersonaId::Child);
        let mut ui = UiState::default();
        handle_key(press(KeyCode::Enter), &mut shell, &mut ui);
        for c in "eNot278GHq".chars() {
            handle_key(press(KeyCode::Char(c)), &mut shell, &mut ui);
        }
        handle_key(press(KeyCode::Enter), &mut shell, &mut ui);
        shell.advance_by(1_500);
        assert_eq!(shell.state().screen, Screen::Desktop);

        handle_key(press(KeyCode::Char('1')), &mut shell, &mut ui);
        ui.sync(shell.state());
        assert_eq!(
            panel_controls(shell.state()).first(),
            Some(&PanelControl::CodeField("chemist".to_string()))
        );
        for c in "qwerty123".chars() {
            handle_key(press(KeyCode::Char(c)), &mut shell, &mut ui);
        }
        let gate = shell.state().gate.as_ref().expect("child gate");
        assert!(gate.field("chemist").map(|field| field.verified()).unwrap_or(false));
    }

    #[test]
    fn lock_screen_renders_the_login_button() {
        let shell = shell(PersonaId::Child);
        let mut ui = UiState::default();
        let text = screen_text(&shell, &mut ui);
        assert!(text.contains("Войти"));
        assert!(ui.hits.login_button.is_some());
        assert!(ui.hits.prompt.is_none());
    }

    #[test]
    fn backdrop_click_closes_the_modal() {
        let mut shell = shell(PersonaId::Lawyer);
        let mut ui = UiState::default();
        shell.user(UserAction::OpenApp(AppSlot::App2));
        shell.advance_by(300);
        let text = screen_text(&shell, &mut ui);
        assert!(text.contains("Всего писем: 1"));

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 1,
            modifiers: KeyModifiers::NONE,
        };
        handle_mouse(click, &mut shell, &mut ui);
        assert!(matches!(
            shell.state().modals.phase(),
            ModalPhase::Closing { .. }
        ));
    }

    #[test]
    fn date_keys_cycle_through_known_days() {
        let mut shell = shell(PersonaId::Guard);
        let mut ui = UiState::default();
        shell.user(UserAction::OpenApp(AppSlot::App3));
        handle_key(press(KeyCode::Char(']')), &mut shell, &mut ui);
        let timeline = shell.state().timeline.as_ref().expect("guard timeline");
        assert_eq!(timeline.date_selector(), "2024-06-22");
        handle_key(press(KeyCode::Enter), &mut shell, &mut ui);
        let timeline = shell.state().timeline.as_ref().expect("guard timeline");
        assert_eq!(timeline.selected().to_string(), "2024-06-22");
        assert!(timeline.load_busy());
    }

    #[test]
    fn camera_titles_come_from_the_registry() {
        let mut state = DeskState::new(
            PersonaTable::builtin(PersonaId::Guard).expect("guard table"),
            TimingConfig::default(),
            &SoundConfig::default(),
        )
        .expect("guard state");
        state.registry = ContentRegistry::new(RegistryDefaults::default());
        state
            .registry
            .insert_camera_tab("camera2", ContentEntry::new("Склад B", ""));

        let timeline = state.timeline.as_ref().expect("guard timeline");
        let mut out = Vec::new();
        camera_lines(&mut out, timeline, &state.registry, palette_for(PersonaId::Guard));
        let text: Vec<String> = out.iter().map(|line| line.to_string()).collect();

        let idle = FeedView::Idle.label();
        assert!(text.contains(&format!("  Склад B {idle}")));
        let fallback = format!("  Камера {idle}");
        assert_eq!(text.iter().filter(|line| **line == fallback).count(), 3);
    }
}
