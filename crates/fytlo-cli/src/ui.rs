use std::io;
use std::time::Duration;
use std::time::Instant;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use ratatui::Terminal;

use fytlo_core::actions::UserAction;
use fytlo_core::messages;
use fytlo_core::state::{
    GarmentSlot, ImageHandle, PickOutcome, PickSource, PickTarget, PreviewSelection, Route,
    SessionState,
};
use fytlo_exec::contracts::ImagePicker;
use fytlo_exec::picker::FilePicker;
use fytlo_exec::runtime::SessionRuntime;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run(session: SessionRuntime) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard; // Ensures terminal is restored on exit or panic

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    run_app(&mut terminal, &mut app).map_err(|e| e.into())
}

/// Presentation-only state. Everything else lives in the session.
enum Overlay {
    None,
    PathInput { target: PickTarget, input: String },
}

struct App {
    session: SessionRuntime,
    picker: FilePicker,
    overlay: Overlay,
    generating_since: Option<Instant>,
}

enum KeyHandlerResult {
    Continue,
    Exit,
}

impl App {
    fn new(session: SessionRuntime) -> Self {
        Self {
            session,
            picker: FilePicker,
            overlay: Overlay::None,
            generating_since: None,
        }
    }

    fn state(&self) -> &SessionState {
        self.session.state()
    }

    fn dispatch(&mut self, action: UserAction) {
        self.session.dispatch(action);
    }

    fn finish_pick(&mut self, target: PickTarget, outcome: PickOutcome) {
        self.dispatch(UserAction::PickerFinished { target, outcome });
    }

    fn open_path_input(&mut self, target: PickTarget) {
        self.overlay = Overlay::PathInput {
            target,
            input: String::new(),
        };
    }

    /// Opens the picker for a garment slot unless the slot is locked for
    /// this generation cycle.
    fn pick_garment(&mut self, slot: GarmentSlot) {
        if self.state().is_slot_locked(slot) {
            self.dispatch(UserAction::ShowToast {
                message: messages::ONE_SWAP_AT_A_TIME.to_string(),
                duration: None,
            });
            return;
        }
        self.open_path_input(PickTarget::Garment(slot));
    }

    fn track_generation(&mut self) {
        match (self.state().route, self.generating_since) {
            (Route::Generating, None) => self.generating_since = Some(Instant::now()),
            (Route::Generating, Some(_)) => {}
            (_, _) => self.generating_since = None,
        }
    }
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut force_redraw = true;
    loop {
        app.session.drain();
        app.track_generation();

        let frame_requested = app.session.take_frame_request();
        if force_redraw || frame_requested || app.generating_since.is_some() {
            terminal.draw(|f| ui(f, app))?;
            force_redraw = false;
        }

        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let KeyHandlerResult::Exit = handle_key_event(key, app) {
                        return Ok(());
                    }
                    force_redraw = true;
                }
                Event::Resize(_, _) => force_redraw = true,
                _ => {}
            }
        }
    }
}

fn handle_key_event(key: KeyEvent, app: &mut App) -> KeyHandlerResult {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    if let Overlay::PathInput { .. } = app.overlay {
        handle_path_input_keys(key, app);
        return KeyHandlerResult::Continue;
    }
    // The consent modal swallows everything else until answered.
    if app.state().show_auto_save_prompt {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                app.dispatch(UserAction::AnswerAutoSavePrompt { enabled: true })
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.dispatch(UserAction::AnswerAutoSavePrompt { enabled: false })
            }
            _ => {}
        }
        return KeyHandlerResult::Continue;
    }
    if key.code == KeyCode::Char('q') {
        return KeyHandlerResult::Exit;
    }

    match app.state().route {
        Route::Welcome => handle_welcome_keys(key, app),
        Route::BodyUpload => handle_body_upload_keys(key, app),
        Route::OutfitBuilder => handle_outfit_builder_keys(key, app),
        Route::Generating => handle_generating_keys(key, app),
    }
    KeyHandlerResult::Continue
}

fn handle_path_input_keys(key: KeyEvent, app: &mut App) {
    let Overlay::PathInput { target, input } = &mut app.overlay else {
        return;
    };
    match key.code {
        KeyCode::Char(c) => input.push(c),
        KeyCode::Backspace => {
            input.pop();
        }
        KeyCode::Esc => {
            let target = *target;
            app.overlay = Overlay::None;
            app.finish_pick(target, PickOutcome::Cancelled);
        }
        KeyCode::Enter => {
            let target = *target;
            let path = std::path::PathBuf::from(input.trim());
            app.overlay = Overlay::None;
            let outcome = app.picker.pick(PickSource::Library, Some(&path));
            app.finish_pick(target, outcome);
        }
        _ => {}
    }
}

fn handle_welcome_keys(key: KeyEvent, app: &mut App) {
    if key.code == KeyCode::Enter {
        app.dispatch(UserAction::GoToBodyUpload);
    }
}

fn handle_body_upload_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('c') => {
            let outcome = app.picker.pick(PickSource::Camera, None);
            app.finish_pick(PickTarget::Body, outcome);
        }
        KeyCode::Char('p') => app.open_path_input(PickTarget::Body),
        KeyCode::Char('x') => app.dispatch(UserAction::SetBodyImage(None)),
        KeyCode::Enter => app.dispatch(UserAction::ContinueFromBodyUpload),
        KeyCode::Esc => app.dispatch(UserAction::GoToWelcome),
        _ => {}
    }
}

fn handle_outfit_builder_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('t') => app.pick_garment(GarmentSlot::Top),
        KeyCode::Char('b') => app.pick_garment(GarmentSlot::Bottom),
        KeyCode::Char('T') => app.dispatch(UserAction::SetGarment {
            slot: GarmentSlot::Top,
            image: None,
        }),
        KeyCode::Char('B') => app.dispatch(UserAction::SetGarment {
            slot: GarmentSlot::Bottom,
            image: None,
        }),
        KeyCode::Char('g') | KeyCode::Enter => app.dispatch(UserAction::Generate),
        KeyCode::Tab => app.dispatch(UserAction::TogglePreview),
        KeyCode::Left => app.dispatch(UserAction::SetPreview(PreviewSelection::Before)),
        KeyCode::Right => app.dispatch(UserAction::SetPreview(PreviewSelection::After)),
        KeyCode::Char('n') | KeyCode::Esc => app.dispatch(UserAction::GoToBodyUpload),
        _ => {}
    }
}

fn handle_generating_keys(key: KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('x') => app.dispatch(UserAction::CancelGeneration),
        KeyCode::Char('n') | KeyCode::Esc => app.dispatch(UserAction::GoToBodyUpload),
        _ => {}
    }
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    muted: Color,
    border: Color,
}

const PALETTE: UiPalette = UiPalette {
    accent: Color::Cyan,
    success: Color::Green,
    warning: Color::Yellow,
    muted: Color::DarkGray,
    border: Color::Gray,
};

fn ui(f: &mut ratatui::Frame, app: &App) {
    let state = app.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Toast
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], state, PALETTE);
    match state.route {
        Route::Welcome => render_welcome(f, chunks[1], PALETTE),
        Route::BodyUpload => render_body_upload(f, chunks[1], state, PALETTE),
        Route::OutfitBuilder => render_outfit_builder(f, chunks[1], state, PALETTE),
        Route::Generating => render_generating(f, chunks[1], app, PALETTE),
    }
    render_toast(f, chunks[2], state, PALETTE);
    render_footer(f, chunks[3], app, PALETTE);

    if state.show_auto_save_prompt {
        render_auto_save_prompt(f, PALETTE);
    }
    if let Overlay::PathInput { target, input } = &app.overlay {
        render_path_input(f, *target, input, PALETTE);
    }
}

fn panel(title: &str, palette: UiPalette) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title(title)
}

fn image_label(image: Option<&ImageHandle>) -> String {
    match image {
        Some(image) => format!(
            "{} ({}x{})",
            image.display_name(),
            image.width(),
            image.height()
        ),
        None => "none".to_string(),
    }
}

fn render_header(f: &mut ratatui::Frame, area: Rect, state: &SessionState, palette: UiPalette) {
    let text = Line::from(vec![
        Span::styled(
            "Fytlo",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" | ", Style::default().fg(palette.muted)),
        Span::raw(state.route.label()),
        Span::styled(" | auto-save ", Style::default().fg(palette.muted)),
        Span::raw(state.auto_save_preference.label()),
    ]);
    f.render_widget(Paragraph::new(text).block(panel("", palette)), area);
}

fn render_welcome(f: &mut ratatui::Frame, area: Rect, palette: UiPalette) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "See an outfit on you before you buy it.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Upload one full-body photo, then swap a top or a bottom."),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to start",
            Style::default().fg(palette.accent),
        )),
    ];
    let p = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel("Welcome", palette));
    f.render_widget(p, area);
}

fn render_body_upload(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &SessionState,
    palette: UiPalette,
) {
    let status = if state.can_continue_from_body_upload() {
        Span::styled("Ready. Press Enter to continue.", Style::default().fg(palette.success))
    } else {
        Span::styled(messages::ADD_FULL_BODY_PHOTO, Style::default().fg(palette.muted))
    };
    let lines = vec![
        Line::from(vec![
            Span::styled("Photo: ", Style::default().fg(palette.accent)),
            Span::raw(image_label(state.body_image.as_ref())),
        ]),
        Line::from(""),
        Line::from("Head-to-shoes, facing the camera, plain background."),
        Line::from(""),
        Line::from(status),
    ];
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel("Full-body photo", palette));
    f.render_widget(p, area);
}

fn slot_line(state: &SessionState, slot: GarmentSlot, palette: UiPalette) -> Line<'static> {
    let marker = if state.dirty_slot.slot() == Some(slot) {
        Span::styled(" [changed]", Style::default().fg(palette.success))
    } else if state.is_slot_locked(slot) {
        Span::styled(" [locked]", Style::default().fg(palette.muted))
    } else {
        Span::raw("")
    };
    Line::from(vec![
        Span::styled(format!("{:<7}", slot.label()), Style::default().fg(palette.accent)),
        Span::raw(image_label(state.garment(slot))),
        marker,
    ])
}

fn render_outfit_builder(
    f: &mut ratatui::Frame,
    area: Rect,
    state: &SessionState,
    palette: UiPalette,
) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut slots = vec![
        Line::from(vec![
            Span::styled(format!("{:<7}", "Body"), Style::default().fg(palette.accent)),
            Span::raw(image_label(state.body_image.as_ref())),
        ]),
        Line::from(""),
        slot_line(state, GarmentSlot::Top, palette),
        slot_line(state, GarmentSlot::Bottom, palette),
        Line::from(""),
    ];
    slots.push(if state.can_generate() {
        Line::from(Span::styled("Press g to generate", Style::default().fg(palette.success)))
    } else {
        Line::from(Span::styled(messages::ADD_GARMENT, Style::default().fg(palette.muted)))
    });
    f.render_widget(
        Paragraph::new(slots)
            .wrap(Wrap { trim: true })
            .block(panel("Outfit", palette)),
        columns[0],
    );

    let preview_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(columns[1]);
    let selected = match state.selected_preview {
        PreviewSelection::Before => 0,
        PreviewSelection::After => 1,
    };
    let tabs = Tabs::new(vec![
        PreviewSelection::Before.label(),
        PreviewSelection::After.label(),
    ])
    .block(panel("Preview", palette))
    .select(selected)
    .highlight_style(
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    );
    f.render_widget(tabs, preview_chunks[0]);

    let preview = match state.preview_image() {
        Some(image) => image_label(Some(image)),
        None => "No result yet".to_string(),
    };
    f.render_widget(
        Paragraph::new(preview)
            .alignment(Alignment::Center)
            .block(panel("", palette)),
        preview_chunks[1],
    );
}

fn render_generating(f: &mut ratatui::Frame, area: Rect, app: &App, palette: UiPalette) {
    let elapsed = app
        .generating_since
        .map(|since| since.elapsed())
        .unwrap_or_default();
    let frame = SPINNER[(elapsed.as_millis() / 120) as usize % SPINNER.len()];
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("{frame} Generating your look"),
            Style::default().fg(palette.accent),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("{:.1}s", elapsed.as_secs_f32()),
            Style::default().fg(palette.muted),
        )),
    ];
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(panel("Generating", palette)),
        area,
    );
}

fn render_toast(f: &mut ratatui::Frame, area: Rect, state: &SessionState, palette: UiPalette) {
    if !state.toast.is_visible {
        return;
    }
    let p = Paragraph::new(state.toast.message.as_str())
        .style(Style::default().fg(palette.warning))
        .alignment(Alignment::Center)
        .block(panel("", palette));
    f.render_widget(p, area);
}

fn key_hints(app: &App) -> &'static [(&'static str, &'static str)] {
    if let Overlay::PathInput { .. } = app.overlay {
        return &[("Enter", "pick"), ("Esc", "cancel")];
    }
    if app.state().show_auto_save_prompt {
        return &[("y", "yes"), ("n", "no")];
    }
    match app.state().route {
        Route::Welcome => &[("Enter", "start"), ("q", "quit")],
        Route::BodyUpload => &[
            ("c", "camera"),
            ("p", "photos"),
            ("x", "clear"),
            ("Enter", "continue"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        Route::OutfitBuilder => &[
            ("t/b", "top/bottom"),
            ("T/B", "clear"),
            ("g", "generate"),
            ("Tab", "before/after"),
            ("n", "new photo"),
            ("q", "quit"),
        ],
        Route::Generating => &[("x", "cancel"), ("n", "new photo"), ("q", "quit")],
    }
}

fn render_footer(f: &mut ratatui::Frame, area: Rect, app: &App, palette: UiPalette) {
    let mut spans = Vec::new();
    for (key, label) in key_hints(app) {
        spans.push(Span::styled(*key, Style::default().fg(palette.accent)));
        spans.push(Span::styled(format!(" {label}  "), Style::default().fg(palette.muted)));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
}

fn render_auto_save_prompt(f: &mut ratatui::Frame, palette: UiPalette) {
    let area = centered_rect(60, 30, f.area());
    let lines = vec![
        Line::from(""),
        Line::from("Save every result to Photos automatically?"),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(palette.accent)),
            Span::raw(" yes   "),
            Span::styled("n", Style::default().fg(palette.accent)),
            Span::raw(" no"),
        ]),
    ];
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(panel("Auto-save", palette)),
        area,
    );
}

fn render_path_input(f: &mut ratatui::Frame, target: PickTarget, input: &str, palette: UiPalette) {
    let area = centered_rect(70, 20, f.area());
    let title = match target {
        PickTarget::Body => "Body photo path".to_string(),
        PickTarget::Garment(slot) => format!("{} photo path", slot.label()),
    };
    let line = Line::from(vec![
        Span::raw(input.to_string()),
        Span::styled("_", Style::default().fg(palette.accent)),
    ]);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(line).block(panel(&title, palette)), area);
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
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;

    use fytlo_core::config::Config;
    use fytlo_core::persistence::MemoryPreferenceStore;
    use fytlo_core::state::PhotoAuthorization;
    use fytlo_exec::photos::DirectoryPhotoLibrary;

    use super::*;

    fn app(rt: &tokio::runtime::Runtime) -> App {
        let library = DirectoryPhotoLibrary::new("/nonexistent", PhotoAuthorization::Denied, false);
        let mut config = Config::default();
        config.generation.min_delay_ms = 10;
        config.generation.max_delay_ms = 10;
        let session = SessionRuntime::new(
            config,
            Box::new(MemoryPreferenceStore::new()),
            Arc::new(library),
            rt.handle().clone(),
        );
        App::new(session)
    }

    fn press(app: &mut App, code: KeyCode) -> KeyHandlerResult {
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), app)
    }

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|f| ui(f, app)).expect("draw");
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn outfit_builder(app: &mut App) {
        app.dispatch(UserAction::SetBodyImage(Some(ImageHandle::new(
            "/photos/me.jpg",
            1000,
            2000,
        ))));
        app.dispatch(UserAction::ContinueFromBodyUpload);
    }

    #[test]
    fn enter_on_welcome_opens_body_upload() {
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let mut app = app(&rt);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state().route, Route::BodyUpload);
        assert!(screen(&app).contains("Full-body photo"));
    }

    #[test]
    fn camera_key_surfaces_unavailable_toast() {
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let mut app = app(&rt);
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.state().toast.message, messages::CAMERA_UNAVAILABLE);
        assert!(app.state().body_image.is_none());
        assert!(screen(&app).contains(messages::CAMERA_UNAVAILABLE));
    }

    #[test]
    fn escaping_path_input_leaves_slot_untouched() {
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let mut app = app(&rt);
        outfit_builder(&mut app);
        press(&mut app, KeyCode::Char('t'));
        assert!(matches!(app.overlay, Overlay::PathInput { .. }));
        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.overlay, Overlay::None));
        assert!(app.state().top_image.is_none());
        assert_eq!(app.state().route, Route::OutfitBuilder);
    }

    #[test]
    fn locked_slot_shows_swap_hint_instead_of_picker() {
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let mut app = app(&rt);
        outfit_builder(&mut app);
        app.dispatch(UserAction::SetGarment {
            slot: GarmentSlot::Top,
            image: Some(ImageHandle::new("/photos/top.png", 500, 500)),
        });
        press(&mut app, KeyCode::Char('b'));
        assert!(matches!(app.overlay, Overlay::None));
        assert_eq!(app.state().toast.message, messages::ONE_SWAP_AT_A_TIME);
        assert!(screen(&app).contains("[locked]"));
    }

    #[test]
    fn consent_modal_blocks_other_keys() {
        let rt = tokio::runtime::Runtime::new().expect("rt");
        let mut app = app(&rt);
        outfit_builder(&mut app);
        app.dispatch(UserAction::SetGarment {
            slot: GarmentSlot::Top,
            image: Some(ImageHandle::new("/photos/top.png", 500, 500)),
        });
        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.state().route, Route::Generating);
        rt.block_on(app.session.next_event());
        assert!(app.state().show_auto_save_prompt);
        assert!(screen(&app).contains("Auto-save"));

        assert!(matches!(press(&mut app, KeyCode::Char('q')), KeyHandlerResult::Continue));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state().route, Route::OutfitBuilder);
        assert!(!app.state().show_auto_save_prompt);
    }
}
