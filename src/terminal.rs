// SPDX-License-Identifier: GPL-3.0-only

//! Terminal front end
//!
//! Renders the live preview with Unicode half-block characters (two pixels
//! per cell), then the analyzing indicator, the identification or the error
//! page, depending on the state machine's snapshot.

use crate::analysis::{AnalysisResult, Analyzer, GeminiClient};
use crate::app::{AppModel, AppState, Message, Runtime, Snapshot};
use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::backends::camera::{MediaSource, PipeWireSource, StillImageSource};
use crate::config::Config;
use crate::constants::timing;
use crate::pipelines::photo::{CapturedFrame, sample_pixel_rgb};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use std::io::{self, stdout};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Capture,
    ToggleCamera,
    Reset,
    ScrollUp,
    ScrollDown,
    Quit,
}

/// Map a key to an intent allowed in `state`
///
/// Capture and camera switch are not offered while analyzing.
pub fn intent_for_key(key: &KeyEvent, state: AppState) -> Option<Intent> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(Intent::Quit);
    }

    let intent = match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Intent::Quit,
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Enter => Intent::Capture,
        KeyCode::Char('s') => Intent::ToggleCamera,
        KeyCode::Char('r') => Intent::Reset,
        KeyCode::Up | KeyCode::Char('k') => Intent::ScrollUp,
        KeyCode::Down | KeyCode::Char('j') => Intent::ScrollDown,
        _ => return None,
    };

    let allowed = match intent {
        Intent::Capture => state == AppState::Capturing,
        Intent::ToggleCamera => state.accepts_camera_controls(),
        Intent::Reset => state.can_reset(),
        Intent::ScrollUp | Intent::ScrollDown => state == AppState::Results,
        Intent::Quit => true,
    };
    allowed.then_some(intent)
}

/// Run the terminal front end
///
/// Uses the still image at `image` instead of a camera when given.
pub fn run(config: Config, image: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    // Fail before touching the terminal if the credential is missing
    let analyzer = GeminiClient::new(&config.analysis)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    match image {
        Some(path) => run_with(config, StillImageSource::new(path), analyzer),
        None => run_with(config, PipeWireSource::new()?, analyzer),
    }
}

fn run_with<S: MediaSource, A: Analyzer>(
    config: Config,
    source: S,
    analyzer: A,
) -> Result<(), Box<dyn std::error::Error>> {
    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &config, source, analyzer);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app<S: MediaSource, A: Analyzer>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    config: &Config,
    source: S,
    analyzer: A,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut model, task) = AppModel::<S::Handle>::new(config);
    let mut runtime = Runtime::new(source, analyzer);
    runtime.spawn(task);

    let mut snapshots = model.subscribe();
    let mut view = ViewState::new(model.snapshot());
    let mut spinner = 0usize;

    loop {
        // Apply finished tasks, then check the live stream
        while let Some(message) = runtime.try_next() {
            let task = model.update(message);
            runtime.spawn(task);
        }
        let task = model.update(Message::Tick);
        runtime.spawn(task);

        if snapshots.has_changed().unwrap_or(false) {
            let snapshot = snapshots.borrow_and_update().clone();
            view.apply(snapshot);
            if view.snapshot.state == AppState::Error
                && let Some(err) = model.last_error()
            {
                warn!(error = %err, "Showing error page");
            }
        }

        let preview = model.preview_frame().cloned();
        spinner = spinner.wrapping_add(1);

        terminal.draw(|f| {
            let area = f.area();

            // Reserve bottom line for status
            let main_area = Rect {
                height: area.height.saturating_sub(1),
                ..area
            };
            let status_area = Rect {
                y: area.y + area.height.saturating_sub(1),
                height: 1,
                ..area
            };

            view.render(main_area, f.buffer_mut(), preview.as_ref(), spinner);
            f.render_widget(
                StatusBar {
                    message: &status_message(&view.snapshot, spinner),
                },
                status_area,
            );
        })?;

        // Handle input with timeout for frame updates
        if event::poll(timing::UI_POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let Some(intent) = intent_for_key(&key, model.state()) else {
                continue;
            };
            debug!(?intent, state = %model.state(), "Key intent");

            let message = match intent {
                Intent::Quit => break,
                Intent::ScrollUp => {
                    view.scroll = view.scroll.saturating_sub(1);
                    continue;
                }
                Intent::ScrollDown => {
                    view.scroll = view.scroll.saturating_add(1);
                    continue;
                }
                Intent::Capture => Message::Capture,
                Intent::ToggleCamera => Message::ToggleCamera,
                Intent::Reset => Message::Reset,
            };
            let task = model.update(message);
            runtime.spawn(task);
        }
    }

    info!("Leaving terminal front end");
    Ok(())
}

/// Presentation-side copy of the latest snapshot
struct ViewState {
    snapshot: Snapshot,
    /// Decoded captured still, shown while analyzing and above the results
    still: Option<CameraFrame>,
    scroll: u16,
}

impl ViewState {
    fn new(snapshot: Snapshot) -> Self {
        let mut view = Self {
            snapshot: Snapshot::default(),
            still: None,
            scroll: 0,
        };
        view.apply(snapshot);
        view
    }

    fn apply(&mut self, snapshot: Snapshot) {
        if snapshot.frame != self.snapshot.frame {
            self.still = snapshot.frame.as_ref().and_then(decode_still);
        }
        if snapshot.state != self.snapshot.state {
            self.scroll = 0;
        }
        self.snapshot = snapshot;
    }

    fn render(&self, area: Rect, buf: &mut Buffer, preview: Option<&CameraFrame>, spinner: usize) {
        match self.snapshot.state {
            AppState::Idle => centered_text(area, buf, &["Starting camera..."]),
            AppState::Capturing => FrameWidget { frame: preview }.render(area, buf),
            AppState::Analyzing => {
                FrameWidget {
                    frame: self.still.as_ref(),
                }
                .render(area, buf);
                let label = format!(" Analyzing{:<3} ", ".".repeat(spinner / 8 % 4));
                centered_text(area, buf, &[label.as_str()]);
            }
            AppState::Results => match (&self.snapshot.result, &self.still) {
                (Some(result), Some(still)) => {
                    let [header, body] =
                        Layout::vertical([Constraint::Percentage(40), Constraint::Min(3)])
                            .areas(area);
                    FrameWidget { frame: Some(still) }.render(header, buf);
                    Paragraph::new(result_lines(result))
                        .block(
                            Block::default()
                                .borders(Borders::ALL)
                                .title(format!(" {} ", result.name)),
                        )
                        .wrap(Wrap { trim: false })
                        .scroll((self.scroll, 0))
                        .render(body, buf);
                }
                _ => centered_text(area, buf, &["No result"]),
            },
            AppState::Error => centered_text(
                area,
                buf,
                &[
                    "Something went wrong",
                    "",
                    "We couldn't access the camera or analyze the image.",
                    "Press 'r' to try again.",
                ],
            ),
        }
    }
}

/// Decode a captured still for display
fn decode_still(frame: &CapturedFrame) -> Option<CameraFrame> {
    match image::load_from_memory(&frame.data) {
        Ok(image) => {
            let rgb = image.to_rgb8();
            let (width, height) = rgb.dimensions();
            Some(CameraFrame::packed(width, height, PixelFormat::RGB24, rgb.into_raw()))
        }
        Err(e) => {
            warn!(error = %e, "Failed to decode captured still for display");
            None
        }
    }
}

/// Text body of the results page
pub fn result_lines(result: &AnalysisResult) -> Vec<Line<'static>> {
    let heading = Style::default().add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(result.name.clone(), heading)));
    if let Some(scientific) = &result.scientific_name {
        lines.push(Line::from(Span::styled(
            scientific.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("Category: ", heading),
        Span::raw(result.category.clone()),
    ]));
    lines.push(Line::default());
    lines.push(Line::from(result.description.clone()));

    if !result.attributes.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Attributes", heading)));
        for attribute in &result.attributes {
            lines.push(Line::from(vec![
                Span::styled(format!("  {}: ", attribute.label), Style::default().fg(Color::Cyan)),
                Span::raw(attribute.value.clone()),
            ]));
        }
    }

    if !result.fun_facts.is_empty() {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Did you know?", heading)));
        for fact in &result.fun_facts {
            lines.push(Line::from(format!("  • {}", fact)));
        }
    }

    lines
}

fn status_message(snapshot: &Snapshot, spinner: usize) -> String {
    let camera = format!("camera: {}", snapshot.camera_mode);
    match snapshot.state {
        AppState::Idle => format!("{} | 's' switch camera | 'q' quit", camera),
        AppState::Capturing => {
            format!("'space' identify | 's' switch camera | {} | 'q' quit", camera)
        }
        AppState::Analyzing => {
            const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
            format!("{} analyzing | 'q' quit", FRAMES[spinner / 4 % FRAMES.len()])
        }
        AppState::Results => "'↑/↓' scroll | 'r' new scan | 's' switch camera | 'q' quit".to_string(),
        AppState::Error => "'r' try again | 's' switch camera | 'q' quit".to_string(),
    }
}

fn centered_text(area: Rect, buf: &mut Buffer, lines: &[&str]) {
    let top = area.y + area.height.saturating_sub(lines.len() as u16) / 2;
    for (i, line) in lines.iter().enumerate() {
        let y = top + i as u16;
        let width = line.chars().count() as u16;
        if y >= area.y + area.height || width > area.width {
            continue;
        }
        let x = area.x + (area.width - width) / 2;
        buf.set_string(x, y, line, Style::default());
    }
}

/// Renders a frame with half-block characters, letterboxed to the area
struct FrameWidget<'a> {
    frame: Option<&'a CameraFrame>,
}

impl Widget for FrameWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let Some(frame) = self.frame.filter(|f| f.width > 0 && f.height > 0) else {
            centered_text(area, buf, &["Waiting for camera..."]);
            return;
        };
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Each cell shows two vertical pixels
        let frame_aspect = frame.width as f64 / frame.height as f64;
        let cols = area.width as f64;
        let rows = (area.height * 2) as f64;

        let (display_width, display_height) = if cols / rows > frame_aspect {
            ((rows * frame_aspect) as u16, area.height)
        } else {
            (area.width, ((cols / frame_aspect) / 2.0) as u16)
        };
        if display_width == 0 || display_height == 0 {
            return;
        }

        let x_offset = area.x + (area.width - display_width.min(area.width)) / 2;
        let y_offset = area.y + (area.height - display_height.min(area.height)) / 2;

        let x_scale = frame.width as f64 / display_width as f64;
        let y_scale = frame.height as f64 / (display_height as f64 * 2.0);

        for ty in 0..display_height {
            for tx in 0..display_width {
                let src_x = (tx as f64 * x_scale) as u32;
                let top = ((ty as f64 * 2.0) * y_scale) as u32;
                let bottom = ((ty as f64 * 2.0 + 1.0) * y_scale) as u32;

                if let Some(cell) = buf.cell_mut((x_offset + tx, y_offset + ty)) {
                    cell.set_char('▀');
                    cell.set_fg(pixel_color(frame, src_x, top));
                    cell.set_bg(pixel_color(frame, src_x, bottom));
                }
            }
        }
    }
}

fn pixel_color(frame: &CameraFrame, x: u32, y: u32) -> Color {
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let (r, g, b) = sample_pixel_rgb(frame, x, y).unwrap_or((0, 0, 0));
    Color::Rgb(r, g, b)
}

/// Status bar widget
struct StatusBar<'a> {
    message: &'a str,
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let style = Style::default().fg(Color::White).bg(Color::DarkGray);
        for x in area.x..area.x + area.width {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_bg(Color::DarkGray);
            }
        }
        // set_stringn truncates by display width
        buf.set_stringn(area.x, area.y, self.message, area.width as usize, style);
    }
}
