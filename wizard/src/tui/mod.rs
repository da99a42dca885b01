//! Terminal UI front-end for the wizard engine.
//!
//! - Centered window titled "Setup" with the active step's view
//! - Bottom button row: [ Back ] [ Next ] [ Cancel ] ("Finish" on the last step)
//! - `End` jumps to the last step, `Esc` asks for cancel confirmation
//!
//! Note: Logging is file-only in TUI mode (stdout logging is disabled) to avoid corrupting the terminal UI.

use crate::navigation::StepInput;
use crate::wizard::{Advance, Wizard};
use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{error, info};
use ratatui::backend::{Backend, CrosstermBackend, TestBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

const KEY_HINTS: &str = "Tab/Left/Right: buttons  Enter: select  End: last step  Esc: cancel";

/// How an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Finished,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ButtonFocus {
    Back,
    Next,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Modal {
    ConfirmCancel,
    Message { title: String, body: String },
}

struct UiState {
    wizard: Wizard,
    focus: ButtonFocus,
    modal: Option<Modal>,
    outcome: Option<Outcome>,
}

impl UiState {
    fn new(wizard: Wizard) -> Self {
        Self {
            wizard,
            focus: ButtonFocus::Next,
            modal: None,
            outcome: None,
        }
    }

    fn next_enabled(&self) -> bool {
        self.wizard.can_next() || self.wizard.can_finish()
    }

    fn show_error(&mut self, title: &str, err: impl std::fmt::Display) {
        error!("[PHASE: tui] [STEP: error] {}: {}", title, err);
        self.modal = Some(Modal::Message {
            title: title.to_string(),
            body: err.to_string(),
        });
    }
}

/// Run the wizard interactively until it is finished or cancelled.
pub fn run(mut wizard: Wizard) -> Result<Outcome> {
    info!("[PHASE: tui] [STEP: start] Starting TUI wizard");
    wizard.start()?;

    let mut terminal = setup_terminal()?;
    let result = run_loop(&mut terminal, UiState::new(wizard));
    restore_terminal(&mut terminal)?;

    result
}

/// Render a single frame into an in-memory backend.
///
/// `target` is `first` (default) or `last`.
pub fn smoke(mut wizard: Wizard, target: &str) -> Result<()> {
    info!(
        "[PHASE: tui] [STEP: smoke] Rendering single-frame TUI smoke target={}",
        target
    );

    wizard.start()?;
    match target.trim().to_ascii_lowercase().as_str() {
        "" | "first" => {}
        "last" => {
            wizard.jump_to_last()?;
        }
        other => bail!("Unknown smoke target '{}' (expected first|last)", other),
    }

    // In-memory backend: no raw mode or alternate screen.
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend)?;
    let state = UiState::new(wizard);
    terminal.draw(|f| draw(f.size(), f, &state))?;

    info!(
        "[PHASE: tui] [STEP: smoke] Rendered step '{}'",
        state.wizard.active_name().unwrap_or("<none>")
    );
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_loop<B: Backend>(terminal: &mut Terminal<B>, mut state: UiState) -> Result<Outcome> {
    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    loop {
        if let Some(outcome) = state.outcome {
            info!("[PHASE: tui] [STEP: exit] {:?}", outcome);
            return Ok(outcome);
        }

        terminal.draw(|f| draw(f.size(), f, &state))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut state, key.code);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }
    }
}

fn cycle_focus(focus: ButtonFocus, forward: bool) -> ButtonFocus {
    match (focus, forward) {
        (ButtonFocus::Back, true) => ButtonFocus::Next,
        (ButtonFocus::Next, true) => ButtonFocus::Cancel,
        (ButtonFocus::Cancel, true) => ButtonFocus::Back,
        (ButtonFocus::Back, false) => ButtonFocus::Cancel,
        (ButtonFocus::Next, false) => ButtonFocus::Back,
        (ButtonFocus::Cancel, false) => ButtonFocus::Next,
    }
}

fn handle_key(state: &mut UiState, code: KeyCode) {
    // Modal handling
    if let Some(modal) = state.modal.clone() {
        match modal {
            Modal::ConfirmCancel => match code {
                KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                    state.focus = match state.focus {
                        ButtonFocus::Cancel => ButtonFocus::Next,
                        _ => ButtonFocus::Cancel,
                    };
                }
                KeyCode::Enter => {
                    let confirm = state.focus == ButtonFocus::Cancel;
                    state.modal = None;
                    state.focus = ButtonFocus::Next;
                    if confirm && state.wizard.cancel() {
                        state.outcome = Some(Outcome::Cancelled);
                    }
                }
                KeyCode::Esc => {
                    state.modal = None;
                    state.focus = ButtonFocus::Next;
                }
                _ => {}
            },
            Modal::Message { .. } => {
                if matches!(code, KeyCode::Enter | KeyCode::Esc) {
                    state.modal = None;
                }
            }
        }
        return;
    }

    match code {
        KeyCode::Tab | KeyCode::Right => state.focus = cycle_focus(state.focus, true),
        KeyCode::BackTab | KeyCode::Left => state.focus = cycle_focus(state.focus, false),
        KeyCode::Enter => {
            let focus = state.focus;
            activate(state, focus);
        }
        KeyCode::Esc => activate(state, ButtonFocus::Cancel),
        KeyCode::End => match state.wizard.jump_to_last() {
            Ok(Advance::Moved(_)) => state.focus = ButtonFocus::Next,
            Ok(_) => {}
            Err(e) => state.show_error("Cannot jump to the last step", e),
        },
        KeyCode::Up => state.wizard.handle_input(StepInput::Up),
        KeyCode::Down => state.wizard.handle_input(StepInput::Down),
        KeyCode::Backspace => state.wizard.handle_input(StepInput::Backspace),
        KeyCode::Char(c) => state.wizard.handle_input(StepInput::Char(c)),
        _ => {}
    }
}

fn activate(state: &mut UiState, button: ButtonFocus) {
    match button {
        ButtonFocus::Back => {
            if !state.wizard.can_previous() {
                return;
            }
            if let Err(e) = state.wizard.previous() {
                state.show_error("Cannot go back", e);
            }
        }
        ButtonFocus::Next => {
            if !state.next_enabled() {
                return;
            }
            match state.wizard.next() {
                Ok(Advance::Moved(_)) => state.focus = ButtonFocus::Next,
                Ok(Advance::Blocked) => {}
                Ok(Advance::Finished) => state.outcome = Some(Outcome::Finished),
                Err(e) => state.show_error("Cannot continue", e),
            }
        }
        ButtonFocus::Cancel => {
            if state.wizard.can_cancel() {
                state.focus = ButtonFocus::Next;
                state.modal = Some(Modal::ConfirmCancel);
            }
        }
    }
}

fn next_label(state: &UiState) -> &'static str {
    if state.wizard.is_complete() {
        "Finish"
    } else {
        "Next"
    }
}

/// Why Finish is disabled on the last step, when a step on the walk was jumped over.
fn finish_hint(state: &UiState) -> Option<String> {
    if !state.wizard.is_complete() {
        return None;
    }
    let skipped = state.wizard.skipped_step()?;
    Some(format!(
        "Complete step '{}' before finishing",
        state.wizard.graph().step_name(skipped)
    ))
}

fn draw(area: Rect, f: &mut ratatui::Frame<'_>, state: &UiState) {
    let window_area = centered_window(area, 100, 30);

    // Outer frame
    let outer_block = Block::default().borders(Borders::ALL).title("Setup");
    f.render_widget(outer_block, window_area);

    // Inner layout: content + hints + buttons row
    let inner = window_area.inner(&ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(inner);

    let view = state.wizard.active_view().unwrap_or_default();
    let lines: Vec<Line> = view
        .lines
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let content = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(view.title.as_str()))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });
    f.render_widget(content, rows[0]);

    let hints = match finish_hint(state) {
        Some(hint) => Paragraph::new(hint).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(KEY_HINTS).style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(hints, rows[1]);

    // Bottom buttons row (right-aligned)
    draw_buttons(f, rows[2], state);

    // Modal overlay
    if let Some(modal) = state.modal.as_ref() {
        match modal {
            Modal::ConfirmCancel => draw_cancel_modal(f, window_area, state),
            Modal::Message { title, body } => draw_message_modal(f, window_area, title, body),
        }
    }
}

fn centered_window(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width.saturating_sub(2)).max(60).min(area.width);
    let h = height.min(area.height.saturating_sub(2)).max(20).min(area.height);
    let x = area.x + (area.width.saturating_sub(w)) / 2;
    let y = area.y + (area.height.saturating_sub(h)) / 2;
    Rect {
        x,
        y,
        width: w,
        height: h,
    }
}

fn draw_buttons(f: &mut ratatui::Frame<'_>, area: Rect, state: &UiState) {
    let back = button_text(
        "Back",
        state.focus == ButtonFocus::Back,
        state.wizard.can_previous(),
    );
    let next = button_text(
        next_label(state),
        state.focus == ButtonFocus::Next,
        state.next_enabled(),
    );
    let cancel = button_text(
        "Cancel",
        state.focus == ButtonFocus::Cancel,
        state.wizard.can_cancel(),
    );

    let line = Line::from(vec![back, Span::raw(" "), next, Span::raw(" "), cancel]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, area);
}

fn button_text(label: &str, focused: bool, enabled: bool) -> Span<'static> {
    let mut style = Style::default();
    if !enabled {
        style = style.fg(Color::DarkGray);
    }
    if focused && enabled {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Span::styled(format!("[ {} ]", label), style)
}

fn modal_area(window_area: Rect, width: u16, height: u16) -> Rect {
    let w = width
        .min(window_area.width.saturating_sub(4))
        .max(20)
        .min(window_area.width);
    let h = height
        .min(window_area.height.saturating_sub(4))
        .max(5)
        .min(window_area.height);
    Rect {
        x: window_area.x + (window_area.width.saturating_sub(w)) / 2,
        y: window_area.y + (window_area.height.saturating_sub(h)) / 2,
        width: w,
        height: h,
    }
}

fn draw_cancel_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, state: &UiState) {
    let area = modal_area(window_area, 56, 7);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Cancel Setup?");
    let body = Paragraph::new(Text::from(vec![
        Line::from("If you cancel now, the setup will not be completed."),
        Line::from(""),
        Line::from(""),
    ]))
    .block(block)
    .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    // Buttons: [Yes, cancel] [No] (primary on right)
    let buttons_area = Rect {
        x: area.x + 1,
        y: area.y + area.height.saturating_sub(2),
        width: area.width.saturating_sub(2),
        height: 1,
    };

    let reversed = |focused: bool| {
        if focused {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        }
    };
    let yes = Span::styled("[ Yes, cancel ]", reversed(state.focus == ButtonFocus::Cancel));
    let no = Span::styled("[ No ]", reversed(state.focus != ButtonFocus::Cancel));

    let line = Line::from(vec![yes, Span::raw(" "), no]);
    let p = Paragraph::new(Text::from(line)).alignment(Alignment::Right);
    f.render_widget(p, buttons_area);
}

fn draw_message_modal(f: &mut ratatui::Frame<'_>, window_area: Rect, title: &str, body: &str) {
    let area = modal_area(window_area, 70, 10);
    f.render_widget(Clear, area);

    let mut lines: Vec<Line> = body.lines().map(Line::from).collect();
    lines.push(Line::from(""));
    lines.push(Line::from("Press Enter to close."));

    let p = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}
