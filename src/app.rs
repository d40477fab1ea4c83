//! Interactive terminal session
//!
//! Thin I/O plumbing around the session core: terminal lifecycle, key
//! decoding, effect execution, and rendering. All work runs on one event
//! loop; pipeline calls are the only suspension points, and input events
//! keep flowing while a submission is in flight.

use crate::editor::EditorBuffer;
use crate::llm::{DetectTranslate, PipelineError, TranslatePipeline};
use crate::session::{Effect, Event, SessionController, SessionState};
use crate::settings::Settings;
use crossterm::event::{Event as TermEvent, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use futures::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::{Frame, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

const LEGEND: &str =
    "esc: Exit | enter: Translate | ctrl+j: Newline | ctrl+c: Copy | up,down: History";

type PipelineOutcome = Result<String, PipelineError>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Status {
    Ready,
    Translating,
    Error(String),
}

struct App {
    session: SessionController,
    editor: EditorBuffer,
    status: Status,
    pipeline: Arc<dyn TranslatePipeline>,
    outcome_tx: mpsc::Sender<PipelineOutcome>,
}

/// Run the interactive session until the user exits.
pub async fn run(settings: &Settings) -> io::Result<()> {
    let pipeline: Arc<dyn TranslatePipeline> = Arc::new(DetectTranslate::from_settings(settings));

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, pipeline).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    pipeline: Arc<dyn TranslatePipeline>,
) -> io::Result<()> {
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<PipelineOutcome>(1);
    let mut app = App {
        session: SessionController::new(),
        editor: EditorBuffer::new(),
        status: Status::Ready,
        pipeline,
        outcome_tx,
    };
    let mut input = EventStream::new();

    loop {
        terminal.draw(|frame| draw(frame, &app))?;

        let quit = tokio::select! {
            maybe_event = input.next() => match maybe_event {
                Some(Ok(TermEvent::Key(key))) if key.kind != KeyEventKind::Release => {
                    handle_key(&mut app, key)
                }
                Some(Ok(_)) => false,
                Some(Err(e)) => return Err(e),
                None => true,
            },
            Some(outcome) = outcome_rx.recv() => {
                let event = match outcome {
                    Ok(reply) => Event::PipelineDone { reply },
                    Err(e) => Event::PipelineFailed { message: e.to_string() },
                };
                let effects = app.session.handle(event);
                apply_effects(&mut app, effects)
            }
        };
        if quit {
            return Ok(());
        }
    }
}

/// Decode one key press: session-level bindings become events for the state
/// machine; everything else edits the buffer directly.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    let session_event = match (key.code, ctrl) {
        (KeyCode::Esc, _) => Some(Event::Quit),
        (KeyCode::Enter, false) => Some(Event::Submit {
            text: app.editor.text(),
        }),
        // The editor has no selection, so copy always takes the full buffer.
        (KeyCode::Char('c'), true) => Some(Event::Copy {
            text: app.editor.text(),
        }),
        (KeyCode::Up, _) => Some(Event::NavigateOlder),
        (KeyCode::Down, _) => Some(Event::NavigateNewer),
        _ => None,
    };

    if let Some(event) = session_event {
        let effects = app.session.handle(event);
        return apply_effects(app, effects);
    }

    match (key.code, ctrl) {
        (KeyCode::Char('j'), true) | (KeyCode::Enter, true) => app.editor.insert_newline(),
        (KeyCode::Char(c), false) => app.editor.insert_char(c),
        (KeyCode::Backspace, _) => app.editor.backspace(),
        (KeyCode::Delete, _) => app.editor.delete(),
        (KeyCode::Left, _) => app.editor.move_left(),
        (KeyCode::Right, _) => app.editor.move_right(),
        (KeyCode::Home, _) => app.editor.move_home(),
        (KeyCode::End, _) => app.editor.move_end(),
        _ => {}
    }
    false
}

/// Execute the effects of one transition. Returns true when the session
/// should terminate.
fn apply_effects(app: &mut App, effects: Vec<Effect>) -> bool {
    for effect in effects {
        match effect {
            Effect::RunPipeline { text } => {
                app.status = Status::Translating;
                let pipeline = Arc::clone(&app.pipeline);
                let tx = app.outcome_tx.clone();
                tokio::spawn(async move {
                    let outcome = pipeline.run(&text).await;
                    // The receiver is only gone when the session is exiting.
                    let _ = tx.send(outcome).await;
                });
            }
            Effect::SetEditor { text } => {
                app.editor.set_text(&text);
                app.status = Status::Ready;
            }
            Effect::ClearEditor => app.editor.clear(),
            Effect::CopyToClipboard { text } => copy_to_clipboard(&text),
            Effect::ShowError { message } => {
                tracing::error!(error = %message, "submission failed");
                app.status = Status::Error(message);
            }
            Effect::Quit => {
                // In-flight requests are abandoned, not awaited.
                tracing::info!(turns = app.session.history().len(), "session ended");
                return true;
            }
        }
    }
    false
}

fn copy_to_clipboard(text: &str) {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => {
            if let Err(e) = clipboard.set_text(text) {
                tracing::warn!(error = %e, "clipboard write failed");
            }
        }
        Err(e) => tracing::warn!(error = %e, "clipboard unavailable"),
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let [editor_area, status_area, legend_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let lines: Vec<Line> = app
        .editor
        .lines()
        .iter()
        .map(|line| Line::raw(line.as_str()))
        .collect();
    frame.render_widget(Paragraph::new(lines), editor_area);

    let (row, col) = app.editor.cursor();
    let x = editor_area
        .x
        .saturating_add(u16::try_from(col).unwrap_or(u16::MAX))
        .min(editor_area.right().saturating_sub(1));
    let y = editor_area
        .y
        .saturating_add(u16::try_from(row).unwrap_or(u16::MAX))
        .min(editor_area.bottom().saturating_sub(1));
    frame.set_cursor_position((x, y));

    let status = match (&app.status, app.session.state()) {
        (Status::Error(message), _) => Line::raw(message.as_str()).red(),
        (Status::Translating, _) | (_, SessionState::Submitting) => {
            Line::raw("translating…").yellow()
        }
        (Status::Ready, SessionState::Idle) => Line::raw(""),
    };
    frame.render_widget(Paragraph::new(status), status_area);

    frame.render_widget(Paragraph::new(Line::raw(LEGEND).dim()), legend_area);
}
