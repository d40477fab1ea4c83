//! Session state machine
//!
//! Pure transitions: input events in, effects out, no I/O inside. The
//! runtime (TUI or test harness) executes the effects and feeds pipeline
//! outcomes back in as events.

use crate::history::{HistoryNavigator, HistoryStore, NavTarget, Role};

/// Whether a submission's pipeline is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
}

/// Events that drive the session.
#[derive(Debug, Clone)]
pub enum Event {
    /// Submit key pressed; carries the editor's plain-text value.
    Submit { text: String },
    NavigateOlder,
    NavigateNewer,
    /// The in-flight pipeline produced a reply.
    PipelineDone { reply: String },
    /// The in-flight pipeline failed; the live text is left unchanged.
    PipelineFailed { message: String },
    /// Copy key pressed; carries the text to copy (selection or full buffer).
    Copy { text: String },
    Quit,
}

/// Effects for the runtime to execute after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Start the detect-then-translate sequence for this text.
    RunPipeline { text: String },
    /// Replace the editor content wholesale.
    SetEditor { text: String },
    ClearEditor,
    CopyToClipboard { text: String },
    ShowError { message: String },
    Quit,
}

/// Owns the turn history, the scrollback cursor, and the Idle/Submitting
/// state. One instance per interactive session; nothing is shared across
/// sessions or persisted.
#[derive(Debug, Default)]
pub struct SessionController {
    state: SessionState,
    store: HistoryStore,
    navigator: HistoryNavigator,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &HistoryStore {
        &self.store
    }

    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Submit { text } => self.on_submit(text),
            Event::NavigateOlder => self
                .navigator
                .older(&self.store)
                .map(|turn| {
                    vec![Effect::SetEditor {
                        text: turn.content.clone(),
                    }]
                })
                .unwrap_or_default(),
            Event::NavigateNewer => match self.navigator.newer(&self.store) {
                Some(NavTarget::Turn(turn)) => vec![Effect::SetEditor {
                    text: turn.content.clone(),
                }],
                Some(NavTarget::Live) => vec![Effect::ClearEditor],
                None => vec![],
            },
            Event::PipelineDone { reply } => self.on_pipeline_done(reply),
            Event::PipelineFailed { message } => {
                self.state = SessionState::Idle;
                vec![Effect::ShowError { message }]
            }
            Event::Copy { text } => vec![Effect::CopyToClipboard { text }],
            Event::Quit => vec![Effect::Quit],
        }
    }

    fn on_submit(&mut self, text: String) -> Vec<Effect> {
        if self.state == SessionState::Submitting {
            // Re-entrancy guard: one pipeline at a time, no queueing.
            tracing::debug!("submit ignored while a pipeline is in flight");
            return vec![];
        }
        self.store.push(text.clone(), Role::User);
        self.state = SessionState::Submitting;
        vec![Effect::RunPipeline { text }]
    }

    fn on_pipeline_done(&mut self, reply: String) -> Vec<Effect> {
        self.store.push(reply.clone(), Role::Assistant);
        self.navigator.reset();
        self.state = SessionState::Idle;
        vec![Effect::SetEditor { text: reply }]
    }
}
