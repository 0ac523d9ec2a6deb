//! Submission state for the display surface.
//!
//! ```text
//!          Submit              Complete
//!   Idle ─────────▶ Submitting ─────────▶ Succeeded ─┐
//!    ▲                  │ Fail                       │ Settle
//!    │                  ▼                            │
//!    └──────────────── Failed ◀──────────────────────┘ (both settle to Idle)
//! ```
//!
//! [`transition`] is the whole state machine as a pure function.
//! [`ReviewSession`] drives it around a real review: at most one submission
//! is in flight, and the busy state is released by a scoped guard on every
//! exit path, including errors, panics and a dropped future.

use crate::config::ReviewConfig;
use crate::error::ReviewError;
use crate::model::resolve_model;
use crate::output::{ReviewOutput, ReviewResult};
use crate::pipeline::input::UploadedDocument;
use crate::prompts::ReviewMode;
use crate::review::review;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// Where a session is in its submit cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl SessionState {
    pub fn is_busy(self) -> bool {
        self == SessionState::Submitting
    }
}

/// Inputs to [`transition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A non-empty document was submitted.
    Submit,
    /// The model answered.
    Complete,
    /// Normalisation or the request failed.
    Fail,
    /// The outcome has been recorded.
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Event {event:?} is not valid in state {state:?}")]
pub struct InvalidTransition {
    pub state: SessionState,
    pub event: SessionEvent,
}

/// The session state machine.
pub fn transition(state: SessionState, event: SessionEvent) -> Result<SessionState, InvalidTransition> {
    use SessionEvent::*;
    use SessionState::*;
    match (state, event) {
        (Idle, Submit) => Ok(Submitting),
        (Submitting, Complete) => Ok(Succeeded),
        (Submitting, Fail) => Ok(Failed),
        (Succeeded | Failed, Settle) => Ok(Idle),
        _ => Err(InvalidTransition { state, event }),
    }
}

/// Point-in-time view of a session, as rendered by the web page and `/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub mode: ReviewMode,
    /// Name of the file currently (or most recently) submitted.
    pub document: Option<String>,
    /// `Succeeded` or `Failed` for the most recent finished submission.
    pub last_outcome: Option<SessionState>,
    pub has_review: bool,
    pub last_error: Option<String>,
    #[serde(skip)]
    pub review: Option<ReviewResult>,
}

#[derive(Debug, Default)]
struct SessionInner {
    state: SessionState,
    mode: ReviewMode,
    document: Option<String>,
    last_outcome: Option<SessionState>,
    review: Option<ReviewResult>,
    last_error: Option<String>,
}

impl SessionInner {
    fn apply(&mut self, event: SessionEvent) {
        match transition(self.state, event) {
            Ok(next) => {
                debug!("Session {:?} --{:?}--> {:?}", self.state, event, next);
                self.state = next;
            }
            // Only reachable through a bug in the guard; keep the old state.
            Err(e) => warn!("{}", e),
        }
    }
}

/// One user's review session: the state, the last review and the last failure.
pub struct ReviewSession {
    config: ReviewConfig,
    inner: Mutex<SessionInner>,
}

impl std::fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewSession")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl ReviewSession {
    /// Create an idle session. The model client is resolved once here, so a
    /// missing API key is reported at startup rather than on first submit.
    pub fn new(config: ReviewConfig) -> Result<Self, ReviewError> {
        let model = resolve_model(&config)?;
        Ok(Self {
            config: ReviewConfig {
                model_client: Some(model),
                ..config
            },
            inner: Mutex::new(SessionInner::default()),
        })
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            state: inner.state,
            mode: inner.mode,
            document: inner.document.clone(),
            last_outcome: inner.last_outcome,
            has_review: inner.review.is_some(),
            last_error: inner.last_error.clone(),
            review: inner.review.clone(),
        }
    }

    /// Submit a document for review.
    ///
    /// # Errors
    /// * [`ReviewError::NoDocument`]: `document` is `None` or empty; nothing
    ///   changes and no work is done
    /// * [`ReviewError::Busy`]: another submission is in flight
    /// * any pipeline error; it is also recorded as the session's last error
    ///   and the previous review is kept
    pub async fn submit(
        &self,
        document: Option<UploadedDocument>,
        mode: ReviewMode,
    ) -> Result<ReviewOutput, ReviewError> {
        let document = match document {
            Some(doc) if !doc.is_empty() => doc,
            _ => return Err(ReviewError::NoDocument),
        };

        let guard = self.begin(document.name(), mode)?;
        let outcome = review(document, mode, &self.config).await;
        guard.finish(&outcome);
        outcome
    }

    fn begin(&self, name: &str, mode: ReviewMode) -> Result<SubmitGuard<'_>, ReviewError> {
        let mut inner = self.lock();
        if inner.state.is_busy() {
            return Err(ReviewError::Busy);
        }
        inner.apply(SessionEvent::Submit);
        inner.mode = mode;
        inner.document = Some(name.to_string());
        inner.last_error = None;
        info!("Session: submitted '{}' for a {} review", name, mode);
        Ok(SubmitGuard {
            session: self,
            finished: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Holds the session in `Submitting`; releasing it always settles to `Idle`.
struct SubmitGuard<'a> {
    session: &'a ReviewSession,
    finished: bool,
}

impl SubmitGuard<'_> {
    fn finish(mut self, outcome: &Result<ReviewOutput, ReviewError>) {
        let mut inner = self.session.lock();
        match outcome {
            Ok(out) => {
                inner.apply(SessionEvent::Complete);
                inner.review = Some(out.result.clone());
            }
            Err(e) => {
                inner.apply(SessionEvent::Fail);
                inner.last_error = Some(e.to_string());
            }
        }
        inner.last_outcome = Some(inner.state);
        inner.apply(SessionEvent::Settle);
        self.finished = true;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let mut inner = self.session.lock();
        warn!("Session: submission ended without an outcome");
        inner.apply(SessionEvent::Fail);
        inner.last_error = Some("The review was interrupted before it finished".into());
        inner.last_outcome = Some(SessionState::Failed);
        inner.apply(SessionEvent::Settle);
    }
}
