//! Turn controller: the entry point the presentation layer talks to.
//!
//! Each user message is processed under a single-flight discipline. A
//! second message arriving while one is in flight is rejected, never run
//! concurrently, so turns from two messages cannot interleave in the
//! session history.

use crate::session_factory::SessionFactory;
use crate::tool_executor::ResolutionToolExecutor;
use resolv_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use resolv_core::resolution::{Resolution, ResolutionStore};
use resolv_core::{ResolvError, Result};
use resolv_interaction::{COACH_GREETING, DialogueSession};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

/// The only failure text the presentation layer ever sees.
pub const APOLOGY: &str = "I'm having trouble connecting right now. Please try again.";

/// Clears the busy flag on every exit path, including cancellation.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Orchestrates one user message at a time against a lazily created session.
pub struct TurnController {
    factory: Arc<dyn SessionFactory>,
    session: Mutex<Option<DialogueSession>>,
    executor: ResolutionToolExecutor,
    busy: AtomicBool,
    request_timeout: Duration,
}

impl TurnController {
    /// Creates a controller writing resolutions into `store`.
    pub fn new(factory: Arc<dyn SessionFactory>, store: ResolutionStore) -> Self {
        Self {
            factory,
            session: Mutex::new(None),
            executor: ResolutionToolExecutor::new(store),
            busy: AtomicBool::new(false),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Overrides the per-message deadline.
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Opening assistant line shown before the first user message.
    pub fn greeting(&self) -> &'static str {
        COACH_GREETING
    }

    pub fn store(&self) -> &ResolutionStore {
        self.executor.store()
    }

    /// Removes a resolution from the board at the user's request.
    pub fn remove_resolution(&self, id: &str) -> Option<Resolution> {
        self.store().remove(id)
    }

    /// Whether a message is currently being processed.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Sends one user message through the dialogue.
    ///
    /// Returns `None` without doing anything when `text` is blank or another
    /// message is still in flight. Otherwise always returns reply text: the
    /// model's answer on success, or [`APOLOGY`] on any failure. The
    /// underlying error is logged, never returned.
    pub async fn send_user_message(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            tracing::debug!("[TurnController] Ignoring blank message");
            return None;
        }

        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            tracing::info!("[TurnController] Rejecting message: a turn is already in flight");
            return None;
        };

        let outcome = match tokio::time::timeout(self.request_timeout, self.run_turn(text)).await {
            Ok(result) => result,
            Err(_) => Err(ResolvError::timeout(self.request_timeout)),
        };

        match outcome {
            Ok(reply) => Some(reply),
            Err(err) => {
                tracing::error!("[TurnController] Turn failed: {}", err);
                Some(APOLOGY.to_string())
            }
        }
    }

    async fn run_turn(&self, text: &str) -> Result<String> {
        let mut slot = self.session.lock().await;

        let session = match slot.take() {
            Some(session) => session,
            None => {
                tracing::info!("[TurnController] Creating dialogue session");
                self.factory
                    .create_session()
                    .await
                    .map_err(ResolvError::into_initialization)?
            }
        };
        let session = slot.insert(session);

        session.advance(text, &self.executor).await
    }

    /// Number of turns in the current session's history (0 before the
    /// session exists).
    pub async fn history_len(&self) -> usize {
        self.session
            .lock()
            .await
            .as_ref()
            .map(DialogueSession::turn_count)
            .unwrap_or(0)
    }
}
