use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::{extract::ExtractMode, stream::answer_updates};
use crate::{KnowledgeBase, error::KnowledgeBaseError};

/// Lifecycle of one question.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnswerState {
    #[default]
    Idle,
    Requesting,
    Streaming,
    Completed,
    Failed(String),
}

impl AnswerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed(_))
    }
}

/// What the presentation layer sees: the latest session's state and answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnswerSnapshot {
    /// Session id; `0` before the first question.
    pub session: u64,
    pub state: AnswerState,
    pub answer: String,
}

/// Drives streamed answers, one live session at a time.
///
/// Each accepted question opens a new session with a fresh cancellation
/// token and cancels the one before it. Only the latest session may write
/// to the published snapshot.
#[derive(Debug)]
pub struct AnswerController {
    client: KnowledgeBase,
    mode: ExtractMode,
    snapshot: watch::Sender<AnswerSnapshot>,
    sessions: AtomicU64,
    active: Mutex<Option<(u64, CancellationToken)>>,
}

impl AnswerController {
    pub fn new(client: KnowledgeBase) -> Self {
        Self::with_mode(client, ExtractMode::default())
    }

    pub fn with_mode(client: KnowledgeBase, mode: ExtractMode) -> Self {
        let (snapshot, _) = watch::channel(AnswerSnapshot::default());
        Self {
            client,
            mode,
            snapshot,
            sessions: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<AnswerSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> AnswerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Abandon the live session, if any. Its partial answer stays visible.
    pub fn cancel(&self) {
        if let Some((session, token)) = self.lock_active().take() {
            log::debug!("cancelling answer session {session}");
            token.cancel();
        }
    }

    /// Ask a question and drive its stream to the end.
    ///
    /// Returns the final answer. A blank question is refused with
    /// `EmptyQuestion` before any state changes or network activity.
    pub async fn ask(&self, question: &str) -> Result<String, KnowledgeBaseError> {
        if question.trim().is_empty() {
            return Err(KnowledgeBaseError::EmptyQuestion);
        }

        let session = self.sessions.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((previous, old)) = self.lock_active().replace((session, token.clone())) {
            log::debug!("answer session {previous} superseded by {session}");
            old.cancel();
        }

        log::info!("answer session {session} started");
        self.snapshot.send_replace(AnswerSnapshot {
            session,
            state: AnswerState::Requesting,
            answer: String::new(),
        });

        let result = self.drive(session, question, &token).await;

        match &result {
            Ok(_) => {
                log::info!("answer session {session} completed");
                self.publish(session, |s| s.state = AnswerState::Completed);
            }
            Err(e) => {
                log::warn!("answer session {session} failed: {e}");
                let message = e.message();
                self.publish(session, |s| s.state = AnswerState::Failed(message));
            }
        }

        let mut active = self.lock_active();
        if active.as_ref().is_some_and(|(id, _)| *id == session) {
            *active = None;
        }

        result
    }

    async fn drive(
        &self,
        session: u64,
        question: &str,
        token: &CancellationToken,
    ) -> Result<String, KnowledgeBaseError> {
        let helper = self.client.request_helper();
        let response = tokio::select! {
            biased;
            () = token.cancelled() => return Err(KnowledgeBaseError::Cancelled),
            res = helper.open_answer_stream(question) => res?,
        };

        self.publish(session, |s| s.state = AnswerState::Streaming);

        let mut updates = answer_updates(response, self.mode);
        let mut answer = String::new();

        loop {
            let next = tokio::select! {
                biased;
                () = token.cancelled() => return Err(KnowledgeBaseError::Cancelled),
                next = updates.next() => next,
            };

            match next {
                Some(update) => {
                    answer = update?;
                    let published = answer.clone();
                    self.publish(session, |s| s.answer = published);
                }
                None => break,
            }
        }

        Ok(answer)
    }

    /// Apply `update` only if `session` is still the one on display.
    fn publish(&self, session: u64, update: impl FnOnce(&mut AnswerSnapshot)) {
        self.snapshot.send_if_modified(|snapshot| {
            if snapshot.session != session {
                return false;
            }
            update(snapshot);
            true
        });
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Option<(u64, CancellationToken)>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
