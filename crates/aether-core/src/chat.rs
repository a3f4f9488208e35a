//! The transcript for the active session and the send pipeline.
//!
//! Every network step is split in three: a synchronous `begin_*` that moves
//! the panel into its next state and hands back a request value, an async
//! `execute` that only talks to the backend, and a synchronous `finish_*`
//! that applies the outcome. Requests carry the panel's epoch; outcomes whose
//! epoch no longer matches are dropped.

use crate::api::ChatBackend;
use crate::error::Result;
use crate::model::{new_session_title, Message, NewSessionRequest, SessionSummary, User};

/// Shown while an answer is pending.
pub const THINKING: &str = "Thinking...";

#[derive(Debug, Clone, Default)]
pub struct ChatPanel {
    session_id: Option<String>,
    messages: Vec<Message>,
    input: String,
    loading: bool,
    epoch: u64,
}

/// Fetch of a transcript, issued when the session changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLoad {
    pub epoch: u64,
    pub session_id: String,
}

impl TranscriptLoad {
    pub async fn execute<B: ChatBackend>(&self, backend: &B) -> Result<Vec<Message>> {
        backend.session_messages(&self.session_id).await
    }
}

/// Everything a send needs, captured at submit time.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub epoch: u64,
    pub session_id: Option<String>,
    pub email: String,
    /// Title used if the send has to create the session.
    pub title: String,
    pub question: String,
}

/// Result of running a [`PendingSend`].
#[derive(Debug)]
pub struct SendOutcome {
    pub epoch: u64,
    /// Who sent it; a session created for someone else is never listed.
    pub email: String,
    /// Set when this send created the session, even if a later step failed.
    pub created: Option<SessionSummary>,
    pub answer: Result<String>,
}

/// What [`ChatPanel::finish_send`] did with an outcome. Both arms carry the
/// session the send created, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendApplied {
    /// Applied to the transcript.
    Current(Option<SessionSummary>),
    /// Dropped because the panel moved on. The server-side session still exists.
    Stale(Option<SessionSummary>),
}

impl PendingSend {
    /// Persist the question, fetch the answer, persist the answer.
    ///
    /// Order on the wire: create-or-append(user), `/chat`, append(ai).
    pub async fn execute<B: ChatBackend>(self, backend: &B) -> SendOutcome {
        let mut created = None;
        let answer = self.run(backend, &mut created).await;
        SendOutcome {
            epoch: self.epoch,
            email: self.email,
            created,
            answer,
        }
    }

    async fn run<B: ChatBackend>(
        &self,
        backend: &B,
        created: &mut Option<SessionSummary>,
    ) -> Result<String> {
        let question = Message::user(&self.question);
        let session_id = match &self.session_id {
            Some(id) => {
                backend.append_message(id, &self.email, &question).await?;
                id.clone()
            }
            None => {
                let request = NewSessionRequest {
                    email: self.email.clone(),
                    title: self.title.clone(),
                    message: Some(question),
                };
                let id = backend.create_session(&request).await?;
                tracing::info!(id = %id, "chat: session created");
                *created = Some(SessionSummary::new(id.clone(), self.title.clone()));
                id
            }
        };

        let answer = backend.ask(&self.question).await?;

        // A failed persist of the answer is logged; the answer is still shown.
        if let Err(e) = backend
            .append_message(&session_id, &self.email, &Message::ai(&answer))
            .await
        {
            tracing::warn!(error = %e, session = %session_id, "chat: failed to persist answer");
        }
        Ok(answer)
    }
}

impl ChatPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // -- Input buffer --

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    // -- Session --

    /// Point the panel at `session`. A change of identity bumps the epoch and
    /// empties the transcript; a non-empty id yields the load to run.
    pub fn set_session(&mut self, session: Option<&SessionSummary>) -> Option<TranscriptLoad> {
        let next = session.map(|s| s.id.as_str()).filter(|id| !id.is_empty());
        if next == self.session_id.as_deref() {
            return None;
        }
        self.epoch += 1;
        self.session_id = next.map(str::to_string);
        self.messages.clear();
        self.loading = false;
        self.session_id.clone().map(|session_id| TranscriptLoad {
            epoch: self.epoch,
            session_id,
        })
    }

    /// Re-fetch the current session's transcript without changing the epoch.
    pub fn reload(&self) -> Option<TranscriptLoad> {
        self.session_id.clone().map(|session_id| TranscriptLoad {
            epoch: self.epoch,
            session_id,
        })
    }

    /// Replace the transcript with a loaded one. Returns `false` when stale.
    pub fn finish_load(&mut self, epoch: u64, result: Result<Vec<Message>>) -> bool {
        if epoch != self.epoch {
            tracing::debug!(epoch, current = self.epoch, "chat: dropping stale transcript");
            return false;
        }
        match result {
            Ok(messages) => self.messages = messages,
            Err(e) => {
                tracing::warn!(error = %e, "chat: failed to load transcript");
                self.messages.clear();
            }
        }
        true
    }

    // -- Send --

    /// Submit the input buffer.
    pub fn submit(&mut self, user: Option<&User>) -> Option<PendingSend> {
        let question = self.input.clone();
        self.begin_send(user, &question)
    }

    /// Append the question optimistically and capture what the send needs.
    /// A blank question, a missing user or a send already in flight is a no-op.
    pub fn begin_send(&mut self, user: Option<&User>, question: &str) -> Option<PendingSend> {
        let user = user?;
        if self.loading || question.trim().is_empty() {
            return None;
        }
        self.messages.push(Message::user(question));
        self.input.clear();
        self.loading = true;
        Some(PendingSend {
            epoch: self.epoch,
            session_id: self.session_id.clone(),
            email: user.email.clone(),
            title: new_session_title(),
            question: question.to_string(),
        })
    }

    /// Apply a send outcome. A stale outcome leaves the transcript alone but
    /// still reports the session it created.
    pub fn finish_send(&mut self, outcome: SendOutcome) -> SendApplied {
        if outcome.epoch != self.epoch {
            tracing::debug!(
                epoch = outcome.epoch,
                current = self.epoch,
                "chat: dropping stale send"
            );
            return SendApplied::Stale(outcome.created);
        }
        if let Some(ref created) = outcome.created {
            self.session_id = Some(created.id.clone());
        }
        match outcome.answer {
            Ok(answer) => self.messages.push(Message::ai(answer)),
            Err(e) => {
                tracing::warn!(error = %e, "chat: send failed");
                self.messages.push(Message::error());
            }
        }
        self.loading = false;
        SendApplied::Current(outcome.created)
    }

    /// Start over with no session. Unlike [`set_session`](Self::set_session)
    /// this always bumps the epoch, even when no session was active yet, so a
    /// first send still in flight can no longer claim the panel.
    pub fn new_chat(&mut self) {
        self.epoch += 1;
        self.session_id = None;
        self.messages.clear();
        self.loading = false;
    }

    /// Empty everything, e.g. on logout. Outstanding work becomes stale.
    pub fn reset(&mut self) {
        self.new_chat();
        self.input.clear();
    }
}
