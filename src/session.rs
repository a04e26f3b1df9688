//! Session orchestration: upload → generate → open → chat.
//!
//! One `Session` drives the workflow for one user: selecting an artifact,
//! generating and storing its summary, opening summaries from history, and
//! the chat loop. State lives in a single serializable object so the whole
//! machine can be observed and tested deterministically.
//!
//! Replies are delivered on a deferred tokio task after a simulated delay.
//! Deferred work is tagged with the record id and a chat epoch; results
//! arriving for a session that is no longer active are dropped rather than
//! applied to the newly opened summary.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::Serialize;
use uuid::Uuid;

use crate::error::GenerateError;
use crate::extract;
use crate::history::HistoryStore;
use crate::responder;
use crate::summarize;
use crate::types::{ChatMessage, EngineConfig, SummaryRecord, UploadedArtifact};

/// Where the session currently is in the upload/chat workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionPhase {
    /// Nothing selected, nothing open.
    NoArtifact,
    /// A file is selected and ready to generate.
    ArtifactSelected,
    /// Extraction and synthesis are running.
    Generating,
    /// A summary is open and the chat input is live.
    SummaryOpen,
    /// A reply is pending; new sends are rejected until it lands.
    Chatting,
}

/// One in-flight rename. At most one exists per session; starting another
/// replaces it without saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditSession {
    pub editing_id: String,
    pub editing_title: String,
}

/// The session's complete observable state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub phase: SessionPhase,
    /// The file picked for upload, kept across failed generations so the
    /// user can retry.
    #[serde(skip)]
    pub selected: Option<UploadedArtifact>,
    /// View of the currently open summary. A clone, not ownership — the
    /// history store remains the owner and the view survives deletion.
    pub open: Option<SummaryRecord>,
    pub transcript: Vec<ChatMessage>,
    pub chat_input: String,
    pub editing: Option<EditSession>,
    /// Bumped on every open/new-upload; stale deferred replies check it.
    #[serde(skip)]
    chat_epoch: u64,
}

impl SessionState {
    fn new() -> Self {
        Self {
            phase: SessionPhase::NoArtifact,
            selected: None,
            open: None,
            transcript: Vec::new(),
            chat_input: String::new(),
            editing: None,
            chat_epoch: 0,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrator for one user session over a shared history store.
pub struct Session {
    store: Arc<HistoryStore>,
    state: Arc<Mutex<SessionState>>,
    config: EngineConfig,
    rng: Mutex<StdRng>,
}

impl Session {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<HistoryStore>, config: EngineConfig) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState::new())),
            config,
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Session with a fixed random seed, for reproducible replies.
    pub fn with_seed(store: Arc<HistoryStore>, config: EngineConfig, seed: u64) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(SessionState::new())),
            config,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.state
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// A file was chosen. Replaces any prior selection without
    /// confirmation and closes any open summary. Rejected while a
    /// generation is running.
    pub fn select_artifact(&self, artifact: UploadedArtifact) {
        let Ok(mut s) = self.state.lock() else { return };
        if s.phase == SessionPhase::Generating {
            return;
        }
        log::debug!("Session: selected artifact {}", artifact.name);
        s.selected = Some(artifact);
        s.open = None;
        s.transcript.clear();
        s.chat_input.clear();
        s.chat_epoch += 1;
        s.phase = SessionPhase::ArtifactSelected;
    }

    /// Run extract → synthesize → store for the selected artifact.
    ///
    /// On success the selection is cleared and the new record's id is
    /// returned. On failure the selection is preserved so the same file
    /// can be retried or replaced, and the typed extraction error is
    /// surfaced for the presentation layer.
    pub fn generate(&self) -> Result<String, GenerateError> {
        let artifact = {
            let Ok(mut s) = self.state.lock() else {
                return Err(GenerateError::Busy);
            };
            if s.phase == SessionPhase::Generating {
                return Err(GenerateError::Busy);
            }
            let Some(artifact) = s.selected.clone() else {
                return Err(GenerateError::NoArtifact);
            };
            s.phase = SessionPhase::Generating;
            artifact
        };

        let format = extract::detect_format(&artifact);
        let outcome = extract::extract_with_config(&artifact, &self.config)
            .map(|bundle| summarize::synthesize(&bundle, format));

        match outcome {
            Ok(draft) => {
                let id = self.store.add(draft);
                if let Ok(mut s) = self.state.lock() {
                    s.selected = None;
                    s.phase = SessionPhase::NoArtifact;
                }
                log::info!("Session: generated summary {} from {}", id, artifact.name);
                Ok(id)
            }
            Err(e) => {
                if let Ok(mut s) = self.state.lock() {
                    s.phase = SessionPhase::ArtifactSelected;
                }
                log::warn!("Session: generation failed for {}: {}", artifact.name, e);
                Err(e.into())
            }
        }
    }

    /// Open a summary from history. Clears the transcript and input draft
    /// for the newly opened record. No-op for unknown ids.
    pub fn open(&self, id: &str) -> bool {
        let Some(record) = self.store.get(id) else {
            log::debug!("Session: open ignored for unknown id {}", id);
            return false;
        };
        let Ok(mut s) = self.state.lock() else { return false };
        if s.phase == SessionPhase::Generating {
            return false;
        }
        s.open = Some(record);
        s.transcript.clear();
        s.chat_input.clear();
        s.chat_epoch += 1;
        s.phase = SessionPhase::SummaryOpen;
        true
    }

    /// Return to the upload screen, clearing the open summary, chat
    /// transcript, input draft, and file selection.
    pub fn new_upload(&self) {
        let Ok(mut s) = self.state.lock() else { return };
        s.selected = None;
        s.open = None;
        s.transcript.clear();
        s.chat_input.clear();
        s.chat_epoch += 1;
        s.phase = SessionPhase::NoArtifact;
    }

    /// Update the chat input draft.
    pub fn set_chat_input(&self, text: &str) {
        if let Ok(mut s) = self.state.lock() {
            s.chat_input = text.to_string();
        }
    }

    /// Send a question about the open summary.
    ///
    /// The user message is appended synchronously; the reply is appended
    /// by a deferred task after the configured simulated delay. Returns
    /// false (a silent no-op) for blank questions, when no summary is
    /// open, or while a reply is already pending. Must be called within a
    /// tokio runtime.
    pub fn send(&self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let Ok(mut s) = self.state.lock() else { return false };
        if s.phase != SessionPhase::SummaryOpen {
            return false;
        }
        let Some(record) = s.open.clone() else { return false };

        let (reply, delay) = {
            let Ok(mut rng) = self.rng.lock() else { return false };
            let reply = responder::respond_with(text, &record, &mut *rng);
            let (lo, hi) = self.config.reply_delay_ms;
            let hi = hi.max(lo);
            let delay = Duration::from_millis(rng.random_range(lo..=hi));
            (reply, delay)
        };

        s.transcript.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            is_user: true,
            timestamp: Utc::now(),
        });
        s.chat_input.clear();
        s.phase = SessionPhase::Chatting;
        let epoch = s.chat_epoch;
        drop(s);

        log::debug!(
            "Session: reply for {} scheduled in {}ms",
            record.id,
            delay.as_millis()
        );

        let state = Arc::clone(&self.state);
        let record_id = record.id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            deliver_reply(&state, &record_id, epoch, reply);
        });
        true
    }

    /// Begin renaming a record, seeding the draft with its current title.
    /// Replaces any in-flight edit without saving it.
    pub fn start_edit(&self, id: &str) -> bool {
        let Some(record) = self.store.get(id) else { return false };
        let Ok(mut s) = self.state.lock() else { return false };
        s.editing = Some(EditSession {
            editing_id: record.id,
            editing_title: record.title,
        });
        true
    }

    /// Update the rename draft.
    pub fn set_edit_title(&self, draft: &str) {
        if let Ok(mut s) = self.state.lock() {
            if let Some(edit) = s.editing.as_mut() {
                edit.editing_title = draft.to_string();
            }
        }
    }

    /// Commit the rename draft. A draft that trims to empty is rejected
    /// silently: no rename happens and the edit session stays open with
    /// the invalid draft.
    pub fn save_edit(&self) -> bool {
        let Ok(mut s) = self.state.lock() else { return false };
        let Some(edit) = s.editing.clone() else { return false };
        if edit.editing_title.trim().is_empty() {
            return false;
        }
        self.store.rename(&edit.editing_id, &edit.editing_title);
        s.editing = None;
        true
    }

    /// Abandon the rename draft.
    pub fn cancel_edit(&self) {
        if let Ok(mut s) = self.state.lock() {
            s.editing = None;
        }
    }

    /// One-shot rename: begin an edit, set the draft, and try to commit.
    /// On a blank draft the edit session is left open, like `save_edit`.
    pub fn rename(&self, id: &str, draft: &str) -> bool {
        if !self.start_edit(id) {
            return false;
        }
        self.set_edit_title(draft);
        self.save_edit()
    }

    /// Delete a record from history. The open summary view, if it is the
    /// one deleted, stays readable; a matching edit session is dropped.
    pub fn delete(&self, id: &str) {
        self.store.delete(id);
        if let Ok(mut s) = self.state.lock() {
            if s.editing.as_ref().is_some_and(|e| e.editing_id == id) {
                s.editing = None;
            }
        }
    }
}

/// Apply a deferred reply, unless the session it targets is gone.
fn deliver_reply(state: &Arc<Mutex<SessionState>>, record_id: &str, epoch: u64, reply: String) {
    let Ok(mut s) = state.lock() else { return };

    let still_active = s.chat_epoch == epoch
        && s.phase == SessionPhase::Chatting
        && s.open.as_ref().is_some_and(|r| r.id == record_id);
    if !still_active {
        log::debug!("Session: dropped stale reply for {}", record_id);
        return;
    }

    s.transcript.push(ChatMessage {
        id: Uuid::new_v4().to_string(),
        text: reply,
        is_user: false,
        timestamp: Utc::now(),
    });
    s.phase = SessionPhase::SummaryOpen;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;

    fn text_artifact(name: &str, body: &str) -> UploadedArtifact {
        UploadedArtifact::new(name, Some("text/plain".to_string()), body.as_bytes().to_vec())
    }

    fn session() -> Session {
        Session::with_seed(Arc::new(HistoryStore::new()), EngineConfig::default(), 7)
    }

    fn session_with_store(store: Arc<HistoryStore>) -> Session {
        Session::with_seed(store, EngineConfig::default(), 7)
    }

    /// Generate a summary and open it, returning its id.
    fn open_generated(session: &Session, name: &str) -> String {
        session.select_artifact(text_artifact(name, "study material"));
        let id = session.generate().unwrap();
        assert!(session.open(&id));
        id
    }

    #[test]
    fn test_initial_state() {
        let snap = session().snapshot();
        assert_eq!(snap.phase, SessionPhase::NoArtifact);
        assert!(snap.selected.is_none());
        assert!(snap.open.is_none());
        assert!(snap.transcript.is_empty());
        assert!(snap.editing.is_none());
    }

    #[test]
    fn test_select_replaces_prior_selection() {
        let session = session();
        session.select_artifact(text_artifact("first.txt", "one"));
        session.select_artifact(text_artifact("second.txt", "two"));

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::ArtifactSelected);
        assert_eq!(snap.selected.unwrap().name, "second.txt");
    }

    #[test]
    fn test_generate_success_clears_selection_and_stores() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        session.select_artifact(text_artifact("notes.txt", "plain text notes"));

        let id = session.generate().unwrap();

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::NoArtifact);
        assert!(snap.selected.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].id, id);
        assert_eq!(store.list()[0].title, "Summary of notes.txt");
    }

    #[test]
    fn test_generate_without_selection_is_rejected() {
        let session = session();
        assert!(matches!(session.generate(), Err(GenerateError::NoArtifact)));
        assert_eq!(session.snapshot().phase, SessionPhase::NoArtifact);
    }

    #[test]
    fn test_generate_failure_preserves_selection_for_retry() {
        let store = Arc::new(HistoryStore::new());
        let config = EngineConfig {
            max_artifact_bytes: 4,
            ..EngineConfig::default()
        };
        let session = Session::with_seed(Arc::clone(&store), config, 7);

        session.select_artifact(text_artifact("big.txt", "way too many bytes"));
        match session.generate() {
            Err(GenerateError::Extract(ExtractError::TooLarge { .. })) => {}
            other => panic!("Expected TooLarge, got {:?}", other),
        }

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::ArtifactSelected);
        assert_eq!(snap.selected.unwrap().name, "big.txt");
        assert!(store.is_empty());

        // Replacing the selection allows a successful retry
        session.select_artifact(text_artifact("ok.txt", "tiny"));
        assert!(session.generate().is_ok());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_generate_invalid_pdf_surfaces_typed_error() {
        let session = session();
        session.select_artifact(UploadedArtifact::new(
            "broken.pdf",
            Some("application/pdf".to_string()),
            b"not a pdf".to_vec(),
        ));
        match session.generate() {
            Err(GenerateError::Extract(ExtractError::InvalidFormat(_))) => {}
            other => panic!("Expected InvalidFormat, got {:?}", other),
        }
        assert!(session.snapshot().selected.is_some());
    }

    #[test]
    fn test_open_unknown_id_is_noop() {
        let session = session();
        assert!(!session.open("missing"));
        assert_eq!(session.snapshot().phase, SessionPhase::NoArtifact);
    }

    #[test]
    fn test_open_sets_view_and_clears_chat() {
        let session = session();
        let id = open_generated(&session, "chapter.txt");

        session.set_chat_input("half-typed question");
        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::SummaryOpen);
        assert_eq!(snap.open.as_ref().unwrap().id, id);

        // Re-opening clears the draft
        assert!(session.open(&id));
        assert!(session.snapshot().chat_input.is_empty());
    }

    #[test]
    fn test_new_upload_resets_everything() {
        let session = session();
        open_generated(&session, "chapter.txt");
        session.set_chat_input("draft");

        session.new_upload();

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::NoArtifact);
        assert!(snap.open.is_none());
        assert!(snap.selected.is_none());
        assert!(snap.transcript.is_empty());
        assert!(snap.chat_input.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_appends_user_message_then_deferred_reply() {
        let session = session();
        open_generated(&session, "chapter.txt");

        assert!(session.send("what is this about?"));

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::Chatting);
        assert_eq!(snap.transcript.len(), 1);
        assert!(snap.transcript[0].is_user);
        assert_eq!(snap.transcript[0].text, "what is this about?");

        // Reply lands within the configured 1-2s window
        tokio::time::sleep(Duration::from_millis(2500)).await;

        let snap = session.snapshot();
        assert_eq!(snap.phase, SessionPhase::SummaryOpen);
        assert_eq!(snap.transcript.len(), 2);
        assert!(!snap.transcript[1].is_user);
        assert!(snap.transcript[1].text.starts_with("This summary is about"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_rejected_while_reply_pending() {
        let session = session();
        open_generated(&session, "chapter.txt");

        assert!(session.send("first question"));
        assert!(!session.send("second question"), "send while Chatting must be rejected");

        tokio::time::sleep(Duration::from_millis(2500)).await;

        // Only the first exchange happened; sending works again now
        assert_eq!(session.snapshot().transcript.len(), 2);
        assert!(session.send("second question"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_rejects_blank_and_unopened() {
        let session = session();
        assert!(!session.send("no summary open yet"));

        open_generated(&session, "chapter.txt");
        assert!(!session.send(""));
        assert!(!session.send("   \t "));
        assert!(session.snapshot().transcript.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_opening_another_summary_clears_transcript() {
        let session = session();
        let _x = open_generated(&session, "first.txt");
        assert!(session.send("hello?"));
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(session.snapshot().transcript.len(), 2);

        session.select_artifact(text_artifact("second.txt", "more"));
        let y = session.generate().unwrap();
        assert!(session.open(&y));

        let snap = session.snapshot();
        assert!(snap.transcript.is_empty(), "opened summary must start with an empty transcript");
        assert_eq!(snap.open.unwrap().id, y);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reply_is_dropped_after_reopen() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        let x = open_generated(&session, "first.txt");

        session.select_artifact(text_artifact("second.txt", "more"));
        let y = session.generate().unwrap();

        assert!(session.open(&x));
        assert!(session.send("question for the first summary"));

        // Switch away while the reply is still in flight
        assert!(session.open(&y));
        assert!(session.snapshot().transcript.is_empty());

        tokio::time::sleep(Duration::from_millis(2500)).await;

        let snap = session.snapshot();
        assert!(
            snap.transcript.is_empty(),
            "stale reply must not land in the new session"
        );
        assert_eq!(snap.phase, SessionPhase::SummaryOpen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_reply_dropped_even_for_same_record_reopened() {
        let session = session();
        let x = open_generated(&session, "first.txt");

        assert!(session.send("question"));
        // Reopening the same record resets the chat session
        assert!(session.open(&x));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(session.snapshot().transcript.is_empty());
    }

    #[test]
    fn test_edit_flow_replaces_and_saves() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        session.select_artifact(text_artifact("a.txt", "one"));
        let a = session.generate().unwrap();
        session.select_artifact(text_artifact("b.txt", "two"));
        let b = session.generate().unwrap();

        assert!(session.start_edit(&a));
        // Starting an edit on another record silently replaces the first
        assert!(session.start_edit(&b));
        let editing = session.snapshot().editing.unwrap();
        assert_eq!(editing.editing_id, b);
        assert_eq!(editing.editing_title, "Summary of b.txt");

        session.set_edit_title("Week two reading");
        assert!(session.save_edit());
        assert!(session.snapshot().editing.is_none());
        assert_eq!(store.get(&b).unwrap().title, "Week two reading");
        // The other record was never auto-saved
        assert_eq!(store.get(&a).unwrap().title, "Summary of a.txt");
    }

    #[test]
    fn test_save_edit_blank_draft_keeps_session_open() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        session.select_artifact(text_artifact("a.txt", "one"));
        let a = session.generate().unwrap();

        assert!(session.start_edit(&a));
        session.set_edit_title("   ");
        assert!(!session.save_edit());

        let editing = session.snapshot().editing.unwrap();
        assert_eq!(editing.editing_id, a);
        assert_eq!(editing.editing_title, "   ");
        assert_eq!(store.get(&a).unwrap().title, "Summary of a.txt");
    }

    #[test]
    fn test_cancel_edit_discards_draft() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        session.select_artifact(text_artifact("a.txt", "one"));
        let a = session.generate().unwrap();

        session.start_edit(&a);
        session.set_edit_title("never applied");
        session.cancel_edit();

        assert!(session.snapshot().editing.is_none());
        assert_eq!(store.get(&a).unwrap().title, "Summary of a.txt");
    }

    #[test]
    fn test_one_shot_rename() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        session.select_artifact(text_artifact("a.txt", "one"));
        let a = session.generate().unwrap();

        assert!(session.rename(&a, "Renamed"));
        assert_eq!(store.get(&a).unwrap().title, "Renamed");

        assert!(!session.rename(&a, "  "));
        assert_eq!(store.get(&a).unwrap().title, "Renamed");
        // Blank draft leaves the edit session open, like save_edit
        assert!(session.snapshot().editing.is_some());
    }

    #[test]
    fn test_delete_clears_matching_edit_and_keeps_open_view() {
        let store = Arc::new(HistoryStore::new());
        let session = session_with_store(Arc::clone(&store));
        let a = open_generated(&session, "a.txt");

        session.start_edit(&a);
        session.delete(&a);

        assert!(store.get(&a).is_none());
        let snap = session.snapshot();
        assert!(snap.editing.is_none());
        // The open view outlives the stored record
        assert_eq!(snap.open.unwrap().id, a);
    }

    #[test]
    fn test_state_snapshot_serializes() {
        let session = session();
        open_generated(&session, "chapter.txt");

        let json = serde_json::to_string(&session.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"summaryOpen\""));
        assert!(json.contains("\"transcript\""));
    }
}
