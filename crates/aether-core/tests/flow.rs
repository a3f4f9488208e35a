mod common;

use aether_core::auth;
use aether_core::files::{PickedFile, ONLY_PDF};
use aether_core::identity::IdentityStore;
use aether_core::model::{Message, Role, SessionSummary, UploadedFile, PDF_MIME};
use aether_core::storage::{ClientStorage, Storage, CURRENT_SESSION_KEY, USER_KEY};

use common::*;

fn pdf(name: &str) -> PickedFile {
    PickedFile {
        filename: name.into(),
        mime: PDF_MIME.into(),
        bytes: b"%PDF-1.4".to_vec(),
    }
}

// -- Auth --

#[tokio::test]
async fn test_login_commits_user_and_refreshes_views() {
    let storage = Storage::in_memory();
    let mut backend = RecordingBackend::new();
    backend.files = vec![UploadedFile::from_name("paper.pdf")];
    backend.sessions = vec![SessionSummary::new("s1", "First")];
    let mut ws = workspace(storage.clone());

    let user = ws.login(&backend, "google-jwt").await.unwrap();
    assert_eq!(user.email, "a@b.com");
    assert_eq!(ws.files.files().len(), 1);
    assert_eq!(ws.history.sessions().len(), 1);
    assert!(storage.get(USER_KEY).unwrap().is_some());

    let calls = backend.calls();
    assert_eq!(calls[0], Call::AuthGoogle("google-jwt".into()));
    assert!(calls.contains(&Call::MyFiles("a@b.com".into())));
    assert!(calls.contains(&Call::ChatSessions("a@b.com".into())));
}

#[tokio::test]
async fn test_blank_credential_makes_no_request() {
    let backend = RecordingBackend::new();
    let mut identity = IdentityStore::load(Storage::in_memory());
    assert!(auth::login(&backend, &mut identity, "  ").await.is_err());
    assert!(backend.calls().is_empty());
    assert!(!identity.is_logged_in());
}

#[tokio::test]
async fn test_failed_login_leaves_user_absent() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::Auth);
    let mut identity = IdentityStore::load(Storage::in_memory());
    let err = auth::login(&backend, &mut identity, "jwt").await.unwrap_err();
    assert!(err.is_network());
    assert!(!identity.is_logged_in());
}

#[tokio::test]
async fn test_profile_without_email_is_rejected() {
    let mut backend = RecordingBackend::new();
    backend.profile = Some(aether_core::model::User::new("", "Nobody"));
    assert!(auth::exchange(&backend, "jwt").await.is_err());
}

// -- Files --

#[tokio::test]
async fn test_mirrored_selection_tracks_each_toggle() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());

    ws.toggle_file(&backend, "a.pdf").await;
    ws.toggle_file(&backend, "b.pdf").await;
    ws.toggle_file(&backend, "a.pdf").await;

    let mirrored: Vec<Vec<String>> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::SelectedFiles(files) => Some(files),
            _ => None,
        })
        .collect();
    assert_eq!(
        mirrored,
        vec![
            vec!["a.pdf".to_string()],
            vec!["a.pdf".to_string(), "b.pdf".to_string()],
            vec!["b.pdf".to_string()],
        ]
    );
    assert_eq!(mirrored.last().unwrap(), ws.files.selected());
}

#[tokio::test]
async fn test_mirror_failure_keeps_local_selection() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::SelectedFiles);
    let mut ws = workspace(logged_in_storage());
    ws.toggle_file(&backend, "a.pdf").await;
    assert!(ws.files.is_selected("a.pdf"));
}

#[tokio::test]
async fn test_non_pdf_upload_makes_no_request() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    let picked = PickedFile {
        filename: "notes.txt".into(),
        mime: "text/plain".into(),
        bytes: b"hi".to_vec(),
    };
    let status = ws.upload(&backend, picked).await;
    assert_eq!(status.as_deref(), Some(ONLY_PDF));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_upload_refreshes_listing() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    let status = ws.upload(&backend, pdf("paper.pdf")).await;
    assert_eq!(status.as_deref(), Some("Uploaded paper.pdf"));
    assert_eq!(
        backend.calls(),
        vec![
            Call::Upload {
                filename: "paper.pdf".into(),
                email: "a@b.com".into(),
            },
            Call::MyFiles("a@b.com".into()),
        ]
    );
}

#[tokio::test]
async fn test_upload_failure_shows_generic_status() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::Upload);
    let mut ws = workspace(logged_in_storage());
    let status = ws.upload(&backend, pdf("paper.pdf")).await;
    assert_eq!(status.as_deref(), Some("Upload failed."));
}

// -- Chat --

#[tokio::test]
async fn test_blank_question_makes_no_request() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    ws.send(&backend, "   ").await.unwrap();
    assert!(ws.chat.messages().is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_send_without_user_makes_no_request() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(Storage::in_memory());
    ws.send(&backend, "Hello").await.unwrap();
    assert!(ws.chat.messages().is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_first_message_creates_session() {
    let storage = logged_in_storage();
    let backend = RecordingBackend::new();
    let mut ws = workspace(storage.clone());

    ws.send(&backend, "Hello").await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 3);
    let Call::CreateSession(ref created) = calls[0] else {
        panic!("expected session create first, got {:?}", calls[0]);
    };
    assert_eq!(created.email, "a@b.com");
    assert_eq!(created.message, Some(Message::user("Hello")));
    assert!(!created.title.is_empty());
    assert_eq!(calls[1], Call::Ask("Hello".into()));

    let session = ws.session().cloned().unwrap();
    assert_eq!(session.title, created.title);
    assert_eq!(
        calls[2],
        Call::AppendMessage {
            session: session.id.clone(),
            message: Message::ai("Hi there"),
        }
    );

    assert_eq!(
        ws.chat.messages(),
        &[Message::user("Hello"), Message::ai("Hi there")]
    );
    let persisted: Option<SessionSummary> = storage.get_json(CURRENT_SESSION_KEY).unwrap();
    assert_eq!(persisted, Some(session.clone()));
    assert!(ws.history.sessions().iter().any(|s| s.id == session.id));

    // Follow-ups reuse the returned id.
    backend.clear_calls();
    ws.send(&backend, "And then?").await.unwrap();
    assert!(!backend
        .calls()
        .iter()
        .any(|c| matches!(c, Call::CreateSession(_))));
    assert_eq!(
        backend.calls()[0],
        Call::AppendMessage {
            session: session.id,
            message: Message::user("And then?"),
        }
    );
}

#[tokio::test]
async fn test_existing_session_appends_user_then_ai() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    ws.select_session(SessionSummary::new("s1", "First")).unwrap();

    ws.send(&backend, "What is RAG?").await.unwrap();

    assert_eq!(
        backend.calls(),
        vec![
            Call::AppendMessage {
                session: "s1".into(),
                message: Message::user("What is RAG?"),
            },
            Call::Ask("What is RAG?".into()),
            Call::AppendMessage {
                session: "s1".into(),
                message: Message::ai("Hi there"),
            },
        ]
    );
}

#[tokio::test]
async fn test_answer_failure_appends_error_reply() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::Ask);
    let mut ws = workspace(logged_in_storage());
    ws.select_session(SessionSummary::new("s1", "First")).unwrap();

    ws.send(&backend, "Hello").await.unwrap();

    let last = ws.chat.messages().last().unwrap();
    assert_eq!(last.role, Role::Ai);
    assert_eq!(last.text, "Error.");
    assert!(!ws.chat.is_loading());
}

#[tokio::test]
async fn test_create_failure_leaves_no_session() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::CreateSession);
    let mut ws = workspace(logged_in_storage());

    ws.send(&backend, "Hello").await.unwrap();

    assert!(ws.session().is_none());
    assert_eq!(ws.chat.messages().last().unwrap().text, "Error.");
    assert!(!backend.calls().iter().any(|c| matches!(c, Call::Ask(_))));
}

#[tokio::test]
async fn test_selecting_session_loads_transcript() {
    let mut backend = RecordingBackend::new();
    backend.transcripts.insert(
        "s1".into(),
        vec![Message::user("q"), Message::ai("a")],
    );
    let mut ws = workspace(logged_in_storage());

    let load = ws
        .select_session(SessionSummary::new("s1", "First"))
        .unwrap()
        .unwrap();
    let result = load.execute(&backend).await;
    assert!(ws.chat.finish_load(load.epoch, result));
    assert_eq!(ws.chat.messages().len(), 2);
}

#[tokio::test]
async fn test_unknown_session_loads_empty_transcript() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    ws.select_session(SessionSummary::new("missing", "Gone")).unwrap();
    ws.refresh_user_views(&backend).await;
    assert!(ws.chat.messages().is_empty());
    assert!(backend
        .calls()
        .contains(&Call::SessionMessages("missing".into())));
}

// -- Session pointer --

#[tokio::test]
async fn test_new_chat_then_reload_has_no_session() {
    let storage = logged_in_storage();
    let mut ws = workspace(storage.clone());
    ws.select_session(SessionSummary::new("s1", "First")).unwrap();
    ws.new_chat().unwrap();

    let reloaded = workspace(storage);
    assert!(reloaded.session().is_none());
    assert!(reloaded.chat.messages().is_empty());
}

#[tokio::test]
async fn test_logout_clears_pointer_and_lists() {
    let storage = logged_in_storage();
    let mut backend = RecordingBackend::new();
    backend.files = vec![UploadedFile::from_name("paper.pdf")];
    backend.sessions = vec![SessionSummary::new("s1", "First")];
    let mut ws = workspace(storage.clone());
    ws.refresh_user_views(&backend).await;
    ws.select_session(SessionSummary::new("s1", "First")).unwrap();
    ws.send(&backend, "Hello").await.unwrap();

    ws.logout().unwrap();

    assert!(storage.get(CURRENT_SESSION_KEY).unwrap().is_none());
    assert!(ws.files.files().is_empty());
    assert!(ws.history.sessions().is_empty());
    assert!(ws.chat.messages().is_empty());
    assert!(workspace(storage).user().is_none());
}

#[tokio::test]
async fn test_stale_send_after_switching_sessions_is_dropped() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    ws.refresh_user_views(&backend).await;

    let pending = ws.begin_send("Hello").unwrap();
    ws.select_session(SessionSummary::new("other", "Other")).unwrap();
    let outcome = pending.execute(&backend).await;
    let created = outcome.created.clone().unwrap();
    ws.finish_send(outcome).unwrap();

    // The server still created a session: it is listed, but the client stays on "other".
    assert_eq!(ws.session().map(|s| s.id.as_str()), Some("other"));
    assert!(ws.chat.messages().is_empty());
    assert!(ws.history.sessions().iter().any(|s| s.id == created.id));
}

#[tokio::test]
async fn test_new_chat_after_failed_first_send_clears_transcript() {
    let backend = RecordingBackend::new();
    backend.fail(Endpoint::CreateSession);
    let mut ws = workspace(logged_in_storage());

    ws.send(&backend, "Hello").await.unwrap();
    assert!(ws.session().is_none());
    assert_eq!(ws.chat.messages().len(), 2);

    assert!(ws.new_chat().unwrap().is_none());
    assert!(ws.session().is_none());
    assert!(ws.chat.messages().is_empty());
    assert!(!ws.chat.is_loading());
}

#[tokio::test]
async fn test_new_chat_during_first_send_keeps_client_sessionless() {
    let backend = RecordingBackend::new();
    let storage = logged_in_storage();
    let mut ws = workspace(storage.clone());
    ws.refresh_user_views(&backend).await;

    let pending = ws.begin_send("Hello").unwrap();
    ws.new_chat().unwrap();
    let outcome = pending.execute(&backend).await;
    let created = outcome.created.clone().unwrap();
    ws.finish_send(outcome).unwrap();

    assert!(ws.session().is_none());
    assert!(ws.chat.session_id().is_none());
    assert!(ws.chat.messages().is_empty());
    assert!(storage.get(CURRENT_SESSION_KEY).unwrap().is_none());
    assert!(workspace(storage).session().is_none());
    // Listed for later, not activated.
    assert!(ws.history.sessions().iter().any(|s| s.id == created.id));
}

#[tokio::test]
async fn test_stale_send_after_logout_is_not_listed() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());
    ws.refresh_user_views(&backend).await;

    let pending = ws.begin_send("Hello").unwrap();
    ws.logout().unwrap();
    let outcome = pending.execute(&backend).await;
    ws.finish_send(outcome).unwrap();

    assert!(ws.session().is_none());
    assert!(ws.history.sessions().is_empty());
}

#[tokio::test]
async fn test_select_session_at_picks_listed_session() {
    let mut backend = RecordingBackend::new();
    backend.sessions = vec![
        SessionSummary::new("s1", "First"),
        SessionSummary::new("s2", "Second"),
    ];
    let storage = logged_in_storage();
    let mut ws = workspace(storage.clone());
    ws.refresh_user_views(&backend).await;

    let load = ws.select_session_at(1).unwrap().unwrap();
    assert_eq!(load.session_id, "s2");
    assert_eq!(ws.session().map(|s| s.id.as_str()), Some("s2"));
    assert_eq!(workspace(storage).session().map(|s| s.id.as_str()), Some("s2"));

    assert!(ws.select_session_at(5).unwrap().is_none());
    assert_eq!(ws.session().map(|s| s.id.as_str()), Some("s2"));
}

// -- Scenario --

#[tokio::test]
async fn test_hello_scenario() {
    let backend = RecordingBackend::new();
    let mut ws = workspace(logged_in_storage());

    ws.chat.set_input("Hello");
    let pending = ws.submit().unwrap();
    let outcome = pending.execute(&backend).await;
    ws.finish_send(outcome).unwrap();

    let creates: Vec<_> = backend
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::CreateSession(r) => Some(r),
            _ => None,
        })
        .collect();
    assert_eq!(creates.len(), 1);
    assert_eq!(
        serde_json::to_value(creates[0].message.as_ref().unwrap()).unwrap(),
        serde_json::json!({"role": "user", "text": "Hello"})
    );
    let asks: Vec<_> = backend
        .calls()
        .into_iter()
        .filter(|c| matches!(c, Call::Ask(_)))
        .collect();
    assert_eq!(asks, vec![Call::Ask("Hello".into())]);

    let roles: Vec<Role> = ws.chat.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Ai]);
    assert_eq!(ws.chat.messages()[0].text, "Hello");
}
