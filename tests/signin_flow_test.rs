//! End-to-end behaviour of the sign-in controller against fake collaborators

mod common;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Notify;

use common::{
    creds, BrokenStore, GatedStore, Harness, RecordingNavigator, RecordingView, ScriptedAuthClient,
    ViewCall, DEFAULT_ROUTE,
};
use console_signin::{
    FailureKind, Field, FieldEdit, Localizer, LoginOutcome, OutcomeKind, Phase, SessionStore,
    SessionToken, SignInController, SignInEvent, SubmitResult,
};

fn success(token: &str) -> LoginOutcome {
    LoginOutcome::Success(SessionToken::new(token))
}

#[tokio::test]
async fn test_success_stores_token_and_navigates_once() -> Result<()> {
    let h = Harness::with_outcomes(vec![success("abc123")]);

    let result = h.controller.submit(creds("secret")).await;
    assert_eq!(result, SubmitResult::Completed(OutcomeKind::Success));

    let token = h.store.get().await?.expect("token stored");
    assert_eq!(token.as_str(), "abc123");
    assert_eq!(h.navigator.routes(), vec![DEFAULT_ROUTE.to_string()]);

    let state = h.controller.state().await;
    assert!(!state.loading);
    assert!(state.error_message.is_none());
    assert_eq!(h.controller.phase().await, Phase::Idle);
    assert_eq!(h.client.calls(), 1);
    assert_eq!(h.client.requests()[0].password, "secret");
    Ok(())
}

#[tokio::test]
async fn test_success_shows_notification() {
    let h = Harness::with_outcomes(vec![success("abc123")]);
    let mut events = h.controller.subscribe();

    h.controller.submit(creds("secret")).await;

    assert!(h
        .view
        .calls()
        .contains(&ViewCall::Notify("Sign in successfully".to_string())));

    let mut signed_in = None;
    while let Ok(event) = events.try_recv() {
        if let SignInEvent::SignedIn { route, message, .. } = event {
            signed_in = Some((route, message));
        }
    }
    assert_eq!(
        signed_in,
        Some((DEFAULT_ROUTE.to_string(), "Sign in successfully".to_string()))
    );
}

#[tokio::test]
async fn test_empty_password_never_calls_login() {
    let h = Harness::with_outcomes(vec![success("abc123")]);
    let mut events = h.controller.subscribe();

    let result = h.controller.submit(creds("")).await;

    match result {
        SubmitResult::Invalid(err) => {
            assert_eq!(err.field, Field::Password);
            assert_eq!(err.message, "Please enter password");
        }
        other => panic!("expected validation failure, got {:?}", other),
    }
    assert_eq!(h.client.calls(), 0);

    let state = h.controller.state().await;
    assert!(!state.loading);
    assert_eq!(state.validation.as_ref().map(|v| v.field), Some(Field::Password));

    // loading was never rendered as true
    assert!(h.view.calls().iter().all(|c| match c {
        ViewCall::Render(state) => !state.loading,
        _ => true,
    }));
    assert!(matches!(
        events.try_recv(),
        Ok(SignInEvent::ValidationFailed { field: Field::Password, .. })
    ));
}

#[tokio::test]
async fn test_rejected_shows_localized_error_and_refocuses_after_render() {
    let h = Harness::with_outcomes(vec![LoginOutcome::rejected("auth.bad_password")]);
    h.view.clear();

    let result = h.controller.submit(creds("wrong")).await;
    assert_eq!(result, SubmitResult::Completed(OutcomeKind::Rejected));

    let localizer = Localizer::english();
    let expected = localizer.sign_in_error(&localizer.translate("auth.bad_password"));

    let state = h.controller.state().await;
    assert!(!state.loading);
    assert_eq!(state.error_message.as_deref(), Some(expected.as_str()));
    assert_eq!(state.credentials.password, "");
    assert_eq!(h.controller.phase().await, Phase::Error);

    // Focus comes after the render that re-enabled the password input
    let calls = h.view.calls();
    let focus_at = calls
        .iter()
        .position(|c| *c == ViewCall::Focus(Field::Password))
        .expect("password refocused");
    let rendered = h.view.rendered_before(focus_at).expect("render before focus");
    assert!(!rendered.loading);
    assert_eq!(rendered.error_message.as_deref(), Some(expected.as_str()));
    assert_eq!(h.view.focus_count(), 1);
    assert!(h.navigator.routes().is_empty());
}

#[tokio::test]
async fn test_rejected_unknown_code_falls_back_to_server_message_then_code() {
    let h = Harness::with_outcomes(vec![
        LoginOutcome::Rejected {
            error_code: "auth.strange".to_string(),
            message: Some("strange failure".to_string()),
        },
        LoginOutcome::rejected("auth.stranger"),
    ]);

    h.controller.submit(creds("x")).await;
    assert_eq!(
        h.controller.state().await.error_message.as_deref(),
        Some("Sign in failed: strange failure")
    );

    h.controller.submit(creds("x")).await;
    assert_eq!(
        h.controller.state().await.error_message.as_deref(),
        Some("Sign in failed: auth.stranger")
    );
}

#[tokio::test]
async fn test_transport_failure_uses_message_verbatim() {
    let h = Harness::with_outcomes(vec![LoginOutcome::transport("network down")]);

    let result = h.controller.submit(creds("secret")).await;
    assert_eq!(result, SubmitResult::Completed(OutcomeKind::TransportFailure));

    let state = h.controller.state().await;
    let message = state.error_message.expect("error shown");
    assert!(message.contains("network down"));
    assert_eq!(state.credentials.password, "");
    assert!(!state.loading);
    assert_eq!(h.view.focus_count(), 1);
    assert!(h.store.get().await.unwrap().is_none());
}

#[tokio::test]
async fn test_already_handled_shows_no_error_but_releases_form() {
    let h = Harness::with_outcomes(vec![LoginOutcome::AlreadyHandled(FailureKind::Transport)]);
    let mut events = h.controller.subscribe();

    let result = h.controller.submit(creds("secret")).await;
    assert_eq!(result, SubmitResult::Completed(OutcomeKind::AlreadyHandled));

    let state = h.controller.state().await;
    assert!(!state.loading);
    assert!(state.error_message.is_none());
    assert_eq!(state.credentials.password, "secret");
    assert_eq!(h.controller.phase().await, Phase::Idle);
    assert_eq!(h.view.focus_count(), 0);

    let mut failed = None;
    while let Ok(event) = events.try_recv() {
        if let SignInEvent::SignInFailed { kind, message, .. } = event {
            failed = Some((kind, message));
        }
    }
    assert_eq!(failed, Some((FailureKind::AlreadyHandled, None)));
}

#[tokio::test]
async fn test_submit_while_loading_is_ignored() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(ScriptedAuthClient::gated(vec![success("abc123")], gate.clone()));

    let controller = Arc::clone(&h.controller);
    let first = tokio::spawn(async move { controller.submit(creds("secret")).await });
    h.client.wait_entered().await;

    let before = h.controller.state().await;
    assert!(before.loading);
    assert_eq!(h.controller.phase().await, Phase::Submitting);

    let second = h.controller.submit(creds("other")).await;
    assert_eq!(second, SubmitResult::Ignored);
    assert_eq!(h.controller.state().await, before);
    assert_eq!(h.client.calls(), 1);

    // Inputs are disabled mid-flight
    assert_eq!(h.controller.on_field_edit(Field::Password, "typed").await, FieldEdit::Ignored);

    gate.notify_one();
    assert_eq!(first.await?, SubmitResult::Completed(OutcomeKind::Success));
    assert_eq!(h.client.calls(), 1);
    assert_eq!(h.navigator.routes().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_consecutive_failures_do_not_stack_errors() {
    let h = Harness::with_outcomes(vec![
        LoginOutcome::rejected("auth.bad_password"),
        LoginOutcome::transport("network down"),
    ]);

    h.controller.submit(creds("one")).await;
    let first = h.controller.state().await.error_message.expect("first error");

    h.view.clear();
    h.controller.submit(creds("two")).await;

    // The new attempt starts from a clean slate
    let calls = h.view.calls();
    match calls.first() {
        Some(ViewCall::Render(state)) => {
            assert!(state.loading);
            assert!(state.error_message.is_none());
        }
        other => panic!("expected a render first, got {:?}", other),
    }

    let second = h.controller.state().await.error_message.expect("second error");
    assert_ne!(first, second);
    assert!(second.contains("network down"));
    assert!(!second.contains("Incorrect username or password"));
}

#[tokio::test]
async fn test_edit_in_error_clears_message_immediately() {
    let h = Harness::with_outcomes(vec![
        LoginOutcome::rejected("auth.bad_password"),
        LoginOutcome::rejected("auth.bad_password"),
    ]);

    h.controller.submit(creds("wrong")).await;
    assert_eq!(h.controller.phase().await, Phase::Error);

    assert_eq!(h.controller.on_field_edit(Field::Password, "n").await, FieldEdit::Applied);
    let state = h.controller.state().await;
    assert!(state.error_message.is_none());
    assert_eq!(state.credentials.password, "n");
    assert_eq!(h.controller.phase().await, Phase::Idle);

    // The locked username keeps its value but the edit still clears the error
    h.controller.submit(creds("wrong")).await;
    assert_eq!(h.controller.on_field_edit(Field::Username, "admin").await, FieldEdit::Locked);
    let state = h.controller.state().await;
    assert!(state.error_message.is_none());
    assert_eq!(state.credentials.username, "root");
}

#[tokio::test]
async fn test_submit_form_uses_edited_values() {
    let h = Harness::with_outcomes(vec![success("abc123")]);

    h.controller.on_field_edit(Field::Password, "typed-secret").await;
    let result = h.controller.submit_form().await;

    assert_eq!(result, SubmitResult::Completed(OutcomeKind::Success));
    let sent = &h.client.requests()[0];
    assert_eq!(sent.username, "root");
    assert_eq!(sent.password, "typed-secret");
}

#[tokio::test]
async fn test_mount_focuses_password() {
    let h = Harness::with_outcomes(vec![]);
    h.controller.on_mount().await;

    let calls = h.view.calls();
    assert!(matches!(calls.as_slice(), [ViewCall::Render(_), ViewCall::Focus(Field::Password)]));
}

#[tokio::test]
async fn test_outcome_after_unmount_is_discarded() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let h = Harness::new(ScriptedAuthClient::gated(vec![success("abc123")], gate.clone()));

    let controller = Arc::clone(&h.controller);
    let pending = tokio::spawn(async move { controller.submit(creds("secret")).await });
    h.client.wait_entered().await;

    h.controller.on_unmount().await;
    h.view.clear();
    gate.notify_one();

    assert_eq!(pending.await?, SubmitResult::Discarded(OutcomeKind::Success));
    assert!(h.store.get().await?.is_none());
    assert!(h.navigator.routes().is_empty());
    assert!(h.view.calls().is_empty());

    // A torn-down screen accepts no further input
    assert_eq!(h.controller.submit(creds("secret")).await, SubmitResult::Ignored);
    assert_eq!(h.controller.on_field_edit(Field::Password, "x").await, FieldEdit::Ignored);
    Ok(())
}

#[tokio::test]
async fn test_unmount_during_token_write_discards_success() -> Result<()> {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(GatedStore::new(gate.clone()));
    let navigator = Arc::new(RecordingNavigator::default());
    let view = Arc::new(RecordingView::default());
    let client = Arc::new(ScriptedAuthClient::new(vec![success("abc123")]));
    let controller = Arc::new(
        SignInController::builder(client)
            .store(store.clone())
            .navigator(navigator.clone())
            .view(view.clone())
            .build(),
    );
    let mut events = controller.subscribe();

    let submitting = Arc::clone(&controller);
    let pending = tokio::spawn(async move { submitting.submit(creds("secret")).await });
    store.wait_entered().await;

    controller.on_unmount().await;
    view.clear();
    gate.notify_one();

    assert_eq!(pending.await?, SubmitResult::Discarded(OutcomeKind::Success));
    assert!(navigator.routes().is_empty());
    assert!(view.calls().is_empty());
    assert!(store.get().await?.is_none());

    let mut discarded = false;
    while let Ok(event) = events.try_recv() {
        assert!(!matches!(event, SignInEvent::SignedIn { .. }));
        discarded |= matches!(event, SignInEvent::OutcomeDiscarded { .. });
    }
    assert!(discarded);
    Ok(())
}

#[tokio::test]
async fn test_store_failure_takes_error_path() {
    let client = Arc::new(ScriptedAuthClient::new(vec![success("abc123")]));
    let navigator = Arc::new(RecordingNavigator::default());
    let controller = SignInController::builder(client)
        .store(Arc::new(BrokenStore))
        .navigator(navigator.clone())
        .build();

    let result = controller.submit(creds("secret")).await;
    assert_eq!(result, SubmitResult::Completed(OutcomeKind::TransportFailure));

    let state = controller.state().await;
    assert!(!state.loading);
    assert!(state.error_message.expect("error shown").contains("disk full"));
    assert!(navigator.routes().is_empty());
}

#[tokio::test]
async fn test_phase_events_follow_state_machine() {
    let h = Harness::with_outcomes(vec![LoginOutcome::transport("network down"), success("t")]);
    let mut events = h.controller.subscribe();

    h.controller.submit(creds("a")).await;
    h.controller.submit(creds("b")).await;

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SignInEvent::PhaseChanged { from, to, .. } = event {
            phases.push((from, to));
        }
    }
    assert_eq!(
        phases,
        vec![
            (Phase::Idle, Phase::Submitting),
            (Phase::Submitting, Phase::Error),
            (Phase::Error, Phase::Submitting),
            (Phase::Submitting, Phase::Idle),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_phase_events_form_a_chain() -> Result<()> {
    let outcomes = (0..8).map(|_| LoginOutcome::transport("network down")).collect();
    let h = Harness::with_outcomes(outcomes);
    let mut events = h.controller.subscribe();

    for round in 0..8 {
        let submitting = Arc::clone(&h.controller);
        let editing = Arc::clone(&h.controller);
        let submit = tokio::spawn(async move { submitting.submit(creds("secret")).await });
        let edit = tokio::spawn(async move {
            editing.on_field_edit(Field::Password, format!("typed-{}", round)).await
        });
        submit.await?;
        edit.await?;
    }

    let mut phases = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SignInEvent::PhaseChanged { from, to, .. } = event {
            phases.push((from, to));
        }
    }

    // Each transition starts where the previous one ended
    assert_eq!(phases.first().map(|(from, _)| *from), Some(Phase::Idle));
    for pair in phases.windows(2) {
        assert_eq!(pair[0].1, pair[1].0, "out of order: {:?}", phases);
    }
    assert_eq!(phases.last().map(|(_, to)| *to), Some(h.controller.phase().await));
    Ok(())
}
