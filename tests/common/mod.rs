//! Shared fakes for the sign-in integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use console_signin::{
    AuthClient, Credentials, Field, FormState, FormView, LoginOutcome, MemorySessionStore,
    Navigator, SessionStore, SessionToken, SignInController, SignInError, SignInResult,
    StaticRouteRegistry,
};

pub const DEFAULT_ROUTE: &str = "/overview";

/// Auth client that replays a script of outcomes
pub struct ScriptedAuthClient {
    outcomes: Mutex<VecDeque<LoginOutcome>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Credentials>>,
    /// When set, each login waits here until released
    gate: Option<Arc<Notify>>,
    /// Signalled when a login call has started
    entered: Arc<Notify>,
}

impl ScriptedAuthClient {
    pub fn new(outcomes: Vec<LoginOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            gate: None,
            entered: Arc::new(Notify::new()),
        }
    }

    /// Hold every login until `gate` is notified
    pub fn gated(outcomes: Vec<LoginOutcome>, gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(outcomes)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Credentials> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until a login call is in progress
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl AuthClient for ScriptedAuthClient {
    async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(credentials.clone());
        self.entered.notify_one();

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| LoginOutcome::transport("no scripted outcome"))
    }
}

/// Navigator that remembers every route it was sent to
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn go(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

/// One call made on the view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewCall {
    Render(FormState),
    Focus(Field),
    Notify(String),
}

/// View that logs every call in order
#[derive(Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
}

impl RecordingView {
    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn focus_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, ViewCall::Focus(_)))
            .count()
    }

    /// The state rendered most recently before call number `index`
    pub fn rendered_before(&self, index: usize) -> Option<FormState> {
        self.calls()[..index].iter().rev().find_map(|c| match c {
            ViewCall::Render(state) => Some(state.clone()),
            _ => None,
        })
    }
}

impl FormView for RecordingView {
    fn render(&self, state: &FormState) {
        self.calls.lock().unwrap().push(ViewCall::Render(state.clone()));
    }

    fn focus(&self, field: Field) {
        self.calls.lock().unwrap().push(ViewCall::Focus(field));
    }

    fn notify_success(&self, message: &str) {
        self.calls
            .lock()
            .unwrap()
            .push(ViewCall::Notify(message.to_string()));
    }
}

/// Store whose writes always fail
pub struct BrokenStore;

#[async_trait]
impl SessionStore for BrokenStore {
    async fn set(&self, _token: SessionToken) -> SignInResult<()> {
        Err(SignInError::storage("disk full"))
    }

    async fn get(&self) -> SignInResult<Option<SessionToken>> {
        Ok(None)
    }

    async fn clear(&self) -> SignInResult<()> {
        Ok(())
    }
}

/// Memory store whose writes wait until `gate` is notified
pub struct GatedStore {
    inner: MemorySessionStore,
    gate: Arc<Notify>,
    entered: Notify,
}

impl GatedStore {
    pub fn new(gate: Arc<Notify>) -> Self {
        Self {
            inner: MemorySessionStore::new(),
            gate,
            entered: Notify::new(),
        }
    }

    /// Wait until a write is in progress
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl SessionStore for GatedStore {
    async fn set(&self, token: SessionToken) -> SignInResult<()> {
        self.entered.notify_one();
        self.gate.notified().await;
        self.inner.set(token).await
    }

    async fn get(&self) -> SignInResult<Option<SessionToken>> {
        self.inner.get().await
    }

    async fn clear(&self) -> SignInResult<()> {
        self.inner.clear().await
    }
}

/// Everything a test needs to drive and observe one controller
pub struct Harness {
    pub controller: Arc<SignInController>,
    pub client: Arc<ScriptedAuthClient>,
    pub store: Arc<MemorySessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub view: Arc<RecordingView>,
}

impl Harness {
    pub fn new(client: ScriptedAuthClient) -> Self {
        let client = Arc::new(client);
        let store = Arc::new(MemorySessionStore::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let view = Arc::new(RecordingView::default());

        let controller = SignInController::builder(client.clone())
            .store(store.clone())
            .navigator(navigator.clone())
            .routes(Arc::new(StaticRouteRegistry::new(DEFAULT_ROUTE)))
            .view(view.clone())
            .build();

        Self {
            controller: Arc::new(controller),
            client,
            store,
            navigator,
            view,
        }
    }

    pub fn with_outcomes(outcomes: Vec<LoginOutcome>) -> Self {
        Self::new(ScriptedAuthClient::new(outcomes))
    }
}

pub fn creds(password: &str) -> Credentials {
    Credentials::new("root", password)
}
