//! Sign-in form state machine
//!
//! [`SignInController`] runs at most one login attempt at a time and keeps
//! the [`FormState`] consistent with it:
//!
//! ```text
//!   Idle --submit--> Submitting --Success / AlreadyHandled--> Idle
//!                         |
//!                         +--Rejected / TransportFailure--> Error --submit--> Submitting
//! ```
//!
//! Any field edit clears the error, so Error also falls back to Idle.
//! A submit while Submitting is ignored.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::client::AuthClient;
use crate::auth::credentials::{Credentials, Field};
use crate::auth::storage::{MemorySessionStore, SessionStore};
use crate::auth::token::{LoginOutcome, OutcomeKind};
use crate::config::SignInConfig;
use crate::error::{FailureKind, ValidationError};
use crate::events::{EventStream, SignInEvent, Subscriber, EVENT_BUFFER_SIZE, EVENT_CHANNEL_CAPACITY};
use crate::i18n::{self, Localizer};
use crate::navigation::{LogNavigator, Navigator, RouteRegistry, StaticRouteRegistry};
use crate::view::{FormView, NullView, ViewEffect};

pub mod state;

pub use state::{FieldEdit, FieldMessage, FormState, Phase, SubmitResult};

/// Mutable part of the controller, guarded by one lock
struct Inner {
    form: FormState,
    mounted: bool,
    /// Effects to run after the next render
    pending: Vec<ViewEffect>,
}

/// Owns the sign-in form and drives login attempts
pub struct SignInController {
    client: Arc<dyn AuthClient>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    routes: Arc<dyn RouteRegistry>,
    view: Arc<dyn FormView>,
    localizer: Arc<Localizer>,
    events: EventStream<SignInEvent>,
    inner: RwLock<Inner>,
}

/// Builder for [`SignInController`]
pub struct SignInControllerBuilder {
    client: Arc<dyn AuthClient>,
    store: Option<Arc<dyn SessionStore>>,
    navigator: Option<Arc<dyn Navigator>>,
    routes: Option<Arc<dyn RouteRegistry>>,
    view: Option<Arc<dyn FormView>>,
    localizer: Option<Arc<Localizer>>,
    default_username: String,
    username_locked: bool,
}

impl SignInControllerBuilder {
    /// Where the session token goes after a successful login
    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Registry that supplies the post-login route
    pub fn routes(mut self, routes: Arc<dyn RouteRegistry>) -> Self {
        self.routes = Some(routes);
        self
    }

    pub fn view(mut self, view: Arc<dyn FormView>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn localizer(mut self, localizer: Arc<Localizer>) -> Self {
        self.localizer = Some(localizer);
        self
    }

    /// Take username defaults and the default route from `config`
    pub fn config(mut self, config: &SignInConfig) -> Self {
        self.default_username = config.default_username.clone();
        self.username_locked = config.username_locked;
        if self.routes.is_none() {
            self.routes = Some(Arc::new(StaticRouteRegistry::new(config.default_route.clone())));
        }
        self
    }

    /// Build the controller for a freshly mounted screen
    pub fn build(self) -> SignInController {
        let form = FormState::new(self.default_username, self.username_locked);
        debug!(username_locked = form.username_locked, "Creating sign-in controller");

        SignInController {
            client: self.client,
            store: self.store.unwrap_or_else(|| Arc::new(MemorySessionStore::new())),
            navigator: self.navigator.unwrap_or_else(|| Arc::new(LogNavigator)),
            routes: self
                .routes
                .unwrap_or_else(|| Arc::new(StaticRouteRegistry::new(crate::config::DEFAULT_ROUTE))),
            view: self.view.unwrap_or_else(|| Arc::new(NullView)),
            localizer: self.localizer.unwrap_or_else(|| Arc::new(Localizer::english())),
            events: EventStream::new(EVENT_CHANNEL_CAPACITY, EVENT_BUFFER_SIZE),
            inner: RwLock::new(Inner {
                form,
                mounted: true,
                pending: Vec::new(),
            }),
        }
    }
}

impl SignInController {
    /// Start building a controller around `client`
    pub fn builder(client: Arc<dyn AuthClient>) -> SignInControllerBuilder {
        SignInControllerBuilder {
            client,
            store: None,
            navigator: None,
            routes: None,
            view: None,
            localizer: None,
            default_username: crate::config::DEFAULT_USERNAME.to_string(),
            username_locked: true,
        }
    }

    /// Snapshot of the current form state
    pub async fn state(&self) -> FormState {
        self.inner.read().await.form.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.inner.read().await.form.phase()
    }

    /// Current field values
    pub async fn credentials(&self) -> Credentials {
        self.inner.read().await.form.credentials.clone()
    }

    /// Subscribe to controller events
    pub fn subscribe(&self) -> Subscriber<SignInEvent> {
        self.events.subscribe()
    }

    /// Screen became visible: render and focus the password input
    pub async fn on_mount(&self) {
        let mut inner = self.inner.write().await;
        inner.mounted = true;
        inner.pending.push(ViewEffect::Focus(Field::Password));
        self.render_locked(&mut inner);
    }

    /// Screen was torn down; later outcomes are dropped
    pub async fn on_unmount(&self) {
        let mut inner = self.inner.write().await;
        inner.mounted = false;
        inner.pending.clear();
        debug!("Sign-in screen unmounted");
    }

    /// The user typed into `field`
    pub async fn on_field_edit(&self, field: Field, value: impl Into<String>) -> FieldEdit {
        let mut inner = self.inner.write().await;
        if !inner.mounted || inner.form.loading {
            debug!(field = %field, "Edit ignored while inputs are disabled");
            return FieldEdit::Ignored;
        }

        let before = inner.form.phase();
        let result = if field == Field::Username && inner.form.username_locked {
            FieldEdit::Locked
        } else {
            inner.form.credentials.set(field, value);
            FieldEdit::Applied
        };
        inner.form.clear_messages();
        self.render_locked(&mut inner);

        self.publish_transition(before, inner.form.phase()).await;
        result
    }

    /// Submit whatever the form currently holds
    pub async fn submit_form(&self) -> SubmitResult {
        let credentials = self.credentials().await;
        self.submit(credentials).await
    }

    /// Run one login attempt with `credentials`
    pub async fn submit(&self, credentials: Credentials) -> SubmitResult {
        let attempt_id = Uuid::new_v4();

        let request = {
            let mut inner = self.inner.write().await;
            if !inner.mounted {
                warn!(attempt_id = %attempt_id, "Submit on an unmounted sign-in screen");
                return SubmitResult::Ignored;
            }
            if inner.form.loading {
                drop(inner);
                debug!(attempt_id = %attempt_id, "Login already in flight, submit ignored");
                self.events.publish(SignInEvent::AttemptIgnored).await;
                return SubmitResult::Ignored;
            }

            let before = inner.form.phase();
            match self.begin_attempt(&mut inner, credentials) {
                Err(error) => {
                    info!(attempt_id = %attempt_id, field = %error.field, "Sign-in form failed validation");
                    self.events
                        .publish(SignInEvent::ValidationFailed {
                            field: error.field,
                            message: error.message.clone(),
                        })
                        .await;
                    return SubmitResult::Invalid(error);
                }
                Ok(request) => {
                    self.publish_transition(before, inner.form.phase()).await;
                    request
                }
            }
        };

        info!(attempt_id = %attempt_id, username = %request.username, "Signing in");
        let outcome = self.client.login(&request).await;
        debug!(attempt_id = %attempt_id, outcome = ?outcome.kind(), "Login call returned");

        self.resolve(attempt_id, outcome).await
    }

    /// Validate and, if valid, flip the form into Submitting.
    /// Returns the credentials to send.
    fn begin_attempt(
        &self,
        inner: &mut Inner,
        submitted: Credentials,
    ) -> Result<Credentials, ValidationError> {
        let form = &mut inner.form;
        if !form.username_locked {
            form.credentials.username = submitted.username;
        }
        form.credentials.password = submitted.password;

        if let Some(field) = form.credentials.first_missing() {
            let key = match field {
                Field::Username => i18n::MSG_CHECK_USERNAME,
                Field::Password => i18n::MSG_CHECK_PASSWORD,
            };
            let error = ValidationError {
                field,
                message: self.localizer.translate(key),
            };
            form.validation = Some(FieldMessage {
                field,
                message: error.message.clone(),
            });
            self.render_locked(inner);
            return Err(error);
        }

        form.loading = true;
        form.clear_messages();
        let request = form.credentials.clone();
        self.render_locked(inner);

        Ok(request)
    }

    /// Apply the outcome of a finished login call
    async fn resolve(&self, attempt_id: Uuid, outcome: LoginOutcome) -> SubmitResult {
        let kind = outcome.kind();

        if !self.inner.read().await.mounted {
            return self.discard(attempt_id, kind).await;
        }

        match outcome {
            LoginOutcome::Success(token) => {
                if let Err(e) = self.store.set(token).await {
                    warn!(attempt_id = %attempt_id, error = %e, "Failed to store session token");
                    return self
                        .fail(
                            attempt_id,
                            FailureKind::Transport,
                            e.to_string(),
                            OutcomeKind::TransportFailure,
                        )
                        .await;
                }

                let message = self.localizer.translate(i18n::MSG_SUCCESS);
                let route = self.routes.default_route();
                let event = SignInEvent::SignedIn {
                    attempt_id,
                    message: message.clone(),
                    route: route.clone(),
                };

                // Notification and navigation only reach a screen that is still mounted
                let committed = self
                    .commit(event, |form, _| {
                        self.view.notify_success(&message);
                        self.navigator.go(&route);
                        form.loading = false;
                        form.clear_messages();
                    })
                    .await;

                if !committed {
                    // Unmounted while the token was being written
                    if let Err(e) = self.store.clear().await {
                        warn!(attempt_id = %attempt_id, error = %e, "Failed to clear session token of a discarded login");
                    }
                    return self.discard(attempt_id, kind).await;
                }

                info!(attempt_id = %attempt_id, route = %route, "Signed in");
                SubmitResult::Completed(kind)
            }

            LoginOutcome::Rejected {
                error_code,
                message,
            } => {
                // Translation first, then the server's own text, then the bare code
                let detail = self
                    .localizer
                    .lookup(&error_code)
                    .map(str::to_string)
                    .or(message)
                    .unwrap_or(error_code);
                self.fail(attempt_id, FailureKind::RejectedCredentials, detail, kind)
                    .await
            }

            LoginOutcome::TransportFailure(message) => {
                self.fail(attempt_id, FailureKind::Transport, message, kind)
                    .await
            }

            LoginOutcome::AlreadyHandled(source) => {
                debug!(attempt_id = %attempt_id, source = %source, "Failure reported upstream, not showing it again");
                let event = SignInEvent::SignInFailed {
                    attempt_id,
                    kind: FailureKind::AlreadyHandled,
                    message: None,
                };
                if self.commit(event, |form, _| form.loading = false).await {
                    SubmitResult::Completed(kind)
                } else {
                    self.discard(attempt_id, kind).await
                }
            }
        }
    }

    /// Shared error path: show the message, clear the password and
    /// refocus it once the input is enabled again
    async fn fail(
        &self,
        attempt_id: Uuid,
        failure: FailureKind,
        detail: String,
        kind: OutcomeKind,
    ) -> SubmitResult {
        let text = self.localizer.sign_in_error(&detail);
        warn!(attempt_id = %attempt_id, kind = %failure, error = %detail, "Sign-in failed");

        let event = SignInEvent::SignInFailed {
            attempt_id,
            kind: failure,
            message: Some(text.clone()),
        };
        let committed = self
            .commit(event, move |form, effects| {
                form.loading = false;
                form.validation = None;
                form.error_message = Some(text);
                form.credentials.password.clear();
                effects.push(ViewEffect::Focus(Field::Password));
            })
            .await;

        if committed {
            SubmitResult::Completed(kind)
        } else {
            self.discard(attempt_id, kind).await
        }
    }

    async fn discard(&self, attempt_id: Uuid, kind: OutcomeKind) -> SubmitResult {
        info!(attempt_id = %attempt_id, outcome = ?kind, "Screen unmounted, discarding login outcome");
        self.events
            .publish(SignInEvent::OutcomeDiscarded { attempt_id })
            .await;
        SubmitResult::Discarded(kind)
    }

    /// Mutate the form, render it, run effects queued for after the render,
    /// then publish `event` and the phase change, all under the state lock.
    /// Returns `false` without touching anything if the screen has been
    /// unmounted in the meantime.
    async fn commit<F>(&self, event: SignInEvent, change: F) -> bool
    where
        F: FnOnce(&mut FormState, &mut Vec<ViewEffect>),
    {
        let mut inner = self.inner.write().await;
        if !inner.mounted {
            return false;
        }

        let before = inner.form.phase();
        let Inner { form, pending, .. } = &mut *inner;
        change(form, pending);
        self.render_locked(&mut inner);

        self.events.publish(event).await;
        self.publish_transition(before, inner.form.phase()).await;
        true
    }

    /// Render the current state and flush pending effects. Effects whose
    /// target is still disabled wait for the next render.
    fn render_locked(&self, inner: &mut Inner) {
        self.view.render(&inner.form);

        let pending = std::mem::take(&mut inner.pending);
        for effect in pending {
            match effect {
                ViewEffect::Focus(field) if inner.form.is_disabled(field) => {
                    debug!(field = %field, "Focus deferred, field disabled");
                    inner.pending.push(effect);
                }
                ViewEffect::Focus(field) => self.view.focus(field),
            }
        }
    }

    /// Callers hold the state lock so events go out in state order
    async fn publish_transition(&self, from: Phase, to: Phase) {
        if from != to {
            debug!(from = ?from, to = ?to, "Sign-in phase changed");
            self.events
                .publish(SignInEvent::PhaseChanged {
                    from,
                    to,
                    at: chrono::Utc::now(),
                })
                .await;
        }
    }
}
