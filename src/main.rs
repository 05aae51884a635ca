use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error, info};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use console_signin::{
    Field, FileSessionStore, HttpAuthClient, Localizer, LogNavigator, MemorySessionStore,
    OutcomeKind, ReqwestHttpClient, SessionStore, SignInConfig, SignInController, SubmitResult,
    TerminalView,
};

/// Read one password, hidden when stdin is a terminal. `None` once input is closed.
async fn read_password(lines: &mut Lines<BufReader<Stdin>>) -> Result<Option<String>> {
    if !std::io::stdin().is_terminal() {
        return Ok(lines.next_line().await?);
    }

    match tokio::task::spawn_blocking(rpassword::read_password).await? {
        Ok(password) => Ok(Some(password)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(None),
        Err(e) => Err(e).context("failed to read password"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file if it exists
    let env_file_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "console_signin=debug,warn".into()
            } else {
                "console_signin=info,warn".into()
            }
        }))
        .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    match env_file_path {
        Some(path) => info!("Loaded environment variables from {}", path.display()),
        None => debug!("No .env file found. Using existing environment variables."),
    };

    let config = SignInConfig::from_env().context("invalid sign-in configuration")?;
    info!(api = %config.api_base_url, username = %config.default_username, "Starting sign-in");

    let http = match config.request_timeout() {
        Some(timeout) => ReqwestHttpClient::with_timeout(timeout)?,
        None => ReqwestHttpClient::new(),
    };
    let client = HttpAuthClient::new(Arc::new(http), &config.api_base_url);

    let store: Arc<dyn SessionStore> = match &config.session_file {
        Some(path) => Arc::new(FileSessionStore::new(path)),
        None => Arc::new(MemorySessionStore::new()),
    };

    let localizer = match &config.locale_file {
        Some(path) => Localizer::from_file(path)
            .await
            .with_context(|| format!("failed to load translations from {}", path.display()))?,
        None => Localizer::english(),
    };

    let controller = SignInController::builder(Arc::new(client))
        .config(&config)
        .store(Arc::clone(&store))
        .navigator(Arc::new(LogNavigator))
        .view(Arc::new(TerminalView::stdout()))
        .localizer(Arc::new(localizer))
        .build();

    controller.on_mount().await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(password) = read_password(&mut lines).await? else {
            info!("Input closed before signing in");
            controller.on_unmount().await;
            return Ok(());
        };

        controller.on_field_edit(Field::Password, password).await;
        match controller.submit_form().await {
            SubmitResult::Completed(OutcomeKind::Success) => break,
            // No error line is shown for these, so bring the prompt back
            SubmitResult::Invalid(_)
            | SubmitResult::Completed(OutcomeKind::AlreadyHandled) => {
                controller.on_mount().await
            }
            other => debug!(result = ?other, "Attempt finished"),
        }
    }

    match store.get().await {
        Ok(Some(token)) => info!(issued_at = %token.issued_at(), "Session ready"),
        Ok(None) => error!("Signed in but no session token was stored"),
        Err(e) => error!(error = %e, "Failed to read back session token"),
    }

    controller.on_unmount().await;
    Ok(())
}
