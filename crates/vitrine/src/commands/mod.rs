//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod request;
pub mod resources;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use console::Style;
use serde_json::Value;
use vitrine_client::{ClientBuilder, FormData, TracingHook, VitrineClient};
use vitrine_config::{LoadedConfig, VitrineConfig};
use vitrine_session::{RecordingNavigator, SessionStore, create_token_store};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective configuration (files, environment, then CLI flags).
    pub config: VitrineConfig,
    /// Discovery details for `config which`.
    pub loaded: LoadedConfig,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Explicitly wired services for one CLI invocation.
pub struct Services {
    pub session: Arc<SessionStore>,
    pub navigator: Arc<RecordingNavigator>,
    pub client: VitrineClient,
}

impl Context {
    /// Directory holding persisted tokens and logs.
    pub fn data_dir(&self) -> Result<PathBuf> {
        vitrine_config::xdg_config_dir().context("Could not determine config directory")
    }

    /// Build the session and client, restoring any persisted session.
    pub async fn connect(&self) -> Result<Services> {
        let tokens = create_token_store(&self.data_dir()?);
        let navigator = Arc::new(RecordingNavigator::new());
        let session = Arc::new(SessionStore::from_config(
            &self.config,
            tokens,
            navigator.clone(),
        )?);

        if let Err(e) = session.restore().await {
            tracing::warn!(error = %e, "Could not restore persisted session");
        }

        let client = ClientBuilder::from_config(&self.config, Arc::clone(&session))
            .response_hook(TracingHook)
            .build()?;

        Ok(Services {
            session,
            navigator,
            client,
        })
    }
}

impl Services {
    /// Tell the user when the session layer sent them back to the login page.
    pub fn report_navigation(&self) {
        if self.navigator.current().as_deref() == Some(self.session.login_page()) {
            let yellow = Style::new().yellow();
            eprintln!(
                "{} session ended; run `vitrine login` to sign in again",
                yellow.apply_to("!")
            );
        }
    }
}

/// Print a JSON value, pretty in both modes; `--json` keeps it compact.
pub fn print_value(value: &Value, ctx: &Context) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// Print a success line unless JSON output was requested.
pub fn print_done(message: impl std::fmt::Display, ctx: &Context) {
    if !ctx.json_output {
        let green = Style::new().green();
        println!("{} {}", green.apply_to("✓"), message);
    }
}

/// Split `key=value`.
pub fn parse_pair(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("expected key=value, got '{}'", raw))?;
    if key.trim().is_empty() {
        anyhow::bail!("empty key in '{}'", raw);
    }
    Ok((key.trim().to_string(), value.to_string()))
}

/// Build form data from `--field key=value` and `--file key=path` arguments.
pub fn build_form(fields: &[String], files: &[String]) -> Result<FormData> {
    let mut form = FormData::new();
    for field in fields {
        let (name, value) = parse_pair(field)?;
        form = form.text(name, value);
    }
    for file in files {
        let (name, path) = parse_pair(file)?;
        let path = PathBuf::from(path);
        let content =
            std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.clone());
        form = form.file(name, file_name, mime_for(&path), content);
    }
    Ok(form)
}

fn mime_for(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
