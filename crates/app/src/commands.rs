//! Command implementations.

use std::process::ExitCode;
use std::sync::Arc;

use portal_application::SessionObserver;
use portal_domain::{ClientSettings, HttpMethod, RequestEnvelope, ResponseEnvelope, SessionState};
use portal_infrastructure::{CallbackSessionObserver, LoggingSessionObserver, SettingsRepository};

use crate::cli::{Cli, Command};
use crate::context::Portal;
use crate::error::AppError;

/// Loads settings and applies command-line overrides on top.
///
/// # Errors
///
/// Returns an error if the settings file exists but cannot be used.
pub async fn load_settings(cli: &Cli) -> Result<ClientSettings, AppError> {
    let repository = cli
        .settings
        .as_ref()
        .map_or_else(SettingsRepository::new, SettingsRepository::at);
    let mut settings = repository.load().await?;

    if let Some(base_url) = &cli.base_url {
        settings.base_url.clone_from(base_url);
    }
    if let Some(credentials) = &cli.credentials {
        settings.credentials_file = Some(credentials.clone());
    }
    settings.validate()?;
    Ok(settings)
}

/// Splits a `Name: value` header argument.
///
/// # Errors
///
/// Returns [`AppError::InvalidHeader`] if there is no colon or the name is empty.
pub fn parse_header(raw: &str) -> Result<(String, String), AppError> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(AppError::InvalidHeader(raw.to_string())),
    }
}

/// Builds the envelope for the `request` command.
///
/// # Errors
///
/// Returns an error for an unknown method, a path not starting with `/`, or
/// a malformed header.
pub fn build_request(
    method: &str,
    path: &str,
    data: Option<&str>,
    headers: &[String],
) -> Result<RequestEnvelope, AppError> {
    let method: HttpMethod = method.parse()?;
    let mut envelope = RequestEnvelope::new(method, path);
    if let Some(data) = data {
        envelope = envelope.with_body(data);
    }
    for raw in headers {
        let (name, value) = parse_header(raw)?;
        envelope = envelope.with_header(name, value);
    }
    envelope.validate()?;
    Ok(envelope)
}

/// Renders a response body for the terminal, pretty-printing JSON.
#[must_use]
pub fn render_body(response: &ResponseEnvelope) -> String {
    response
        .json::<serde_json::Value>()
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| response.text())
}

/// Runs one command to completion.
///
/// # Errors
///
/// Returns an error if the command could not be carried out. A non-2xx
/// response to `request` is not an error; it yields a failing exit code.
pub async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let settings = load_settings(&cli).await?;
    let observer = Arc::new(CallbackSessionObserver::new(|episode| {
        LoggingSessionObserver.session_ended(episode);
        eprintln!("Session expired. Run `portal login` to sign in again.");
    }));
    let portal = Portal::new(settings, observer)?;

    match cli.command {
        Command::Login { email, password } => {
            portal.sessions().login(&email, &password).await?;
            println!("Logged in as {email}.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Request {
            method,
            path,
            data,
            headers,
        } => {
            let envelope = build_request(&method, &path, data.as_deref(), &headers)?;
            let response = portal.client().request(&envelope).await?;

            let body = render_body(&response);
            if !body.is_empty() {
                println!("{body}");
            }
            if response.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                eprintln!("{}", response.status);
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Logout => {
            portal.sessions().logout().await?;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Command::Status => {
            let state = portal.sessions().status().await;
            println!("{state} ({})", portal.settings().base_url);
            Ok(if state == SessionState::Authenticated {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use portal_application::ApplicationError;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("X-Portal:  admin ").unwrap(),
            ("X-Portal".to_string(), "admin".to_string())
        );
        assert!(matches!(
            parse_header("no colon"),
            Err(AppError::InvalidHeader(_))
        ));
        assert!(matches!(
            parse_header(": value"),
            Err(AppError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_build_request() {
        let envelope = build_request(
            "put",
            "/categories/3",
            Some(r#"{"name":"Office"}"#),
            &["Content-Type: text/plain".to_string()],
        )
        .unwrap();

        assert_eq!(envelope.method(), HttpMethod::Put);
        assert_eq!(envelope.body(), Some(r#"{"name":"Office"}"#));
        assert_eq!(envelope.headers().get("content-type"), Some("text/plain"));
    }

    #[test]
    fn test_build_request_rejects_bad_input() {
        assert!(matches!(
            build_request("TRACE", "/x", None, &[]),
            Err(AppError::Application(ApplicationError::Domain(_)))
        ));
        assert!(matches!(
            build_request("GET", "vendors", None, &[]),
            Err(AppError::Application(ApplicationError::Domain(_)))
        ));
        assert!(matches!(
            build_request("GET", "/vendors", None, &["bad name: x".to_string()]),
            Err(AppError::Application(ApplicationError::Domain(_)))
        ));
    }

    #[test]
    fn test_render_body_pretty_prints_json() {
        let response = ResponseEnvelope::from_status(200u16, r#"{"id":1}"#);
        assert_eq!(render_body(&response), "{\n  \"id\": 1\n}");

        let response = ResponseEnvelope::from_status(500u16, "boom");
        assert_eq!(render_body(&response), "boom");
    }
}
