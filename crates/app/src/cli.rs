//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Authenticated command-line client for the portal backend.
#[derive(Debug, Parser)]
#[command(name = "portal", version, about)]
pub struct Cli {
    /// Backend base URL, overriding the settings file.
    #[arg(long, env = "PORTAL_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Settings file to use instead of the platform default.
    #[arg(long, env = "PORTAL_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Credentials file to use instead of the one named in settings.
    #[arg(long, env = "PORTAL_CREDENTIALS", global = true)]
    pub credentials: Option<PathBuf>,

    /// Log filter, e.g. `portal=debug`. `RUST_LOG` takes precedence.
    #[arg(long, env = "PORTAL_LOG", default_value = "portal=info", global = true)]
    pub log_level: String,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// What to do.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the issued credentials.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,

        /// Account password.
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Send an authenticated request and print the response body.
    Request {
        /// HTTP method.
        method: String,

        /// Path relative to the base URL, e.g. `/vendors`.
        path: String,

        /// Request body. Sent as JSON unless a Content-Type header is given.
        #[arg(long, short)]
        data: Option<String>,

        /// Extra header as `Name: value`. Repeatable.
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,
    },

    /// Forget stored credentials.
    Logout,

    /// Show whether credentials are stored.
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_request_with_headers() {
        let cli = Cli::try_parse_from([
            "portal",
            "request",
            "post",
            "/categories",
            "-d",
            r#"{"name":"x"}"#,
            "-H",
            "X-Portal: admin",
        ])
        .map_err(|e| e.to_string());

        let Ok(Cli {
            command: Command::Request { method, headers, .. },
            ..
        }) = cli
        else {
            unreachable!("unexpected parse result: {cli:?}");
        };
        assert_eq!(method, "post");
        assert_eq!(headers, vec!["X-Portal: admin".to_string()]);
    }
}
