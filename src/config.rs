//! Command line and environment configuration for the server.

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// The web server for finboard.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about, long_about = None)]
pub struct ServerConfig {
    /// File path to the application SQLite database.
    #[arg(long, env = "FINBOARD_DB_PATH")]
    pub db_path: PathBuf,

    /// The port to serve the app from.
    #[arg(short, long, env = "FINBOARD_PORT", default_value_t = 3000)]
    pub port: u16,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    ///
    /// Transactions become due at midnight in this timezone.
    #[arg(long, env = "FINBOARD_TIMEZONE", default_value = "Etc/UTC", value_parser = parse_timezone)]
    pub timezone: String,

    /// How often to create the transactions of due recurring rules, in seconds.
    ///
    /// Set to zero to only create them on request.
    #[arg(long, env = "FINBOARD_DUE_SCAN_SECONDS", default_value_t = 3600)]
    pub due_scan_seconds: u64,

    /// Where users without a valid auth cookie are sent to sign in.
    #[arg(long, env = "FINBOARD_SIGN_IN_URL")]
    pub sign_in_url: String,

    /// File path for the debug log.
    #[arg(long, env = "FINBOARD_LOG_PATH", default_value = "debug.log")]
    pub log_path: PathBuf,
}

impl ServerConfig {
    /// The period of the scheduled due-rule scan, or `None` if it is disabled.
    pub fn due_scan_period(&self) -> Option<Duration> {
        (self.due_scan_seconds > 0).then(|| Duration::from_secs(self.due_scan_seconds))
    }
}

fn parse_timezone(name: &str) -> Result<String, String> {
    match time_tz::timezones::get_by_name(name) {
        Some(_) => Ok(name.to_owned()),
        None => Err(format!(
            "\"{name}\" is not a canonical timezone name, e.g. \"Pacific/Auckland\""
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::ServerConfig;

    const REQUIRED_ARGS: [&str; 5] = [
        "server",
        "--db-path",
        "app.db",
        "--sign-in-url",
        "https://id.example.com/sign_in",
    ];

    #[test]
    fn defaults() {
        let config = ServerConfig::try_parse_from(REQUIRED_ARGS).unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.timezone, "Etc/UTC");
        assert_eq!(config.due_scan_period(), Some(Duration::from_secs(3600)));
    }

    #[test]
    fn zero_disables_due_scan() {
        let args = REQUIRED_ARGS.iter().copied().chain(["--due-scan-seconds", "0"]);

        let config = ServerConfig::try_parse_from(args).unwrap();

        assert_eq!(config.due_scan_period(), None);
    }

    #[test]
    fn rejects_unknown_timezone() {
        let args = REQUIRED_ARGS
            .iter()
            .copied()
            .chain(["--timezone", "Middle/Earth"]);

        assert!(ServerConfig::try_parse_from(args).is_err());
    }
}
