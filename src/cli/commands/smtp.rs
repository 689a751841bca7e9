use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::time::Duration;

use crate::notify::SmtpConfig;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct Options {
    /// `None` when no relay is configured; passcodes are then only logged.
    pub config: Option<SmtpConfig>,
}

impl Options {
    /// Parse mail relay arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a password is given without a username.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(host) = get_non_empty(ARG_SMTP_HOST) else {
            return Ok(Self { config: None });
        };

        let username = get_non_empty(ARG_SMTP_USERNAME);
        let password = get_non_empty(ARG_SMTP_PASSWORD).map(SecretString::from);
        if username.is_none() && password.is_some() {
            anyhow::bail!("--{ARG_SMTP_PASSWORD} requires --{ARG_SMTP_USERNAME}");
        }

        Ok(Self {
            config: Some(SmtpConfig {
                host,
                port: matches.get_one::<u16>(ARG_SMTP_PORT).copied().unwrap_or(587),
                username,
                password,
                from: get_non_empty(ARG_SMTP_FROM)
                    .unwrap_or_else(|| "otpgate <no-reply@localhost>".to_string()),
                timeout: SMTP_TIMEOUT,
            }),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host; passcodes are only logged when unset")
                .env("OTPGATE_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port (STARTTLS)")
                .env("OTPGATE_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("OTPGATE_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("OTPGATE_SMTP_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("Sender mailbox for passcode emails")
                .env("OTPGATE_SMTP_FROM")
                .default_value("otpgate <no-reply@localhost>"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleared<F: FnOnce()>(f: F) {
        temp_env::with_vars(
            [
                ("OTPGATE_SMTP_HOST", None::<&str>),
                ("OTPGATE_SMTP_PORT", None),
                ("OTPGATE_SMTP_USERNAME", None),
                ("OTPGATE_SMTP_PASSWORD", None),
                ("OTPGATE_SMTP_FROM", None),
            ],
            f,
        );
    }

    #[test]
    fn no_host_means_no_relay() {
        cleared(|| {
            let matches = with_args(Command::new("otpgate")).get_matches_from(vec!["otpgate"]);
            assert!(Options::parse(&matches).unwrap().config.is_none());
        });
    }

    #[test]
    fn host_enables_relay_with_defaults() {
        cleared(|| {
            let matches = with_args(Command::new("otpgate")).get_matches_from(vec![
                "otpgate",
                "--smtp-host",
                "smtp.example.com",
                "--smtp-username",
                "mailer",
                "--smtp-password",
                "hunter2",
            ]);
            let config = Options::parse(&matches).unwrap().config.unwrap();
            assert_eq!(config.host, "smtp.example.com");
            assert_eq!(config.port, 587);
            assert_eq!(config.username.as_deref(), Some("mailer"));
            assert!(config.password.is_some());
            assert_eq!(config.from, "otpgate <no-reply@localhost>");
        });
    }

    #[test]
    fn password_without_username_fails() {
        cleared(|| {
            let matches = with_args(Command::new("otpgate")).get_matches_from(vec![
                "otpgate",
                "--smtp-host",
                "smtp.example.com",
                "--smtp-password",
                "hunter2",
            ]);
            assert!(Options::parse(&matches).is_err());
        });
    }
}
