//! Maps validated CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{otp, smtp, token};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let otp_opts = otp::Options::parse(matches)?;
    let token_opts = token::Options::parse(matches)?;
    let smtp_opts = smtp::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        policy: otp_opts.policy,
        token: token_opts,
        smtp: smtp_opts.config,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const ENV: [(&str, Option<&str>); 10] = [
        ("OTPGATE_PORT", None),
        ("OTPGATE_DSN", Some("postgres://user@localhost:5432/otpgate")),
        ("OTPGATE_TOKEN_SECRET", Some("dispatch-secret")),
        ("OTPGATE_TOKEN_ISSUER", None),
        ("OTPGATE_TOKEN_TTL_SECONDS", None),
        ("OTPGATE_OTP_LENGTH", None),
        ("OTPGATE_OTP_TTL_SECONDS", None),
        ("OTPGATE_OTP_INVALIDATE_PRIOR", None),
        ("OTPGATE_SMTP_HOST", None),
        ("OTPGATE_SMTP_PASSWORD", None),
    ];

    #[test]
    fn builds_server_action() {
        temp_env::with_vars(ENV, || {
            let matches = crate::cli::commands::new().get_matches_from(vec![
                "otpgate",
                "--otp-length",
                "8",
                "--smtp-host",
                "smtp.example.com",
            ]);
            let Action::Server(args) = handler(&matches).unwrap();
            assert_eq!(args.port, 8080);
            assert_eq!(args.dsn, "postgres://user@localhost:5432/otpgate");
            assert_eq!(args.policy.code_length(), 8);
            assert_eq!(args.token.secret.expose_secret(), "dispatch-secret");
            assert_eq!(args.token.issuer, "otpgate");
            assert_eq!(args.token.ttl_seconds, 3600);
            assert_eq!(args.smtp.map(|config| config.host).as_deref(), Some("smtp.example.com"));
        });
    }

    #[test]
    fn token_secret_required() {
        temp_env::with_vars(ENV, || {
            temp_env::with_var("OTPGATE_TOKEN_SECRET", None::<&str>, || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["otpgate"]);
                let err = handler(&matches).err().unwrap();
                assert!(err
                    .to_string()
                    .contains("missing required argument: --token-secret"));
            });
        });
    }

    #[test]
    fn invalid_policy_is_reported() {
        temp_env::with_vars(ENV, || {
            let matches = crate::cli::commands::new()
                .get_matches_from(vec!["otpgate", "--otp-ttl-seconds", "0"]);
            assert!(handler(&matches).is_err());
        });
    }
}
