use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_TOKEN_SECRET: &str = "token-secret";
pub const ARG_TOKEN_ISSUER: &str = "token-issuer";
pub const ARG_TOKEN_TTL_SECONDS: &str = "token-ttl-seconds";

#[derive(Debug, Clone)]
pub struct Options {
    pub secret: SecretString,
    pub issuer: String,
    pub ttl_seconds: i64,
}

impl Options {
    /// Parse session token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing secret is missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let secret = match matches.get_one::<String>(ARG_TOKEN_SECRET) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.clone()),
            _ => anyhow::bail!("missing required argument: --{ARG_TOKEN_SECRET}"),
        };

        let issuer = matches
            .get_one::<String>(ARG_TOKEN_ISSUER)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "otpgate".to_string());

        let ttl_seconds = matches
            .get_one::<i64>(ARG_TOKEN_TTL_SECONDS)
            .copied()
            .unwrap_or(3600);

        Ok(Self {
            secret,
            issuer,
            ttl_seconds,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TOKEN_SECRET)
                .long(ARG_TOKEN_SECRET)
                .help("HMAC secret used to sign session tokens")
                .env("OTPGATE_TOKEN_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_TOKEN_ISSUER)
                .long(ARG_TOKEN_ISSUER)
                .help("Issuer (iss) claim of session tokens")
                .env("OTPGATE_TOKEN_ISSUER")
                .default_value("otpgate"),
        )
        .arg(
            Arg::new(ARG_TOKEN_TTL_SECONDS)
                .long(ARG_TOKEN_TTL_SECONDS)
                .help("Session token lifetime in seconds")
                .env("OTPGATE_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
}
