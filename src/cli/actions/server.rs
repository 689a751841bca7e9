use crate::{
    api,
    cli::{commands::token, telemetry},
    identity::PgUserDirectory,
    notify::{LogNotifier, Notifier, SmtpConfig, SmtpNotifier},
    otp::{OtpPolicy, OtpService, PgOtpStore},
    token::JwtTokenIssuer,
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub policy: OtpPolicy,
    pub token: token::Options,
    pub smtp: Option<SmtpConfig>,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &"***")
            .field("policy", &self.policy)
            .field("token", &self.token)
            .field("smtp", &self.smtp)
            .finish()
    }
}

/// Pick the mail relay, or the log notifier when none is configured.
///
/// # Errors
/// Returns an error if the relay settings are invalid.
pub fn notifier(smtp: Option<&SmtpConfig>) -> Result<Arc<dyn Notifier>> {
    match smtp {
        Some(config) => {
            info!(host = %config.host, port = config.port, "delivering passcodes via SMTP");
            Ok(Arc::new(
                SmtpNotifier::new(config).context("Invalid SMTP configuration")?,
            ))
        }
        None => {
            info!("no SMTP relay configured, passcodes will only be logged");
            Ok(Arc::new(LogNotifier))
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable, the token or mail settings are invalid,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let tokens = JwtTokenIssuer::new(&args.token.secret, args.token.issuer, args.token.ttl_seconds)
        .context("Invalid session token configuration")?;
    let notifier = notifier(args.smtp.as_ref())?;

    let pool = api::connect(&args.dsn).await?;

    let otp = OtpService::builder(
        Arc::new(PgUserDirectory::new(pool.clone())),
        Arc::new(PgOtpStore::new(pool.clone())),
        notifier,
        Arc::new(tokens),
    )
    .policy(args.policy)
    .build();

    let result = api::new(args.port, Arc::new(otp), pool).await;

    telemetry::shutdown_tracer();

    result
}
