use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::otp::{
    code::DEFAULT_CODE_LENGTH,
    policy::{OtpPolicy, DEFAULT_TTL_SECONDS},
};

pub const ARG_OTP_LENGTH: &str = "otp-length";
pub const ARG_OTP_TTL_SECONDS: &str = "otp-ttl-seconds";
pub const ARG_OTP_INVALIDATE_PRIOR: &str = "otp-invalidate-prior";

#[derive(Debug, Clone, Copy)]
pub struct Options {
    pub policy: OtpPolicy,
}

impl Options {
    /// Parse passcode policy arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the length or validity window is out of range.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let length = matches
            .get_one::<usize>(ARG_OTP_LENGTH)
            .copied()
            .unwrap_or(DEFAULT_CODE_LENGTH);
        let ttl_seconds = matches
            .get_one::<i64>(ARG_OTP_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_TTL_SECONDS);

        let policy = OtpPolicy::new()
            .with_code_length(length)
            .with_context(|| format!("invalid --{ARG_OTP_LENGTH}"))?
            .with_ttl_seconds(ttl_seconds)
            .with_context(|| format!("invalid --{ARG_OTP_TTL_SECONDS}"))?
            .with_invalidate_prior_on_issue(matches.get_flag(ARG_OTP_INVALIDATE_PRIOR));

        Ok(Self { policy })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_OTP_LENGTH)
                .long(ARG_OTP_LENGTH)
                .help("Number of digits in each passcode (1-10)")
                .env("OTPGATE_OTP_LENGTH")
                .default_value("6")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_OTP_TTL_SECONDS)
                .long(ARG_OTP_TTL_SECONDS)
                .help("Passcode validity window in seconds")
                .env("OTPGATE_OTP_TTL_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_OTP_INVALIDATE_PRIOR)
                .long(ARG_OTP_INVALIDATE_PRIOR)
                .help("Discard a user's unconsumed passcodes when a new one is issued")
                .env("OTPGATE_OTP_INVALIDATE_PRIOR")
                .action(ArgAction::SetTrue),
        )
}
