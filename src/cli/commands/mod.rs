pub mod otp;
pub mod smtp;
pub mod token;

use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ArgAction, ArgMatches, ColorChoice, Command,
};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

const LEVELS: [Level; 5] = [
    Level::ERROR,
    Level::WARN,
    Level::INFO,
    Level::DEBUG,
    Level::TRACE,
];

/// `OTPGATE_LOG_LEVEL` takes a level name or its index, so `info`, `2` and `-vv` agree.
fn log_level() -> ValueParser {
    ValueParser::from(|value: &str| -> Result<u8, String> {
        LEVELS
            .iter()
            .position(|level| level.as_str().eq_ignore_ascii_case(value))
            .and_then(|index| u8::try_from(index).ok())
            .or_else(|| value.parse::<u8>().ok().filter(|index| *index <= 5))
            .ok_or_else(|| format!("invalid log level: {value}"))
    })
}

/// Tracing level selected by `-v` or `OTPGATE_LOG_LEVEL`; `None` keeps the ERROR default.
#[must_use]
pub fn verbosity(matches: &ArgMatches) -> Option<Level> {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or(0) {
        0 => None,
        index => LEVELS
            .get(usize::from(index))
            .copied()
            .or(Some(Level::TRACE)),
    }
}

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("otpgate")
        .about("One-time passcode issuance and verification")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("OTPGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("dsn")
                .short('d')
                .long("dsn")
                .help("Database connection string")
                .env("OTPGATE_DSN")
                .hide_env_values(true)
                .required(true),
        );

    let command = otp::with_args(command);
    let command = token::with_args(command);
    smtp::with_args(command).arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("OTPGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(log_level()),
    )
}
