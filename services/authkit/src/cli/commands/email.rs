//! Outbound email queue tuning.

use clap::{Arg, Command};

pub const ARG_QUEUE_CAPACITY: &str = "email-queue-capacity";
pub const ARG_MAX_ATTEMPTS: &str = "email-max-attempts";
pub const ARG_BACKOFF_BASE: &str = "email-backoff-base-seconds";
pub const ARG_BACKOFF_MAX: &str = "email-backoff-max-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_QUEUE_CAPACITY)
                .long(ARG_QUEUE_CAPACITY)
                .help("Bounded capacity of the outbound email queue")
                .env("AUTHKIT_EMAIL_QUEUE_CAPACITY")
                .default_value("64")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Max delivery attempts before a message is dropped with an error log")
                .env("AUTHKIT_EMAIL_MAX_ATTEMPTS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_BACKOFF_BASE)
                .long(ARG_BACKOFF_BASE)
                .help("Base delay for email retry backoff")
                .env("AUTHKIT_EMAIL_BACKOFF_BASE_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_BACKOFF_MAX)
                .long(ARG_BACKOFF_MAX)
                .help("Max delay for email retry backoff")
                .env("AUTHKIT_EMAIL_BACKOFF_MAX_SECONDS")
                .default_value("300")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub backoff_base_seconds: u64,
    pub backoff_max_seconds: u64,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            queue_capacity: matches
                .get_one::<usize>(ARG_QUEUE_CAPACITY)
                .copied()
                .unwrap_or(64),
            max_attempts: matches.get_one::<u32>(ARG_MAX_ATTEMPTS).copied().unwrap_or(5),
            backoff_base_seconds: matches.get_one::<u64>(ARG_BACKOFF_BASE).copied().unwrap_or(5),
            backoff_max_seconds: matches.get_one::<u64>(ARG_BACKOFF_MAX).copied().unwrap_or(300),
        }
    }
}
