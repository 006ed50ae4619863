//! Session store arguments. Session persistence itself lives with an
//! external collaborator; only the capability flags and its secrets are
//! recognized here so bootstrap validation can check them.

use clap::{builder::FalseyValueParser, Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_SESSION: &str = "session";
pub const ARG_SESSION_STORE_REDIS: &str = "session-store-redis";
pub const ARG_REDIS_ADDRESS: &str = "redis-address";
pub const ARG_REDIS_PASSWORD: &str = "redis-password";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION)
                .long(ARG_SESSION)
                .help("Enable cookie session support")
                .env("AUTHKIT_SESSION")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_SESSION_STORE_REDIS)
                .long(ARG_SESSION_STORE_REDIS)
                .help("Back sessions with Redis instead of in-memory cookies")
                .env("AUTHKIT_SESSION_STORE_REDIS")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_REDIS_ADDRESS)
                .long(ARG_REDIS_ADDRESS)
                .help("Redis address, required when the Redis session store is enabled")
                .env("AUTHKIT_REDIS_ADDRESS"),
        )
        .arg(
            Arg::new(ARG_REDIS_PASSWORD)
                .long(ARG_REDIS_PASSWORD)
                .help("Redis password")
                .env("AUTHKIT_REDIS_PASSWORD")
                .hide_env_values(true),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session: bool,
    pub session_store_redis: bool,
    pub redis_address: Option<String>,
    pub redis_password: Option<SecretString>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            session: matches.get_flag(ARG_SESSION),
            session_store_redis: matches.get_flag(ARG_SESSION_STORE_REDIS),
            redis_address: matches.get_one::<String>(ARG_REDIS_ADDRESS).cloned(),
            redis_password: matches
                .get_one::<String>(ARG_REDIS_PASSWORD)
                .cloned()
                .map(SecretString::from),
        }
    }
}
