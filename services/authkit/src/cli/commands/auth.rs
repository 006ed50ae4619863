//! Token scheme and lifecycle arguments.

use anyhow::{anyhow, Result};
use clap::{builder::FalseyValueParser, Arg, ArgAction, Command};
use secrecy::SecretString;
use std::collections::BTreeMap;

pub const ARG_JWT_AUTH: &str = "jwt-auth";
pub const ARG_PASETO_AUTH: &str = "paseto-auth";
pub const ARG_JWT_SECRET: &str = "jwt-secret";
pub const ARG_PASETO_KEY: &str = "paseto-key";
pub const ARG_ACCESS_TOKEN_TTL: &str = "access-token-ttl-seconds";
pub const ARG_TOKEN_METADATA: &str = "token-metadata";
pub const ARG_PRODUCTION: &str = "production";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";
pub const ARG_STORE_TIMEOUT: &str = "store-timeout-seconds";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_JWT_AUTH)
                .long(ARG_JWT_AUTH)
                .help("Issue and validate HMAC-signed JWT bearer tokens")
                .env("AUTHKIT_JWT_AUTH")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_PASETO_AUTH)
                .long(ARG_PASETO_AUTH)
                .help("Issue and validate PASETO v4.local bearer tokens")
                .env("AUTHKIT_PASETO_AUTH")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_JWT_SECRET)
                .long(ARG_JWT_SECRET)
                .help("HMAC signing secret for the jwt scheme")
                .env("AUTHKIT_JWT_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_PASETO_KEY)
                .long(ARG_PASETO_KEY)
                .help("Base64 32-byte symmetric key for the paseto scheme")
                .env("AUTHKIT_PASETO_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_TTL)
                .long(ARG_ACCESS_TOKEN_TTL)
                .help("Access token TTL in seconds (refresh tokens are fixed at 24h)")
                .env("AUTHKIT_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("180")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_TOKEN_METADATA)
                .long(ARG_TOKEN_METADATA)
                .help("Extra key=value claims embedded in access tokens (repeatable)")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_PRODUCTION)
                .long(ARG_PRODUCTION)
                .help("Production mode: verification emails instead of auto-verify")
                .env("AUTHKIT_PRODUCTION")
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL used for CORS and verification links")
                .env("AUTHKIT_FRONTEND_BASE_URL")
                .default_value("https://authkit.dev"),
        )
        .arg(
            Arg::new(ARG_STORE_TIMEOUT)
                .long(ARG_STORE_TIMEOUT)
                .help("Per-call timeout for credential store operations in seconds")
                .env("AUTHKIT_STORE_TIMEOUT_SECONDS")
                .default_value("5")
                .value_parser(clap::value_parser!(u64)),
        )
}

#[derive(Debug)]
pub struct Options {
    pub jwt_auth: bool,
    pub paseto_auth: bool,
    pub jwt_secret: Option<SecretString>,
    pub paseto_key: Option<SecretString>,
    pub access_token_ttl_seconds: i64,
    pub token_metadata: BTreeMap<String, String>,
    pub production: bool,
    pub frontend_base_url: String,
    pub store_timeout_seconds: u64,
}

impl Options {
    /// Read the auth options out of parsed matches.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed `--token-metadata` entry.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let token_metadata = matches
            .get_many::<String>(ARG_TOKEN_METADATA)
            .unwrap_or_default()
            .map(|entry| parse_metadata_entry(entry))
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(Self {
            jwt_auth: matches.get_flag(ARG_JWT_AUTH),
            paseto_auth: matches.get_flag(ARG_PASETO_AUTH),
            jwt_secret: matches
                .get_one::<String>(ARG_JWT_SECRET)
                .cloned()
                .map(SecretString::from),
            paseto_key: matches
                .get_one::<String>(ARG_PASETO_KEY)
                .cloned()
                .map(SecretString::from),
            access_token_ttl_seconds: matches
                .get_one::<i64>(ARG_ACCESS_TOKEN_TTL)
                .copied()
                .unwrap_or(180),
            token_metadata,
            production: matches.get_flag(ARG_PRODUCTION),
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "https://authkit.dev".to_string()),
            store_timeout_seconds: matches.get_one::<u64>(ARG_STORE_TIMEOUT).copied().unwrap_or(5),
        })
    }
}

fn parse_metadata_entry(entry: &str) -> Result<(String, String)> {
    let mut parts = entry.splitn(2, '=');
    let key = parts.next().map(str::trim).unwrap_or_default();
    let value = parts.next().map(str::trim);
    match value {
        Some(value) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(anyhow!("invalid token metadata entry: {entry} (want key=value)")),
    }
}
