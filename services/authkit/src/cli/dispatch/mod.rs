//! Command-line argument dispatch and bootstrap validation.
//!
//! This module maps validated CLI arguments to the server action. Bootstrap
//! validation runs here: a missing secret for any enabled capability aborts
//! before anything binds a port or touches the database.

use crate::cli::actions::{server, Action};
use crate::cli::commands::{auth, email, oauth, session};
use crate::config::Settings;
use crate::email::EmailWorkerConfig;
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or bootstrap
/// validation fails.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let session_opts = session::Options::parse(matches);
    let oauth_opts = oauth::Options::parse(matches);
    let email_opts = email::Options::parse(matches);

    let settings = Settings::new()
        .with_jwt_auth(auth_opts.jwt_auth)
        .with_paseto_auth(auth_opts.paseto_auth)
        .with_jwt_secret(auth_opts.jwt_secret)
        .with_paseto_key(auth_opts.paseto_key)
        .with_production(auth_opts.production)
        .with_access_token_ttl_seconds(auth_opts.access_token_ttl_seconds)
        .with_store_timeout_seconds(auth_opts.store_timeout_seconds)
        .with_token_metadata(auth_opts.token_metadata)
        .with_frontend_base_url(auth_opts.frontend_base_url)
        .with_session(session_opts.session)
        .with_session_store_redis(session_opts.session_store_redis)
        .with_redis_address(session_opts.redis_address)
        .with_redis_password(session_opts.redis_password)
        .with_google_oauth(oauth_opts.google)
        .with_github_oauth(oauth_opts.github);

    // Fail fast: the process must not start serving with missing secrets.
    settings.validate().context("bootstrap validation failed")?;

    let email_config = EmailWorkerConfig::new()
        .with_queue_capacity(email_opts.queue_capacity)
        .with_max_attempts(email_opts.max_attempts)
        .with_backoff_base_seconds(email_opts.backoff_base_seconds)
        .with_backoff_max_seconds(email_opts.backoff_max_seconds);

    Ok(Action::Server(server::Args {
        port,
        dsn,
        settings,
        email_config,
    }))
}
