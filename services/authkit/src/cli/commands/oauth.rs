//! OAuth provider arguments. The flows themselves are out of scope; the
//! credentials are recognized so bootstrap validation can fail fast on a
//! partially configured provider.

use crate::config::OauthProvider;
use clap::{builder::FalseyValueParser, Arg, ArgAction, Command};
use secrecy::SecretString;

pub const ARG_GOOGLE_OAUTH: &str = "google-oauth";
pub const ARG_GITHUB_OAUTH: &str = "github-oauth";

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = provider_args(
        command,
        ARG_GOOGLE_OAUTH,
        "google",
        "AUTHKIT_GOOGLE_OAUTH",
        "AUTHKIT_GOOGLE_CLIENT_ID",
        "AUTHKIT_GOOGLE_CLIENT_SECRET",
        "AUTHKIT_GOOGLE_REDIRECT_URL",
    );
    provider_args(
        command,
        ARG_GITHUB_OAUTH,
        "github",
        "AUTHKIT_GITHUB_OAUTH",
        "AUTHKIT_GITHUB_CLIENT_ID",
        "AUTHKIT_GITHUB_CLIENT_SECRET",
        "AUTHKIT_GITHUB_REDIRECT_URL",
    )
}

#[allow(clippy::too_many_arguments)]
fn provider_args(
    command: Command,
    flag: &'static str,
    provider: &'static str,
    flag_env: &'static str,
    id_env: &'static str,
    secret_env: &'static str,
    redirect_env: &'static str,
) -> Command {
    command
        .arg(
            Arg::new(flag)
                .long(flag)
                .help(format!("Enable {provider} oauth credential validation"))
                .env(flag_env)
                .action(ArgAction::SetTrue)
                .value_parser(FalseyValueParser::new()),
        )
        .arg(
            Arg::new(format!("{provider}-client-id"))
                .long(format!("{provider}-client-id"))
                .help(format!("{provider} oauth client id"))
                .env(id_env),
        )
        .arg(
            Arg::new(format!("{provider}-client-secret"))
                .long(format!("{provider}-client-secret"))
                .help(format!("{provider} oauth client secret"))
                .env(secret_env)
                .hide_env_values(true),
        )
        .arg(
            Arg::new(format!("{provider}-redirect-url"))
                .long(format!("{provider}-redirect-url"))
                .help(format!("{provider} oauth redirect url"))
                .env(redirect_env),
        )
}

#[derive(Debug)]
pub struct Options {
    pub google: Option<OauthProvider>,
    pub github: Option<OauthProvider>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            google: provider(matches, ARG_GOOGLE_OAUTH, "google"),
            github: provider(matches, ARG_GITHUB_OAUTH, "github"),
        }
    }
}

fn provider(matches: &clap::ArgMatches, flag: &str, name: &str) -> Option<OauthProvider> {
    if !matches.get_flag(flag) {
        return None;
    }
    // Missing pieces become empty strings so validation reports them instead
    // of silently disabling the provider.
    Some(OauthProvider {
        client_id: matches
            .get_one::<String>(&format!("{name}-client-id"))
            .cloned()
            .unwrap_or_default(),
        client_secret: matches
            .get_one::<String>(&format!("{name}-client-secret"))
            .cloned()
            .map(SecretString::from)
            .unwrap_or_default(),
        redirect_url: matches
            .get_one::<String>(&format!("{name}-redirect-url"))
            .cloned()
            .unwrap_or_default(),
    })
}
