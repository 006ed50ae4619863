//! # Authkit (Credential & Token Lifecycle Engine)
//!
//! `authkit` turns a raw email/password pair into a verified identity and a
//! pair of signed bearer tokens, under a configuration-selected scheme, and
//! exposes the result over a small HTTP surface.
//!
//! ## Token schemes
//!
//! Exactly one scheme is active per deployment, chosen once at bootstrap:
//!
//! - **JWT**: HMAC-SHA256 signed compact tokens.
//! - **PASETO**: v4.local symmetric authenticated encryption.
//! - **None**: token issuance disabled; login/registration still work and
//!   return an empty token pair callers must tolerate.
//!
//! Access and refresh tokens carry a kind discriminator inside the signed
//! payload; a refresh token is never accepted where an access token is
//! required, and vice versa.
//!
//! ## Bootstrap validation
//!
//! Startup validates that every enabled capability (token scheme, Redis
//! session store, OAuth providers) has its secrets present. Any missing value
//! aborts the process before it serves traffic. Enabling both token schemes
//! at once is a bootstrap error, not a silent precedence choice.
//!
//! ## Error boundary
//!
//! Per-request failures are mapped to a small, stable set of HTTP codes at
//! the handler boundary. Unknown email and wrong password are
//! indistinguishable to callers; internal causes go to structured logs only.

pub mod api;
pub mod cli;
pub mod config;
pub mod credential;
pub mod email;
