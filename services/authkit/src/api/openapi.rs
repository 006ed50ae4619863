use super::handlers::{auth, health, me};
use utoipa::openapi::{InfoBuilder, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, mut spec) = public_router().split_for_parts();
    let (_router, protected) = protected_router().split_for_parts();
    spec.merge(protected);
    spec
}

/// Routes that need no bearer token.
///
/// Add new endpoints via `.routes(routes!(...))` so they are both served and
/// included in the generated `OpenAPI` spec.
pub(crate) fn public_router() -> OpenApiRouter {
    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Registration, login, and token rotation".to_string());

    let mut me_tag = Tag::new("me");
    me_tag.description = Some("Authenticated introspection".to_string());

    let mut base = cargo_openapi();
    base.tags = Some(vec![auth_tag, me_tag]);

    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    OpenApiRouter::with_openapi(base)
        .routes(routes!(health::health))
        .routes(routes!(auth::register::register))
        .routes(routes!(auth::login::login))
        .routes(routes!(auth::session::refresh))
        .routes(routes!(auth::session::logout))
}

/// Routes served behind the bearer gatekeeper; the middleware itself is
/// attached during router assembly, not here.
pub(crate) fn protected_router() -> OpenApiRouter {
    OpenApiRouter::new().routes(routes!(me::get_me))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(Some(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    OpenApiBuilder::new().info(info).build()
}
