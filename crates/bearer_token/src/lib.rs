mod claims;
mod codec;
mod error;
mod jwt;
mod paseto;

pub use claims::{Claims, TokenKind, TokenPair, REFRESH_TTL_SECONDS};
pub use codec::SchemeCodec;
pub use error::Error;
pub use jwt::JwtCodec;
pub use paseto::{PasetoCodec, PASETO_KEY_BYTES};
