//! Token and password primitives shared by the user endpoints and every
//! authenticated route.

pub mod jwt;
pub mod password;

pub use jwt::{AuthUser, Claims, JwtKeys, TokenKind};
