pub mod middleware;
pub mod password;
pub mod token;

/// Header carrying the opaque session token.
pub const AUTH_HEADER: &str = "x-authorization";
