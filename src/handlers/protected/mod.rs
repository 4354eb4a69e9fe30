// handlers/protected/mod.rs - Endpoints behind jwt_auth_middleware
//
// Every handler here receives `Extension<AuthUser>` and calls `require` before touching the gateway,
// except where any authenticated caller is allowed and the guard would always say yes.

pub mod auth;
pub mod franchise;
pub mod order;
