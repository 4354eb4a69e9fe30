// handlers/public/auth/mod.rs - Token acquisition
//
// Both endpoints answer with `{user, token}` and open a session in the token authority.

pub mod login;
pub mod register;

pub use login::login_put;
pub use register::register_post;
