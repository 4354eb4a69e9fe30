// handlers/protected/auth/mod.rs - Session and profile endpoints for logged in users

pub mod logout;
pub mod me;
pub mod user;

pub use logout::logout_delete;
pub use me::me_get;
pub use user::user_put;
