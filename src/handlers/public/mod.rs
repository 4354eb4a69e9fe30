// handlers/public/mod.rs - Endpoints that need no bearer token

pub mod auth;
pub mod menu;
