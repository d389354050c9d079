// handlers/mod.rs - HTTP handlers
//
// Public (no credential) → service info, health and login
// Protected (identity middleware) → whoami and the entity collections

pub mod auth;
pub mod resource;
pub mod system;
