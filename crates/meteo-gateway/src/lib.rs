//! meteo-gateway - HTTP front door for the meteo assistant
//!
//! Exposes chat, intent classification and raw weather lookups as JSON
//! endpoints, with optional bearer-token auth.

pub mod auth;
pub mod protocol;
pub mod server;

pub use server::{GatewayServer, GatewayState};
