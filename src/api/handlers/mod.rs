//! API handlers for Konfirmo.
//!
//! Auth flows live under [`auth`]; user management, health, and the root
//! banner are siblings.

pub mod auth;
pub mod health;
pub mod root;
pub mod users;
