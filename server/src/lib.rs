//! Sortie Server
//!
//! REST backend for organizing outings: user accounts, events tagged with a
//! category, and an owner-approved participant list behind a waiting list.

pub mod api;
pub mod auth;
pub mod categories;
pub mod config;
pub mod db;
pub mod events;
