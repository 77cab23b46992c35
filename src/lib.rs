//! Pairing Mailer: emails each debate round's pairing to both teams.

pub mod app;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod mail;
pub mod pairing;
pub mod records;
pub mod store;
