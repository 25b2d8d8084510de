//! Calendar provider integration
//!
//! Google Calendar v3 change feed (`events.list` with sync tokens) and push
//! channels (`events.watch`, `channels.stop`).

pub mod google;
mod wire;

pub use google::GoogleCalendarFeed;
