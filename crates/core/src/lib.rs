//! Core types shared across the buildlens crates
//!
//! This crate carries the small pieces every other layer needs: the build
//! session identifier and the payload-free change notification channel.

pub mod events;
pub mod session;

pub use events::{DataChangeNotifier, NewDataSubscriber};
pub use session::BuildSessionId;
