//! PushNotifier implementations.

pub mod log;

pub use log::LogPushNotifier;
