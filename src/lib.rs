//! Keeps the macOS Dock on the right screen edge for each display layout.
//!
//! Attached displays are reduced to a [`display::Fingerprint`]. When the
//! fingerprint changes the [`engine::ReconciliationEngine`] looks up the
//! saved [`store::LayoutPreference`] for it and moves the Dock through the
//! [`dock::ActionExecutor`].

pub mod config;
pub mod display;
pub mod dock;
pub mod engine;
pub mod ipc;
pub mod persist;
pub mod store;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
