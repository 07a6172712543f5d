//! i18n-catalog-server
//!
//! Multi-locale translation catalog backed by one nested JSON document per
//! locale, with per-key review tracking, change detection across reloads and
//! locale-aware typography, served over the Language Server Protocol.

pub mod codec;
pub mod config;
pub mod server;
pub mod store;
pub mod typography;
pub mod watcher;

pub use server::backend::Backend;
pub use store::TranslationStore;
