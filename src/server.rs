//! Language server hosting the catalog.

pub mod backend;
pub mod commands;
mod handlers;
pub mod state;
