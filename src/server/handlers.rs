//! LSP handler modules (internal to `server::backend`).

#![allow(unreachable_pub)]

pub mod execute_command;
pub mod lifecycle;
pub mod workspace;
