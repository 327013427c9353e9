//! Application handlers.

pub mod subscription;
pub mod webhook;
