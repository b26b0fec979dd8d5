//! Engine implementations.

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod web;
