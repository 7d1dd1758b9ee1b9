//! HTTP surface.
//!
//! Serves generated challenges as PNG images or base64 JSON.

pub mod listener;
pub mod response;
pub mod router;

pub use listener::serve;
