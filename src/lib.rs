//! Visual novel generator API
//!
//! Serves short interactive story segments: a language model writes the
//! scene, question and answers, and an image model illustrates it.

pub mod ai;
pub mod error;
pub mod models;
pub mod prompts;
pub mod server;
pub mod story;

pub use error::{Error, Result};
