//! Lexi streaming proxy server.
//!
//! Accepts a chat history over HTTP, forwards it with a fixed system
//! preamble to a hosted OpenAI-compatible model and relays the generated
//! text back as it arrives.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod stream;
pub mod upstream;
