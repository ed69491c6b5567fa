//! Image analysis backed by a Gemini-style `generateContent` endpoint.

mod client;
mod error;
mod schema;

pub use client::GeminiClient;
pub use error::{AnalysisError, Result};
