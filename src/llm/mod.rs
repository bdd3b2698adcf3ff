mod client;

pub use client::{GeminiClient, GEMINI_MODEL};
