//! Gemini API Integration
//!
//! The reqwest-backed implementation of the [`ModelClient`] trait.
//!
//! [`ModelClient`]: crate::types::ModelClient

pub mod client;

pub use client::GeminiClient;
