//! Cassia -- TravelCash Chat Assistant
//!
//! A terminal chat front-end that relays user messages to a hosted model,
//! augmenting turns with a best-effort location annotation and a small set
//! of callable tools (mock balance lookup, web-search grounding).

pub mod agent;
pub mod config;
pub mod error;
pub mod gemini;
pub mod geo;
pub mod types;
