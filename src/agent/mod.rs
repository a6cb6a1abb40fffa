//! Agent Module
//!
//! The turn loop, tool selection and registry, conversation store, and the
//! fixed system instruction.

pub mod history;
pub mod session;
pub mod system_prompt;
pub mod tools;
