//! Response sanitizing for vision-model output
//!
//! Repairs answers that arrive wrapped in markdown fences, embedded in prose,
//! or only as free-form reasoning, so the consolidator always sees either a
//! usable value or the `unknown` sentinel.

pub mod code_block;
pub mod reasoning;
pub mod renderer;

pub use code_block::{CodeBlockAnalyzer, SanitizeError};
pub use reasoning::{extract_answer, EXTINGUISHER_TYPES};
pub use renderer::Renderer;
