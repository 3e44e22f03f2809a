//! `tagscan-pipeline` — turns one tag photograph into a [`ConsolidatedRecord`].
//!
//! OCR runs first; the eight field layers then fan out concurrently over the
//! OCR text and the shared image, and the consolidator folds their answers
//! into the record.
//!
//! [`ConsolidatedRecord`]: tagscan_core::ConsolidatedRecord

pub mod consolidate;
pub mod layers;
pub mod pipeline;

pub use consolidate::{consolidate, LayerAnswers};
pub use layers::{FieldKind, FieldQuery};
pub use pipeline::{InspectionAnalysis, InspectionPipeline, PipelineError};
