pub mod core;
pub mod export;
pub mod extract;
pub mod ledger;
pub mod parser;
pub mod pipeline;
pub mod watch;

pub use crate::core::model::{Evidence, ExtractionItem, FieldSpec, ResultSet, FIELDS};
pub use pipeline::{Pipeline, PipelineConfig, ProcessOutcome};
