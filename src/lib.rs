//! Resale price prediction for used cars.
//!
//! A submission is validated, turned into a schema-ordered feature row and
//! priced by an exported regression model loaded through ONNX Runtime.

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod features;
pub mod model;
pub mod server;
pub mod service;
pub mod telemetry;


// Re-export common types
pub use error::PredictorError;
pub use features::{CarInput, FeatureRecord, FeatureSchema, SchemaVersion};
pub use service::{PriceService, Quote};
