//! Image artifact pipeline
//!
//! Validates enhancement parameters, loads corpus images, applies the
//! color/brightness/contrast/sharpness chain, classifies images through a
//! pluggable model registry, renders reports and histograms, and manages
//! every generated file as a uniquely named, scoped artifact.

pub mod artifact;
pub mod classify;
pub mod config;
pub mod error;
pub mod imaging;
pub mod pipeline;
pub mod render;
pub mod report;
pub mod state;

pub use config::Config;
pub use error::{PipelineError, Result};
pub use pipeline::Pipeline;
