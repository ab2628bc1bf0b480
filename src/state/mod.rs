/// State and data model
///
/// This module holds everything the pipeline passes between stages:
/// - Shared data structures (data.rs)
/// - Enhancement parameters and form validation (params.rs)
/// - The read-only image corpus (corpus.rs)

pub mod corpus;
pub mod data;
pub mod params;
