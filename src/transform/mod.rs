//! Submission reshaping: schema indexing, label heuristics and reassembly

mod date;
mod heuristics;
mod schema;
mod transformer;

pub use schema::SchemaIndex;
pub use transformer::transform;
