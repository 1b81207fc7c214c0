//! Wire and output types for forms, submissions and reshaped documents

mod document;
mod form;
pub(crate) mod scalar;
mod submission;

pub use document::*;
pub use form::*;
pub use scalar::scalar_to_string;
pub use submission::*;
