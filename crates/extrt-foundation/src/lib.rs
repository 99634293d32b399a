//! Shared error taxonomy for the extension runtime.
//!
//! Every other crate in the workspace depends on this one and none of its
//! siblings; keep it free of anything but error types and the small
//! validation helpers that stages reuse.

pub mod error;
pub mod validation;

pub use error::{ErrorCategory, ErrorKind, ExtError, ExtResult};
