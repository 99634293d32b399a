//! The manifest model (spec §3 "Manifest") and the `ManifestSource`
//! boundary through which an external parser delivers parsed manifests
//! (spec §6.2 — out of scope, modeled here only as a trait).

pub mod manifest;
pub mod method;
pub mod source;

pub use manifest::{Conflict, Dependency, ExtensionType, Manifest, Obsolete};
pub use method::{CallingConvention, Enum, EnumValue, Method, Property};
pub use source::{ManifestSource, RawManifest};
