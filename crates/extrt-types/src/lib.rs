//! Identifiers, versions, constraint ranges, addresses and value types
//! shared by every other crate in the workspace (spec §3).

pub mod address;
pub mod id;
pub mod range;
pub mod value_type;
pub mod version;

pub use address::Address;
pub use id::UniqueId;
pub use range::{Constraint, Operator, RangeSet};
pub use value_type::{TargetAbi, ValueType};
pub use version::Version;
