//! `Method`/`Property` tree (spec §3), grounded in
//! `original_source/include/plugify/core/method.hpp` and `property.hpp`.

use serde::{Deserialize, Serialize};

use extrt_types::ValueType;

/// Calling convention a `Method`'s native entry point uses. Only `Cdecl`
/// and `Stdcall` are meaningfully distinct on the ABIs this runtime
/// targets; others are accepted and forwarded to the JIT code generator
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallingConvention {
    Cdecl,
    Stdcall,
    Fastcall,
    Thiscall,
}

impl Default for CallingConvention {
    fn default() -> Self {
        CallingConvention::Cdecl
    }
}

/// A labeled enumeration a [`Property`] can reference for documentation
/// and host-side validation purposes; has no effect on JIT code
/// generation, which only ever sees the underlying [`ValueType`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub value: i64,
}

/// A single function parameter or return slot. `prototype` makes
/// `Property`/`Method` mutually recursive so function-valued parameters
/// can describe the callback signature they expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub is_ref: bool,
    pub prototype: Option<Box<Method>>,
    pub enumerate: Option<Enum>,
}

impl Property {
    pub fn scalar(value_type: ValueType) -> Self {
        Self {
            value_type,
            is_ref: false,
            prototype: None,
            enumerate: None,
        }
    }
}

/// Sentinel `var_index` meaning "this method has no varargs".
pub const NO_VAR_ARGS: u8 = 0xFF;

/// An exported (or callback-prototype) function signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub func_name: String,
    pub calling_convention: CallingConvention,
    pub return_type: Property,
    pub params: Vec<Property>,
    /// `NO_VAR_ARGS` (`0xFF`) when the method has no varargs, otherwise the
    /// index of the first variadic parameter.
    pub var_index: u8,
}

impl Method {
    pub fn has_var_args(&self) -> bool {
        self.var_index != NO_VAR_ARGS
    }

    /// Depth-first search for a function-valued parameter's prototype
    /// named `name`, mirroring `Method::FindPrototype` in the original.
    pub fn find_prototype(&self, name: &str) -> Option<&Method> {
        for param in &self.params {
            if let Some(proto) = &param.prototype {
                if proto.name == name {
                    return Some(proto);
                }
                if let Some(found) = proto.find_prototype(name) {
                    return Some(found);
                }
            }
        }
        None
    }
}
