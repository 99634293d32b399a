//! `Signature` (spec §4.7 step 1), grounded in
//! `original_source/include/plugify/signature.hpp`
//! (SPEC_FULL.md supplemented feature #6: `ArgCount`/`HasRet` kept as
//! methods here rather than free functions).

use extrt_manifest::method::{Method, NO_VAR_ARGS};
use extrt_types::ValueType;

/// A single logical argument: its value type plus whether it's passed by
/// reference (`Property::is_ref`). A by-ref argument is always transmitted
/// as a pointer, regardless of how wide the referenced `value_type` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arg {
    pub value_type: ValueType,
    pub is_ref: bool,
}

impl Arg {
    pub fn by_value(value_type: ValueType) -> Self {
        Self {
            value_type,
            is_ref: false,
        }
    }
}

/// The ABI-relevant projection of a [`Method`]: just enough to drive code
/// generation, stripped of names and documentation metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub return_type: ValueType,
    pub args: Vec<Arg>,
    pub var_index: u8,
}

impl Signature {
    pub fn new(return_type: ValueType, args: Vec<Arg>) -> Self {
        Self {
            return_type,
            args,
            var_index: NO_VAR_ARGS,
        }
    }

    pub fn from_method(method: &Method) -> Self {
        Self {
            return_type: method.return_type.value_type,
            args: method
                .params
                .iter()
                .map(|p| Arg {
                    value_type: p.value_type,
                    is_ref: p.is_ref,
                })
                .collect(),
            var_index: method.var_index,
        }
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn has_ret(&self) -> bool {
        !matches!(self.return_type, ValueType::Void)
    }

    pub fn has_var_args(&self) -> bool {
        self.var_index != NO_VAR_ARGS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn void_return_has_no_ret() {
        let sig = Signature::new(ValueType::Void, vec![Arg::by_value(ValueType::Int32)]);
        assert!(!sig.has_ret());
        assert_eq!(sig.arg_count(), 1);
    }

    #[test]
    fn non_void_return_has_ret() {
        let sig = Signature::new(ValueType::Double, vec![]);
        assert!(sig.has_ret());
    }

    #[test]
    fn from_method_carries_is_ref_through() {
        use extrt_manifest::method::{CallingConvention, Property};

        let method = Method {
            name: "f".to_string(),
            func_name: "f".to_string(),
            calling_convention: CallingConvention::Cdecl,
            return_type: Property::scalar(ValueType::Void),
            params: vec![Property {
                value_type: ValueType::Vector3,
                is_ref: true,
                prototype: None,
                enumerate: None,
            }],
            var_index: NO_VAR_ARGS,
        };

        let sig = Signature::from_method(&method);
        assert!(sig.args[0].is_ref);
        assert_eq!(sig.args[0].value_type, ValueType::Vector3);
    }
}
