//! Closed value-type enum used by the manifest model and the JIT
//! generators (spec §3 "ValueType"), grounded in
//! `original_source/include/plugify/value_type.hpp`.

use serde::{Deserialize, Serialize};

/// The host ABI a JIT trampoline is built against; determines the hidden-
/// return rule in [`ValueType::is_hidden_param`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetAbi {
    SysV64,
    Win64,
    X86,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Invalid,
    Void,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Pointer,
    Float,
    Double,
    Function,

    String,
    Any,

    ArrayBool,
    ArrayInt8,
    ArrayInt16,
    ArrayInt32,
    ArrayInt64,
    ArrayUInt8,
    ArrayUInt16,
    ArrayUInt32,
    ArrayUInt64,
    ArrayPointer,
    ArrayFloat,
    ArrayDouble,
    ArrayString,
    ArrayAny,
    ArrayVector2,
    ArrayVector3,
    ArrayVector4,
    ArrayMatrix4x4,

    Vector2,
    Vector3,
    Vector4,
    Matrix4x4,
}

impl ValueType {
    pub fn is_int(self) -> bool {
        matches!(
            self,
            ValueType::Bool
                | ValueType::Int8
                | ValueType::Int16
                | ValueType::Int32
                | ValueType::Int64
                | ValueType::UInt8
                | ValueType::UInt16
                | ValueType::UInt32
                | ValueType::UInt64
                | ValueType::Pointer
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }

    /// Reference types: strings, "any", and arrays — always passed as a
    /// pointer regardless of the logical element type.
    pub fn is_object(self) -> bool {
        matches!(self, ValueType::String | ValueType::Any) || self.is_array()
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            ValueType::ArrayBool
                | ValueType::ArrayInt8
                | ValueType::ArrayInt16
                | ValueType::ArrayInt32
                | ValueType::ArrayInt64
                | ValueType::ArrayUInt8
                | ValueType::ArrayUInt16
                | ValueType::ArrayUInt32
                | ValueType::ArrayUInt64
                | ValueType::ArrayPointer
                | ValueType::ArrayFloat
                | ValueType::ArrayDouble
                | ValueType::ArrayString
                | ValueType::ArrayAny
                | ValueType::ArrayVector2
                | ValueType::ArrayVector3
                | ValueType::ArrayVector4
                | ValueType::ArrayMatrix4x4
        )
    }

    /// Fixed-size vector/matrix structs passed (and sometimes returned) by
    /// value.
    pub fn is_struct(self) -> bool {
        matches!(
            self,
            ValueType::Vector2 | ValueType::Vector3 | ValueType::Vector4 | ValueType::Matrix4x4
        )
    }

    /// True when a value of this type, if used as a return type under
    /// `abi`, is returned via a caller-allocated buffer passed as the
    /// hidden first argument (spec §4.7 step 2).
    pub fn is_hidden_param(self, abi: TargetAbi) -> bool {
        if !self.is_struct() {
            return false;
        }
        match abi {
            // Matches the original's `#if _WIN32 && !_M_ARM64` carve-out:
            // Vector3 upward is hidden everywhere except Win64/x86, where
            // only Matrix4x4 needs the hidden-pointer convention.
            TargetAbi::Win64 => matches!(self, ValueType::Matrix4x4),
            TargetAbi::SysV64 | TargetAbi::X86 => matches!(
                self,
                ValueType::Vector3 | ValueType::Vector4 | ValueType::Matrix4x4
            ),
        }
    }

    /// Size in bytes of the scalar/struct representation, used to size JIT
    /// stack slots.
    pub fn size_of(self) -> usize {
        match self {
            ValueType::Void | ValueType::Invalid => 0,
            ValueType::Bool | ValueType::Int8 | ValueType::UInt8 => 1,
            ValueType::Int16 | ValueType::UInt16 => 2,
            ValueType::Int32 | ValueType::UInt32 | ValueType::Float => 4,
            ValueType::Int64
            | ValueType::UInt64
            | ValueType::Double
            | ValueType::Pointer
            | ValueType::Function => 8,
            ValueType::Vector2 => 8,
            ValueType::Vector3 => 12,
            ValueType::Vector4 => 16,
            ValueType::Matrix4x4 => 64,
            ValueType::String | ValueType::Any => std::mem::size_of::<usize>(),
            _ if self.is_array() => std::mem::size_of::<usize>(),
            _ => std::mem::size_of::<usize>(),
        }
    }
}
