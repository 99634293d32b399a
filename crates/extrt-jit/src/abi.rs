//! SysV64 register-class projection shared by both generators (spec §4.7
//! "Both JIT generators share the same ValueType → ABI type-id projection").
//!
//! Only the SysV64 ABI is targeted: x86-64 Linux/macOS. Win64 and 32-bit
//! x86 use a structurally similar but differently-numbered scheme (spec
//! §4.7 steps 4/6 call out the 32-bit split-register case explicitly) and
//! are out of scope for this implementation — see `DESIGN.md`.

use extrt_foundation::{ExtError, ExtResult};
use extrt_types::ValueType;

use crate::signature::Arg;

/// Which register file an argument or return value of `vt` occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgClass {
    Integer,
    Sse,
}

pub fn classify(vt: ValueType) -> ArgClass {
    if vt.is_float() {
        ArgClass::Sse
    } else {
        ArgClass::Integer
    }
}

/// Register class a logical argument occupies: a by-ref argument is always
/// a pointer (Integer), regardless of the referenced type; a by-value
/// argument classifies by its `ValueType` as usual.
pub fn classify_arg(arg: Arg) -> ArgClass {
    if arg.is_ref {
        ArgClass::Integer
    } else {
        classify(arg.value_type)
    }
}

/// Only by-value arguments that fit in a single 8-byte register/slot are
/// supported; anything wider (e.g. `Vector3`/`Vector4`/`Matrix4x4` passed by
/// value) must be passed by reference instead, matching the original JIT's
/// `TypeUtils::isInt`/`isFloat` gate in `jit_callback.cpp`.
pub fn check_arg_width(arg: Arg) -> ExtResult<()> {
    if !arg.is_ref && arg.value_type.size_of() > 8 {
        return Err(ExtError::validation_failed(
            "Parameters wider than 64bits not supported",
        ));
    }
    Ok(())
}

/// SysV64 integer argument registers in order, encoded per the x86-64
/// `ModRM.reg`/`REX.B` numbering dynasm's `Rq`/`Rd` operands expect
/// (rdi=7, rsi=6, rdx=2, rcx=1, r8=8, r9=9).
pub const INT_ARG_REGS: [u8; 6] = [7, 6, 2, 1, 8, 9];

/// SysV64 SSE argument registers, xmm0..xmm7.
pub const SSE_ARG_REGS: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

/// Return-value registers: `rax` for the integer class, `xmm0` for SSE.
pub const INT_RET_REG: u8 = 0;
pub const SSE_RET_REG: u8 = 0;
