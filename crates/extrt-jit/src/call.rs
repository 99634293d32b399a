//! JIT call generator (spec §4.8): the symmetric inverse of the callback
//! generator — unpacks a packed argument array into a native call of an
//! arbitrary target function.

use dynasmrt::{dynasm, DynasmApi};

use extrt_foundation::{ExtError, ExtResult};
use extrt_types::{Address, TargetAbi};

use crate::abi::{check_arg_width, classify, classify_arg, ArgClass, INT_ARG_REGS, SSE_ARG_REGS};
use crate::return_value::Return;
use crate::runtime::JitRuntime;
use crate::signature::Signature;

/// The generated trampoline's own fixed signature: `(args, ret)`.
pub type CallFn = extern "C" fn(*const u64, *mut Return);

/// When to stop for a debugger before invoking the target (spec §4.8
/// "WaitType::Breakpoint").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitType {
    #[default]
    None,
    Breakpoint,
}

pub struct JitCall {
    code: dynasmrt::ExecutableBuffer,
    entry: dynasmrt::AssemblyOffset,
    signature: Signature,
}

impl JitCall {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn function_pointer(&self) -> Address {
        Address::from_ptr(self.code.ptr(self.entry))
    }

    /// Safe wrapper around invoking the trampoline: `args` must hold one
    /// `u64` per logical argument in `signature`'s order.
    ///
    /// # Safety
    /// `target` (passed to [`generate_call`]) must still be a valid,
    /// ABI-matching function pointer.
    pub unsafe fn call(&self, args: &[u64], ret: &mut Return) {
        let f: CallFn = std::mem::transmute(self.code.ptr(self.entry));
        f(args.as_ptr(), ret as *mut Return);
    }
}

const WORD: i32 = 8;

/// Builds a trampoline of fixed signature `(args, ret)` that calls `target`
/// as if through `signature`'s native C calling convention, targeting
/// SysV64 (see `abi.rs`).
pub fn generate_call(
    signature: Signature,
    target: Address,
    wait: WaitType,
) -> ExtResult<JitCall> {
    let hidden = signature.return_type.is_hidden_param(TargetAbi::SysV64);
    let logical_args = signature.arg_count();
    let abi_arg_count = logical_args + usize::from(hidden);

    if abi_arg_count > INT_ARG_REGS.len() + SSE_ARG_REGS.len() {
        return Err(ExtError::validation_failed(
            "JIT call: stack-passed arguments are not supported",
        ));
    }

    let (code, entry) = JitRuntime::global().emit(|ops| {
        let start = ops.offset();
        dynasm!(ops
            ; .arch x64
            ; push rbp
            ; mov rbp, rsp
            ; sub rsp, 16
            // Stash the trampoline's own two incoming parameters (args
            // pointer in rdi, ret pointer in rsi) in callee-saved-by-us
            // scratch registers before we start overwriting rdi/rsi with
            // the target call's real arguments.
            ; mov r10, rdi
            ; mov r11, rsi
        );

        let mut int_idx = 0usize;
        let mut sse_idx = 0usize;

        if hidden {
            let reg = INT_ARG_REGS[0];
            int_idx += 1;
            dynasm!(ops; .arch x64; mov Rq(reg), r11);
        }

        for logical_pos in 0..logical_args {
            let arg = signature.args[logical_pos];
            check_arg_width(arg)?;
            let slot_off = (logical_pos as i32) * WORD;
            match classify_arg(arg) {
                ArgClass::Integer => {
                    let reg = *INT_ARG_REGS.get(int_idx).ok_or_else(too_many_int_args)?;
                    int_idx += 1;
                    dynasm!(ops; .arch x64; mov Rq(reg), [r10 + slot_off]);
                }
                ArgClass::Sse => {
                    let reg = *SSE_ARG_REGS.get(sse_idx).ok_or_else(too_many_sse_args)?;
                    sse_idx += 1;
                    dynasm!(ops; .arch x64; movsd Rx(reg), [r10 + slot_off]);
                }
            }
        }

        if wait == WaitType::Breakpoint {
            dynasm!(ops; .arch x64; int 3);
        }

        dynasm!(ops
            ; .arch x64
            ; mov rax, QWORD target.as_usize() as i64
            ; call rax
        );

        if !hidden && signature.has_ret() {
            match classify(signature.return_type) {
                ArgClass::Integer => {
                    dynasm!(ops; .arch x64; mov [r11], rax);
                }
                ArgClass::Sse => {
                    dynasm!(ops; .arch x64; movsd [r11], xmm0);
                }
            }
        }

        dynasm!(ops
            ; .arch x64
            ; mov rsp, rbp
            ; pop rbp
            ; ret
        );

        Ok(start)
    })?;

    Ok(JitCall {
        code,
        entry,
        signature,
    })
}

fn too_many_int_args() -> ExtError {
    ExtError::validation_failed("JIT call: more than 6 integer/pointer arguments not supported")
}

fn too_many_sse_args() -> ExtError {
    ExtError::validation_failed("JIT call: more than 8 floating-point arguments not supported")
}
