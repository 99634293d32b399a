//! JIT callback generator (spec §4.7): a trampoline conforming to a
//! `Method`'s native C signature that packs its arguments and calls a fixed
//! generic handler.

use dynasmrt::{dynasm, DynasmApi};

use extrt_foundation::{ExtError, ExtResult};
use extrt_types::{Address, TargetAbi};

use crate::abi::{check_arg_width, classify, classify_arg, ArgClass, INT_ARG_REGS, SSE_ARG_REGS};
use crate::return_value::Return;
use crate::runtime::JitRuntime;
use crate::signature::Signature;

/// `handler(method, user_data, args, count, ret)` (spec §4.7).
pub type Handler = extern "C" fn(*const (), *const (), *const u64, usize, *mut Return);

/// A generated trampoline conforming to `signature`'s native calling
/// convention. Dropping it frees the executable memory; any native code
/// still holding the function pointer after that is a use-after-free, same
/// as any other JIT handle (spec §9 "generated code lifetime is tied to
/// the JIT handle").
pub struct JitCallback {
    code: dynasmrt::ExecutableBuffer,
    entry: dynasmrt::AssemblyOffset,
    signature: Signature,
}

impl JitCallback {
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The trampoline's entry point, callable by foreign code as a
    /// function matching `signature`'s native C calling convention.
    pub fn function_pointer(&self) -> Address {
        Address::from_ptr(self.code.ptr(self.entry))
    }
}

const WORD: i32 = 8;

/// Builds a trampoline for `signature` that invokes `handler` with the
/// fixed `(method, user_data, args, count, ret)` shape, targeting SysV64
/// (spec §4.7; see `abi.rs` for the ABI-scope note).
pub fn generate_callback(
    signature: Signature,
    handler: Handler,
    method: Address,
    user_data: Address,
) -> ExtResult<JitCallback> {
    let hidden = signature.return_type.is_hidden_param(TargetAbi::SysV64);
    let logical_args = signature.arg_count();
    let abi_arg_count = logical_args + usize::from(hidden);

    if abi_arg_count > INT_ARG_REGS.len() + SSE_ARG_REGS.len() {
        return Err(ExtError::validation_failed(
            "JIT callback: stack-passed arguments are not supported",
        ));
    }

    let args_frame = (abi_arg_count as i32) * WORD;
    let ret_base: i32 = 16;
    // Slot `i`'s displacement is `args_base - i*WORD`, so slot 0 (the
    // array's base pointer) sits at the lowest address and subsequent
    // slots at increasing addresses, immediately below the return buffer.
    let args_base: i32 = ret_base + args_frame;
    let frame_size = align16(args_base);

    let (code, entry) = JitRuntime::global().emit(|ops| {
        let start = ops.offset();
        dynasm!(ops
            ; .arch x64
            ; push rbp
            ; mov rbp, rsp
            ; sub rsp, frame_size
        );

        let mut int_idx = 0usize;
        let mut sse_idx = 0usize;
        for abi_pos in 0..abi_arg_count {
            let slot_off = args_base - (abi_pos as i32) * WORD;
            let class = if hidden && abi_pos == 0 {
                ArgClass::Integer
            } else {
                let arg = signature.args[abi_pos - usize::from(hidden)];
                check_arg_width(arg)?;
                classify_arg(arg)
            };
            match class {
                ArgClass::Integer => {
                    let reg = *INT_ARG_REGS.get(int_idx).ok_or_else(too_many_int_args)?;
                    int_idx += 1;
                    dynasm!(ops; .arch x64; mov [rbp - slot_off], Rq(reg));
                }
                ArgClass::Sse => {
                    let reg = *SSE_ARG_REGS.get(sse_idx).ok_or_else(too_many_sse_args)?;
                    sse_idx += 1;
                    dynasm!(ops; .arch x64; movsd [rbp - slot_off], Rx(reg));
                }
            }
        }

        let args_ptr_off = args_base - (usize::from(hidden) as i32) * WORD;
        let ret_ptr_off = if hidden { args_base } else { ret_base };
        let logical_count = logical_args as i32;

        // `handler(method, user_data, args, count, ret)` — SysV64 takes
        // those in rdi/rsi/rdx/rcx/r8. Compute the two frame-relative
        // pointers first, while rbp-relative addressing is still cheap to
        // express, then load the two call-site constants last.
        dynasm!(ops
            ; .arch x64
            ; lea rdx, [rbp - args_ptr_off]
            ; mov ecx, logical_count
            ; lea r8, [rbp - ret_ptr_off]
            ; mov rdi, QWORD method.as_usize() as i64
            ; mov rsi, QWORD user_data.as_usize() as i64
            ; mov rax, QWORD handler as usize as i64
            ; call rax
        );

        if hidden {
            dynasm!(ops; .arch x64; mov rax, [rbp - args_base]);
        } else if signature.has_ret() {
            match classify(signature.return_type) {
                ArgClass::Integer => {
                    dynasm!(ops; .arch x64; mov rax, [rbp - ret_base]);
                }
                ArgClass::Sse => {
                    dynasm!(ops; .arch x64; movsd xmm0, [rbp - ret_base]);
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

    Ok(JitCallback {
        code,
        entry,
        signature,
    })
}

fn align16(n: i32) -> i32 {
    (n + 15) & !15
}

fn too_many_int_args() -> ExtError {
    ExtError::validation_failed("JIT callback: more than 6 integer/pointer arguments not supported")
}

fn too_many_sse_args() -> ExtError {
    ExtError::validation_failed("JIT callback: more than 8 floating-point arguments not supported")
}
