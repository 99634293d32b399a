//! JIT trampoline engine (spec §4.7/§4.8): bridges a language runtime's
//! calling convention to the core's uniform `(args: [u64], ret: Return)`
//! representation. Targets the SysV64 ABI only — see `abi.rs`.

pub mod abi;
pub mod call;
pub mod callback;
pub mod return_value;
pub mod runtime;
pub mod signature;

pub use call::{generate_call, CallFn, JitCall, WaitType};
pub use callback::{generate_callback, Handler, JitCallback};
pub use return_value::Return;
pub use runtime::JitRuntime;
pub use signature::{Arg, Signature};
