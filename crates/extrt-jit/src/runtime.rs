//! Process-wide JIT runtime (spec §4.7 "Thread-safety", §9 "Global JIT
//! runtime"): a lazily-initialized singleton with an internal mutex around
//! code emission. Generated code lives in the `ExecutableBuffer` owned by
//! each `JitCallback`/`JitCall`, not here — this only serializes emission.

use std::sync::{Mutex, OnceLock};

use dynasmrt::{Assembler, AssemblyOffset, ExecutableBuffer};

use extrt_foundation::{ExtError, ExtResult};

pub struct JitRuntime {
    emission_lock: Mutex<()>,
}

impl JitRuntime {
    pub fn global() -> &'static JitRuntime {
        static INSTANCE: OnceLock<JitRuntime> = OnceLock::new();
        INSTANCE.get_or_init(|| JitRuntime {
            emission_lock: Mutex::new(()),
        })
    }

    /// Runs `build` under the emission lock, handing it a fresh assembler,
    /// then finalizes the result into executable memory.
    pub(crate) fn emit<F>(&self, build: F) -> ExtResult<(ExecutableBuffer, AssemblyOffset)>
    where
        F: FnOnce(&mut Assembler<dynasmrt::x64::X64Relocation>) -> ExtResult<AssemblyOffset>,
    {
        let _guard = self
            .emission_lock
            .lock()
            .map_err(|_| ExtError::initialization_failed("JIT emission lock poisoned"))?;

        let mut ops = Assembler::new()
            .map_err(|e| ExtError::initialization_failed(format!("JIT assembler init: {e}")))?;
        let entry = build(&mut ops)?;
        let buffer = ops
            .finalize()
            .map_err(|_| ExtError::initialization_failed("JIT code finalization failed"))?;
        Ok((buffer, entry))
    }
}
