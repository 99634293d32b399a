//! Panic-safe foreign-call shim (spec §4.5): every call across the
//! language-module boundary goes through here so a panicking or
//! longjmp-style-misbehaving module can't take the host down with it.

use std::any::Any;
use std::panic::{catch_unwind, UnwindSafe};

use extrt_foundation::{ExtError, ExtResult};

/// Runs `f`, converting a panic into an [`ExtError`] named after `operation`
/// and `extension_name` rather than unwinding into the caller.
pub fn safe_call<T>(
    operation: &str,
    extension_name: &str,
    f: impl FnOnce() -> T + UnwindSafe,
) -> ExtResult<T> {
    catch_unwind(f).map_err(|payload| {
        let message = panic_message(&payload);
        ExtError::initialization_failed(format!(
            "{operation} on '{extension_name}' panicked: {message}"
        ))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
