//! Language-module ABI boundary (spec §6.1), the panic-safe foreign-call
//! shim (spec §4.5), and the `GetLanguageModule` entry-point resolver.

pub mod language_module;
pub mod loader;
pub mod raw_abi;
pub mod safe_call;

pub use language_module::{InitData, LanguageModule, LoadData, NativeLanguageModule, Provider};
pub use loader::{ExtensionLoader, ENTRY_POINT_SYMBOL};
pub use raw_abi::{GetLanguageModuleFn, RawInitResult, RawLanguageModuleVTable, RawLoadResult, RawMethodBinding};
pub use safe_call::safe_call;
