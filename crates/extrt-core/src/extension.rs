//! The `Extension` entity (spec §3) — the pipeline's payload.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use extrt_foundation::{ExtError, ExtResult};
use extrt_manifest::{ExtensionType, Manifest, Method};
use extrt_types::{Address, UniqueId};

use crate::method_table::MethodTable;
use crate::state::ExtensionState;

/// Owning handle to a loaded shared library (spec §3 "Assembly"). Defined
/// here, at the point an [`Extension`] needs to hold one, and implemented
/// by `extrt-platform`'s loader so this crate never depends on the loader.
pub trait Assembly: Send + Sync {
    fn path(&self) -> &Path;

    /// Resolve an exported symbol to its address (spec C2 "symbol lookup").
    fn get_symbol(&self, name: &str) -> ExtResult<Address>;
}

/// Mutable, pipeline-owned representation of a discovered extension.
pub struct Extension {
    id: UniqueId,
    extension_type: ExtensionType,
    location: PathBuf,
    manifest: Option<Manifest>,

    state: ExtensionState,
    method_table: MethodTable,
    user_data: Address,
    /// Non-owning handle into the hosting module's v-table (plugins), or
    /// into itself once loaded (modules). See spec §3 Ownership notes.
    language_module: Address,
    assembly: Option<std::sync::Arc<dyn Assembly>>,
    method_data: Vec<(Method, Address)>,

    errors: Vec<String>,
    warnings: Vec<String>,

    durations: FxHashMap<ExtensionState, Duration>,
    last_operation_start: Instant,
}

impl Extension {
    pub fn new(id: UniqueId, extension_type: ExtensionType, location: PathBuf) -> Self {
        Self {
            id,
            extension_type,
            location,
            manifest: None,
            state: ExtensionState::Discovered,
            method_table: MethodTable::NONE,
            user_data: Address::NULL,
            language_module: Address::NULL,
            assembly: None,
            method_data: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            durations: FxHashMap::default(),
            last_operation_start: Instant::now(),
        }
    }

    // --- Core getters ---

    pub fn id(&self) -> &UniqueId {
        &self.id
    }

    pub fn extension_type(&self) -> ExtensionType {
        self.extension_type
    }

    pub fn is_plugin(&self) -> bool {
        self.extension_type == ExtensionType::Plugin
    }

    pub fn is_module(&self) -> bool {
        self.extension_type == ExtensionType::Module
    }

    pub fn state(&self) -> ExtensionState {
        self.state
    }

    pub fn location(&self) -> &Path {
        &self.location
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn name(&self) -> &str {
        self.manifest
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or_else(|| self.id.display_name())
    }

    // --- State management (spec §4.1) ---

    fn validate_transition(&self, new_state: ExtensionState) -> ExtResult<()> {
        if ExtensionState::is_valid_transition(self.state, new_state) {
            Ok(())
        } else {
            Err(ExtError::validation_failed(format!(
                "illegal state transition for '{}': {:?} -> {:?}",
                self.name(),
                self.state,
                new_state
            )))
        }
    }

    /// Record the start timestamp and move into `new_state`.
    pub fn start_operation(&mut self, new_state: ExtensionState) -> ExtResult<()> {
        self.validate_transition(new_state)?;
        self.last_operation_start = Instant::now();
        debug!(extension = %self.name(), from = ?self.state, to = ?new_state, "start_operation");
        self.state = new_state;
        Ok(())
    }

    /// Accumulate the time spent in the current state into its duration
    /// bucket, then move into `new_state`.
    pub fn end_operation(&mut self, new_state: ExtensionState) -> ExtResult<()> {
        self.validate_transition(new_state)?;
        let elapsed = self.last_operation_start.elapsed();
        *self.durations.entry(self.state).or_default() += elapsed;
        debug!(extension = %self.name(), from = ?self.state, to = ?new_state, elapsed_ms = elapsed.as_millis() as u64, "end_operation");
        self.state = new_state;
        Ok(())
    }

    /// Move into `new_state` with no timing side effect.
    pub fn set_state(&mut self, new_state: ExtensionState) -> ExtResult<()> {
        self.validate_transition(new_state)?;
        self.state = new_state;
        Ok(())
    }

    // --- Timing (spec §3, §8 property 2) ---

    pub fn operation_time(&self, state: ExtensionState) -> Duration {
        self.durations.get(&state).copied().unwrap_or_default()
    }

    pub fn total_time(&self) -> Duration {
        self.durations.values().sum()
    }

    /// Human-readable timing/diagnostic summary (SPEC_FULL.md supplemented
    /// feature #1).
    pub fn performance_report(&self) -> String {
        let mut report = format!(
            "{} [{}] total={}ms",
            self.name(),
            self.state,
            self.total_time().as_millis()
        );
        let mut entries: Vec<_> = self.durations.iter().collect();
        entries.sort_by_key(|(state, _)| format!("{state:?}"));
        for (state, duration) in entries {
            report.push_str(&format!(" {state:?}={}ms", duration.as_millis()));
        }
        report
    }

    // --- Diagnostics ---

    pub fn add_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        warn!(extension = %self.name(), %error, "extension error recorded");
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        debug!(extension = %self.name(), %warning, "extension warning recorded");
        self.warnings.push(warning);
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    // --- Runtime updates ---

    pub fn set_manifest(&mut self, manifest: Manifest) {
        self.manifest = Some(manifest);
    }

    pub fn method_table(&self) -> MethodTable {
        self.method_table
    }

    pub fn set_method_table(&mut self, table: MethodTable) {
        self.method_table = table;
    }

    pub fn user_data(&self) -> Address {
        self.user_data
    }

    pub fn set_user_data(&mut self, data: Address) {
        self.user_data = data;
    }

    pub fn language_module(&self) -> Address {
        self.language_module
    }

    pub fn set_language_module(&mut self, handle: Address) {
        self.language_module = handle;
    }

    pub fn assembly(&self) -> Option<&std::sync::Arc<dyn Assembly>> {
        self.assembly.as_ref()
    }

    pub fn set_assembly(&mut self, assembly: std::sync::Arc<dyn Assembly>) {
        self.assembly = Some(assembly);
    }

    pub fn method_data(&self) -> &[(Method, Address)] {
        &self.method_data
    }

    pub fn set_method_data(&mut self, data: Vec<(Method, Address)>) {
        self.method_data = data;
    }
}

impl std::fmt::Display for Extension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?}, {})", self.name(), self.extension_type, self.state)
    }
}
