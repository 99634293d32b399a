//! `Manifest` (spec §3), immutable after parsing.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use extrt_types::{RangeSet, Version};

use crate::method::Method;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionType {
    Module,
    Plugin,
}

impl ExtensionType {
    /// File extension used by discovery to tell modules and plugins apart
    /// (spec §6.2).
    pub fn file_extension(self) -> &'static str {
        match self {
            ExtensionType::Module => "pmodule",
            ExtensionType::Plugin => "pplugin",
        }
    }

    pub fn from_file_extension(ext: &str) -> Option<Self> {
        match ext {
            "pmodule" => Some(ExtensionType::Module),
            "pplugin" => Some(ExtensionType::Plugin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default = "RangeSet::any")]
    pub constraint: RangeSet,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conflict {
    pub name: String,
    #[serde(default = "RangeSet::any")]
    pub constraint: RangeSet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obsolete {
    pub name: String,
    #[serde(default = "RangeSet::any")]
    pub constraint: RangeSet,
}

/// An extension's declared identity and requirements (spec §3). Immutable
/// once parsed — the pipeline never mutates a `Manifest` in place, only the
/// `Extension` wrapping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub version: Version,
    /// Identifier of the language-module that hosts plugins of this kind
    /// (plugins), or the language this module implements (modules).
    pub language: String,
    #[serde(rename = "type")]
    pub extension_type: ExtensionType,

    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub license: String,

    /// Platform tags (e.g. `windows`, `linux`); empty means universal.
    #[serde(default)]
    pub platforms: Vec<String>,

    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default)]
    pub obsoletes: Vec<Obsolete>,

    /// Plugin-only: symbolic entry point in the hosting module.
    #[serde(default)]
    pub entry: String,
    /// Plugin-only: exported method descriptors.
    #[serde(default)]
    pub methods: Vec<Method>,

    /// Module-only: path to the shared library implementing the language
    /// module. Defaults to `<location>/bin/lib<name>.<platform-suffix>`
    /// when absent (spec §3), resolved by [`Manifest::runtime_path`].
    #[serde(default)]
    pub runtime: Option<PathBuf>,
    /// Module-only: additional loader search paths.
    #[serde(default)]
    pub directories: Vec<PathBuf>,
}

impl Manifest {
    pub fn is_plugin(&self) -> bool {
        self.extension_type == ExtensionType::Plugin
    }

    pub fn is_module(&self) -> bool {
        self.extension_type == ExtensionType::Module
    }

    /// Resolve the module runtime library path, applying the documented
    /// default when the manifest omits `runtime` (spec §3 Manifest,
    /// Module-only fields).
    pub fn runtime_path(&self, location: &std::path::Path) -> PathBuf {
        if let Some(explicit) = &self.runtime {
            return location.join(explicit);
        }
        let filename = platform_library_name(&self.name);
        location.join("bin").join(filename)
    }
}

#[cfg(not(target_os = "windows"))]
#[cfg(not(target_os = "macos"))]
fn platform_library_name(name: &str) -> String {
    format!("lib{name}.so")
}

#[cfg(target_os = "macos")]
fn platform_library_name(name: &str) -> String {
    format!("lib{name}.dylib")
}

#[cfg(target_os = "windows")]
fn platform_library_name(name: &str) -> String {
    format!("{name}.dll")
}
