//! Filesystem enumeration (spec §1, out of scope — an external
//! collaborator). The core only needs `Extension`s in `Discovered` state;
//! this module is the minimal directory walker the host binary uses to
//! produce them, grounded in the original's `FindFiles(searchPath,
//! {"*.pplugin", "*.pmodule"}, false)` (`manager.cpp`).

use std::path::Path;

use walkdir::WalkDir;

use extrt_core::Extension;
use extrt_foundation::{ExtError, ExtResult};
use extrt_manifest::ExtensionType;
use extrt_types::UniqueId;

/// Walk `root` (non-recursively into extension directories, but recursive
/// over the tree itself) and construct one `Discovered` [`Extension`] per
/// `.pmodule`/`.pplugin` file found.
pub fn discover(root: &Path) -> ExtResult<Vec<Extension>> {
    if !root.is_dir() {
        return Err(ExtError::file_not_found(root.display().to_string()));
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
    {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        let Some(extension_type) = ExtensionType::from_file_extension(ext) else {
            continue;
        };
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();

        found.push(Extension::new(
            UniqueId::new(name),
            extension_type,
            path.to_path_buf(),
        ));
    }

    found.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(found)
}
