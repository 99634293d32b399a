//! The manifest-parser boundary (spec §6.2). The actual file format and
//! parser are an external collaborator; this crate only defines the trait
//! `ParsingStage` calls through, plus a minimal JSON-backed implementation
//! used by the host app and the test suite.

use std::path::Path;

use extrt_foundation::ExtResult;

use crate::manifest::Manifest;

/// Bytes read from disk for a candidate manifest file, plus the path they
/// came from (used in error messages).
#[derive(Debug, Clone)]
pub struct RawManifest {
    pub path: std::path::PathBuf,
    pub contents: Vec<u8>,
}

/// External collaborator boundary: delivers a parsed [`Manifest`] from raw
/// file contents. Concrete manifest file formats (TOML, JSON, a custom
/// DSL) live behind this trait; the core never assumes a specific syntax.
pub trait ManifestSource: Send + Sync {
    fn parse(&self, raw: &RawManifest) -> ExtResult<Manifest>;
}

/// A plain JSON-backed [`ManifestSource`], used by the host binary and by
/// tests that need a concrete parser without depending on a particular
/// manifest DSL.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManifestSource;

impl ManifestSource for JsonManifestSource {
    fn parse(&self, raw: &RawManifest) -> ExtResult<Manifest> {
        serde_json::from_slice(&raw.contents).map_err(|e| {
            extrt_foundation::ExtError::invalid_manifest(format!(
                "{}: {e}",
                raw.path.display()
            ))
        })
    }
}

/// Reads `path` into a [`RawManifest`], the minimal piece of "filesystem
/// enumeration" (spec §1, out of scope) this crate needs to expose for
/// `ManifestSource` implementations to consume.
pub fn read_raw(path: &Path) -> ExtResult<RawManifest> {
    let contents = std::fs::read(path)
        .map_err(|_| extrt_foundation::ExtError::file_not_found(path.display().to_string()))?;
    Ok(RawManifest {
        path: path.to_path_buf(),
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn json_source_parses_a_minimal_plugin_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.pplugin");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{
                "name": "alpha",
                "version": "0.1.0",
                "language": "python",
                "type": "Plugin",
                "entry": "alpha_entry"
            }}"#
        )
        .unwrap();

        let raw = read_raw(&path).unwrap();
        let manifest = JsonManifestSource.parse(&raw).unwrap();
        assert_eq!(manifest.name, "alpha");
        assert!(manifest.is_plugin());
    }

    #[test]
    fn missing_file_reports_file_not_found() {
        let err = read_raw(Path::new("/nonexistent/path.pplugin")).unwrap_err();
        assert_eq!(err.kind, extrt_foundation::ErrorKind::FileNotFound);
    }
}
