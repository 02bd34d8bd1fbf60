//! File discovery and format-aware deserialization.
//!
//! Data files are looked up by base name inside a directory and parsed as
//! RON, TOML or JSON according to their extension.

use foundry_core::building::BuildingKind;
use foundry_core::engine::PlacementError;
use foundry_core::grid::GridPosition;
use foundry_core::world::LayoutError;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or building a scenario.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A value parsed but is not usable, such as a negative duration.
    #[error("invalid value in {file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error("invalid world layout: {0}")]
    Layout(#[from] LayoutError),

    /// A scripted placement was refused by the simulation.
    #[error("cannot place {kind} at {position}: {source}")]
    Placement {
        kind: BuildingKind,
        position: GridPosition,
        source: PlacementError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file from its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Look for `{base_name}.ron`, `.toml` or `.json` in `dir`.
///
/// Returns `Ok(None)` when none exists and `ConflictingFormats` when more
/// than one does.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    if let Some(path) = &found {
        debug!(target: "data.load", file = %path.display(), "found data file");
    }
    Ok(found)
}

/// Like [`find_data_file`], but a missing file is an error.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, detail: impl ToString) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: detail.to_string(),
    }
}

/// Read a file and deserialize it according to its extension.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list. TOML has no top-level arrays, so there the list is
/// read from the array under `toml_key`; RON and JSON hold the list
/// directly.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    /// A fresh, empty directory unique to this test and process.
    fn make_test_dir(suffix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "foundry_data_test_{suffix}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn cleanup(dir: &Path) {
        let _ = fs::remove_dir_all(dir);
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Cell {
        x: i32,
        y: i32,
    }

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detects_each_extension() {
        assert_eq!(detect_format(Path::new("config.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("config.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("config.json")).unwrap(), Format::Json);
    }

    #[test]
    fn rejects_unknown_or_missing_extension() {
        assert!(matches!(
            detect_format(Path::new("config.yaml")),
            Err(DataLoadError::UnsupportedFormat { .. })
        ));
        assert!(detect_format(Path::new("config")).is_err());
    }

    // -----------------------------------------------------------------------
    // Discovery
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_variants() {
        let dir = make_test_dir("find");
        assert!(find_data_file(&dir, "world").unwrap().is_none());

        fs::write(dir.join("world.toml"), "").unwrap();
        assert_eq!(
            find_data_file(&dir, "world").unwrap(),
            Some(dir.join("world.toml"))
        );

        fs::write(dir.join("world.json"), "{}").unwrap();
        assert!(matches!(
            find_data_file(&dir, "world"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        cleanup(&dir);
    }

    #[test]
    fn require_data_file_reports_missing() {
        let dir = make_test_dir("require");
        let err = require_data_file(&dir, "config").unwrap_err();
        assert!(matches!(err, DataLoadError::MissingRequired { ref file, .. } if file == "config"));
        assert!(err.to_string().contains("'config'"));
        cleanup(&dir);
    }

    // -----------------------------------------------------------------------
    // Deserialization
    // -----------------------------------------------------------------------

    #[test]
    fn deserialize_file_in_each_format() {
        let dir = make_test_dir("deser");
        fs::write(dir.join("a.ron"), "(x: 1, y: 2)").unwrap();
        fs::write(dir.join("b.json"), r#"{"x": 1, "y": 2}"#).unwrap();
        fs::write(dir.join("c.toml"), "x = 1\ny = 2\n").unwrap();
        for name in ["a.ron", "b.json", "c.toml"] {
            let cell: Cell = deserialize_file(&dir.join(name)).unwrap();
            assert_eq!(cell, Cell { x: 1, y: 2 }, "{name}");
        }
        cleanup(&dir);
    }

    #[test]
    fn deserialize_file_parse_error_names_file() {
        let dir = make_test_dir("parse_err");
        let path = dir.join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = deserialize_file::<Cell>(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Parse { ref file, .. } if file == &path));
        cleanup(&dir);
    }

    #[test]
    fn deserialize_list_reads_toml_key() {
        let dir = make_test_dir("list");
        fs::write(dir.join("cells.toml"), "[[cells]]\nx = 1\ny = 2\n\n[[cells]]\nx = 3\ny = 4\n")
            .unwrap();
        fs::write(dir.join("cells.ron"), "[(x: 1, y: 2)]").unwrap();

        let toml_cells: Vec<Cell> = deserialize_list(&dir.join("cells.toml"), "cells").unwrap();
        assert_eq!(toml_cells.len(), 2);
        let ron_cells: Vec<Cell> = deserialize_list(&dir.join("cells.ron"), "cells").unwrap();
        assert_eq!(ron_cells, vec![Cell { x: 1, y: 2 }]);

        let missing = deserialize_list::<Cell>(&dir.join("cells.toml"), "other");
        assert!(matches!(missing, Err(DataLoadError::Parse { .. })));
        cleanup(&dir);
    }

    #[test]
    fn io_error_converts() {
        let err =
            deserialize_file::<Cell>(Path::new("/nonexistent/foundry/config.ron")).unwrap_err();
        assert!(matches!(err, DataLoadError::Io(_)));
    }
}
