//! Filesystem operations
//!
//! Text, JSON and YAML file helpers used by the scanner and the workers.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::FilesystemError;

/// Write content to a file, creating parent directories
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    let to_error = |e: std::io::Error| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(to_error)?;
    }
    std::fs::write(path, content).map_err(to_error)
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, FilesystemError> {
    let content = read_file(path)?;
    serde_json::from_str(&content).map_err(|e| FilesystemError::Parse {
        path: path.to_path_buf(),
        format: "JSON",
        error: e.to_string(),
    })
}

/// Serialize a value as pretty JSON with a trailing newline
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), FilesystemError> {
    let mut content = serde_json::to_string_pretty(value).map_err(|e| FilesystemError::Parse {
        path: path.to_path_buf(),
        format: "JSON",
        error: e.to_string(),
    })?;
    content.push('\n');
    write_file(path, &content)
}

/// Read and deserialize a YAML file
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, FilesystemError> {
    let content = read_file(path)?;
    serde_yaml::from_str(&content).map_err(|e| FilesystemError::Parse {
        path: path.to_path_buf(),
        format: "YAML",
        error: e.to_string(),
    })
}

/// Serialize a value as YAML
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<(), FilesystemError> {
    let content = serde_yaml::to_string(value).map_err(|e| FilesystemError::Parse {
        path: path.to_path_buf(),
        format: "YAML",
        error: e.to_string(),
    })?;
    write_file(path, &content)
}
