//! JSON export and import of result structures
//!
//! Every result type is written inside an [`ExportDocument`] envelope that
//! records when and by which engine version it was produced.

use chrono::{DateTime, Utc};
use pmi_common::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Envelope around an exported result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument<T> {
    pub exported_at: DateTime<Utc>,
    pub engine_version: String,
    pub result: T,
}

impl<T> ExportDocument<T> {
    pub fn new(result: T) -> Self {
        Self {
            exported_at: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            result,
        }
    }
}

/// `path` with a `.json` extension appended when it has none
pub fn json_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("json") => path.to_path_buf(),
        _ => {
            let mut name = path.as_os_str().to_owned();
            name.push(".json");
            PathBuf::from(name)
        }
    }
}

pub fn to_json_string<T: Serialize>(result: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::new(result))?)
}

pub fn from_json_str<T: DeserializeOwned>(json: &str) -> Result<ExportDocument<T>> {
    Ok(serde_json::from_str(json)?)
}

/// Write `result` to `path` and return the path actually written
pub fn export_json<T: Serialize>(result: &T, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = json_path(path.as_ref());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&path, to_json_string(result)?)?;
    info!("Exported results to {}", path.display());
    Ok(path)
}

pub fn import_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<ExportDocument<T>> {
    let contents = fs::read_to_string(path.as_ref())?;
    from_json_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_json_extension_appended() {
        assert_eq!(json_path(Path::new("out/case")), PathBuf::from("out/case.json"));
        assert_eq!(json_path(Path::new("case.JSON")), PathBuf::from("case.JSON"));
        assert_eq!(json_path(Path::new("case.v2")), PathBuf::from("case.v2.json"));
    }

    #[test]
    fn test_string_round_trip() {
        let json = to_json_string(&vec![1.5_f64, 2.25]).unwrap();
        let document: ExportDocument<Vec<f64>> = from_json_str(&json).unwrap();
        assert_eq!(document.result, vec![1.5, 2.25]);
        assert_eq!(document.engine_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let result = from_json_str::<Vec<f64>>("{not json");
        assert!(matches!(result, Err(pmi_common::Error::Serialization(_))));
    }
}
