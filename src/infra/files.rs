//! Loading the local catalog and saved market snapshots from disk.

use std::{fs, io, path::Path};

use serde_json::Value;
use thiserror::Error;

use crate::domain::{InputError, MarketSnapshot, RawCatalog};
use crate::infra::market::parse_snapshot;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: {source}")]
    Shape {
        path: String,
        #[source]
        source: InputError,
    },
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let display = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: display,
        source,
    })
}

/// Reads a catalog file and checks it has an `Items` tree.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<RawCatalog, LoadError> {
    let path = path.as_ref();
    let catalog = RawCatalog::new(read_json(path)?);
    catalog.items_root().map_err(|source| LoadError::Shape {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!("[files] loaded catalog from {}", path.display());
    Ok(catalog)
}

/// Reads a saved snapshot in either wire or converted form.
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<MarketSnapshot, LoadError> {
    let path = path.as_ref();
    let snapshot = parse_snapshot(read_json(path)?).map_err(|source| LoadError::Shape {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!(
        "[files] loaded {} price records from {}",
        snapshot.len(),
        path.display()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("idle-profit-finder-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_catalog_with_items_root() {
        let path = scratch_file(
            "catalog_ok.json",
            r#"{ "Items": { "ores": [ { "id": 1, "value": 5 } ] } }"#,
        );
        let catalog = load_catalog(&path).unwrap();
        assert!(catalog.items_root().is_ok());
    }

    #[test]
    fn catalog_without_items_is_a_shape_error() {
        let path = scratch_file("catalog_bad.json", r#"{ "Shop": {} }"#);
        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Shape {
                source: InputError::MissingItemsRoot,
                ..
            }
        ));
    }

    #[test]
    fn invalid_json_and_missing_files_are_reported() {
        let path = scratch_file("broken.json", "{ not json");
        assert!(matches!(load_catalog(&path), Err(LoadError::Json { .. })));
        assert!(matches!(
            load_snapshot("/definitely/not/here.json"),
            Err(LoadError::Io { .. })
        ));
    }

    #[test]
    fn loads_wire_snapshot() {
        let path = scratch_file(
            "snapshot.json",
            r#"[ { "itemId": 3, "lowestSellPrice": 40, "lowestPriceVolume": 2 } ]"#,
        );
        let snapshot = load_snapshot(&path).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.items[0].sell_volume, 2);
    }

    #[test]
    fn object_snapshot_is_rejected() {
        let path = scratch_file("snapshot_obj.json", r#"{ "items": [] }"#);
        assert!(matches!(
            load_snapshot(&path),
            Err(LoadError::Shape {
                source: InputError::SnapshotNotSequence,
                ..
            })
        ));
    }
}
