//! JSON file persistence for the in-memory datastore.

use std::fs;
use std::io;
use std::path::Path;

use field_spec::MemoryDatastore;
use serde_json::Value;
use tracing::debug;

/// Reads a datastore file; a missing file yields an empty store.
pub fn load(path: &Path) -> Result<MemoryDatastore, Box<dyn std::error::Error>> {
    let value = match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Value::Null,
        Ok(contents) => serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "datastore file missing, starting empty");
            Value::Null
        }
        Err(err) => return Err(format!("failed to read {}: {}", path.display(), err).into()),
    };
    Ok(MemoryDatastore::from_value(value)?)
}

/// Writes every stored value back to `path` as pretty JSON.
pub fn write(path: &Path, datastore: &MemoryDatastore) -> Result<(), Box<dyn std::error::Error>> {
    let value = datastore.to_value()?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty_store() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = load(&dir.path().join("absent.json")).expect("load");
        assert!(store.is_empty());
    }

    #[test]
    fn written_store_can_be_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("store.json");
        let store =
            MemoryDatastore::from_value(serde_json::json!({ "_title": "Hi" })).expect("seed");
        write(&path, &store).expect("write");
        let reloaded = load(&path).expect("load");
        assert_eq!(reloaded.get("_title"), Some(serde_json::json!("Hi")));
    }
}
