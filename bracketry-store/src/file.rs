use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::memory::Tables;
use crate::{EntityType, Filter, Record, Result, Store};

/// A [`Store`] keeping all records in a single JSON document on disk.
///
/// The document is rewritten after every mutation. A mutation only becomes visible once it has
/// been written successfully.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    tables: Mutex<Tables>,
}

impl FileStore {
    /// Opens the store at `path`. A missing file is treated as an empty store and is created on
    /// the first mutation.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_path_buf();

        let tables = match fs::read(&path) {
            Ok(buf) => serde_json::from_slice(&buf)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("Store {} does not exist, starting empty", path.display());
                Tables::default()
            }
            Err(err) => return Err(err.into()),
        };

        log::debug!("Opened store {}", path.display());

        Ok(Self {
            path,
            tables: Mutex::new(tables),
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `f` to a copy of the tables and writes it to disk. The copy replaces the current
    /// tables only if writing succeeded.
    fn mutate<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tables) -> T,
    {
        let mut tables = self.tables.lock();

        let mut next = tables.clone();
        let output = f(&mut next);

        self.write(&next)?;
        *tables = next;

        Ok(output)
    }

    fn write(&self, tables: &Tables) -> Result<()> {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        let tmp = self.path.with_file_name(name);

        let buf = serde_json::to_vec_pretty(tables)?;
        fs::write(&tmp, buf)?;
        fs::rename(&tmp, &self.path)?;

        log::trace!("Wrote store {}", self.path.display());
        Ok(())
    }
}

impl Store for FileStore {
    fn insert(&self, entity: EntityType, record: Record) -> Result<u64> {
        self.mutate(|tables| tables.insert(entity, record))
    }

    fn select(&self, entity: EntityType, filter: Option<&Filter>) -> Result<Vec<Record>> {
        Ok(self.tables.lock().select(entity, filter))
    }

    fn update(&self, entity: EntityType, filter: &Filter, patch: &Record) -> Result<bool> {
        self.mutate(|tables| tables.update(entity, filter, patch))
    }

    fn delete(&self, entity: EntityType, filter: Option<&Filter>) -> Result<bool> {
        self.mutate(|tables| tables.delete(entity, filter))
    }

    fn clear(&self) -> Result<()> {
        self.mutate(Tables::clear)
    }
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::process;

    use serde_json::json;

    use super::FileStore;
    use crate::{EntityType, Error, Filter, Record, Store};

    fn record(value: serde_json::Value) -> Record {
        match value {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("bracketry-store-{}", process::id()));
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join(name);
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_file_store_reopen() {
        let path = temp_path("reopen.json");

        let store = FileStore::open(&path).unwrap();
        assert!(store.select(EntityType::Tournaments, None).unwrap().is_empty());
        assert!(!path.exists());

        let id = store
            .insert(EntityType::Tournaments, record(json!({ "bracket_type": "knockout" })))
            .unwrap();
        store
            .update(
                EntityType::Tournaments,
                &Filter::Id(id),
                &record(json!({ "randomize": true })),
            )
            .unwrap();
        drop(store);

        let store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.select(EntityType::Tournaments, None).unwrap(),
            [record(json!({ "id": 1, "bracket_type": "knockout", "randomize": true }))]
        );

        // Ids continue after reopening.
        let id = store
            .insert(EntityType::Tournaments, record(json!({})))
            .unwrap();
        assert_eq!(id, 2);

        store.clear().unwrap();
        let store = FileStore::open(&path).unwrap();
        assert!(store.select(EntityType::Tournaments, None).unwrap().is_empty());

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_invalid() {
        let path = temp_path("invalid.json");
        fs::write(&path, b"not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(Error::Json(_))));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_file_store_write_failure() {
        let path = temp_path("missing-dir").join("store.json");

        let store = FileStore::open(&path).unwrap();
        assert!(matches!(
            store.insert(EntityType::Teams, record(json!({}))),
            Err(Error::Io(_))
        ));

        // The failed insert is not visible.
        assert!(store.select(EntityType::Teams, None).unwrap().is_empty());
    }
}
