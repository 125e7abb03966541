use std::collections::BTreeMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EntityType, Filter, Record, Result, Store, ID};

/// A [`Store`] keeping all records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn insert(&self, entity: EntityType, record: Record) -> Result<u64> {
        Ok(self.tables.lock().insert(entity, record))
    }

    fn select(&self, entity: EntityType, filter: Option<&Filter>) -> Result<Vec<Record>> {
        Ok(self.tables.lock().select(entity, filter))
    }

    fn update(&self, entity: EntityType, filter: &Filter, patch: &Record) -> Result<bool> {
        Ok(self.tables.lock().update(entity, filter, patch))
    }

    fn delete(&self, entity: EntityType, filter: Option<&Filter>) -> Result<bool> {
        Ok(self.tables.lock().delete(entity, filter))
    }

    fn clear(&self) -> Result<()> {
        self.tables.lock().clear();
        Ok(())
    }
}

/// The records of all entity types.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Tables(BTreeMap<EntityType, Table>);

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Table {
    next_id: u64,
    records: Vec<Record>,
}

impl Tables {
    pub fn insert(&mut self, entity: EntityType, mut record: Record) -> u64 {
        let table = self.0.entry(entity).or_default();

        table.next_id += 1;
        let id = table.next_id;

        record.insert(ID.to_owned(), Value::from(id));
        table.records.push(record);

        log::trace!("Inserted {} record {}", entity, id);
        id
    }

    pub fn select(&self, entity: EntityType, filter: Option<&Filter>) -> Vec<Record> {
        let table = match self.0.get(&entity) {
            Some(table) => table,
            None => return Vec::new(),
        };

        table
            .records
            .iter()
            .filter(|record| filter.map_or(true, |filter| filter.matches(record)))
            .cloned()
            .collect()
    }

    pub fn update(&mut self, entity: EntityType, filter: &Filter, patch: &Record) -> bool {
        let table = match self.0.get_mut(&entity) {
            Some(table) => table,
            None => return false,
        };

        let mut updated = false;
        for record in table.records.iter_mut().filter(|record| filter.matches(record)) {
            for (key, value) in patch {
                // The id is assigned by the store and never changes.
                if key != ID {
                    record.insert(key.clone(), value.clone());
                }
            }

            updated = true;
        }

        updated
    }

    pub fn delete(&mut self, entity: EntityType, filter: Option<&Filter>) -> bool {
        let table = match self.0.get_mut(&entity) {
            Some(table) => table,
            None => return false,
        };

        let len = table.records.len();
        match filter {
            Some(filter) => table.records.retain(|record| !filter.matches(record)),
            None => table.records.clear(),
        }

        table.records.len() != len
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}
