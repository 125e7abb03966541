//! # bracketry-store
//!
//! Persistence for [`Tournament`]s. Every tournament is stored as plain JSON records in four
//! entity types: the tournament itself, its competitors, teams and matches. A [`Store`] only
//! knows about records, the [`Manager`] maps tournaments onto them.
//!
//! [`Tournament`]: bracketry_core::Tournament
pub mod file;
pub mod manager;
pub mod memory;

mod records;

pub use file::FileStore;
pub use manager::Manager;
pub use memory::MemoryStore;

use std::fmt::{self, Display, Formatter};
use std::io;
use std::result;

use bracketry_core::TournamentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single record. The store assigns every record an unique id under the [`ID`] field.
pub type Record = serde_json::Map<String, Value>;

/// The field holding the id of a [`Record`].
pub const ID: &str = "id";

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] bracketry_core::Error),
    #[error(transparent)]
    Options(#[from] bracketry_core::options::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("tournament {0} not found")]
    NotFound(TournamentId),
    #[error("invalid {entity} record: {reason}")]
    InvalidRecord { entity: EntityType, reason: String },
}

/// The kinds of records kept in a [`Store`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Tournaments,
    Competitors,
    Teams,
    Matches,
}

impl EntityType {
    pub const ALL: [Self; 4] = [
        Self::Tournaments,
        Self::Competitors,
        Self::Teams,
        Self::Matches,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tournaments => "tournaments",
            Self::Competitors => "competitors",
            Self::Teams => "teams",
            Self::Matches => "matches",
        }
    }
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects records in a [`Store`].
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// The record with the given id.
    Id(u64),
    /// All records where every given field is equal. A `null` field also matches records that
    /// don't have the field at all.
    Fields(Record),
}

impl Filter {
    /// Creates a [`Filter::Fields`] from `(key, value)` pairs.
    pub fn fields<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: ToString,
        V: Into<Value>,
    {
        Self::Fields(
            fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.into()))
                .collect(),
        )
    }

    /// Returns `true` if `record` is selected by this `Filter`.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Id(id) => record.get(ID).and_then(Value::as_u64) == Some(*id),
            Self::Fields(fields) => fields.iter().all(|(key, value)| match record.get(key) {
                Some(found) => found == value,
                None => value.is_null(),
            }),
        }
    }
}

/// A storage backend for records.
///
/// All methods take `&self`, implementations are responsible for synchronizing access.
pub trait Store {
    /// Inserts a new record and returns its assigned id.
    fn insert(&self, entity: EntityType, record: Record) -> Result<u64>;

    /// Returns all records selected by `filter`, or all records if `filter` is `None`.
    fn select(&self, entity: EntityType, filter: Option<&Filter>) -> Result<Vec<Record>>;

    /// Merges `patch` into all records selected by `filter`. Returns `true` if any record was
    /// updated.
    fn update(&self, entity: EntityType, filter: &Filter, patch: &Record) -> Result<bool>;

    /// Deletes all records selected by `filter`, or all records if `filter` is `None`. Returns
    /// `true` if any record was deleted.
    fn delete(&self, entity: EntityType, filter: Option<&Filter>) -> Result<bool>;

    /// Deletes all records of all entity types.
    fn clear(&self) -> Result<()>;
}

impl<S> Store for &S
where
    S: Store + ?Sized,
{
    fn insert(&self, entity: EntityType, record: Record) -> Result<u64> {
        (**self).insert(entity, record)
    }

    fn select(&self, entity: EntityType, filter: Option<&Filter>) -> Result<Vec<Record>> {
        (**self).select(entity, filter)
    }

    fn update(&self, entity: EntityType, filter: &Filter, patch: &Record) -> Result<bool> {
        (**self).update(entity, filter, patch)
    }

    fn delete(&self, entity: EntityType, filter: Option<&Filter>) -> Result<bool> {
        (**self).delete(entity, filter)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}
