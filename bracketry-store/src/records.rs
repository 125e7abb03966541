//! Conversion between tournaments and store records.
//!
//! - `tournaments`: the [`Settings`] of the tournament.
//! - `competitors`: `tournament`, `index` and `name`.
//! - `teams`: `tournament`, `index` and `members`.
//! - `matches`: `tournament`, `index` and the serialized match as `data`.
use bracketry_core::{
    Competitor, CompetitorId, Match, Settings, Team, TeamId, Tournament, TournamentId,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::{EntityType, Error, Filter, Record, Result, ID};

pub const TOURNAMENT: &str = "tournament";
pub const INDEX: &str = "index";
const NAME: &str = "name";
const MEMBERS: &str = "members";
const DATA: &str = "data";

/// Selects all records of the tournament `id`.
pub fn of_tournament(id: TournamentId) -> Filter {
    Filter::fields([(TOURNAMENT, id.0)])
}

/// Selects the record at `index` of the tournament `id`.
pub fn at_index(id: TournamentId, index: usize) -> Filter {
    Filter::fields([(TOURNAMENT, id.0), (INDEX, index as u64)])
}

pub fn settings(settings: &Settings) -> Result<Record> {
    object(EntityType::Tournaments, settings)
}

pub fn competitor(id: TournamentId, index: usize, competitor: &Competitor) -> Record {
    let mut record = header(id, index);
    record.insert(NAME.to_owned(), Value::from(competitor.name.clone()));
    record
}

pub fn team(id: TournamentId, index: usize, team: &Team) -> Result<Record> {
    let mut record = header(id, index);
    record.insert(MEMBERS.to_owned(), serde_json::to_value(&team.members)?);
    Ok(record)
}

pub fn r#match(id: TournamentId, index: usize, r#match: &Match) -> Result<Record> {
    let mut record = header(id, index);
    record.extend(match_patch(r#match)?);
    Ok(record)
}

/// Returns the fields of a match record that change as the match progresses.
pub fn match_patch(r#match: &Match) -> Result<Record> {
    let mut record = Record::new();
    record.insert(DATA.to_owned(), serde_json::to_value(r#match)?);
    Ok(record)
}

/// Returns the id of a tournament record.
pub fn tournament_id(record: &Record) -> Result<TournamentId> {
    field(EntityType::Tournaments, record, ID).map(TournamentId)
}

/// Rebuilds a tournament from its records.
pub fn decode(
    tournament: &Record,
    competitors: Vec<Record>,
    teams: Vec<Record>,
    matches: Vec<Record>,
) -> Result<Tournament> {
    let settings: Settings = serde_json::from_value(Value::Object(tournament.clone()))?;

    let competitors = sorted(EntityType::Competitors, competitors)?
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let name: String = field(EntityType::Competitors, record, NAME)?;
            Ok(Competitor::new(CompetitorId(index as u64), name))
        })
        .collect::<Result<Vec<_>>>()?;

    let teams = sorted(EntityType::Teams, teams)?
        .iter()
        .enumerate()
        .map(|(index, record)| {
            Ok(Team {
                id: TeamId(index as u64),
                members: field(EntityType::Teams, record, MEMBERS)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let matches = sorted(EntityType::Matches, matches)?
        .iter()
        .map(|record| field(EntityType::Matches, record, DATA))
        .collect::<Result<Vec<Match>>>()?;

    Ok(Tournament::resume(
        settings.bracket_type,
        competitors,
        teams,
        matches,
    )?)
}

fn header(id: TournamentId, index: usize) -> Record {
    let mut record = Record::new();
    record.insert(TOURNAMENT.to_owned(), Value::from(id.0));
    record.insert(INDEX.to_owned(), Value::from(index as u64));
    record
}

fn object<T>(entity: EntityType, value: &T) -> Result<Record>
where
    T: Serialize,
{
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::InvalidRecord {
            entity,
            reason: String::from("expected an object"),
        }),
    }
}

fn field<T>(entity: EntityType, record: &Record, key: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    let value = record.get(key).ok_or_else(|| Error::InvalidRecord {
        entity,
        reason: format!("missing field {}", key),
    })?;

    serde_json::from_value(value.clone()).map_err(|err| Error::InvalidRecord {
        entity,
        reason: format!("invalid field {}: {}", key, err),
    })
}

/// Sorts `records` by their index and checks that the indices are contiguous.
fn sorted(entity: EntityType, records: Vec<Record>) -> Result<Vec<Record>> {
    let mut indexed = records
        .into_iter()
        .map(|record| Ok((field::<usize>(entity, &record, INDEX)?, record)))
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(index, _)| *index);

    indexed
        .into_iter()
        .enumerate()
        .map(|(expected, (index, record))| {
            if index == expected {
                Ok(record)
            } else {
                Err(Error::InvalidRecord {
                    entity,
                    reason: format!("expected index {}, found {}", expected, index),
                })
            }
        })
        .collect()
}
