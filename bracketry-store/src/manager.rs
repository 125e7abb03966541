use std::collections::HashMap;
use std::sync::Arc;

use bracketry_core::{Match, MatchId, Progress, Settings, Tournament, TournamentId};
use parking_lot::{Mutex, RwLock};

use crate::records;
use crate::{EntityType, Error, Filter, Result, Store};

/// Runs tournaments on top of a [`Store`].
///
/// Loaded tournaments are cached. Calls for the same tournament are serialized, calls for
/// different tournaments can run concurrently.
///
/// Every mutation is applied to the in-memory [`Tournament`] first and then persisted. If
/// persisting fails, the in-memory tournament is restored and the writes that already succeeded
/// are reverted.
#[derive(Debug)]
pub struct Manager<S> {
    store: S,
    tournaments: RwLock<HashMap<TournamentId, Entry>>,
}

/// A cached tournament. `None` once the tournament has been deleted.
type Entry = Arc<Mutex<Option<Tournament>>>;

/// A write that has been applied to the store and can be reverted.
#[derive(Debug)]
enum Applied {
    Inserted { entity: EntityType, id: u64 },
    Updated { index: usize, previous: Match },
    Deleted { index: usize, previous: Match },
}

impl<S> Manager<S>
where
    S: Store,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            tournaments: RwLock::new(HashMap::new()),
        }
    }

    #[inline]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates and persists a new tournament, returning its id.
    pub fn create_tournament<I, T>(&self, competitors: I, settings: &Settings) -> Result<TournamentId>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        let tournament = Tournament::new(competitors, settings)?;

        let id = self
            .store
            .insert(EntityType::Tournaments, records::settings(settings)?)?;
        let id = TournamentId(id);

        if let Err(err) = self.insert_records(id, &tournament) {
            log::warn!("Failed to create tournament {}: {}", id, err);

            self.delete_records(id);
            return Err(err);
        }

        log::info!(
            "Created {} tournament {} with {} teams",
            tournament.kind(),
            id,
            tournament.teams().len()
        );

        self.tournaments
            .write()
            .insert(id, Arc::new(Mutex::new(Some(tournament))));

        Ok(id)
    }

    /// Returns a snapshot of the tournament `id`.
    pub fn tournament(&self, id: TournamentId) -> Result<Tournament> {
        let entry = self.load(id)?;
        let tournament = entry.lock().clone();
        tournament.ok_or(Error::NotFound(id))
    }

    /// Returns the ids of all stored tournaments in ascending order.
    pub fn list(&self) -> Result<Vec<TournamentId>> {
        let mut ids = self
            .store
            .select(EntityType::Tournaments, None)?
            .iter()
            .map(records::tournament_id)
            .collect::<Result<Vec<_>>>()?;

        ids.sort();
        Ok(ids)
    }

    /// Reports the result of match `r#match` in the tournament `id`.
    pub fn report_result(
        &self,
        id: TournamentId,
        r#match: MatchId,
        score_a: i64,
        score_b: i64,
    ) -> Result<Progress> {
        self.transaction(id, |tournament| {
            tournament.report_result(r#match, score_a, score_b)
        })
    }

    /// Reverts the result of match `r#match` in the tournament `id`.
    pub fn reset_match(&self, id: TournamentId, r#match: MatchId) -> Result<()> {
        self.transaction(id, |tournament| tournament.reset_match(r#match))
    }

    /// Deletes the tournament `id` and all of its records.
    pub fn reset(&self, id: TournamentId) -> Result<()> {
        let mut tournaments = self.tournaments.write();
        if let Some(entry) = tournaments.remove(&id) {
            // Waits for running calls on the tournament to finish.
            *entry.lock() = None;
        }

        if !self
            .store
            .delete(EntityType::Tournaments, Some(&Filter::Id(id.0)))?
        {
            return Err(Error::NotFound(id));
        }

        let filter = records::of_tournament(id);
        for entity in [EntityType::Competitors, EntityType::Teams, EntityType::Matches] {
            self.store.delete(entity, Some(&filter))?;
        }

        log::info!("Deleted tournament {}", id);
        Ok(())
    }

    /// Deletes all tournaments.
    pub fn clear(&self) -> Result<()> {
        let mut tournaments = self.tournaments.write();
        for (_, entry) in tournaments.drain() {
            *entry.lock() = None;
        }

        self.store.clear()?;

        log::info!("Deleted all tournaments");
        Ok(())
    }

    /// Returns the cached tournament `id`, loading it from the store if necessary.
    fn load(&self, id: TournamentId) -> Result<Entry> {
        if let Some(tournament) = self.tournaments.read().get(&id) {
            return Ok(tournament.clone());
        }

        let record = self
            .store
            .select(EntityType::Tournaments, Some(&Filter::Id(id.0)))?
            .pop()
            .ok_or(Error::NotFound(id))?;

        let filter = records::of_tournament(id);
        let tournament = records::decode(
            &record,
            self.store.select(EntityType::Competitors, Some(&filter))?,
            self.store.select(EntityType::Teams, Some(&filter))?,
            self.store.select(EntityType::Matches, Some(&filter))?,
        )?;

        log::debug!("Loaded tournament {} from store", id);

        let mut tournaments = self.tournaments.write();
        let entry = tournaments
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(Some(tournament))));

        Ok(entry.clone())
    }

    /// Applies `f` to the tournament `id` and persists the changed matches.
    fn transaction<F, T>(&self, id: TournamentId, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tournament) -> bracketry_core::Result<T>,
    {
        let entry = self.load(id)?;
        self.apply(id, &entry, f)
    }

    fn apply<F, T>(&self, id: TournamentId, entry: &Entry, f: F) -> Result<T>
    where
        F: FnOnce(&mut Tournament) -> bracketry_core::Result<T>,
    {
        let mut guard = entry.lock();
        let tournament = guard.as_mut().ok_or(Error::NotFound(id))?;

        let snapshot = tournament.clone();
        let output = f(&mut *tournament)?;

        let mut applied = Vec::new();
        if let Err(err) = self.persist(id, &snapshot, &*tournament, &mut applied) {
            log::warn!("Failed to persist tournament {}: {}", id, err);

            *tournament = snapshot;
            self.revert(id, applied);
            return Err(err);
        }

        Ok(output)
    }

    /// Writes the differences between `before` and `after` to the store.
    fn persist(
        &self,
        id: TournamentId,
        before: &Tournament,
        after: &Tournament,
        applied: &mut Vec<Applied>,
    ) -> Result<()> {
        for (index, r#match) in after.matches().iter().enumerate() {
            match before.matches().get(index) {
                Some(previous) if previous == r#match => (),
                Some(previous) => {
                    let filter = records::at_index(id, index);
                    let patch = records::match_patch(r#match)?;

                    if !self.store.update(EntityType::Matches, &filter, &patch)? {
                        return Err(Error::InvalidRecord {
                            entity: EntityType::Matches,
                            reason: format!("missing match {} of tournament {}", index, id),
                        });
                    }

                    applied.push(Applied::Updated {
                        index,
                        previous: previous.clone(),
                    });
                }
                None => {
                    let record = records::r#match(id, index, r#match)?;
                    let record_id = self.store.insert(EntityType::Matches, record)?;

                    applied.push(Applied::Inserted {
                        entity: EntityType::Matches,
                        id: record_id,
                    });
                }
            }
        }

        for (index, previous) in before
            .matches()
            .iter()
            .enumerate()
            .skip(after.matches().len())
        {
            let filter = records::at_index(id, index);
            self.store.delete(EntityType::Matches, Some(&filter))?;

            applied.push(Applied::Deleted {
                index,
                previous: previous.clone(),
            });
        }

        Ok(())
    }

    /// Reverts `applied` writes in reverse order. Failures are logged and skipped.
    fn revert(&self, id: TournamentId, applied: Vec<Applied>) {
        for write in applied.into_iter().rev() {
            let res = match &write {
                Applied::Inserted { entity, id: record } => self
                    .store
                    .delete(*entity, Some(&Filter::Id(*record)))
                    .map(|_| ()),
                Applied::Updated { index, previous } => {
                    records::match_patch(previous).and_then(|patch| {
                        self.store
                            .update(EntityType::Matches, &records::at_index(id, *index), &patch)
                            .map(|_| ())
                    })
                }
                Applied::Deleted { index, previous } => records::r#match(id, *index, previous)
                    .and_then(|record| self.store.insert(EntityType::Matches, record))
                    .map(|_| ()),
            };

            if let Err(err) = res {
                log::error!("Failed to revert {:?} of tournament {}: {}", write, id, err);
            }
        }
    }

    fn insert_records(&self, id: TournamentId, tournament: &Tournament) -> Result<()> {
        for (index, competitor) in tournament.competitors().iter().enumerate() {
            self.store.insert(
                EntityType::Competitors,
                records::competitor(id, index, competitor),
            )?;
        }

        for (index, team) in tournament.teams().iter().enumerate() {
            self.store
                .insert(EntityType::Teams, records::team(id, index, team)?)?;
        }

        for (index, r#match) in tournament.matches().iter().enumerate() {
            self.store
                .insert(EntityType::Matches, records::r#match(id, index, r#match)?)?;
        }

        Ok(())
    }

    /// Deletes all records of the tournament `id`, logging failures.
    fn delete_records(&self, id: TournamentId) {
        let filter = records::of_tournament(id);

        for entity in [EntityType::Competitors, EntityType::Teams, EntityType::Matches] {
            if let Err(err) = self.store.delete(entity, Some(&filter)) {
                log::error!("Failed to delete {} of tournament {}: {}", entity, id, err);
            }
        }

        if let Err(err) = self
            .store
            .delete(EntityType::Tournaments, Some(&Filter::Id(id.0)))
        {
            log::error!("Failed to delete tournament {}: {}", id, err);
        }
    }
}
