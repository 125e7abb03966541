//! # Seeding
//!
//! Turns an ordered list of [`Competitor`]s into [`Team`]s and places the teams into the first
//! round of a bracket.
//!
//! The first round follows the standard seeding pattern: in a bracket with `n` slots, seed `s`
//! plays seed `n + 1 - s`, and the pairings are ordered so that the two best seeds can only meet
//! in the final. Slots without a team are byes, which always go to the best seeds.
use rand::seq::SliceRandom;
use rand::Rng;

use crate::options::Grouping;
use crate::{Competitor, Error, Result, Team, TeamId};

/// Groups `competitors` into teams according to `grouping`.
///
/// With `randomize` set, the competitors are shuffled uniformly before grouping. In doubles a
/// trailing competitor without a partner plays as a singleton team.
///
/// # Errors
///
/// Returns [`Error::InsufficientCompetitors`] if less than two teams can be formed.
pub fn seed<R>(
    competitors: &[Competitor],
    grouping: Grouping,
    randomize: bool,
    rng: &mut R,
) -> Result<Vec<Team>>
where
    R: Rng + ?Sized,
{
    if competitors.len() < 2 {
        return Err(Error::InsufficientCompetitors {
            found: competitors.len(),
        });
    }

    let mut order: Vec<_> = competitors.iter().map(|competitor| competitor.id).collect();
    if randomize {
        order.shuffle(rng);
    }

    let teams: Vec<Team> = order
        .chunks(grouping.team_size())
        .enumerate()
        .map(|(index, members)| Team {
            id: TeamId(index as u64),
            members: members.to_vec(),
        })
        .collect();

    if teams.len() < 2 {
        return Err(Error::InsufficientCompetitors { found: teams.len() });
    }

    log::debug!(
        "Seeded {} competitors into {} teams ({})",
        competitors.len(),
        teams.len(),
        grouping
    );

    Ok(teams)
}

/// Returns the 1-based seeds in bracket order for a bracket with `size` slots. `size` must be a
/// power of two.
///
/// # Examples
///
/// ```
/// # use bracketry_core::standard_order;
/// assert_eq!(standard_order(4), [1, 4, 2, 3]);
/// assert_eq!(standard_order(8), [1, 8, 4, 5, 2, 7, 3, 6]);
/// ```
pub fn standard_order(size: usize) -> Vec<usize> {
    debug_assert!(size == 0 || size.is_power_of_two());

    if size == 0 {
        return Vec::new();
    }

    let mut order = vec![1];
    while order.len() < size {
        let slots = order.len() * 2;

        order = order
            .iter()
            .flat_map(|&seed| [seed, slots + 1 - seed])
            .collect();
    }

    order
}

/// Returns the first round pairings for `teams`, ordered by seed. A `None` spot is a bye.
///
/// The bracket is padded to the next power of two, so `teams.len().next_power_of_two() / 2`
/// pairings are returned. Two byes never meet.
pub fn place_byes(teams: &[TeamId]) -> Vec<[Option<TeamId>; 2]> {
    if teams.len() < 2 {
        return Vec::new();
    }

    standard_order(teams.len().next_power_of_two())
        .chunks(2)
        .map(|pair| [teams.get(pair[0] - 1).copied(), teams.get(pair[1] - 1).copied()])
        .collect()
}
