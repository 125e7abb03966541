//! # bracketry-core
//!
//! This crate contains everything required to run single and double elimination brackets: seeding
//! competitors into teams, building the bracket graph and progressing it as results come in.
//!
//! Important types:
//! - [`Tournament`]: Owns all competitors, teams and matches of a tournament. Results are reported
//! through [`Tournament::report_result`].
//! - [`Match`]: A *match* of two teams. Every match carries an explicit [`MatchState`].
//! - [`Slot`]: A *spot* within a match, which either contains a team or waits for the winner or
//! loser of a previous match.
//! - [`NextMatches`]: The outgoing edges of a match in the bracket graph.
//! - [`Settings`]: How a tournament is built.
//!
//! ## Feature Flags
//!
//! `serde`: Adds `Serialize` and `Deserialize` impls to almost all types.
//!
pub mod options;
pub mod render;
pub mod seeding;
pub mod tournament;

mod double_elimination;
mod id;
mod progression;
mod single_elimination;
mod topology;
mod utils;

pub use id::{CompetitorId, MatchId, TeamId, TournamentId};
pub use options::{Grouping, Settings};
pub use progression::Progress;
pub use seeding::{place_byes, seed, standard_order};
pub use tournament::{Tournament, TournamentKind};

use thiserror::Error;

use std::fmt::{self, Display, Formatter};
use std::ops::{Index, IndexMut};
use std::result;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An `Result<T>` using [`enum@Error`] as an error type.
pub type Result<T> = result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("insufficient competitors: at least 2 teams are required, found {found}")]
    InsufficientCompetitors { found: usize },
    #[error("invalid score {score_a}:{score_b}: scores must not be negative or tied")]
    InvalidScore { score_a: i64, score_b: i64 },
    #[error("match {0} not found")]
    MatchNotFound(MatchId),
    #[error("match {0} is not ready: waiting for a previous match")]
    MatchNotReady(MatchId),
    #[error("invalid operation on match {id}: {reason}")]
    InvalidOperation { id: MatchId, reason: &'static str },
    #[error("bracket corruption: slot {side} of match {id} holds team {found}, expected {expected}")]
    BracketCorruption {
        id: MatchId,
        side: Side,
        found: TeamId,
        expected: TeamId,
    },
    #[error("invalid number of matches: expected {expected}, found {found}")]
    InvalidNumberOfMatches { expected: usize, found: usize },
    #[error("invalid match: match at {index} has id {id}")]
    InvalidMatch { index: usize, id: MatchId },
    #[error("invalid edge: match {id} leads to match {target} but only {length} matches are given")]
    InvalidEdge {
        id: MatchId,
        target: MatchId,
        length: usize,
    },
    #[error("invalid team: match {id} refers to team {team} but only {length} teams are given")]
    InvalidTeam {
        id: MatchId,
        team: TeamId,
        length: usize,
    },
}

/// A single player.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
}

impl Competitor {
    #[inline]
    pub fn new<T>(id: CompetitorId, name: T) -> Self
    where
        T: ToString,
    {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// One or two [`Competitor`]s playing as a unit.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Team {
    pub id: TeamId,
    pub members: Vec<CompetitorId>,
}

/// The bracket a [`Match`] belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Bracket {
    /// The only bracket of a knockout tournament.
    Single,
    Winners,
    Losers,
    Final,
}

impl Bracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Winners => "winners",
            Self::Losers => "losers",
            Self::Final => "final",
        }
    }
}

impl Display for Bracket {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the two slots in a [`Match`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    A,
    B,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::A, Side::B];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }

    #[inline]
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// A spot for a [`Team`] in a [`Match`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Slot {
    Team(TeamId),
    /// Filled by the winner or loser of a previous match.
    Tbd,
}

impl Slot {
    /// Returns `true` if the `Slot` is bound to a team.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bracketry_core::{Slot, TeamId};
    /// assert!(Slot::Team(TeamId(0)).is_team());
    /// assert!(!Slot::Tbd.is_team());
    /// ```
    pub fn is_team(&self) -> bool {
        matches!(self, Self::Team(_))
    }

    /// Returns the bound team, if any.
    pub fn team(&self) -> Option<TeamId> {
        match self {
            Self::Team(team) => Some(*team),
            Self::Tbd => None,
        }
    }
}

/// The recorded result of a [`Match`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Outcome {
    pub winner: Side,
    pub score_a: i64,
    pub score_b: i64,
}

/// The lifecycle of a [`Match`]: `Pending -> Ready -> Resolved`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MatchState {
    /// At least one slot is waiting for a previous match.
    Pending,
    /// Both slots are bound, no outcome yet.
    Ready,
    /// The outcome is set. Only [`Tournament::reset_match`] leaves this state.
    Resolved,
}

/// A slot of another match that a team moves into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Edge {
    pub r#match: MatchId,
    pub side: Side,
}

impl Edge {
    #[inline]
    pub fn new(r#match: MatchId, side: Side) -> Self {
        Self { r#match, side }
    }
}

/// Information about the next matches.
///
/// `winner` is `None` for the terminal matches of a tournament, `loser` is only set for matches in
/// the winners bracket of a double elimination tournament.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NextMatches {
    pub winner: Option<Edge>,
    pub loser: Option<Edge>,
}

/// A match between two teams.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Match {
    pub(crate) id: MatchId,
    pub(crate) bracket: Bracket,
    pub(crate) round: u32,
    pub(crate) position: usize,
    pub(crate) slots: [Slot; 2],
    pub(crate) outcome: Option<Outcome>,
    pub(crate) state: MatchState,
    pub(crate) bye: bool,
    pub(crate) next: NextMatches,
}

impl Match {
    pub(crate) fn new(
        id: MatchId,
        bracket: Bracket,
        round: u32,
        position: usize,
        slots: [Slot; 2],
    ) -> Self {
        let state = if slots.iter().all(Slot::is_team) {
            MatchState::Ready
        } else {
            MatchState::Pending
        };

        Self {
            id,
            bracket,
            round,
            position,
            slots,
            outcome: None,
            state,
            bye: false,
            next: NextMatches::default(),
        }
    }

    /// Creates a bye for `team`. A bye is resolved from the start.
    pub(crate) fn bye(
        id: MatchId,
        bracket: Bracket,
        round: u32,
        position: usize,
        team: TeamId,
    ) -> Self {
        Self {
            id,
            bracket,
            round,
            position,
            slots: [Slot::Team(team), Slot::Team(team)],
            outcome: Some(Outcome {
                winner: Side::A,
                score_a: 0,
                score_b: 0,
            }),
            state: MatchState::Resolved,
            bye: true,
            next: NextMatches::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> MatchId {
        self.id
    }

    #[inline]
    pub fn bracket(&self) -> Bracket {
        self.bracket
    }

    /// The 1-based round within [`bracket`](Self::bracket).
    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The 0-based position of the match within its round.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn slots(&self) -> &[Slot; 2] {
        &self.slots
    }

    #[inline]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    #[inline]
    pub fn state(&self) -> MatchState {
        self.state
    }

    #[inline]
    pub fn is_bye(&self) -> bool {
        self.bye
    }

    #[inline]
    pub fn next(&self) -> &NextMatches {
        &self.next
    }

    /// Returns the team in slot `side`, if bound.
    #[inline]
    pub fn team(&self, side: Side) -> Option<TeamId> {
        self[side].team()
    }

    /// Returns the winning team of a resolved match.
    pub fn winner(&self) -> Option<TeamId> {
        self.outcome.and_then(|outcome| self.team(outcome.winner))
    }

    /// Returns the losing team of a resolved match. Byes have no loser.
    pub fn loser(&self) -> Option<TeamId> {
        if self.bye {
            return None;
        }

        self.outcome
            .and_then(|outcome| self.team(outcome.winner.other()))
    }

    /// Returns `true` if `team` plays in this match.
    pub fn contains(&self, team: TeamId) -> bool {
        self.slots.iter().any(|slot| *slot == Slot::Team(team))
    }

    /// Binds `team` to `side` and moves the match to [`MatchState::Ready`] once both slots are
    /// bound.
    pub(crate) fn bind(&mut self, side: Side, team: TeamId) {
        self[side] = Slot::Team(team);

        if self.state == MatchState::Pending && self.slots.iter().all(Slot::is_team) {
            self.state = MatchState::Ready;
        }
    }

    /// Reverts [`bind`](Self::bind).
    pub(crate) fn unbind(&mut self, side: Side) {
        self[side] = Slot::Tbd;
        self.state = MatchState::Pending;
    }
}

impl Index<Side> for Match {
    type Output = Slot;

    #[inline]
    fn index(&self, side: Side) -> &Self::Output {
        &self.slots[side.index()]
    }
}

impl IndexMut<Side> for Match {
    #[inline]
    fn index_mut(&mut self, side: Side) -> &mut Self::Output {
        &mut self.slots[side.index()]
    }
}
