use std::fmt::{self, Display, Formatter};
use std::result;
use std::str::FromStr;

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::options::{self, Settings};
use crate::render::{BracketRounds, Renderer};
use crate::{double_elimination, seeding, single_elimination};
use crate::{
    Bracket, Competitor, CompetitorId, Error, Match, MatchId, MatchState, Result, Team, TeamId,
};

/// The topology of a [`Tournament`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TournamentKind {
    /// Single elimination.
    #[default]
    Knockout,
    DoubleElimination,
}

impl TournamentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knockout => "knockout",
            Self::DoubleElimination => "double-elimination",
        }
    }

    /// Returns the bracket in which the tournament is decided.
    pub fn terminal_bracket(&self) -> Bracket {
        match self {
            Self::Knockout => Bracket::Single,
            Self::DoubleElimination => Bracket::Final,
        }
    }

    /// Returns all brackets of this kind in display order.
    pub fn brackets(&self) -> &'static [Bracket] {
        match self {
            Self::Knockout => &[Bracket::Single],
            Self::DoubleElimination => &[Bracket::Winners, Bracket::Losers, Bracket::Final],
        }
    }
}

impl Display for TournamentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentKind {
    type Err = options::Error;

    fn from_str(s: &str) -> result::Result<Self, Self::Err> {
        match s {
            "knockout" => Ok(Self::Knockout),
            "double-elimination" => Ok(Self::DoubleElimination),
            _ => Err(options::Error::InvalidValue {
                key: Settings::BRACKET_TYPE.to_owned(),
                found: s.to_owned(),
                expected: "'knockout' or 'double-elimination'",
            }),
        }
    }
}

/// The complete state of a single tournament.
///
/// A `Tournament` exclusively owns all of its competitors, teams and matches. Results are
/// applied with [`report_result`], which keeps the bracket graph consistent.
///
/// [`report_result`]: Self::report_result
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Tournament {
    pub(crate) kind: TournamentKind,
    pub(crate) competitors: Vec<Competitor>,
    pub(crate) teams: Vec<Team>,
    pub(crate) matches: Vec<Match>,
}

impl Tournament {
    /// Creates a new `Tournament` for `competitors` using the given `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InsufficientCompetitors`] if less than two teams can be formed.
    pub fn new<I, T>(competitors: I, settings: &Settings) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        Self::new_with_rng(competitors, settings, &mut rand::thread_rng())
    }

    /// Creates a new `Tournament` like [`new`], drawing randomness from `rng`.
    ///
    /// [`new`]: Self::new
    pub fn new_with_rng<I, T, R>(competitors: I, settings: &Settings, rng: &mut R) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: ToString,
        R: Rng + ?Sized,
    {
        let competitors: Vec<Competitor> = competitors
            .into_iter()
            .enumerate()
            .map(|(index, name)| Competitor::new(CompetitorId(index as u64), name))
            .collect();

        log::debug!(
            "Creating new {} tournament with {} competitors",
            settings.bracket_type,
            competitors.len()
        );

        let teams = seeding::seed(&competitors, settings.grouping, settings.randomize, rng)?;
        let matches = Self::build(settings.bracket_type, &teams);

        log::debug!(
            "Created new {} tournament with {} teams and {} matches",
            settings.bracket_type,
            teams.len(),
            matches.len()
        );

        Ok(Self {
            kind: settings.bracket_type,
            competitors,
            teams,
            matches,
        })
    }

    /// Resumes a tournament from its persisted parts.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if less than two teams are given, `matches` has an invalid number
    /// of matches for `teams`, a match id does not match its position or a [`Match`] refers to a
    /// match or team that does not exist.
    pub fn resume(
        kind: TournamentKind,
        competitors: Vec<Competitor>,
        teams: Vec<Team>,
        matches: Vec<Match>,
    ) -> Result<Self> {
        log::debug!(
            "Trying to resume {} tournament with {} teams and {} matches",
            kind,
            teams.len(),
            matches.len()
        );

        if teams.len() < 2 {
            return Err(Error::InsufficientCompetitors { found: teams.len() });
        }

        let expected = Self::build(kind, &teams).len();
        let found = matches.len();

        // The second final of a double elimination bracket only exists after a bracket reset.
        let reset = kind == TournamentKind::DoubleElimination
            && found == expected + 1
            && matches
                .last()
                .map_or(false, |m| m.bracket == Bracket::Final && m.round == 2);

        if found != expected && !reset {
            return Err(Error::InvalidNumberOfMatches { expected, found });
        }

        for (index, r#match) in matches.iter().enumerate() {
            if r#match.id.index() != index {
                return Err(Error::InvalidMatch {
                    index,
                    id: r#match.id,
                });
            }

            for edge in [r#match.next.winner, r#match.next.loser].into_iter().flatten() {
                if edge.r#match.index() >= found {
                    return Err(Error::InvalidEdge {
                        id: r#match.id,
                        target: edge.r#match,
                        length: found,
                    });
                }
            }

            for slot in r#match.slots.iter() {
                if let Some(team) = slot.team() {
                    if team.index() >= teams.len() {
                        return Err(Error::InvalidTeam {
                            id: r#match.id,
                            team,
                            length: teams.len(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            kind,
            competitors,
            teams,
            matches,
        })
    }

    fn build(kind: TournamentKind, teams: &[Team]) -> Vec<Match> {
        let teams: Vec<TeamId> = teams.iter().map(|team| team.id).collect();

        let layout = match kind {
            TournamentKind::Knockout => single_elimination::layout(&teams),
            TournamentKind::DoubleElimination => double_elimination::layout(&teams),
        };

        layout.build()
    }

    #[inline]
    pub fn kind(&self) -> TournamentKind {
        self.kind
    }

    #[inline]
    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    /// Returns all teams in seeding order.
    #[inline]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    #[inline]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.get(id.index())
    }

    /// Returns the display name of a team: the names of its members joined by ` & `.
    pub fn team_name(&self, id: TeamId) -> Option<String> {
        let team = self.team(id)?;

        let names: Vec<&str> = team
            .members
            .iter()
            .filter_map(|member| self.competitors.get(member.index()))
            .map(|competitor| competitor.name.as_str())
            .collect();

        Some(names.join(" & "))
    }

    /// Returns all matches in creation order.
    #[inline]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    #[inline]
    pub fn get(&self, id: MatchId) -> Option<&Match> {
        self.matches.get(id.index())
    }

    /// Returns all matches that can be played next. Byes are never included.
    pub fn pending_matches(&self) -> Vec<&Match> {
        self.matches
            .iter()
            .filter(|m| m.state == MatchState::Ready && !m.bye)
            .collect()
    }

    /// Returns `true` if the tournament has been decided.
    pub fn is_complete(&self) -> bool {
        self.determining_match()
            .map_or(false, |m| m.state == MatchState::Resolved)
    }

    /// Returns the winner of the tournament, or `None` if it is not complete.
    pub fn champion(&self) -> Option<&Team> {
        let r#match = self.determining_match()?;
        if r#match.state != MatchState::Resolved {
            return None;
        }

        r#match.winner().and_then(|team| self.team(team))
    }

    /// Returns the lowest round among the matches that can be played next.
    pub fn current_round(&self) -> Option<u32> {
        self.pending_matches().iter().map(|m| m.round).min()
    }

    /// Returns the number of rounds in `bracket`.
    pub fn rounds(&self, bracket: Bracket) -> u32 {
        self.matches
            .iter()
            .filter(|m| m.bracket == bracket)
            .map(|m| m.round)
            .max()
            .unwrap_or(0)
    }

    /// Returns the number of matches `team` has lost.
    pub fn losses(&self, team: TeamId) -> usize {
        self.matches
            .iter()
            .filter(|m| m.loser() == Some(team))
            .count()
    }

    /// Returns the number of matches `team` has won, not counting byes.
    pub fn wins(&self, team: TeamId) -> usize {
        self.matches
            .iter()
            .filter(|m| !m.bye && m.winner() == Some(team))
            .count()
    }

    /// Renders the tournament using the given [`Renderer`].
    pub fn render<R>(&self, renderer: &mut R)
    where
        R: Renderer,
    {
        renderer.render(BracketRounds::new(self));
    }

    /// Returns the last created match of the terminal bracket. Its winner is the champion.
    fn determining_match(&self) -> Option<&Match> {
        let bracket = self.kind.terminal_bracket();

        self.matches.iter().rev().find(|m| m.bracket == bracket)
    }
}
