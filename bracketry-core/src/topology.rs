//! The static shape of a bracket.
//!
//! A [`Layout`] describes every structural match of a bracket and where its two teams come from.
//! [`Layout::build`] turns it into the list of [`Match`]es, removing the structure that can never
//! be played because a team is missing:
//! - A structural match with a known team and no second feeder becomes a resolved bye. The team is
//! bound into the next match right away.
//! - A structural match with a single pending feeder is skipped: the feeder's edge is redirected to
//! where the skipped match would have sent its winner.
//! - A structural match without any feeder is dropped, and so is the slot it would have filled.
use crate::seeding::place_byes;
use crate::{Bracket, Edge, Match, MatchId, Side, Slot, TeamId};

/// Where a slot of a structural match gets its team from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Source {
    Team(TeamId),
    /// The winner of the structural match at the index.
    Winner(usize),
    /// The loser of the structural match at the index.
    Loser(usize),
    Nothing,
}

#[derive(Clone, Debug)]
struct Proto {
    bracket: Bracket,
    round: u32,
    position: usize,
    sources: [Source; 2],
}

/// What a structural match hands on to the next match.
#[derive(Copy, Clone, Debug)]
enum Value {
    /// A team that is already known. `origin` is the index of the bye that produced it.
    Team { team: TeamId, origin: Option<usize> },
    /// The winner (or loser) of a real match, known once it is played.
    Feed { index: usize, loser: bool },
    Nothing,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct Layout {
    protos: Vec<Proto>,
}

impl Layout {
    /// Pushes a new structural match, returning its index.
    pub fn push(
        &mut self,
        bracket: Bracket,
        round: u32,
        position: usize,
        sources: [Source; 2],
    ) -> usize {
        self.protos.push(Proto {
            bracket,
            round,
            position,
            sources,
        });

        self.protos.len() - 1
    }

    /// Pushes the first round for `teams` in standard seeding order.
    pub fn first_round(&mut self, bracket: Bracket, teams: &[TeamId]) -> Vec<usize> {
        place_byes(teams)
            .into_iter()
            .enumerate()
            .map(|(position, pair)| {
                let sources = pair.map(|team| match team {
                    Some(team) => Source::Team(team),
                    None => Source::Nothing,
                });

                self.push(bracket, 1, position, sources)
            })
            .collect()
    }

    /// Pushes knockout rounds following `first` until a single match remains. The winners of
    /// matches `2k` and `2k + 1` meet in match `k` of the next round.
    ///
    /// Returns the indices of all rounds, including `first`.
    pub fn knockout(&mut self, bracket: Bracket, first: Vec<usize>) -> Vec<Vec<usize>> {
        let mut rounds = vec![first];

        while let Some(prev) = rounds.last().filter(|round| round.len() > 1) {
            let round = rounds.len() as u32 + 1;

            let next = self.pairs(bracket, round, prev);
            rounds.push(next);
        }

        rounds
    }

    /// Pushes a round in which the winners of adjacent matches in `prev` meet. An odd trailing
    /// winner has no opponent and is forwarded. Rounds following [`first_round`] are never odd.
    ///
    /// [`first_round`]: Self::first_round
    pub fn pairs(&mut self, bracket: Bracket, round: u32, prev: &[usize]) -> Vec<usize> {
        prev.chunks(2)
            .enumerate()
            .map(|(position, pair)| {
                let second = pair.get(1).map_or(Source::Nothing, |&i| Source::Winner(i));
                self.push(bracket, round, position, [Source::Winner(pair[0]), second])
            })
            .collect()
    }

    /// Builds the matches of the layout. Match ids are assigned in layout order.
    pub fn build(self) -> Vec<Match> {
        let mut matches: Vec<Match> = Vec::with_capacity(self.protos.len());
        let mut winners: Vec<Value> = Vec::with_capacity(self.protos.len());
        let mut losers: Vec<Value> = Vec::with_capacity(self.protos.len());

        for proto in self.protos {
            let values = proto.sources.map(|source| match source {
                Source::Team(team) => Value::Team { team, origin: None },
                Source::Winner(index) => winners[index],
                Source::Loser(index) => losers[index],
                Source::Nothing => Value::Nothing,
            });

            let id = MatchId(matches.len() as u64);

            let (winner, loser) = match values {
                [Value::Nothing, Value::Nothing] => (Value::Nothing, Value::Nothing),
                [Value::Team { team, origin }, Value::Nothing] => {
                    connect(&mut matches, origin, Edge::new(id, Side::A));
                    matches.push(Match::bye(id, proto.bracket, proto.round, proto.position, team));

                    let origin = Some(id.index());
                    (Value::Team { team, origin }, Value::Nothing)
                }
                [Value::Nothing, Value::Team { team, origin }] => {
                    connect(&mut matches, origin, Edge::new(id, Side::B));
                    matches.push(Match::bye(id, proto.bracket, proto.round, proto.position, team));

                    let origin = Some(id.index());
                    (Value::Team { team, origin }, Value::Nothing)
                }
                [feed @ Value::Feed { .. }, Value::Nothing]
                | [Value::Nothing, feed @ Value::Feed { .. }] => (feed, Value::Nothing),
                values => {
                    let mut slots = [Slot::Tbd; 2];

                    for (side, value) in Side::BOTH.into_iter().zip(values) {
                        let edge = Edge::new(id, side);

                        match value {
                            Value::Team { team, origin } => {
                                slots[side.index()] = Slot::Team(team);
                                connect(&mut matches, origin, edge);
                            }
                            Value::Feed { index, loser } => {
                                let next = &mut matches[index].next;
                                if loser {
                                    next.loser = Some(edge);
                                } else {
                                    next.winner = Some(edge);
                                }
                            }
                            Value::Nothing => (),
                        }
                    }

                    matches.push(Match::new(
                        id,
                        proto.bracket,
                        proto.round,
                        proto.position,
                        slots,
                    ));

                    let index = id.index();
                    (
                        Value::Feed {
                            index,
                            loser: false,
                        },
                        Value::Feed { index, loser: true },
                    )
                }
            };

            winners.push(winner);
            losers.push(loser);
        }

        matches
    }
}

/// Records the winner edge of the bye at `origin`.
fn connect(matches: &mut [Match], origin: Option<usize>, edge: Edge) {
    if let Some(origin) = origin {
        matches[origin].next.winner = Some(edge);
    }
}
