//! Reporting results and moving teams through the bracket graph.
use crate::tournament::{Tournament, TournamentKind};
use crate::{Bracket, Edge, Error, Match, MatchId, MatchState, Outcome, Result, Side, Slot, TeamId};

/// What changed after a result was reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// The match that was reported.
    pub r#match: MatchId,
    pub winner: TeamId,
    pub loser: TeamId,
    /// The second final, if this result forced a bracket reset.
    pub reset: Option<MatchId>,
    /// The winner of the tournament, if this result decided it.
    pub champion: Option<TeamId>,
}

impl Tournament {
    /// Reports the result of the match `id`.
    ///
    /// The team with the higher score wins and moves along the winner edge of the match, the
    /// other team moves along the loser edge (if any). Nothing is changed if an error is
    /// returned.
    ///
    /// # Errors
    ///
    /// - [`Error::MatchNotFound`] if no match with `id` exists.
    /// - [`Error::InvalidOperation`] if the match is a bye or has already been reported.
    /// - [`Error::MatchNotReady`] if the match is still waiting for a team.
    /// - [`Error::InvalidScore`] if a score is negative or both scores are equal.
    /// - [`Error::BracketCorruption`] if a following slot is bound to an unexpected team.
    pub fn report_result(&mut self, id: MatchId, score_a: i64, score_b: i64) -> Result<Progress> {
        let r#match = self.get(id).ok_or(Error::MatchNotFound(id))?;

        if r#match.bye {
            return Err(Error::InvalidOperation {
                id,
                reason: "byes advance automatically",
            });
        }

        match r#match.state {
            MatchState::Resolved => {
                return Err(Error::InvalidOperation {
                    id,
                    reason: "result has already been reported",
                })
            }
            MatchState::Pending => return Err(Error::MatchNotReady(id)),
            MatchState::Ready => (),
        }

        if score_a < 0 || score_b < 0 || score_a == score_b {
            return Err(Error::InvalidScore { score_a, score_b });
        }

        let side = if score_a > score_b { Side::A } else { Side::B };

        let (winner, loser) = match (r#match.team(side), r#match.team(side.other())) {
            (Some(winner), Some(loser)) => (winner, loser),
            _ => return Err(Error::MatchNotReady(id)),
        };

        let next = r#match.next;
        let terminal = next.winner.is_none();
        let reset = self.kind == TournamentKind::DoubleElimination
            && r#match.bracket == Bracket::Final
            && r#match.round == 1
            && side == Side::B;

        let moves: Vec<(Edge, TeamId)> = [(next.winner, winner), (next.loser, loser)]
            .into_iter()
            .filter_map(|(edge, team)| edge.map(|edge| (edge, team)))
            .collect();

        // Validate every destination before touching anything.
        for (edge, team) in moves.iter() {
            self.check_destination(*edge, *team)?;
        }

        let r#match = &mut self.matches[id.index()];
        r#match.outcome = Some(Outcome {
            winner: side,
            score_a,
            score_b,
        });
        r#match.state = MatchState::Resolved;

        log::debug!(
            "Match {} resolved {}:{}, winner: {}, loser: {}",
            id,
            score_a,
            score_b,
            winner,
            loser
        );

        for (edge, team) in moves {
            log::debug!("Moving team {} into match {} ({})", team, edge.r#match, edge.side);
            self.matches[edge.r#match.index()].bind(edge.side, team);
        }

        let mut progress = Progress {
            r#match: id,
            winner,
            loser,
            reset: None,
            champion: None,
        };

        if reset {
            let second = self.push_second_final(id);

            log::info!(
                "Team {} won the first final, bracket reset into match {}",
                winner,
                second
            );
            progress.reset = Some(second);
        } else if terminal {
            log::info!("Team {} won the tournament", winner);
            progress.champion = Some(winner);
        }

        Ok(progress)
    }

    /// Reverts the result of the match `id`, moving it back to [`MatchState::Ready`].
    ///
    /// The teams that moved on from this match are removed from their following matches. A second
    /// final created by this result is removed entirely.
    ///
    /// # Errors
    ///
    /// - [`Error::MatchNotFound`] if no match with `id` exists.
    /// - [`Error::InvalidOperation`] if the match is a bye, has no result or a following match
    /// has already been played.
    pub fn reset_match(&mut self, id: MatchId) -> Result<()> {
        let r#match = self.get(id).ok_or(Error::MatchNotFound(id))?;

        if r#match.bye {
            return Err(Error::InvalidOperation {
                id,
                reason: "byes cannot be reset",
            });
        }

        if r#match.state != MatchState::Resolved {
            return Err(Error::InvalidOperation {
                id,
                reason: "match has no result",
            });
        }

        let next = r#match.next;
        let edges: Vec<Edge> = [next.winner, next.loser].into_iter().flatten().collect();

        for edge in edges.iter() {
            if self.get(edge.r#match).map(Match::state) == Some(MatchState::Resolved) {
                return Err(Error::InvalidOperation {
                    id,
                    reason: "a following match has already been played",
                });
            }
        }

        let second_final = r#match.bracket == Bracket::Final && r#match.round == 1;

        if second_final && !edges.is_empty() {
            log::debug!("Removing second final after reset of match {}", id);

            self.matches.pop();
        } else {
            for edge in edges {
                log::debug!("Clearing slot {} of match {}", edge.side, edge.r#match);
                self.matches[edge.r#match.index()].unbind(edge.side);
            }
        }

        let r#match = &mut self.matches[id.index()];
        r#match.outcome = None;
        r#match.state = MatchState::Ready;
        if second_final {
            r#match.next = Default::default();
        }

        log::debug!("Reset match {}", id);

        Ok(())
    }

    fn check_destination(&self, edge: Edge, team: TeamId) -> Result<()> {
        let r#match = self
            .get(edge.r#match)
            .ok_or(Error::MatchNotFound(edge.r#match))?;

        match r#match[edge.side] {
            Slot::Team(found) if found != team => Err(Error::BracketCorruption {
                id: edge.r#match,
                side: edge.side,
                found,
                expected: team,
            }),
            _ => Ok(()),
        }
    }

    /// Creates the second final after the losers bracket champion won the first final `first`.
    /// Both finalists keep their sides.
    fn push_second_final(&mut self, first: MatchId) -> MatchId {
        let id = MatchId(self.matches.len() as u64);

        let slots = self.matches[first.index()].slots;
        let r#match = Match::new(id, Bracket::Final, 2, 0, slots);
        self.matches.push(r#match);

        let first = &mut self.matches[first.index()];
        first.next.winner = Some(Edge::new(id, Side::B));
        first.next.loser = Some(Edge::new(id, Side::A));

        id
    }
}

#[cfg(test)]
mod tests {
    use super::Progress;
    use crate::options::Settings;
    use crate::tournament::{Tournament, TournamentKind};
    use crate::{names, Bracket, Error, MatchId, MatchState, Side, Slot, TeamId};

    fn double_elimination(teams: usize) -> Tournament {
        let settings = Settings {
            bracket_type: TournamentKind::DoubleElimination,
            ..Default::default()
        };

        let names: Vec<String> = (0..teams).map(|i| format!("team{}", i)).collect();
        Tournament::new(names, &settings).unwrap()
    }

    #[test]
    fn test_report_result_progress() {
        let mut tournament = Tournament::new(names!["a", "b", "c", "d"], &Settings::default())
            .unwrap();

        let progress = tournament.report_result(MatchId(0), 3, 5).unwrap();
        assert_eq!(
            progress,
            Progress {
                r#match: MatchId(0),
                winner: TeamId(3),
                loser: TeamId(0),
                reset: None,
                champion: None,
            }
        );
        assert_eq!(
            tournament.get(MatchId(2)).unwrap().slots(),
            &[Slot::Team(TeamId(3)), Slot::Tbd]
        );

        tournament.report_result(MatchId(1), 2, 0).unwrap();
        let progress = tournament.report_result(MatchId(2), 1, 0).unwrap();
        assert_eq!(progress.champion, Some(TeamId(3)));
    }

    #[test]
    fn test_report_result_bracket_corruption() {
        let mut tournament = Tournament::new(names!["a", "b", "c", "d"], &Settings::default())
            .unwrap();
        tournament.matches[2].slots[0] = Slot::Team(TeamId(1));
        let before = tournament.clone();

        assert_eq!(
            tournament.report_result(MatchId(0), 2, 1),
            Err(Error::BracketCorruption {
                id: MatchId(2),
                side: Side::A,
                found: TeamId(1),
                expected: TeamId(0),
            })
        );
        assert_eq!(tournament, before);

        // A slot already holding the same team is accepted.
        tournament.matches[2].slots[0] = Slot::Team(TeamId(0));
        tournament.report_result(MatchId(0), 2, 1).unwrap();
        assert_eq!(tournament.get(MatchId(2)).unwrap().team(Side::A), Some(TeamId(0)));
    }

    #[test]
    fn test_report_result_errors_leave_state() {
        let mut tournament = Tournament::new(names!["a", "b", "c"], &Settings::default()).unwrap();
        let before = tournament.clone();

        assert_eq!(
            tournament.report_result(MatchId(9), 1, 0),
            Err(Error::MatchNotFound(MatchId(9)))
        );
        assert!(matches!(
            tournament.report_result(MatchId(0), 1, 0),
            Err(Error::InvalidOperation { id: MatchId(0), .. })
        ));
        assert_eq!(
            tournament.report_result(MatchId(2), 1, 0),
            Err(Error::MatchNotReady(MatchId(2)))
        );
        assert_eq!(
            tournament.report_result(MatchId(1), 2, 2),
            Err(Error::InvalidScore {
                score_a: 2,
                score_b: 2
            })
        );
        assert_eq!(
            tournament.report_result(MatchId(1), -1, 2),
            Err(Error::InvalidScore {
                score_a: -1,
                score_b: 2
            })
        );

        assert_eq!(tournament, before);
    }

    #[test]
    fn test_reset_match() {
        let mut tournament = Tournament::new(names!["a", "b", "c", "d"], &Settings::default())
            .unwrap();
        let initial = tournament.clone();

        tournament.report_result(MatchId(0), 2, 1).unwrap();
        tournament.reset_match(MatchId(0)).unwrap();
        assert_eq!(tournament, initial);

        tournament.report_result(MatchId(0), 2, 1).unwrap();
        tournament.report_result(MatchId(1), 2, 1).unwrap();
        tournament.report_result(MatchId(2), 2, 1).unwrap();

        // The final has already been played.
        assert!(matches!(
            tournament.reset_match(MatchId(0)),
            Err(Error::InvalidOperation { id: MatchId(0), .. })
        ));

        tournament.reset_match(MatchId(2)).unwrap();
        assert!(!tournament.is_complete());
        assert_eq!(tournament.get(MatchId(2)).unwrap().state(), MatchState::Ready);

        tournament.reset_match(MatchId(1)).unwrap();
        assert_eq!(tournament.get(MatchId(2)).unwrap().state(), MatchState::Pending);
        assert_eq!(
            tournament.get(MatchId(2)).unwrap().slots(),
            &[Slot::Team(TeamId(0)), Slot::Tbd]
        );

        assert!(matches!(
            tournament.reset_match(MatchId(1)),
            Err(Error::InvalidOperation { id: MatchId(1), .. })
        ));
        assert_eq!(
            tournament.reset_match(MatchId(7)),
            Err(Error::MatchNotFound(MatchId(7)))
        );
    }

    #[test]
    fn test_reset_match_bye() {
        let mut tournament = Tournament::new(names!["a", "b", "c"], &Settings::default()).unwrap();

        assert!(matches!(
            tournament.reset_match(MatchId(0)),
            Err(Error::InvalidOperation { id: MatchId(0), .. })
        ));
    }

    #[test]
    fn test_reset_match_second_final() {
        let mut tournament = double_elimination(2);
        // Winners final, losers bracket champion wins the first final.
        tournament.report_result(MatchId(0), 2, 0).unwrap();
        let before = tournament.clone();

        let progress = tournament.report_result(MatchId(1), 0, 2).unwrap();
        assert_eq!(progress.reset, Some(MatchId(2)));
        assert_eq!(tournament.matches().len(), 3);

        tournament.reset_match(MatchId(1)).unwrap();
        assert_eq!(tournament, before);

        tournament.report_result(MatchId(1), 0, 2).unwrap();
        tournament.report_result(MatchId(2), 1, 0).unwrap();
        assert!(tournament.is_complete());
        assert!(matches!(
            tournament.reset_match(MatchId(1)),
            Err(Error::InvalidOperation { id: MatchId(1), .. })
        ));
        assert_eq!(tournament.get(MatchId(2)).unwrap().bracket(), Bracket::Final);
    }
}
