use crate::topology::Layout;
use crate::{Bracket, TeamId};

/// Returns the layout of a single elimination bracket for `teams` in seeding order.
pub(crate) fn layout(teams: &[TeamId]) -> Layout {
    let mut layout = Layout::default();

    let first = layout.first_round(Bracket::Single, teams);
    let rounds = layout.knockout(Bracket::Single, first);

    log::debug!(
        "Built knockout layout with {} rounds for {} teams",
        rounds.len(),
        teams.len()
    );

    layout
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::options::Settings;
    use crate::tournament::Tournament;
    use crate::utils::NumExt;
    use crate::{names, Bracket, Error, MatchId, MatchState, Slot, TeamId};

    fn knockout(teams: usize) -> Tournament {
        let names: Vec<String> = (0..teams).map(|i| format!("team{}", i)).collect();
        Tournament::new(names, &Settings::default()).unwrap()
    }

    /// Plays all pending matches with random results until the tournament is complete.
    fn play(tournament: &mut Tournament, rng: &mut StdRng) {
        while let Some(id) = tournament.pending_matches().first().map(|m| m.id()) {
            let (score_a, score_b) = if rng.gen_bool(0.5) { (2, 1) } else { (0, 3) };
            tournament.report_result(id, score_a, score_b).unwrap();
        }
    }

    #[test]
    fn test_single_elimination_seeding() {
        // Scenario: teams listed as T1, T4, T2, T3.
        let mut tournament =
            Tournament::new(names!["T1", "T4", "T2", "T3"], &Settings::default()).unwrap();
        let name = |tournament: &Tournament, slot: &Slot| {
            slot.team()
                .and_then(|team| tournament.team_name(team))
                .unwrap()
        };

        let first: Vec<_> = tournament
            .matches()
            .iter()
            .filter(|m| m.round() == 1)
            .map(|m| (name(&tournament, &m.slots()[0]), name(&tournament, &m.slots()[1])))
            .collect();
        assert_eq!(
            first,
            [
                ("T1".to_owned(), "T3".to_owned()),
                ("T4".to_owned(), "T2".to_owned())
            ]
        );

        tournament.report_result(MatchId(0), 2, 0).unwrap();
        tournament.report_result(MatchId(1), 2, 0).unwrap();

        let last = tournament.get(MatchId(2)).unwrap();
        assert_eq!(last.round(), 2);
        assert_eq!(name(&tournament, &last.slots()[0]), "T1");
        assert_eq!(name(&tournament, &last.slots()[1]), "T4");

        let progress = tournament.report_result(MatchId(2), 1, 0).unwrap();
        assert_eq!(progress.champion, Some(TeamId(0)));
        assert!(tournament.is_complete());
        assert_eq!(tournament.champion().map(|team| team.id), Some(TeamId(0)));
        assert_eq!(tournament.team_name(TeamId(0)).as_deref(), Some("T1"));
        assert!(tournament.pending_matches().is_empty());
        assert_eq!(tournament.current_round(), None);
    }

    #[test]
    fn test_single_elimination_bye() {
        let mut tournament = knockout(3);
        let matches = tournament.matches();

        assert_eq!(matches.len(), 3);
        assert!(matches[0].is_bye());
        assert_eq!(matches[0].state(), MatchState::Resolved);
        assert_eq!(matches[0].winner(), Some(TeamId(0)));
        assert_eq!(
            matches[1].slots(),
            &[Slot::Team(TeamId(1)), Slot::Team(TeamId(2))]
        );
        // The bye-advanced team is already waiting in the final.
        assert_eq!(matches[2].slots(), &[Slot::Team(TeamId(0)), Slot::Tbd]);
        assert_eq!(matches[2].state(), MatchState::Pending);

        assert_eq!(
            tournament
                .pending_matches()
                .iter()
                .map(|m| m.id())
                .collect::<Vec<_>>(),
            [MatchId(1)]
        );

        tournament.report_result(MatchId(1), 0, 1).unwrap();
        assert_eq!(
            tournament.get(MatchId(2)).unwrap().slots(),
            &[Slot::Team(TeamId(0)), Slot::Team(TeamId(2))]
        );
        assert_eq!(tournament.current_round(), Some(2));

        tournament.report_result(MatchId(2), 0, 1).unwrap();
        assert_eq!(tournament.champion().map(|team| team.id), Some(TeamId(2)));
        // Byes don't count as wins.
        assert_eq!(tournament.wins(TeamId(0)), 0);
        assert_eq!(tournament.wins(TeamId(2)), 2);
    }

    #[test]
    fn test_single_elimination_rounds() {
        for teams in 2..=33 {
            let tournament = knockout(teams);

            assert_eq!(
                tournament.rounds(Bracket::Single),
                teams.ilog2_ceil() as u32,
                "wrong number of rounds for {} teams",
                teams
            );
            assert_eq!(
                tournament.matches().iter().filter(|m| !m.is_bye()).count(),
                teams - 1
            );

            for (index, r#match) in tournament.matches().iter().enumerate() {
                assert_eq!(r#match.id(), MatchId(index as u64));
                assert_eq!(r#match.next().loser, None);
            }
        }
    }

    #[test]
    fn test_single_elimination_play() {
        let mut rng = StdRng::seed_from_u64(1);

        for teams in 2..=24 {
            let mut tournament = knockout(teams);
            play(&mut tournament, &mut rng);

            assert!(tournament.is_complete());
            let champion = tournament.champion().unwrap().id;

            // Everybody except the champion lost exactly once.
            for team in tournament.teams() {
                let expected = if team.id == champion { 0 } else { 1 };
                assert_eq!(tournament.losses(team.id), expected);
            }

            assert!(tournament
                .matches()
                .iter()
                .all(|m| m.state() == MatchState::Resolved));
        }
    }

    #[test]
    fn test_single_elimination_byes_never_pending() {
        let mut rng = StdRng::seed_from_u64(2);

        for teams in [3, 5, 6, 7, 9, 12, 17] {
            let mut tournament = knockout(teams);

            let byes = tournament.matches().iter().filter(|m| m.is_bye()).count();
            assert_eq!(byes, teams.next_power_of_two() - teams);

            while !tournament.is_complete() {
                assert!(tournament.pending_matches().iter().all(|m| !m.is_bye()));

                let id = tournament.pending_matches()[0].id();
                let (score_a, score_b) = if rng.gen_bool(0.5) { (1, 0) } else { (0, 1) };
                tournament.report_result(id, score_a, score_b).unwrap();
            }
        }
    }

    #[test]
    fn test_single_elimination_report_twice() {
        let mut tournament = knockout(4);
        tournament.report_result(MatchId(0), 2, 1).unwrap();
        let before = tournament.clone();

        assert!(matches!(
            tournament.report_result(MatchId(0), 1, 2),
            Err(Error::InvalidOperation { id: MatchId(0), .. })
        ));
        assert_eq!(tournament, before);

        assert_eq!(
            tournament.report_result(MatchId(2), 1, 0),
            Err(Error::MatchNotReady(MatchId(2)))
        );
        assert_eq!(
            tournament.report_result(MatchId(3), 1, 0),
            Err(Error::MatchNotFound(MatchId(3)))
        );
        assert_eq!(
            tournament.report_result(MatchId(1), 0, 0),
            Err(Error::InvalidScore {
                score_a: 0,
                score_b: 0
            })
        );
        assert_eq!(tournament, before);
    }
}
