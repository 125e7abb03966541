//! Double elimination brackets.
//!
//! The winners bracket is a regular knockout. Teams losing in the winners bracket drop into the
//! losers bracket, which alternates between two kinds of rounds:
//! - drop-in rounds, where the survivors of the losers bracket play the teams that just lost in
//! the winners bracket.
//! - consolidation rounds, where the survivors of the losers bracket play each other.
//!
//! With a winners bracket of depth `k`, the losers bracket has `2(k - 1)` rounds. The champions
//! of both brackets meet in the final. If the losers bracket champion wins that match, a second
//! final is played.
use crate::topology::{Layout, Source};
use crate::utils::NumExt;
use crate::{Bracket, TeamId};

/// Returns the layout of a double elimination bracket for `teams` in seeding order.
///
/// The second final is not part of the layout. It is created once it is needed.
pub(crate) fn layout(teams: &[TeamId]) -> Layout {
    let mut layout = Layout::default();

    let first = layout.first_round(Bracket::Winners, teams);
    let winners = layout.knockout(Bracket::Winners, first);

    debug_assert_eq!(winners.len(), teams.len().ilog2_ceil());

    let winners_final = winners[winners.len() - 1][0];

    let finalist = match losers_bracket(&mut layout, &winners) {
        Some(index) => Source::Winner(index),
        // Without a losers bracket the loser of the only match goes straight to the final.
        None => Source::Loser(winners_final),
    };

    layout.push(
        Bracket::Final,
        1,
        0,
        [Source::Winner(winners_final), finalist],
    );

    log::debug!(
        "Built double elimination layout with {} winners rounds for {} teams",
        winners.len(),
        teams.len()
    );

    layout
}

/// Pushes the losers bracket fed by the `winners` rounds. Returns the index of the losers bracket
/// final, or `None` if the winners bracket only has a single round.
fn losers_bracket(layout: &mut Layout, winners: &[Vec<usize>]) -> Option<usize> {
    let depth = winners.len();
    if depth < 2 {
        return None;
    }

    let mut round = 1;

    // The losers of the first winners round play each other.
    let mut survivors: Vec<usize> = winners[0]
        .chunks(2)
        .enumerate()
        .map(|(position, pair)| {
            let second = pair.get(1).map_or(Source::Nothing, |&i| Source::Loser(i));
            layout.push(Bracket::Losers, round, position, [Source::Loser(pair[0]), second])
        })
        .collect();

    for (index, matches) in winners.iter().enumerate().skip(1) {
        let winners_round = index + 1;
        round += 1;

        // Alternate the order of the drop-ins to reduce early rematches.
        let mut drops = matches.clone();
        if winners_round % 2 == 0 {
            drops.reverse();
        }

        survivors = survivors
            .iter()
            .zip(drops)
            .enumerate()
            .map(|(position, (&survivor, drop))| {
                layout.push(
                    Bracket::Losers,
                    round,
                    position,
                    [Source::Winner(survivor), Source::Loser(drop)],
                )
            })
            .collect();

        if winners_round < depth {
            round += 1;
            survivors = layout.pairs(Bracket::Losers, round, &survivors);
        }
    }

    debug_assert_eq!(survivors.len(), 1);
    debug_assert_eq!(round as usize, 2 * (depth - 1));

    survivors.first().copied()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::options::Settings;
    use crate::tournament::{Tournament, TournamentKind};
    use crate::utils::NumExt;
    use crate::{Bracket, Edge, Error, MatchId, MatchState, Side, Slot, TeamId};

    fn double_elimination(teams: usize) -> Tournament {
        let settings = Settings {
            bracket_type: TournamentKind::DoubleElimination,
            ..Default::default()
        };

        let names: Vec<String> = (0..teams).map(|i| format!("team{}", i)).collect();
        Tournament::new(names, &settings).unwrap()
    }

    fn slots(tournament: &Tournament, id: u64) -> [Slot; 2] {
        *tournament.get(MatchId(id)).unwrap().slots()
    }

    fn team(id: u64) -> Slot {
        Slot::Team(TeamId(id))
    }

    #[test]
    fn test_double_elimination_structure() {
        let tournament = double_elimination(4);
        let matches = tournament.matches();

        assert_eq!(matches.len(), 6);
        assert_eq!(
            matches
                .iter()
                .map(|m| (m.bracket(), m.round()))
                .collect::<Vec<_>>(),
            [
                (Bracket::Winners, 1),
                (Bracket::Winners, 1),
                (Bracket::Winners, 2),
                (Bracket::Losers, 1),
                (Bracket::Losers, 2),
                (Bracket::Final, 1),
            ]
        );

        assert_eq!(matches[0].next().winner, Some(Edge::new(MatchId(2), Side::A)));
        assert_eq!(matches[0].next().loser, Some(Edge::new(MatchId(3), Side::A)));
        assert_eq!(matches[1].next().loser, Some(Edge::new(MatchId(3), Side::B)));
        assert_eq!(matches[2].next().winner, Some(Edge::new(MatchId(5), Side::A)));
        assert_eq!(matches[2].next().loser, Some(Edge::new(MatchId(4), Side::B)));
        assert_eq!(matches[3].next().winner, Some(Edge::new(MatchId(4), Side::A)));
        assert_eq!(matches[4].next().winner, Some(Edge::new(MatchId(5), Side::B)));
        assert_eq!(matches[5].next().winner, None);

        assert_eq!(tournament.rounds(Bracket::Losers), 2);
        assert_eq!(tournament.current_round(), Some(1));
    }

    #[test]
    fn test_double_elimination_drop_order() {
        let tournament = double_elimination(8);
        assert_eq!(tournament.matches().len(), 14);

        let loser = |id| tournament.get(MatchId(id)).unwrap().next().loser;

        // Losers of the second winners round drop in reversed.
        assert_eq!(loser(4), Some(Edge::new(MatchId(10), Side::B)));
        assert_eq!(loser(5), Some(Edge::new(MatchId(9), Side::B)));
        // The loser of the winners final drops in as is.
        assert_eq!(loser(6), Some(Edge::new(MatchId(12), Side::B)));
    }

    #[test]
    fn test_double_elimination_bracket_reset() {
        let mut tournament = double_elimination(4);

        // Winners round 1: T0 and T1 win, T3 and T2 drop into the losers bracket.
        tournament.report_result(MatchId(0), 2, 0).unwrap();
        tournament.report_result(MatchId(1), 2, 0).unwrap();
        assert_eq!(slots(&tournament, 3), [team(3), team(2)]);
        assert_eq!(tournament.get(MatchId(3)).unwrap().state(), MatchState::Ready);

        // Winners final: T0 beats T1.
        tournament.report_result(MatchId(2), 2, 1).unwrap();
        assert_eq!(slots(&tournament, 4), [Slot::Tbd, team(1)]);

        // Losers bracket: T2 beats T3, then T1 beats T2.
        tournament.report_result(MatchId(3), 0, 2).unwrap();
        tournament.report_result(MatchId(4), 0, 2).unwrap();
        assert_eq!(tournament.losses(TeamId(2)), 2);
        assert_eq!(slots(&tournament, 5), [team(0), team(1)]);

        // The losers bracket champion wins the first final.
        let progress = tournament.report_result(MatchId(5), 1, 3).unwrap();
        assert_eq!(progress.reset, Some(MatchId(6)));
        assert_eq!(progress.champion, None);
        assert!(!tournament.is_complete());

        let second = tournament.get(MatchId(6)).unwrap();
        assert_eq!(second.bracket(), Bracket::Final);
        assert_eq!(second.round(), 2);
        assert_eq!(second.slots(), &[team(0), team(1)]);
        assert_eq!(second.state(), MatchState::Ready);
        assert_eq!(tournament.rounds(Bracket::Final), 2);

        let progress = tournament.report_result(MatchId(6), 1, 2).unwrap();
        assert_eq!(progress.champion, Some(TeamId(1)));
        assert!(tournament.is_complete());
        assert_eq!(tournament.champion().map(|team| team.id), Some(TeamId(1)));
        assert_eq!(tournament.losses(TeamId(0)), 2);
        assert_eq!(tournament.losses(TeamId(1)), 1);
    }

    #[test]
    fn test_double_elimination_no_reset() {
        let mut tournament = double_elimination(4);

        for id in 0..5 {
            tournament.report_result(MatchId(id), 2, 1).unwrap();
        }

        let progress = tournament.report_result(MatchId(5), 2, 1).unwrap();
        assert_eq!(progress.reset, None);
        assert_eq!(progress.champion, Some(TeamId(0)));
        assert_eq!(tournament.matches().len(), 6);
        assert!(tournament.is_complete());
        assert!(tournament.pending_matches().is_empty());
    }

    #[test]
    fn test_double_elimination_second_loss_eliminates() {
        let mut tournament = double_elimination(8);
        let mut rng = StdRng::seed_from_u64(3);

        while let Some(id) = tournament.pending_matches().first().map(|m| m.id()) {
            let r#match = tournament.get(id).unwrap();

            // Nobody with two losses plays again.
            for side in Side::BOTH {
                let team = r#match.team(side).unwrap();
                assert!(tournament.losses(team) < 2, "team {} plays after 2 losses", team);
            }

            let (score_a, score_b) = if rng.gen_bool(0.5) { (2, 1) } else { (1, 2) };
            tournament.report_result(id, score_a, score_b).unwrap();
        }

        assert!(tournament.is_complete());
    }

    #[test]
    fn test_double_elimination_play() {
        let mut rng = StdRng::seed_from_u64(4);

        for teams in 2..=20 {
            let mut tournament = double_elimination(teams);
            assert_eq!(
                tournament.rounds(Bracket::Winners),
                teams.ilog2_ceil() as u32
            );

            while let Some(id) = tournament.pending_matches().first().map(|m| m.id()) {
                let (score_a, score_b) = if rng.gen_bool(0.5) { (3, 0) } else { (1, 2) };
                tournament.report_result(id, score_a, score_b).unwrap();
            }

            assert!(tournament.is_complete(), "{} teams did not finish", teams);
            assert!(tournament
                .matches()
                .iter()
                .all(|m| m.state() == MatchState::Resolved));

            // Everybody except the champion is out after exactly two losses.
            let champion = tournament.champion().unwrap().id;
            for team in tournament.teams() {
                let losses = tournament.losses(team.id);
                if team.id == champion {
                    assert!(losses <= 1);
                } else {
                    assert_eq!(losses, 2, "team {} of {}", team.id, teams);
                }
            }
        }
    }

    #[test]
    fn test_double_elimination_two_teams() {
        let mut tournament = double_elimination(2);
        assert_eq!(tournament.matches().len(), 2);
        assert_eq!(tournament.rounds(Bracket::Losers), 0);

        tournament.report_result(MatchId(0), 0, 1).unwrap();
        assert_eq!(slots(&tournament, 1), [team(1), team(0)]);

        let progress = tournament.report_result(MatchId(1), 0, 1).unwrap();
        assert_eq!(progress.reset, Some(MatchId(2)));

        tournament.report_result(MatchId(2), 0, 1).unwrap();
        assert_eq!(tournament.champion().map(|team| team.id), Some(TeamId(0)));
    }

    #[test]
    fn test_double_elimination_byes() {
        let tournament = double_elimination(3);
        let matches = tournament.matches();

        // Bye, one winners match, the winners final, a single losers match and the final.
        assert_eq!(matches.len(), 5);
        assert!(matches[0].is_bye());
        assert_eq!(matches[2].slots(), &[team(0), Slot::Tbd]);
        assert_eq!(matches[3].bracket(), Bracket::Losers);
        assert_eq!(matches[3].round(), 2);
        assert_eq!(matches[1].next().loser, Some(Edge::new(MatchId(3), Side::A)));
        assert_eq!(matches[2].next().loser, Some(Edge::new(MatchId(3), Side::B)));
        assert_eq!(matches[4].bracket(), Bracket::Final);

        let tournament = double_elimination(5);
        assert!(tournament
            .matches()
            .iter()
            .filter(|m| m.bracket() == Bracket::Losers)
            .all(|m| !m.is_bye()));
        assert_eq!(tournament.rounds(Bracket::Losers), 4);
    }

    #[test]
    fn test_double_elimination_pending_losers_match() {
        let mut tournament = double_elimination(4);
        tournament.report_result(MatchId(0), 2, 0).unwrap();

        assert_eq!(
            tournament.report_result(MatchId(3), 1, 0),
            Err(Error::MatchNotReady(MatchId(3)))
        );
        assert_eq!(slots(&tournament, 3), [team(3), Slot::Tbd]);
    }
}
