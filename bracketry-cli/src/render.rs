use std::fmt::Write;

use bracketry_core::render::{BracketRounds, Renderer};
use bracketry_core::{Bracket, Match, MatchState, Side, Tournament};

/// Renders a tournament as plain text, one line per match.
#[derive(Clone, Debug, Default)]
pub struct TextRenderer {
    output: String,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_inner(self) -> String {
        self.output
    }
}

impl Renderer for TextRenderer {
    fn render(&mut self, input: BracketRounds<'_>) {
        let tournament = input.tournament();

        for bracket in input {
            let _ = writeln!(self.output, "{}", heading(bracket.bracket()));

            for round in bracket.rounds() {
                let _ = writeln!(self.output, "  Round {}", round.round());

                for r#match in round.matches() {
                    let _ = writeln!(self.output, "    {}", match_line(tournament, r#match));
                }
            }
        }

        match tournament.champion() {
            Some(team) => {
                let name = tournament.team_name(team.id).unwrap_or_default();
                let _ = writeln!(self.output, "Champion: {}", name);
            }
            None => {
                if let Some(round) = tournament.current_round() {
                    let _ = writeln!(self.output, "Current round: {}", round);
                }
            }
        }
    }
}

fn heading(bracket: Bracket) -> &'static str {
    match bracket {
        Bracket::Single => "Bracket",
        Bracket::Winners => "Winners bracket",
        Bracket::Losers => "Losers bracket",
        Bracket::Final => "Final",
    }
}

/// Returns the display name of the team in slot `side`, or `TBD`.
pub fn slot_name(tournament: &Tournament, r#match: &Match, side: Side) -> String {
    r#match
        .team(side)
        .and_then(|team| tournament.team_name(team))
        .unwrap_or_else(|| String::from("TBD"))
}

/// Formats a single match: `#id  A  score_a:score_b  B  [state]`.
pub fn match_line(tournament: &Tournament, r#match: &Match) -> String {
    let a = slot_name(tournament, r#match, Side::A);

    if r#match.is_bye() {
        return format!("#{:<3} {} (bye)", r#match.id(), a);
    }

    let b = slot_name(tournament, r#match, Side::B);

    let score = match r#match.outcome() {
        Some(outcome) => format!("{}:{}", outcome.score_a, outcome.score_b),
        None => String::from("-:-"),
    };

    let state = match r#match.state() {
        MatchState::Pending => "pending",
        MatchState::Ready => "ready",
        MatchState::Resolved => "done",
    };

    format!("#{:<3} {} {} {} [{}]", r#match.id(), a, score, b, state)
}
