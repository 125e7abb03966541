use std::io::Write;

use bracketry_core::options::TournamentOptionValues;
use bracketry_core::{Grouping, MatchId, Settings, Tournament, TournamentId, TournamentKind};
use bracketry_store::{Manager, Store};
use clap::Subcommand;

use crate::render::{match_line, TextRenderer};
use crate::Error;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a new tournament.
    Create {
        /// The bracket type: 'knockout' or 'double-elimination'.
        #[arg(short, long, default_value_t = TournamentKind::Knockout)]
        bracket: TournamentKind,
        /// Group the competitors into teams of two.
        #[arg(long)]
        doubles: bool,
        /// Shuffle the competitors before seeding.
        #[arg(long)]
        randomize: bool,
        /// The competitors in seeding order.
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,
    },
    /// List all tournaments.
    List,
    /// Show the full bracket of a tournament.
    Show { id: TournamentId },
    /// List the matches that can be played next.
    Pending { id: TournamentId },
    /// Report the result of a match.
    Report {
        id: TournamentId,
        match_id: MatchId,
        #[arg(allow_negative_numbers = true)]
        score_a: i64,
        #[arg(allow_negative_numbers = true)]
        score_b: i64,
    },
    /// Revert the result of a match.
    Undo { id: TournamentId, match_id: MatchId },
    /// Delete a tournament.
    Reset { id: TournamentId },
    /// Delete all tournaments.
    Clear,
}

impl Command {
    pub fn run<S, W>(&self, manager: &Manager<S>, out: &mut W) -> Result<(), Error>
    where
        S: Store,
        W: Write,
    {
        match self {
            Self::Create {
                bracket,
                doubles,
                randomize,
                names,
            } => {
                let grouping = if *doubles {
                    Grouping::Doubles
                } else {
                    Grouping::Singles
                };

                let mut values = TournamentOptionValues::new();
                values.set(Settings::BRACKET_TYPE, bracket.as_str());
                values.set(Settings::GROUPING, grouping.as_str());
                values.set(Settings::RANDOMIZE, *randomize);
                let settings = Settings::from_values(values)?;

                let id = manager.create_tournament(names, &settings)?;
                let tournament = manager.tournament(id)?;

                writeln!(
                    out,
                    "Created {} tournament {} with {} teams",
                    tournament.kind(),
                    id,
                    tournament.teams().len()
                )?;
            }
            Self::List => {
                writeln!(out, "ID | Kind | Teams | Status")?;

                for id in manager.list()? {
                    let tournament = manager.tournament(id)?;

                    writeln!(
                        out,
                        "{} | {} | {} | {}",
                        id,
                        tournament.kind(),
                        tournament.teams().len(),
                        status(&tournament)
                    )?;
                }
            }
            Self::Show { id } => {
                let tournament = manager.tournament(*id)?;

                let mut renderer = TextRenderer::new();
                tournament.render(&mut renderer);
                write!(out, "{}", renderer.into_inner())?;
            }
            Self::Pending { id } => {
                let tournament = manager.tournament(*id)?;

                let pending = tournament.pending_matches();
                if pending.is_empty() {
                    writeln!(out, "No pending matches ({})", status(&tournament))?;
                }

                for r#match in pending {
                    writeln!(
                        out,
                        "{} round {}: {}",
                        r#match.bracket(),
                        r#match.round(),
                        match_line(&tournament, r#match)
                    )?;
                }
            }
            Self::Report {
                id,
                match_id,
                score_a,
                score_b,
            } => {
                let progress = manager.report_result(*id, *match_id, *score_a, *score_b)?;
                let tournament = manager.tournament(*id)?;
                let name = |team| tournament.team_name(team).unwrap_or_default();

                writeln!(
                    out,
                    "Match {}: {} beat {}",
                    progress.r#match,
                    name(progress.winner),
                    name(progress.loser)
                )?;

                if let Some(reset) = progress.reset {
                    writeln!(out, "Bracket reset: the second final is match {}", reset)?;
                }

                if let Some(champion) = progress.champion {
                    writeln!(out, "Champion: {}", name(champion))?;
                }
            }
            Self::Undo { id, match_id } => {
                manager.reset_match(*id, *match_id)?;
                writeln!(out, "Reverted match {}", match_id)?;
            }
            Self::Reset { id } => {
                manager.reset(*id)?;
                writeln!(out, "Deleted tournament {}", id)?;
            }
            Self::Clear => {
                manager.clear()?;
                writeln!(out, "Deleted all tournaments")?;
            }
        }

        Ok(())
    }
}

fn status(tournament: &Tournament) -> String {
    match tournament.champion() {
        Some(team) => format!(
            "won by {}",
            tournament.team_name(team.id).unwrap_or_default()
        ),
        None => match tournament.current_round() {
            Some(round) => format!("round {}", round),
            None => String::from("waiting"),
        },
    }
}
