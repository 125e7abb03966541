//! # Tournament Rendering
//!
//! The `render` module provides types to render a [`Tournament`] in any presentation.
//!
//! A [`Renderer`] receives a [`BracketRounds`] iterator, which walks the tournament from the
//! outside in:
//! - A [`BracketView`] holds all rounds of a single [`Bracket`].
//! - A [`RoundView`] holds all matches of a round, ordered by their position.
use std::collections::BTreeMap;
use std::slice;

use crate::tournament::Tournament;
use crate::{Bracket, Match};

/// A renderer used to render a [`Tournament`].
pub trait Renderer {
    fn render(&mut self, input: BracketRounds<'_>);
}

/// An iterator over all brackets of a [`Tournament`] that contain any matches.
#[derive(Clone, Debug)]
pub struct BracketRounds<'a> {
    tournament: &'a Tournament,
    brackets: slice::Iter<'static, Bracket>,
}

impl<'a> BracketRounds<'a> {
    pub(crate) fn new(tournament: &'a Tournament) -> Self {
        Self {
            tournament,
            brackets: tournament.kind().brackets().iter(),
        }
    }

    /// Returns the [`Tournament`] being rendered.
    #[inline]
    pub fn tournament(&self) -> &'a Tournament {
        self.tournament
    }
}

impl<'a> Iterator for BracketRounds<'a> {
    type Item = BracketView<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for bracket in self.brackets.by_ref() {
            let view = BracketView::new(self.tournament, *bracket);
            if !view.rounds.is_empty() {
                return Some(view);
            }
        }

        None
    }
}

#[derive(Clone, Debug)]
pub struct BracketView<'a> {
    bracket: Bracket,
    rounds: Vec<RoundView<'a>>,
}

impl<'a> BracketView<'a> {
    fn new(tournament: &'a Tournament, bracket: Bracket) -> Self {
        let mut rounds: BTreeMap<u32, Vec<&'a Match>> = BTreeMap::new();

        for r#match in tournament.matches().iter().filter(|m| m.bracket() == bracket) {
            rounds.entry(r#match.round()).or_default().push(r#match);
        }

        let rounds = rounds
            .into_iter()
            .map(|(round, mut matches)| {
                matches.sort_by_key(|m| m.position());
                RoundView { round, matches }
            })
            .collect();

        Self { bracket, rounds }
    }

    #[inline]
    pub fn bracket(&self) -> Bracket {
        self.bracket
    }

    /// Returns all rounds in ascending order.
    #[inline]
    pub fn rounds(&self) -> &[RoundView<'a>] {
        &self.rounds
    }
}

#[derive(Clone, Debug)]
pub struct RoundView<'a> {
    round: u32,
    matches: Vec<&'a Match>,
}

impl<'a> RoundView<'a> {
    /// The 1-based round number.
    #[inline]
    pub fn round(&self) -> u32 {
        self.round
    }

    #[inline]
    pub fn matches(&self) -> &[&'a Match] {
        &self.matches
    }
}
