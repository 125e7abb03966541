//! # Tournament Options
//!
//! A tournament is built according to its [`Settings`]: the bracket type, how competitors are
//! grouped into teams and whether the seeding order is randomized.
//!
//! Settings can also be provided as a key-value map via [`TournamentOptionValues`], which is
//! validated against the described defaults from [`Settings::options`]. [`OptionValue`] contains
//! all types supported.
#[cfg(feature = "serde")]
mod serde_impl;

use std::collections::hash_map::Keys;
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::TournamentKind;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("missing key {0}")]
    MissingKey(String),
    #[error("unknown key {0}")]
    UnknownKey(String),
    #[error("invalid value for {key}: expected {expected}, found {found}")]
    InvalidValue {
        key: String,
        found: String,
        expected: &'static str,
    },
}

/// How a tournament is built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Settings {
    pub bracket_type: TournamentKind,
    pub grouping: Grouping,
    pub randomize: bool,
}

impl Settings {
    pub const BRACKET_TYPE: &'static str = "bracket_type";
    pub const GROUPING: &'static str = "grouping";
    pub const RANDOMIZE: &'static str = "randomize";

    /// Returns the [`TournamentOptions`] accepted when building a tournament.
    pub fn options() -> TournamentOptions {
        TournamentOptions::builder()
            .option(
                Self::BRACKET_TYPE,
                "Bracket type ('knockout' or 'double-elimination')",
                TournamentKind::default().as_str(),
            )
            .option(
                Self::GROUPING,
                "Grouping ('singles' or 'doubles')",
                Grouping::default().as_str(),
            )
            .option(Self::RANDOMIZE, "Randomize the seeding order", false)
            .build()
    }

    /// Creates `Settings` from user provided `values`. Missing keys use their defaults.
    ///
    /// # Errors
    ///
    /// Returns an [`enum@Error`] if `values` contains an unknown key, a value of the wrong type or
    /// a string that is not recognized.
    pub fn from_values(values: TournamentOptionValues) -> Result<Self, Error> {
        let mut values = values.merge(Self::options())?;

        let bracket_type = Self::parse(&mut values, Self::BRACKET_TYPE)?;
        let grouping = Self::parse(&mut values, Self::GROUPING)?;
        let randomize = match values.take(Self::RANDOMIZE) {
            Some(value) => value.unwrap_bool_or(false),
            None => return Err(Error::MissingKey(Self::RANDOMIZE.to_owned())),
        };

        Ok(Self {
            bracket_type,
            grouping,
            randomize,
        })
    }

    /// Converts the `Settings` into their key-value form.
    pub fn to_values(&self) -> TournamentOptionValues {
        let mut values = TournamentOptionValues::default();
        values.set(Self::BRACKET_TYPE, self.bracket_type.as_str());
        values.set(Self::GROUPING, self.grouping.as_str());
        values.set(Self::RANDOMIZE, self.randomize);
        values
    }

    fn parse<T>(values: &mut TournamentOptionValues, key: &'static str) -> Result<T, Error>
    where
        T: FromStr<Err = Error>,
    {
        match values.take(key) {
            Some(OptionValue::String(value)) => value.parse(),
            Some(value) => Err(Error::InvalidValue {
                key: key.to_owned(),
                found: value.value_type().to_owned(),
                expected: "string",
            }),
            None => Err(Error::MissingKey(key.to_owned())),
        }
    }
}

/// How competitors are grouped into teams.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Grouping {
    /// One competitor per team.
    #[default]
    Singles,
    /// Two competitors per team.
    Doubles,
}

impl Grouping {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singles => "singles",
            Self::Doubles => "doubles",
        }
    }

    /// The number of competitors in a full team.
    pub fn team_size(&self) -> usize {
        match self {
            Self::Singles => 1,
            Self::Doubles => 2,
        }
    }
}

impl Display for Grouping {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Grouping {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singles" => Ok(Self::Singles),
            "doubles" => Ok(Self::Doubles),
            _ => Err(Error::InvalidValue {
                key: Settings::GROUPING.to_owned(),
                found: s.to_owned(),
                expected: "'singles' or 'doubles'",
            }),
        }
    }
}

/// A list of optional values for a tournament. `TournamentOptions` includes the names and should
/// be used to describe a list of options. [`TournamentOptionValues`] should be used when just
/// expecting a list of key-value pairs.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TournamentOptions(HashMap<String, TournamentOption>);

impl TournamentOptions {
    /// Creates a new [`Builder`].
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the option with the given `key`. Returns `None` if the given key does not exist
    pub fn get(&self, key: &str) -> Option<&TournamentOption> {
        self.0.get(key)
    }

    /// Inserts a new [`TournamentOption`] with the provided `key`, overwriting the previous value
    /// if it exists.
    pub fn insert<K>(&mut self, key: K, option: TournamentOption)
    where
        K: ToString,
    {
        self.0.insert(key.to_string(), option);
    }

    /// Returns an iterator over all keys.
    pub fn keys(&self) -> Keys<'_, String, TournamentOption> {
        self.0.keys()
    }
}

/// A list of optional key-values for a tournament which only contains the values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TournamentOptionValues(HashMap<String, OptionValue>);

impl TournamentOptionValues {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self, key: &str) -> Option<OptionValue> {
        self.0.remove(key)
    }

    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: ToString,
        V: Into<OptionValue>,
    {
        self.0.insert(key.to_string(), value.into());
    }

    /// Checks all values against `options` and fills the missing keys with their defaults.
    pub fn merge(mut self, mut options: TournamentOptions) -> Result<Self, Error> {
        for (key, value) in self.0.iter() {
            let default_value = match options.0.remove(key) {
                Some(value) => value,
                None => return Err(Error::UnknownKey(key.to_owned())),
            };

            if default_value.value.value_type() != value.value_type() {
                return Err(Error::InvalidValue {
                    key: key.to_owned(),
                    found: value.value_type().to_owned(),
                    expected: default_value.value.value_type(),
                });
            }
        }

        // Fill the unassigned fields with defaults.
        for (key, value) in options.0.into_iter() {
            self.0.insert(key, value.value);
        }

        Ok(self)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TournamentOption {
    pub name: String,
    pub value: OptionValue,
}

/// The value of a [`TournamentOption`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    String(String),
}

impl OptionValue {
    /// Returns the name of the type of this value.
    pub fn value_type(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::String(_) => "string",
        }
    }

    /// Returns the contained [`Bool`] value or the provided default.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bracketry_core::options::OptionValue;
    /// let val = OptionValue::Bool(true);
    /// assert!(val.unwrap_bool_or(false));
    /// ```
    ///
    /// ```
    /// # use bracketry_core::options::OptionValue;
    /// let val = OptionValue::from("yes");
    /// assert!(val.unwrap_bool_or(true));
    /// ```
    ///
    /// [`Bool`]: Self::Bool
    #[inline]
    pub fn unwrap_bool_or(self, default: bool) -> bool {
        match self {
            Self::Bool(val) => val,
            _ => default,
        }
    }
}

impl From<bool> for OptionValue {
    #[inline]
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<'a> From<&'a str> for OptionValue {
    #[inline]
    fn from(value: &'a str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for OptionValue {
    #[inline]
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// A builder for [`TournamentOptions`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    options: TournamentOptions,
}

impl Builder {
    /// Inserts a new [`TournamentOption`]. If the `key` already exists, it is overwritten.
    pub fn option<T, V>(mut self, key: &'static str, name: T, value: V) -> Self
    where
        T: ToString,
        V: Into<OptionValue>,
    {
        self.options.insert(
            key,
            TournamentOption {
                name: name.to_string(),
                value: value.into(),
            },
        );
        self
    }

    /// Consumes the `Builder`, returning the collected [`TournamentOptions`].
    #[inline]
    pub fn build(self) -> TournamentOptions {
        self.options
    }
}
