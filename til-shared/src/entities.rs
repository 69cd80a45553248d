// Copyright (C) 2025 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of til.
//
// til is free software: you can redistribute it and/or modify it under the terms of the GNU General
// Public License as published by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// til is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the
// implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General
// Public License for more details.
//
// You should have received a copy of the GNU General Public License along with til.  If not, see
// <http://www.gnu.org/licenses/>.

//! # Today I Learned entities
//!
//! A [Fact] is a short claim, a link to a source backing it up, a [Category] and three vote
//! counters. Facts come back from the store fully-formed, but on the way *in* they're assembled
//! from user input, so the pieces that the user supplies get refined types that are correct by
//! construction: [FactText], [Source] & [Category]. [NewFact] gathers them up.

use std::{fmt::Display, ops::Deref, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use snafu::{Backtrace, prelude::*};
use url::Url;

type StdResult<T, E> = std::result::Result<T, E>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("{text} is not a known category"))]
    Category { text: String, backtrace: Backtrace },
    #[snafu(display("A fact may not be empty"))]
    EmptyText { backtrace: Backtrace },
    #[snafu(display("No category was chosen"))]
    MissingCategory { backtrace: Backtrace },
    #[snafu(display("{text} uses the {scheme} scheme; sources must be http or https"))]
    Scheme {
        text: String,
        scheme: String,
        backtrace: Backtrace,
    },
    #[snafu(display("Facts may be at most 200 characters in length; this one is {length}"))]
    TextLength { length: usize, backtrace: Backtrace },
    #[snafu(display("{text} is not a vote column"))]
    UnknownVote { text: String, backtrace: Backtrace },
    #[snafu(display("Failed to parse {text} as an URL: {source}"))]
    Url {
        text: String,
        source: url::ParseError,
        backtrace: Backtrace,
    },
}

type Result<T> = std::result::Result<T, Error>;

fn mk_serde_de_err<'de, D: serde::Deserializer<'de>>(err: impl std::error::Error) -> D::Error {
    <D::Error as serde::de::Error>::custom(format!("{}", err))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             FactId                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The store assigns each [Fact] an integer identifier on insert; we never make one up ourselves
/// (save in tests).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct FactId(i64);

impl FactId {
    pub fn new(id: i64) -> FactId {
        FactId(id)
    }
}

impl Display for FactId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<FactId> for i64 {
    fn from(value: FactId) -> Self {
        value.0
    }
}

impl FromStr for FactId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        Ok(FactId(s.parse::<i64>()?))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Category                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The fixed set of topics under which a [Fact] may be filed
///
/// Each category carries a display color; rather than searching a list of (name, color) pairs on
/// every render, the mapping is just a `match`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technology,
    Science,
    Finance,
    Society,
    Entertainment,
    Health,
    History,
    News,
}

impl Category {
    /// All categories, in display order
    pub const ALL: [Category; 8] = [
        Category::Technology,
        Category::Science,
        Category::Finance,
        Category::Society,
        Category::Entertainment,
        Category::Health,
        Category::History,
        Category::News,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Technology => "technology",
            Category::Science => "science",
            Category::Finance => "finance",
            Category::Society => "society",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::History => "history",
            Category::News => "news",
        }
    }

    /// CSS color for this category's buttons & tags
    pub fn color(&self) -> &'static str {
        match self {
            Category::Technology => "#3b82f6",
            Category::Science => "#16a34a",
            Category::Finance => "#ef4444",
            Category::Society => "#eab308",
            Category::Entertainment => "#db2777",
            Category::Health => "#14b8a6",
            Category::History => "#f97316",
            Category::News => "#8b5cf6",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .context(CategorySnafu { text: s.to_owned() })
    }
}

/// The category selection driving the fact list: everything, or just one [Category]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn category(&self) -> Option<Category> {
        match self {
            CategoryFilter::All => None,
            CategoryFilter::Only(category) => Some(*category),
        }
    }
    pub fn matches(&self, category: Category) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(selected) => *selected == category,
        }
    }
}

impl Display for CategoryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryFilter::All => write!(f, "all"),
            CategoryFilter::Only(category) => write!(f, "{category}"),
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(value: Category) -> Self {
        CategoryFilter::Only(value)
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        if s == "all" {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Only(s.parse::<Category>()?))
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                              Vote                                              //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Shown ahead of the text of a disputed [Fact]
pub const DISPUTED_MARKER: &str = "[‼️DISPUTED]";

/// The three ways in which one can react to a [Fact]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Vote {
    Interesting,
    Mindblowing,
    False,
}

impl Vote {
    pub const ALL: [Vote; 3] = [Vote::Interesting, Vote::Mindblowing, Vote::False];

    /// The name of the store column holding this vote's count
    pub fn column(&self) -> &'static str {
        match self {
            Vote::Interesting => "votesInteresting",
            Vote::Mindblowing => "votesMindblowing",
            Vote::False => "votesFalse",
        }
    }
    pub fn emoji(&self) -> &'static str {
        match self {
            Vote::Interesting => "👍🏻",
            Vote::Mindblowing => "🤯",
            Vote::False => "⛔️",
        }
    }
}

impl Display for Vote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Parse a [Vote] from its column name
impl FromStr for Vote {
    type Err = Error;

    fn from_str(s: &str) -> StdResult<Self, Self::Err> {
        Vote::ALL
            .into_iter()
            .find(|vote| vote.column() == s)
            .context(UnknownVoteSnafu { text: s.to_owned() })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            FactText                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Facts are meant to be brief
pub const MAX_FACT_LENGTH: usize = 200;

/// Length of `text` in UTF-16 code units, which is how the browser measures the contents of a text
/// input (so an astral-plane emoji counts twice).
pub fn fact_length(text: &str) -> usize {
    text.encode_utf16().count()
}

/// How many characters remain before `text` hits [MAX_FACT_LENGTH]; negative once over.
pub fn remaining_length(text: &str) -> isize {
    MAX_FACT_LENGTH as isize - fact_length(text) as isize
}

/// The text of a [Fact]: non-empty & at most [MAX_FACT_LENGTH] UTF-16 code units
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FactText(String);

impl FactText {
    /// Correct-by-construction [FactText] constructor
    pub fn new(text: &str) -> Result<FactText> {
        ensure!(!text.is_empty(), EmptyTextSnafu);
        let length = fact_length(text);
        ensure!(length <= MAX_FACT_LENGTH, TextLengthSnafu { length });
        Ok(FactText(text.to_owned()))
    }
}

impl AsRef<str> for FactText {
    fn as_ref(&self) -> &str {
        self.deref()
    }
}

impl Deref for FactText {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Implement `Deserialize` by hand to fail if the serialized value isn't a legit `FactText`
impl<'de> Deserialize<'de> for FactText {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        FactText::new(&s).map_err(mk_serde_de_err::<'de, D>)
    }
}

impl Display for FactText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                             Source                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A link backing-up a [Fact]; must be an absolute http or https URL
///
/// We hold on to the text the user typed rather than the parsed [Url]; [Url] normalizes (adding a
/// trailing slash to a bare host, for instance) and I'd rather store what was given.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Source(String);

impl Source {
    pub fn new(text: &str) -> Result<Source> {
        let url = Url::parse(text).context(UrlSnafu {
            text: text.to_owned(),
        })?;
        ensure!(
            url.scheme() == "http" || url.scheme() == "https",
            SchemeSnafu {
                text: text.to_owned(),
                scheme: url.scheme().to_owned(),
            }
        );
        Ok(Source(text.to_owned()))
    }
}

impl AsRef<str> for Source {
    fn as_ref(&self) -> &str {
        self.deref()
    }
}

impl Deref for Source {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'de> Deserialize<'de> for Source {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Source::new(&s).map_err(mk_serde_de_err::<'de, D>)
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            NewFact                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A validated submission, ready to be inserted into the store
///
/// Vote counts are absent; the store defaults them to zero.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct NewFact {
    text: FactText,
    source: Source,
    category: Category,
}

impl NewFact {
    pub fn new(text: FactText, source: Source, category: Category) -> NewFact {
        NewFact {
            text,
            source,
            category,
        }
    }
    /// Validate raw form input; an empty `category` means none was chosen.
    pub fn from_input(text: &str, source: &str, category: &str) -> Result<NewFact> {
        let text = FactText::new(text)?;
        let source = Source::new(source)?;
        ensure!(!category.is_empty(), MissingCategorySnafu);
        Ok(NewFact {
            text,
            source,
            category: category.parse::<Category>()?,
        })
    }
    pub fn category(&self) -> Category {
        self.category
    }
    pub fn source(&self) -> &Source {
        &self.source
    }
    pub fn text(&self) -> &FactText {
        &self.text
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                              Fact                                              //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A fact, as stored
///
/// Field names follow the store's columns (hence the camel-casing of the vote counters). The store
/// may hand back columns we don't care about; they're ignored.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Fact {
    id: FactId,
    text: String,
    source: String,
    category: Category,
    #[serde(default)]
    votes_interesting: u32,
    #[serde(default)]
    votes_mindblowing: u32,
    #[serde(default)]
    votes_false: u32,
}

impl Fact {
    /// Build a [Fact] from its constituents, as the store would on insert
    pub fn new(id: FactId, fact: &NewFact) -> Fact {
        Fact {
            id,
            text: fact.text.to_string(),
            source: fact.source.to_string(),
            category: fact.category,
            votes_interesting: 0,
            votes_mindblowing: 0,
            votes_false: 0,
        }
    }
    pub fn category(&self) -> Category {
        self.category
    }
    pub fn id(&self) -> FactId {
        self.id
    }
    /// A fact is disputed when it has drawn more "false" votes than positive ones of either kind.
    pub fn is_disputed(&self) -> bool {
        u64::from(self.votes_interesting) + u64::from(self.votes_mindblowing)
            < u64::from(self.votes_false)
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn votes(&self, vote: Vote) -> u32 {
        match vote {
            Vote::Interesting => self.votes_interesting,
            Vote::Mindblowing => self.votes_mindblowing,
            Vote::False => self.votes_false,
        }
    }
    /// Return a copy of this [Fact] with the count for `vote` set to `count`
    pub fn with_votes(&self, vote: Vote, count: u32) -> Fact {
        let mut fact = self.clone();
        match vote {
            Vote::Interesting => fact.votes_interesting = count,
            Vote::Mindblowing => fact.votes_mindblowing = count,
            Vote::False => fact.votes_false = count,
        }
        fact
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn fact(interesting: u32, mindblowing: u32, false_: u32) -> Fact {
        Fact::new(
            FactId::new(1),
            &NewFact::from_input("Rust 1.0 shipped in 2015", "https://rust-lang.org", "technology")
                .unwrap(),
        )
        .with_votes(Vote::Interesting, interesting)
        .with_votes(Vote::Mindblowing, mindblowing)
        .with_votes(Vote::False, false_)
    }

    #[test]
    fn disputed() {
        assert!(fact(1, 0, 2).is_disputed());
        assert!(!fact(2, 1, 2).is_disputed());
        assert!(!fact(1, 1, 2).is_disputed());
        assert!(!fact(0, 0, 0).is_disputed());
        assert!(!fact(u32::MAX, u32::MAX, u32::MAX).is_disputed());
        assert_eq!(DISPUTED_MARKER, "[\u{203c}\u{fe0f}DISPUTED]");
    }

    #[test]
    fn fact_text() {
        assert!(FactText::new("").is_err());
        assert!(FactText::new(&"a".repeat(200)).is_ok());
        assert!(FactText::new(&"a".repeat(201)).is_err());
        // Each flag is two `char`s & four UTF-16 code units
        assert!(FactText::new(&"🇯🇵".repeat(200)).is_err());
        assert!(FactText::new(&"🇯🇵".repeat(50)).is_ok());
        assert!(FactText::new(&"🇯🇵".repeat(51)).is_err());
        // Combining marks count on their own
        assert!(FactText::new(&"e\u{301}".repeat(100)).is_ok());
        assert!(FactText::new(&"e\u{301}".repeat(150)).is_err());
        assert_eq!(remaining_length(&"e\u{301}".repeat(150)), -100);
        assert_eq!(remaining_length("é"), 199);
        assert_eq!(remaining_length("hello"), 195);
        assert_eq!(remaining_length(&"a".repeat(205)), -5);
    }

    #[test]
    fn votes() {
        for vote in Vote::ALL {
            assert_eq!(vote.column().parse::<Vote>().unwrap(), vote);
        }
        assert_eq!("votesFalse".parse::<Vote>().unwrap(), Vote::False);
        assert!(matches!(
            "votesBoring".parse::<Vote>(),
            Err(Error::UnknownVote { .. })
        ));
        assert!("votesfalse".parse::<Vote>().is_err());
        assert_eq!(Vote::Interesting.emoji(), "👍🏻");
    }

    #[test]
    fn sources() {
        assert!(Source::new("https://x.com").is_ok());
        assert!(Source::new("http://x.com/a/b?c=d").is_ok());
        assert!(Source::new("ftp://x.com").is_err());
        assert!(Source::new("x.com").is_err());
        assert!(Source::new("").is_err());
        assert_eq!(&*Source::new("https://x.com").unwrap(), "https://x.com");
    }

    #[test]
    fn categories() {
        assert_eq!("science".parse::<Category>().unwrap(), Category::Science);
        assert!("Science".parse::<Category>().is_err());
        assert!("all".parse::<Category>().is_err());
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "news".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::News)
        );
        assert!(CategoryFilter::All.matches(Category::Health));
        assert!(!CategoryFilter::Only(Category::News).matches(Category::Health));
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
            assert!(category.color().starts_with('#'));
        }
    }

    #[test]
    fn new_fact_validation() {
        assert!(NewFact::from_input(&"a".repeat(200), "https://x.com", "science").is_ok());
        assert!(NewFact::from_input(&"a".repeat(201), "https://x.com", "science").is_err());
        assert!(NewFact::from_input("text", "ftp://x.com", "science").is_err());
        assert!(NewFact::from_input("text", "https://x.com", "").is_err());
        assert!(NewFact::from_input("text", "https://x.com", "gossip").is_err());
        assert!(NewFact::from_input("", "https://x.com", "science").is_err());
    }

    #[test]
    fn wire_format() {
        let fact: Fact = serde_json::from_str(
            r#"{"id":7,"text":"Octopuses have three hearts","source":"https://x.com",
                "category":"science","votesInteresting":3,"votesMindblowing":1,"votesFalse":0,
                "created_at":"2023-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(fact.id(), FactId::new(7));
        assert_eq!(fact.category(), Category::Science);
        assert_eq!(fact.votes(Vote::Interesting), 3);

        assert!(
            serde_json::from_str::<Fact>(
                r#"{"id":7,"text":"t","source":"s","category":"gossip"}"#
            )
            .is_err()
        );

        let new_fact = NewFact::from_input("t", "https://x.com", "news").unwrap();
        assert_eq!(
            serde_json::to_value(&new_fact).unwrap(),
            serde_json::json!({"text": "t", "source": "https://x.com", "category": "news"})
        );
        assert!(
            serde_json::from_str::<NewFact>(r#"{"text":"t","source":"ftp://x","category":"news"}"#)
                .is_err()
        );
    }
}
