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

//! # store
//!
//! Abstractions for the fact store.
//!
//! The application only ever does three things with its store: list facts (optionally restricted to
//! one category), insert a fact, and bump one of a fact's vote counters. [FactStore] captures just
//! that. The production implementation speaks HTTP to a hosted table (see [RestStore]);
//! [MemoryStore] keeps everything in a `Vec` and exists for testing.
//!
//! [RestStore]: crate::rest::RestStore

use std::{
    cmp::Reverse,
    sync::{Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use snafu::{Backtrace, prelude::*};
use tracing::debug;

use crate::entities::{CategoryFilter, Fact, FactId, NewFact, Vote};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("The store returned no rows"))]
    NoRows { backtrace: Backtrace },
    #[snafu(display("There is no fact with id {id}"))]
    NoSuchFact { id: FactId, backtrace: Backtrace },
    #[snafu(display("While talking to the store, {source}"))]
    Rest {
        #[snafu(backtrace)]
        source: crate::rest::Error,
    },
    #[snafu(display("The store is unavailable"))]
    Unavailable { backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           FactStore                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The operations the application performs against its store
///
/// Implementations need not be `Send`; in the browser everything runs on one thread.
#[async_trait(?Send)]
pub trait FactStore {
    /// Retrieve every fact matching `filter`, most interesting first
    async fn facts(&self, filter: CategoryFilter) -> Result<Vec<Fact>>;
    /// Insert `fact`; return the row as stored (which is to say, with its id)
    async fn insert(&self, fact: &NewFact) -> Result<Fact>;
    /// Record a vote on `fact`
    ///
    /// This is a read-then-write: we write the count we *have* for `vote`, plus one, and return
    /// the row as the store now has it. Two sessions voting at once can lose a vote; the store's
    /// last write wins.
    async fn vote(&self, fact: &Fact, vote: Vote) -> Result<Fact>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                          MemoryStore                                           //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug)]
struct Inner {
    facts: Vec<Fact>,
    next_id: i64,
    unavailable: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Inner {
            facts: Vec::new(),
            next_id: 1,
            unavailable: false,
        }
    }
}

/// An in-memory [FactStore]
///
/// Beyond implementing [FactStore], this exposes synchronous versions of the underlying table
/// operations so that it can sit behind a fake HTTP endpoint in the integration tests. It can also
/// be told to fail every request, to exercise error paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
    /// Create a [MemoryStore] holding `facts`; their ids are kept, & new ids will be assigned
    /// after the largest.
    pub fn with_facts(facts: impl IntoIterator<Item = Fact>) -> MemoryStore {
        let facts = facts.into_iter().collect::<Vec<Fact>>();
        let next_id = facts
            .iter()
            .map(|fact| i64::from(fact.id()))
            .max()
            .unwrap_or(0)
            + 1;
        MemoryStore {
            inner: Mutex::new(Inner {
                facts,
                next_id,
                unavailable: false,
            }),
        }
    }
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
    /// Select all facts matching `filter`, ordered by interesting votes, descending
    pub fn select(&self, filter: CategoryFilter) -> Vec<Fact> {
        let mut facts = self
            .lock()
            .facts
            .iter()
            .filter(|fact| filter.matches(fact.category()))
            .cloned()
            .collect::<Vec<Fact>>();
        facts.sort_by_key(|fact| Reverse(fact.votes(Vote::Interesting)));
        facts
    }
    /// Insert `fact`, assigning it the next id & zero votes
    pub fn insert_row(&self, fact: &NewFact) -> Fact {
        let mut inner = self.lock();
        let fact = Fact::new(FactId::new(inner.next_id), fact);
        inner.next_id += 1;
        inner.facts.push(fact.clone());
        debug!("Inserted fact {}", fact.id());
        fact
    }
    /// Set the count for `vote` on fact `id`; `None` if there is no such fact
    pub fn update_votes(&self, id: FactId, vote: Vote, count: u32) -> Option<Fact> {
        let mut inner = self.lock();
        let fact = inner.facts.iter_mut().find(|fact| fact.id() == id)?;
        *fact = fact.with_votes(vote, count);
        Some(fact.clone())
    }
    pub fn is_unavailable(&self) -> bool {
        self.lock().unavailable
    }
    /// While `unavailable`, every [FactStore] operation fails
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }
    pub fn len(&self) -> usize {
        self.lock().facts.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait(?Send)]
impl FactStore for MemoryStore {
    async fn facts(&self, filter: CategoryFilter) -> Result<Vec<Fact>> {
        ensure!(!self.is_unavailable(), UnavailableSnafu);
        Ok(self.select(filter))
    }
    async fn insert(&self, fact: &NewFact) -> Result<Fact> {
        ensure!(!self.is_unavailable(), UnavailableSnafu);
        Ok(self.insert_row(fact))
    }
    async fn vote(&self, fact: &Fact, vote: Vote) -> Result<Fact> {
        ensure!(!self.is_unavailable(), UnavailableSnafu);
        self.update_votes(fact.id(), vote, fact.votes(vote).saturating_add(1))
            .context(NoSuchFactSnafu { id: fact.id() })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::entities::Category;

    fn new_fact(text: &str, category: &str) -> NewFact {
        NewFact::from_input(text, "https://example.com", category).unwrap()
    }

    #[tokio::test]
    async fn memory_store_smoke() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let a = store.insert(&new_fact("a", "science")).await.unwrap();
        let b = store.insert(&new_fact("b", "history")).await.unwrap();
        assert_eq!(a.id(), FactId::new(1));
        assert_eq!(b.id(), FactId::new(2));

        let b = store.vote(&b, Vote::Interesting).await.unwrap();
        assert_eq!(b.votes(Vote::Interesting), 1);

        // `b` now has the most interesting votes, so it comes first
        let all = store.facts(CategoryFilter::All).await.unwrap();
        assert_eq!(
            all.iter().map(|fact| fact.text()).collect::<Vec<_>>(),
            vec!["b", "a"]
        );

        let science = store
            .facts(CategoryFilter::Only(Category::Science))
            .await
            .unwrap();
        assert_eq!(science, vec![a.clone()]);

        store.set_unavailable(true);
        assert!(store.facts(CategoryFilter::All).await.is_err());
        assert!(store.vote(&a, Vote::False).await.is_err());
        store.set_unavailable(false);

        let a = store.vote(&a, Vote::False).await.unwrap();
        assert_eq!(a.votes(Vote::False), 1);
        assert_eq!(a.votes(Vote::Interesting), 0);
    }

    #[test]
    fn with_facts_continues_ids() {
        let fact = Fact::new(FactId::new(41), &new_fact("x", "news"));
        let store = MemoryStore::with_facts(vec![fact]);
        assert_eq!(store.insert_row(&new_fact("y", "news")).id(), FactId::new(42));
        assert!(store.update_votes(FactId::new(7), Vote::False, 1).is_none());
    }
}
