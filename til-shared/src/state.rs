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

//! # Application state
//!
//! Everything the UI shows is a function of one [AppState]: the facts on hand, which category is
//! selected, whether a fetch is outstanding, whether the submission form is open (and what's in
//! it), and which facts have votes in flight. Each user intent gets a method that moves the state
//! along; the frontend holds the [AppState] in a single reactive container & calls these methods,
//! issuing whatever network calls they call for in between.
//!
//! Remote calls are split in two: a `begin_*` method records that the call is outstanding (and
//! hands back what's needed to make it), and a `finish_*` method folds the result back in.
//!
//! ## Fetch races
//!
//! Nothing stops the user from clicking "science" and then "history" before the first fetch
//! returns, nor does anything guarantee the responses come back in order. Each fetch is therefore
//! issued with a [FetchTicket] naming the generation of the category selection it was made for;
//! a response bearing any ticket but the latest is dropped on the floor.

use std::collections::HashSet;

use tracing::{debug, error, warn};

use crate::entities::{CategoryFilter, Fact, FactId, NewFact, Vote, remaining_length};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       the fact list                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Identifies one fetch of the fact list
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FetchTicket {
    generation: u64,
    filter: CategoryFilter,
}

impl FetchTicket {
    /// The category selection this fetch is for
    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }
}

/// What became of a completed fetch
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchOutcome {
    /// The fact list was replaced with the results
    Applied,
    /// A later fetch has since been issued; the results were discarded
    Stale,
    /// The fetch failed; the fact list is unchanged & the user should be told
    Failed,
}

/// What the fact list area should show
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListView<'a> {
    Loading,
    Empty,
    Facts(&'a [Fact]),
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      the submission form                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// The submission form's fields, verbatim
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FactForm {
    text: String,
    source: String,
    category: String,
    uploading: bool,
}

impl FactForm {
    pub fn category(&self) -> &str {
        &self.category
    }
    /// While true, the form's inputs are disabled
    pub fn is_uploading(&self) -> bool {
        self.uploading
    }
    /// Characters left before the text hits its limit (negative once past it)
    pub fn remaining(&self) -> isize {
        remaining_length(&self.text)
    }
    pub fn source(&self) -> &str {
        &self.source
    }
    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn set_category(&mut self, category: impl Into<String>) {
        self.category = category.into();
    }
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
    /// Validate the current contents; `None` if they don't pass muster.
    pub fn validate(&self) -> Option<NewFact> {
        NewFact::from_input(&self.text, &self.source, &self.category)
            .map_err(|err| debug!("Submission rejected: {err}"))
            .ok()
    }
    fn reset(&mut self) {
        *self = FactForm::default();
    }
}

/// What became of a completed submission
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    /// The new fact was added to the front of the list & the form closed
    Added(FactId),
    /// The insert failed; the form is left as it was (but re-enabled)
    Failed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            AppState                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Debug, Default)]
pub struct AppState {
    facts: Vec<Fact>,
    filter: CategoryFilter,
    generation: u64,
    loading: bool,
    show_form: bool,
    form: FactForm,
    voting: HashSet<FactId>,
}

impl AppState {
    pub fn new() -> AppState {
        AppState::default()
    }
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }
    pub fn filter(&self) -> CategoryFilter {
        self.filter
    }
    pub fn form(&self) -> &FactForm {
        &self.form
    }
    pub fn form_mut(&mut self) -> &mut FactForm {
        &mut self.form
    }
    pub fn is_loading(&self) -> bool {
        self.loading
    }
    /// True while a vote on fact `id` is outstanding
    pub fn is_voting(&self, id: FactId) -> bool {
        self.voting.contains(&id)
    }
    pub fn show_form(&self) -> bool {
        self.show_form
    }
    /// What the list area should display right now
    pub fn list_view(&self) -> ListView<'_> {
        if self.loading {
            ListView::Loading
        } else if self.facts.is_empty() {
            ListView::Empty
        } else {
            ListView::Facts(&self.facts)
        }
    }

    /// Start a fetch of the fact list for the current selection
    ///
    /// Any fetch still outstanding is superseded.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        self.loading = true;
        FetchTicket {
            generation: self.generation,
            filter: self.filter,
        }
    }
    /// Change the category selection & start a fetch for it
    ///
    /// Selecting the category that's already selected still fetches.
    pub fn select_category(&mut self, filter: CategoryFilter) -> FetchTicket {
        debug!("Selecting {filter}");
        self.filter = filter;
        self.begin_fetch()
    }
    /// Fold the result of the fetch identified by `ticket` into the state
    pub fn finish_fetch<E: std::fmt::Display>(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<Fact>, E>,
    ) -> FetchOutcome {
        if ticket.generation != self.generation {
            debug!(
                "Discarding the results of a stale fetch for {} (generation {}; now {})",
                ticket.filter, ticket.generation, self.generation
            );
            return FetchOutcome::Stale;
        }
        self.loading = false;
        match result {
            Ok(facts) => {
                self.facts = facts;
                FetchOutcome::Applied
            }
            Err(err) => {
                error!("Fetching facts for {}: {err}", ticket.filter);
                FetchOutcome::Failed
            }
        }
    }

    pub fn toggle_form(&mut self) {
        self.show_form = !self.show_form;
    }
    /// Validate the form &, if it passes, mark it as uploading & return the fact to be inserted
    ///
    /// Invalid input is silently ignored, as is a second submission while one is in flight.
    pub fn begin_submit(&mut self) -> Option<NewFact> {
        if self.form.uploading {
            return None;
        }
        let fact = self.form.validate()?;
        self.form.uploading = true;
        Some(fact)
    }
    pub fn finish_submit<E: std::fmt::Display>(
        &mut self,
        result: Result<Fact, E>,
    ) -> SubmitOutcome {
        self.form.uploading = false;
        match result {
            Ok(fact) => {
                let id = fact.id();
                self.facts.insert(0, fact);
                self.form.reset();
                self.show_form = false;
                SubmitOutcome::Added(id)
            }
            Err(err) => {
                error!("Inserting a new fact: {err}");
                SubmitOutcome::Failed
            }
        }
    }

    /// Start a vote on fact `id`; return the fact as we have it (which the caller needs in order to
    /// compute the new count)
    ///
    /// `None` if we don't have such a fact, or a vote on it is already outstanding (in which case
    /// its buttons are disabled, so this shouldn't happen).
    pub fn begin_vote(&mut self, id: FactId, vote: Vote) -> Option<Fact> {
        if self.voting.contains(&id) {
            warn!("A vote on {id} is already in flight; ignoring {vote}");
            return None;
        }
        let fact = self.facts.iter().find(|fact| fact.id() == id)?.clone();
        self.voting.insert(id);
        Some(fact)
    }
    /// Fold the result of a vote on fact `id` into the state; true if the list was updated.
    pub fn finish_vote<E: std::fmt::Display>(
        &mut self,
        id: FactId,
        result: Result<Fact, E>,
    ) -> bool {
        self.voting.remove(&id);
        match result {
            Ok(updated) => match self.facts.iter_mut().find(|fact| fact.id() == updated.id()) {
                Some(fact) => {
                    *fact = updated;
                    true
                }
                // The list may have been replaced while the vote was in flight
                None => false,
            },
            Err(err) => {
                error!("Voting on fact {id}: {err}");
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::entities::Category;

    fn fact(id: i64, category: &str, interesting: u32) -> Fact {
        Fact::new(
            FactId::new(id),
            &NewFact::from_input(&format!("fact {id}"), "https://example.com", category).unwrap(),
        )
        .with_votes(Vote::Interesting, interesting)
    }

    #[test]
    fn fetch_lifecycle() {
        let mut state = AppState::new();
        assert_eq!(state.list_view(), ListView::Empty);

        let ticket = state.begin_fetch();
        assert_eq!(ticket.filter(), CategoryFilter::All);
        assert_eq!(state.list_view(), ListView::Loading);

        let facts = vec![fact(1, "science", 2), fact(2, "news", 1)];
        assert_eq!(
            state.finish_fetch::<String>(ticket, Ok(facts.clone())),
            FetchOutcome::Applied
        );
        assert_eq!(state.list_view(), ListView::Facts(&facts));

        // A failure leaves the list alone
        let ticket = state.select_category(CategoryFilter::Only(Category::News));
        assert_eq!(
            state.finish_fetch(ticket, Err("boom")),
            FetchOutcome::Failed
        );
        assert!(!state.is_loading());
        assert_eq!(state.facts(), &facts[..]);
        assert_eq!(state.filter(), CategoryFilter::Only(Category::News));
    }

    #[test]
    fn stale_fetches_are_discarded() {
        let mut state = AppState::new();
        let science = state.select_category(CategoryFilter::Only(Category::Science));
        let history = state.select_category(CategoryFilter::Only(Category::History));

        // History comes back first...
        assert_eq!(
            state.finish_fetch::<String>(history, Ok(vec![fact(2, "history", 0)])),
            FetchOutcome::Applied
        );
        // and science, later, is ignored
        assert_eq!(
            state.finish_fetch::<String>(science, Ok(vec![fact(1, "science", 0)])),
            FetchOutcome::Stale
        );
        assert_eq!(state.facts().len(), 1);
        assert_eq!(state.facts()[0].category(), Category::History);

        // A stale response mustn't clear the loading indicator for the current fetch, either
        let first = state.select_category(CategoryFilter::All);
        let second = state.select_category(CategoryFilter::All);
        assert_eq!(state.finish_fetch(first, Err("boom")), FetchOutcome::Stale);
        assert!(state.is_loading());
        assert_eq!(
            state.finish_fetch::<String>(second, Ok(Vec::new())),
            FetchOutcome::Applied
        );
        assert_eq!(state.list_view(), ListView::Empty);
    }

    #[test]
    fn submission() {
        let mut state = AppState::new();
        state.toggle_form();
        assert!(state.show_form());

        // Nothing entered: silently rejected
        assert!(state.begin_submit().is_none());
        assert!(!state.form().is_uploading());

        state.form_mut().set_text("a".repeat(201));
        state.form_mut().set_source("https://x.com");
        state.form_mut().set_category("science");
        assert_eq!(state.form().remaining(), -1);
        assert!(state.begin_submit().is_none());

        state.form_mut().set_text("a".repeat(200));
        let new_fact = state.begin_submit().unwrap();
        assert!(state.form().is_uploading());
        // No double submissions
        assert!(state.begin_submit().is_none());

        let mut state_on_failure = state.clone();
        assert_eq!(
            state_on_failure.finish_submit::<&str>(Err("boom")),
            SubmitOutcome::Failed
        );
        assert!(!state_on_failure.form().is_uploading());
        assert!(state_on_failure.show_form());
        assert_eq!(state_on_failure.form().source(), "https://x.com");

        let ticket = state.begin_fetch();
        let _ = state.finish_fetch::<String>(ticket, Ok(vec![fact(1, "news", 9)]));
        let added = Fact::new(FactId::new(2), &new_fact);
        assert_eq!(
            state.finish_submit::<String>(Ok(added.clone())),
            SubmitOutcome::Added(FactId::new(2))
        );
        assert_eq!(state.facts()[0], added);
        assert_eq!(state.facts().len(), 2);
        assert!(!state.show_form());
        assert_eq!(state.form(), &FactForm::default());
    }

    #[test]
    fn voting() {
        let mut state = AppState::new();
        let ticket = state.begin_fetch();
        let _ = state.finish_fetch::<String>(
            ticket,
            Ok(vec![fact(1, "news", 5), fact(2, "news", 3).with_votes(Vote::False, 3)]),
        );

        let id = FactId::new(2);
        let current = state.begin_vote(id, Vote::False).unwrap();
        assert_eq!(current.votes(Vote::False), 3);
        assert!(state.is_voting(id));
        // Every button on the fact is disabled, so a second vote of any kind is refused
        assert!(state.begin_vote(id, Vote::Interesting).is_none());
        assert!(state.begin_vote(FactId::new(99), Vote::False).is_none());

        let updated = current.with_votes(Vote::False, 4);
        assert!(state.finish_vote::<String>(id, Ok(updated)));
        assert!(!state.is_voting(id));
        let fact = &state.facts()[1];
        assert_eq!(fact.votes(Vote::False), 4);
        assert_eq!(fact.votes(Vote::Interesting), 3);
        assert_eq!(fact.votes(Vote::Mindblowing), 0);

        // Failures clear the in-flight flag but change nothing else
        let _ = state.begin_vote(id, Vote::Interesting).unwrap();
        assert!(!state.finish_vote(id, Err("boom")));
        assert!(!state.is_voting(id));
        assert_eq!(state.facts()[1].votes(Vote::Interesting), 3);
    }
}
