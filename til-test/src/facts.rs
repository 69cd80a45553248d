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


//! # Listing & submitting facts

use http::Method;
use libtest_mimic::Failed;

use til_shared::{
    entities::{Category, CategoryFilter, NewFact, Vote},
    state::{AppState, FetchOutcome, ListView, SubmitOutcome},
    store::FactStore,
};

use crate::{API_KEY, Fixture, sample_facts};

/// Filtering on a category returns only facts in that category, most interesting first;
/// "all" returns everything
pub async fn test_filtering() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;

    let all = client.facts(CategoryFilter::All).await?;
    assert_eq!(all.len(), 7);
    assert!(
        all.windows(2)
            .all(|pair| pair[0].votes(Vote::Interesting) >= pair[1].votes(Vote::Interesting))
    );
    assert_eq!(all[0].text(), "Rust 1.0 was released in May 2015");

    for category in Category::ALL {
        let facts = client.facts(category.into()).await?;
        assert!(facts.iter().all(|fact| fact.category() == category));
        assert_eq!(
            facts.len(),
            all.iter().filter(|fact| fact.category() == category).count()
        );
        assert!(
            facts
                .windows(2)
                .all(|pair| pair[0].votes(Vote::Interesting) >= pair[1].votes(Vote::Interesting))
        );
    }

    // One request per call; no caching
    assert_eq!(fixture.requests(Method::GET).await, 1 + Category::ALL.len());
    Ok(())
}

/// Selecting the same category twice fetches twice, with the same results
pub async fn test_reselect() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let mut lists = Vec::new();
    for _ in 0..2 {
        let ticket = state.select_category(Category::Society.into());
        let result = client.facts(ticket.filter()).await;
        assert_eq!(state.finish_fetch(ticket, result), FetchOutcome::Applied);
        lists.push(state.facts().to_vec());
    }

    assert_eq!(fixture.requests(Method::GET).await, 2);
    assert_eq!(lists[0], lists[1]);
    assert_eq!(lists[0].len(), 2);
    Ok(())
}

/// A category with no facts shows the placeholder rather than an empty list
pub async fn test_empty_category() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let ticket = state.select_category(Category::Finance.into());
    assert_eq!(state.list_view(), ListView::Loading);
    let result = client.facts(ticket.filter()).await;
    assert_eq!(state.finish_fetch(ticket, result), FetchOutcome::Applied);
    assert_eq!(state.list_view(), ListView::Empty);
    Ok(())
}

/// Only the most recently requested category's results are shown, regardless of the order in which
/// the responses arrive
pub async fn test_out_of_order_responses() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let science = state.select_category(Category::Science.into());
    let science_rsp = client.facts(science.filter()).await;
    let history = state.select_category(Category::History.into());
    let history_rsp = client.facts(history.filter()).await;

    assert_eq!(state.finish_fetch(history, history_rsp), FetchOutcome::Applied);
    assert_eq!(state.finish_fetch(science, science_rsp), FetchOutcome::Stale);
    assert!(
        state
            .facts()
            .iter()
            .all(|fact| fact.category() == Category::History)
    );
    assert!(state.facts()[0].is_disputed());
    Ok(())
}

/// When the store is down, the fetch fails & the list is left as it was
pub async fn test_store_unavailable() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let ticket = state.begin_fetch();
    let result = client.facts(ticket.filter()).await;
    assert_eq!(state.finish_fetch(ticket, result), FetchOutcome::Applied);

    fixture.facts().set_unavailable(true);
    let ticket = state.select_category(Category::Technology.into());
    let result = client.facts(ticket.filter()).await;
    assert!(result.is_err());
    assert_eq!(state.finish_fetch(ticket, result), FetchOutcome::Failed);
    assert!(!state.is_loading());
    assert_eq!(state.facts().len(), 7);
    Ok(())
}

/// Requests made with the wrong key are refused
pub async fn test_bad_key() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    assert!(
        fixture
            .client_with_key(&format!("not-{API_KEY}"))?
            .facts(CategoryFilter::All)
            .await
            .is_err()
    );
    Ok(())
}

/// A valid submission is inserted, comes back with an id & zero votes, and lands at the top of the
/// list
pub async fn test_submission() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let ticket = state.select_category(Category::Science.into());
    let result = client.facts(ticket.filter()).await;
    state.finish_fetch(ticket, result);
    state.toggle_form();

    // Invalid input never reaches the store
    state.form_mut().set_text("Water boils at 100°C at sea level");
    state.form_mut().set_source("ftp://x.com");
    state.form_mut().set_category("science");
    assert!(state.begin_submit().is_none());
    assert_eq!(fixture.requests(Method::POST).await, 0);

    state.form_mut().set_source("https://x.com");
    let new_fact = state.begin_submit().ok_or("valid input was rejected")?;
    let result = client.insert(&new_fact).await;
    let id = match state.finish_submit(result) {
        SubmitOutcome::Added(id) => id,
        SubmitOutcome::Failed => return Err("insert failed".into()),
    };

    let added = &state.facts()[0];
    assert_eq!(added.id(), id);
    assert_eq!(added.text(), "Water boils at 100°C at sea level");
    assert!(Vote::ALL.into_iter().all(|vote| added.votes(vote) == 0));
    assert!(!state.show_form());
    assert_eq!(state.form().text(), "");
    assert_eq!(fixture.facts().len(), 8);

    // ...and it's in the store
    let science = client.facts(Category::Science.into()).await?;
    assert!(science.iter().any(|fact| fact.id() == id));
    Ok(())
}

/// A failed insert leaves the form as it was, re-enabled
pub async fn test_failed_submission() -> Result<(), Failed> {
    let fixture = Fixture::new(sample_facts()?).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    fixture.facts().set_unavailable(true);
    let new_fact = NewFact::from_input("Owls can't move their eyes", "https://x.com", "science")?;
    let result = client.insert(&new_fact).await;
    assert!(result.is_err());

    state.toggle_form();
    state.form_mut().set_text("Owls can't move their eyes");
    state.form_mut().set_source("https://x.com");
    state.form_mut().set_category("science");
    assert!(state.begin_submit().is_some());
    assert_eq!(state.finish_submit(result), SubmitOutcome::Failed);
    assert!(!state.form().is_uploading());
    assert!(state.show_form());
    assert_eq!(state.form().text(), "Owls can't move their eyes");
    assert_eq!(fixture.facts().len(), 7);
    Ok(())
}
