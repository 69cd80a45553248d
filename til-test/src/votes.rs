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


//! # Voting

use http::Method;
use libtest_mimic::Failed;

use til_shared::{
    entities::{CategoryFilter, FactId, Vote},
    rest::{FACTS_TABLE, StoreConfig, Table, Transport},
    state::AppState,
    store::{self, FactStore},
};

use crate::{API_KEY, Fixture, ReqwestTransport, fact};

/// Voting "false" on a fact with three such votes yields four, leaving the other counts alone
pub async fn test_vote() -> Result<(), Failed> {
    let fixture = Fixture::new([fact(1, "Honey never spoils", "health", [2, 1, 3])?]).await;
    let client = fixture.client()?;
    let mut state = AppState::new();

    let ticket = state.begin_fetch();
    let result = client.facts(ticket.filter()).await;
    state.finish_fetch(ticket, result);
    assert!(!state.facts()[0].is_disputed());

    let id = FactId::new(1);
    let current = state
        .begin_vote(id, Vote::False)
        .ok_or("vote refused")?;
    assert!(state.is_voting(id));
    let result = client.vote(&current, Vote::False).await;
    assert!(state.finish_vote(id, result));
    assert!(!state.is_voting(id));

    let voted = &state.facts()[0];
    assert_eq!(voted.votes(Vote::False), 4);
    assert_eq!(voted.votes(Vote::Interesting), 2);
    assert_eq!(voted.votes(Vote::Mindblowing), 1);
    assert!(voted.is_disputed());

    // The store agrees
    assert_eq!(
        fixture.facts().select(CategoryFilter::All)[0].votes(Vote::False),
        4
    );
    assert_eq!(fixture.requests(Method::PATCH).await, 1);
    Ok(())
}

/// Votes are written as "current + 1" from what the client last saw; the store doesn't reconcile
/// concurrent votes
pub async fn test_last_write_wins() -> Result<(), Failed> {
    let fixture = Fixture::new([fact(
        1,
        "Octopuses have three hearts",
        "science",
        [15, 20, 0],
    )?])
    .await;
    let alice = fixture.client()?;
    let bob = fixture.client()?;

    let seen = alice.facts(CategoryFilter::All).await?.remove(0);
    let after_alice = alice.vote(&seen, Vote::Mindblowing).await?;
    assert_eq!(after_alice.votes(Vote::Mindblowing), 21);
    // Bob is working from the same, stale, copy
    let after_bob = bob.vote(&seen, Vote::Mindblowing).await?;
    assert_eq!(after_bob.votes(Vote::Mindblowing), 21);
    Ok(())
}

/// Voting on a fact the store doesn't have is an error, and leaves the list alone
pub async fn test_vote_on_missing_fact() -> Result<(), Failed> {
    let ghost = fact(99, "This fact was never stored", "news", [0, 0, 0])?;
    let fixture = Fixture::new([fact(1, "Honey never spoils", "health", [2, 1, 3])?]).await;
    let client = fixture.client()?;

    let result = client.vote(&ghost, Vote::Interesting).await;
    assert!(matches!(result, Err(store::Error::NoSuchFact { .. })));

    let mut state = AppState::new();
    let ticket = state.begin_fetch();
    let facts = client.facts(ticket.filter()).await;
    state.finish_fetch(ticket, facts);
    let id = FactId::new(1);
    state.begin_vote(id, Vote::Interesting).ok_or("vote refused")?;
    assert!(!state.finish_vote(id, result));
    assert!(!state.is_voting(id));
    assert_eq!(state.facts()[0].votes(Vote::Interesting), 2);
    Ok(())
}

/// The store refuses updates to columns that aren't vote counters
pub async fn test_unknown_vote_column() -> Result<(), Failed> {
    let fixture = Fixture::new([fact(1, "Honey never spoils", "health", [2, 1, 3])?]).await;
    let config = StoreConfig::new(&fixture.uri(), API_KEY)?;

    let bogus = Table::new(FACTS_TABLE)
        .update()
        .set("votesBoring", 1)
        .eq("id", 1)
        .build(&config)?;
    let rsp = ReqwestTransport::default().send(bogus).await?;
    assert_eq!(rsp.status(), 400);
    let body = serde_json::from_slice::<serde_json::Value>(rsp.body())?;
    assert_eq!(body["message"], "votesBoring is not a vote column");

    let good = Table::new(FACTS_TABLE)
        .update()
        .set(Vote::Mindblowing.column(), 2)
        .eq("id", 1)
        .build(&config)?;
    let rsp = ReqwestTransport::default().send(good).await?;
    assert_eq!(rsp.status(), 200);
    assert_eq!(
        fixture.facts().select(CategoryFilter::All)[0].votes(Vote::Mindblowing),
        2
    );
    Ok(())
}
