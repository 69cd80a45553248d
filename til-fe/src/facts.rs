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


//! # The fact list
//!
//! ## Fetching
//!
//! The list is re-fetched whenever a category is selected (and once at startup). Each fetch runs on
//! its own local task, and carries a ticket saying which selection it was made for; when it
//! completes, [AppState::finish_fetch] decides whether the results are still wanted. If they're
//! wanted but the fetch failed, we pop up an alert.
//!
//! ## Rendering
//!
//! Every intent updates the one [AppState] signal, so anything reading it directly is re-run on,
//! say, every keystroke in the submission form. The list therefore reads it through a [Memo] that
//! only changes when the list itself does.

use leptos::{either::EitherOf3, prelude::*, task::spawn_local};
use tracing::{debug, error};

use til_shared::{
    entities::{DISPUTED_MARKER, Fact, Vote},
    state::{FetchOutcome, FetchTicket, ListView},
    store::FactStore,
};

use crate::types::{FETCH_FAILED, State, Store};

/// Issue the fetch identified by `ticket` & fold the result into `state`
pub fn fetch_facts(store: Store, state: State, ticket: FetchTicket) {
    spawn_local(async move {
        let result = store.facts(ticket.filter()).await;
        match state.try_update(|state| state.finish_fetch(ticket, result)) {
            Some(FetchOutcome::Failed) => {
                if let Err(err) = window().alert_with_message(FETCH_FAILED) {
                    error!("Failed to alert the user: {err:?}");
                }
            }
            Some(outcome) => debug!("Fetch for {}: {outcome:?}", ticket.filter()),
            None => error!("The application state was disposed of mid-fetch!?"),
        }
    });
}

#[component]
fn FactItem(fact: Fact) -> impl IntoView {
    let state = use_context::<State>().expect("No context for the application state!?");
    let store = use_context::<Store>().expect("No context for the store!?");

    let id = fact.id();
    let category = fact.category();

    let on_vote = Action::new_local(move |vote: &Vote| {
        let vote = *vote;
        let store = store.clone();
        async move {
            let Some(current) = state
                .try_update(|state| state.begin_vote(id, vote))
                .flatten()
            else {
                return;
            };
            let result = store.vote(&current, vote).await;
            state.update(|state| {
                state.finish_vote(id, result);
            });
        }
    });

    let voting = Memo::new(move |_| state.with(|state| state.is_voting(id)));
    let votes = Vote::ALL.map(|vote| (vote, fact.votes(vote)));

    view! {
        <li class="fact">
            <p>
                {fact
                    .is_disputed()
                    .then(|| view! { <span class="disputed">{DISPUTED_MARKER}</span> " " })}
                {fact.text().to_owned()}
                " "
                <a class="source" href=fact.source().to_owned() target="_blank" rel="noreferrer">
                    "(Source)"
                </a>
            </p>
            <span class="tag" style=format!("background-color: {}", category.color())>
                {category.name()}
            </span>
            <div class="vote-buttons">
                {votes
                    .into_iter()
                    .map(move |(vote, count)| view! {
                        <button disabled=move || voting.get() on:click=move |_| {
                            on_vote.dispatch(vote);
                        }>
                            {vote.emoji()} " " {count}
                        </button>
                    })
                    .collect_view()}
            </div>
        </li>
    }
}

#[component]
pub fn FactList() -> impl IntoView {
    let state = use_context::<State>().expect("No context for the application state!?");

    // `None` while loading
    let listing = Memo::new(move |_| {
        state.with(|state| match state.list_view() {
            ListView::Loading => None,
            ListView::Empty => Some(Vec::new()),
            ListView::Facts(facts) => Some(facts.to_vec()),
        })
    });

    move || match listing.get() {
        None => EitherOf3::A(view! { <p class="message">"Loading..."</p> }),
        Some(facts) if facts.is_empty() => EitherOf3::B(view! {
            <p class="message">"No facts for this category yet! Create the first one 🤩"</p>
        }),
        Some(facts) => {
            let count = facts.len();
            EitherOf3::C(view! {
                <section>
                    <ul class="facts-list">
                        <For
                            each=move || facts.clone()
                            // Key on the counts, too, so that a vote re-renders its fact
                            key=|fact| (fact.id(), Vote::ALL.map(|vote| fact.votes(vote)))
                            let:fact
                        >
                            <FactItem fact/>
                        </For>
                    </ul>
                    <p>"There are " {count} " facts in the database"</p>
                </section>
            })
        }
    }
}
