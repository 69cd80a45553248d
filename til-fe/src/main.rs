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


//! # Today I Learned
//!
//! A single-page app listing facts people have learned, each filed under one of a handful of
//! categories & voted on by readers. The page is laid out in three parts:
//!
//! - a header, with a button to show or hide the submission form
//! - a sidebar of categories; clicking one shows only the facts in that category
//! - the list of facts, each with its source & three vote buttons
//!
//! All the data lives in a hosted table store, spoken to over its REST interface. Where the store
//! lives (& the key used to access it) is fixed at build time through the `TIL_API` & `TIL_API_KEY`
//! environment variables.
//!
//! The application state is a single [AppState] held in one [RwSignal] & provided (along with the
//! store client) to every component through context.

mod facts;
mod filter;
mod form;
mod header;
mod http;
mod types;

use leptos::{either::Either, prelude::*};
use thaw::{Layout, LayoutHeader};
use tracing::{error, info};
use tracing_subscriber::fmt;
use tracing_subscriber_wasm::MakeConsoleWriter;

use til_shared::{
    rest::{self, RestStore, StoreConfig},
    state::AppState,
};

use crate::{
    facts::{FactList, fetch_facts},
    filter::Categories,
    form::NewFactForm,
    header::Header,
    http::GlooTransport,
    types::{DEFAULT_API, State, Store},
};

fn store() -> rest::Result<Store> {
    let api = option_env!("TIL_API").unwrap_or(DEFAULT_API);
    info!("Using the store at {api}");
    Ok(RestStore::new(
        StoreConfig::new(api, option_env!("TIL_API_KEY").unwrap_or_default())?,
        GlooTransport,
    ))
}

/// The app proper, once we have a store to talk to
#[component]
fn Facts(store: Store) -> impl IntoView {
    let state: State = RwSignal::new(AppState::new());
    provide_context(store.clone());
    provide_context(state);

    if let Some(ticket) = state.try_update(AppState::begin_fetch) {
        fetch_facts(store, state, ticket);
    }

    view! {
        // thaw `Layout` (https://thawui.vercel.app/components/layout)
        <Layout>
            <LayoutHeader class="header">
                <Header/>
            </LayoutHeader>
            <Show when=move || state.with(AppState::show_form)>
                <NewFactForm/>
            </Show>
            <main class="main">
                <Categories/>
                <FactList/>
            </main>
        </Layout>
    }
}

#[component]
fn App() -> impl IntoView {
    match store() {
        Ok(store) => Either::Left(view! { <Facts store/> }),
        Err(err) => {
            error!("Failed to configure the store client: {err}");
            Either::Right(view! {
                <p class="message">{format!("Today I Learned is misconfigured: {err}")}</p>
            })
        }
    }
}

fn main() {
    // Log to the browser console:
    fmt()
        .with_writer(MakeConsoleWriter::default().map_trace_level_to(tracing::Level::DEBUG))
        .without_time()
        .with_ansi(false)
        .init();
    // Get a Rust stack trace on panic, rather than "Unreachable executed"
    console_error_panic_hook::set_once();
    leptos::mount::mount_to_body(App);
}
