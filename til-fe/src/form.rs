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


//! # The submission form
//!
//! The fields are bound to the form state in [AppState]; nothing is validated until the user hits
//! "Post", at which point bad input is quietly ignored.

use leptos::prelude::*;
use tracing::{debug, info};

use til_shared::{
    entities::Category,
    state::{AppState, SubmitOutcome},
    store::FactStore,
};

use crate::types::{State, Store};

#[component]
pub fn NewFactForm() -> impl IntoView {
    debug!("NewFactForm invoked.");

    let state = use_context::<State>().expect("No context for the application state!?");
    let store = use_context::<Store>().expect("No context for the store!?");

    let on_submit = Action::new_local(move |_: &()| {
        let store = store.clone();
        async move {
            let Some(new_fact) = state.try_update(AppState::begin_submit).flatten() else {
                return;
            };
            let result = store.insert(&new_fact).await;
            if let Some(SubmitOutcome::Added(id)) =
                state.try_update(|state| state.finish_submit(result))
            {
                info!("Added fact {id}");
            }
        }
    });

    let uploading = Memo::new(move |_| state.with(|state| state.form().is_uploading()));

    view! {
        <form class="fact-form" on:submit=move |ev| {
                ev.prevent_default();
                on_submit.dispatch(());
            }>
            <input
                type="text"
                placeholder="Share a fact with the world..."
                prop:value=move || state.with(|state| state.form().text().to_owned())
                on:input=move |ev| {
                    state.update(|state| state.form_mut().set_text(event_target_value(&ev)))
                }
                disabled=move || uploading.get()
            />
            <span>{move || state.with(|state| state.form().remaining())}</span>
            <input
                type="text"
                placeholder="Trustworthy source..."
                prop:value=move || state.with(|state| state.form().source().to_owned())
                on:input=move |ev| {
                    state.update(|state| state.form_mut().set_source(event_target_value(&ev)))
                }
                disabled=move || uploading.get()
            />
            <select
                prop:value=move || state.with(|state| state.form().category().to_owned())
                on:change=move |ev| {
                    state.update(|state| state.form_mut().set_category(event_target_value(&ev)))
                }
                disabled=move || uploading.get()
            >
                <option value="">"Choose category:"</option>
                {Category::ALL
                    .into_iter()
                    .map(|category| view! {
                        <option value=category.name()>{category.name().to_uppercase()}</option>
                    })
                    .collect_view()}
            </select>
            <button class="btn btn-large" disabled=move || uploading.get()>"Post"</button>
        </form>
    }
}
