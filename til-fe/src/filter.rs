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


//! # The category sidebar
//!
//! A pure selector: clicking a button sets the selected category, and setting the selected
//! category is the one thing that re-fetches the fact list (even when it's the category already
//! selected).

use leptos::prelude::*;
use tracing::debug;

use til_shared::entities::{Category, CategoryFilter};

use crate::{
    facts::fetch_facts,
    types::{State, Store},
};

#[component]
pub fn Categories() -> impl IntoView {
    let state = use_context::<State>().expect("No context for the application state!?");
    let store = use_context::<Store>().expect("No context for the store!?");

    let select = move |filter: CategoryFilter| {
        debug!("Category {filter} clicked.");
        if let Some(ticket) = state.try_update(|state| state.select_category(filter)) {
            fetch_facts(store.clone(), state, ticket);
        }
    };

    let all = select.clone();
    view! {
        <aside>
            <ul>
                <li class="category">
                    <button
                        class="btn btn-all-categories"
                        on:click=move |_| all(CategoryFilter::All)
                    >
                        "All"
                    </button>
                </li>
                {Category::ALL
                    .into_iter()
                    .map(|category| {
                        let select = select.clone();
                        view! {
                            <li class="category">
                                <button
                                    class="btn btn-category"
                                    style=format!("background-color: {}", category.color())
                                    on:click=move |_| select(category.into())
                                >
                                    {category.name()}
                                </button>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </aside>
    }
}
