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


//! # The page header: logo, title & the button that shows or hides the submission form

use leptos::prelude::*;

use til_shared::state::AppState;

use crate::types::State;

#[component]
pub fn Header() -> impl IntoView {
    let state = use_context::<State>().expect("No context for the application state!?");
    view! {
        <div class="logo">
            <span class="logo-mark" aria-hidden="true">"💡"</span>
            <h1>"Today I Learned"</h1>
        </div>
        <button
            class="btn btn-large btn-open"
            on:click=move |_| state.update(AppState::toggle_form)
        >
            {move || if state.with(AppState::show_form) { "Close" } else { "Share a Fact" }}
        </button>
    }
}
