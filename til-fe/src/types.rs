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


//! # til-fe Types & Constants

use leptos::prelude::RwSignal;

use til_shared::{rest::RestStore, state::AppState};

use crate::http::GlooTransport;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      til-fe common types                                       //
////////////////////////////////////////////////////////////////////////////////////////////////////

// A pair of type aliases for `use_context()`: the store client...
pub type Store = RestStore<GlooTransport>;
// and the one & only piece of application state
pub type State = RwSignal<AppState>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       til-fe constants                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

pub static USER_AGENT: &str = concat!("til-fe/", env!("CARGO_PKG_VERSION"));

/// Where to find the store when `TIL_API` isn't set at build time (a local development instance)
pub static DEFAULT_API: &str = "http://127.0.0.1:54321";

pub static FETCH_FAILED: &str = "There was an error";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn user_agent() {
        assert_eq!(USER_AGENT, format!("til-fe/{}", env!("CARGO_PKG_VERSION")));
        assert!(!USER_AGENT.contains('@'));
    }
}
