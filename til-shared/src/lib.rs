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


//! # til-shared
//!
//! Code shared between the "Today I Learned" frontend & its integration tests: the [entities]
//! (facts, categories & votes), a minimal client for the hosted [rest] table store, the [store]
//! abstraction over it, and the application [state] machine the UI is driven by. Nothing here knows
//! about the DOM, so it all builds (and is tested) natively as well as for `wasm32-unknown-unknown`.

pub mod entities;
pub mod rest;
pub mod state;
pub mod store;

pub use entities::{Category, CategoryFilter, Fact, FactId, NewFact, Vote};
pub use rest::{RestStore, StoreConfig, Transport};
pub use state::AppState;
pub use store::{FactStore, MemoryStore};
