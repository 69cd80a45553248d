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


//! # Today I Learned Integration Tests
//!
//! Each test stands-up its own fake table store, so they're independent of one another & may run
//! in parallel. Set `RUST_LOG` to see what the client & the fake store are up to.

use common::Test;
use libtest_mimic::{Arguments, Trial};
use tracing_subscriber::{EnvFilter, fmt};

use til_test::{block_on, facts, votes};

mod common;

inventory::submit!(Test {
    name: "test_filtering",
    test_fn: || block_on(facts::test_filtering()),
});

inventory::submit!(Test {
    name: "test_reselect",
    test_fn: || block_on(facts::test_reselect()),
});

inventory::submit!(Test {
    name: "test_empty_category",
    test_fn: || block_on(facts::test_empty_category()),
});

inventory::submit!(Test {
    name: "test_out_of_order_responses",
    test_fn: || block_on(facts::test_out_of_order_responses()),
});

inventory::submit!(Test {
    name: "test_store_unavailable",
    test_fn: || block_on(facts::test_store_unavailable()),
});

inventory::submit!(Test {
    name: "test_bad_key",
    test_fn: || block_on(facts::test_bad_key()),
});

inventory::submit!(Test {
    name: "test_submission",
    test_fn: || block_on(facts::test_submission()),
});

inventory::submit!(Test {
    name: "test_failed_submission",
    test_fn: || block_on(facts::test_failed_submission()),
});

inventory::submit!(Test {
    name: "test_vote",
    test_fn: || block_on(votes::test_vote()),
});

inventory::submit!(Test {
    name: "test_last_write_wins",
    test_fn: || block_on(votes::test_last_write_wins()),
});

inventory::submit!(Test {
    name: "test_vote_on_missing_fact",
    test_fn: || block_on(votes::test_vote_on_missing_fact()),
});

inventory::submit!(Test {
    name: "test_unknown_vote_column",
    test_fn: || block_on(votes::test_unknown_vote_column()),
});

fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .init();

    let args = Arguments::from_args();
    let conclusion = libtest_mimic::run(
        &args,
        inventory::iter::<common::Test>
            .into_iter()
            .map(|test| Trial::test(test.name, test.test_fn))
            .collect(),
    );

    conclusion.exit();
}
