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


//! # The Today I Learned Integration Tests
//!
//! # Introduction
//!
//! The unit tests in `til-shared` exercise the table store client against canned responses & the
//! application state against whatever results the test cares to hand it. These tests close the
//! loop: they run the store client over real HTTP (courtesy of [reqwest]) against a fake table
//! store (courtesy of [wiremock]) that answers the same PostgREST requests the hosted store does.
//!
//! # Project Structure
//!
//! As with any Rust integration test, the test programs live in `tests`, but they opt out of the
//! default test harness in favor of [libtest-mimic]:
//!
//! ```toml
//! [[test]]
//!     name = "facts"
//!     harness = false
//! ```
//!
//! Tests register themselves with [inventory], & the test program's `main()` collects them.
//! Code relating to the test framework itself (e.g. the `Test` struct) belongs in `tests/common`.
//! The test functions themselves live here, in this library, along with the fixture they share.
//!
//! [libtest-mimic]: https://docs.rs/libtest-mimic/latest/libtest_mimic/index.html
//! [inventory]: https://docs.rs/inventory

use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use http::Method;
use libtest_mimic::Failed;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate, matchers::path};

use til_shared::{
    entities::{Category, CategoryFilter, Fact, FactId, NewFact, Vote},
    rest::{APIKEY_HEADER, BoxedError, FACTS_TABLE, RestStore, StoreConfig, Transport},
    store::MemoryStore,
};

pub mod facts;
pub mod votes;

/// The API key the fake store expects
pub const API_KEY: &str = "test-anon-key";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                        ReqwestTransport                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// [Transport] implementation on top of [reqwest]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(reqwest::Client);

#[async_trait(?Send)]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        req: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, BoxedError> {
        let rsp = self.0.execute(reqwest::Request::try_from(req)?).await?;
        let mut builder = http::Response::builder().status(rsp.status());
        for (name, value) in rsp.headers() {
            builder = builder.header(name, value);
        }
        Ok(builder.body(rsp.bytes().await?.to_vec())?)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         FakeTableStore                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [Respond] implementation answering PostgREST requests against the `facts` table out of a
/// [MemoryStore]
///
/// It understands just enough of the dialect for our purposes: `GET` with an optional `category`
/// filter (ordered by `votesInteresting`, descending), `POST` of an array of new facts, and `PATCH`
/// of vote counters filtered on `id`. Requests lacking the API key are 401'd & anything else is a
/// 400.
pub struct FakeTableStore {
    facts: Arc<MemoryStore>,
}

impl FakeTableStore {
    pub fn new(facts: Arc<MemoryStore>) -> FakeTableStore {
        FakeTableStore { facts }
    }
}

fn bad_request(msg: impl Into<String>) -> ResponseTemplate {
    let msg = msg.into();
    warn!("FakeTableStore: {msg}");
    ResponseTemplate::new(400).set_body_json(serde_json::json!({ "message": msg }))
}

/// Pull the value out of an `eq` filter (e.g. "eq.science")
fn eq_value(filter: &str) -> Option<&str> {
    filter.strip_prefix("eq.")
}

impl FakeTableStore {
    fn select(&self, request: &Request) -> ResponseTemplate {
        let mut filter = CategoryFilter::All;
        for (name, value) in request.url.query_pairs() {
            match (&*name, &*value) {
                ("select", "*") => (),
                ("order", "votesInteresting.desc") => (),
                ("category", value) => {
                    match eq_value(value).and_then(|value| value.parse::<Category>().ok()) {
                        Some(category) => filter = CategoryFilter::Only(category),
                        // An unknown category simply matches nothing
                        None => return ResponseTemplate::new(200).set_body_json(Vec::<Fact>::new()),
                    }
                }
                (name, value) => return bad_request(format!("Unexpected parameter {name}={value}")),
            }
        }
        ResponseTemplate::new(200).set_body_json(self.facts.select(filter))
    }
    fn insert(&self, request: &Request) -> ResponseTemplate {
        match serde_json::from_slice::<Vec<NewFact>>(&request.body) {
            Ok(new_facts) => ResponseTemplate::new(201).set_body_json(
                new_facts
                    .iter()
                    .map(|fact| self.facts.insert_row(fact))
                    .collect::<Vec<Fact>>(),
            ),
            Err(err) => bad_request(format!("Bad insert body: {err}")),
        }
    }
    fn update(&self, request: &Request) -> ResponseTemplate {
        let id = match request
            .url
            .query_pairs()
            .find(|(name, _)| name == "id")
            .and_then(|(_, value)| eq_value(&value).and_then(|id| id.parse::<FactId>().ok()))
        {
            Some(id) => id,
            None => return bad_request("PATCH without an id filter"),
        };
        let columns = match serde_json::from_slice::<Map<String, Value>>(&request.body) {
            Ok(columns) => columns,
            Err(err) => return bad_request(format!("Bad update body: {err}")),
        };
        let mut updated = None;
        for (column, value) in &columns {
            let vote = match column.parse::<Vote>() {
                Ok(vote) => vote,
                Err(err) => return bad_request(err.to_string()),
            };
            let Some(count) = value.as_u64().and_then(|count| u32::try_from(count).ok()) else {
                return bad_request(format!("Bad value for {column}: {value}"));
            };
            updated = self.facts.update_votes(id, vote, count);
        }
        // PostgREST answers an update matching no rows with an empty array
        ResponseTemplate::new(200).set_body_json(updated.into_iter().collect::<Vec<Fact>>())
    }
}

impl Respond for FakeTableStore {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        debug!("FakeTableStore: {} {}", request.method, request.url);
        let authorized = request
            .headers
            .get(APIKEY_HEADER)
            .is_some_and(|key| key == API_KEY)
            && request
                .headers
                .get(http::header::AUTHORIZATION)
                .is_some_and(|auth| auth == format!("Bearer {API_KEY}").as_str());
        if !authorized {
            return ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({ "message": "Invalid API key" }));
        }
        if self.facts.is_unavailable() {
            return ResponseTemplate::new(503);
        }
        match request.method {
            Method::GET => self.select(request),
            Method::POST => self.insert(request),
            Method::PATCH => self.update(request),
            _ => ResponseTemplate::new(405),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                            Fixture                                             //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A fake table store & a client pointed at it
pub struct Fixture {
    server: MockServer,
    facts: Arc<MemoryStore>,
}

impl Fixture {
    /// Stand-up a fake table store holding `facts`
    pub async fn new(facts: impl IntoIterator<Item = Fact>) -> Fixture {
        let facts = Arc::new(MemoryStore::with_facts(facts));
        let server = MockServer::start().await;
        Mock::given(path(format!("/rest/v1/{FACTS_TABLE}")))
            .respond_with(FakeTableStore::new(facts.clone()))
            .mount(&server)
            .await;
        Fixture { server, facts }
    }
    /// Where the fake store is listening
    pub fn uri(&self) -> String {
        self.server.uri()
    }
    /// The backing store, for checking on (or interfering with) what the client has done
    pub fn facts(&self) -> &MemoryStore {
        &self.facts
    }
    /// A client for the fake store, authenticating with `key`
    pub fn client_with_key(&self, key: &str) -> Result<RestStore<ReqwestTransport>, Failed> {
        Ok(RestStore::new(
            StoreConfig::new(&self.server.uri(), key)?,
            ReqwestTransport::default(),
        ))
    }
    pub fn client(&self) -> Result<RestStore<ReqwestTransport>, Failed> {
        self.client_with_key(API_KEY)
    }
    /// How many requests of type `method` the fake store has seen
    pub async fn requests(&self, method: Method) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.method == method)
            .count()
    }
}

/// Build a [Fact] as it might come back from the store
pub fn fact(id: i64, text: &str, category: &str, votes: [u32; 3]) -> Result<Fact, Failed> {
    let new_fact = NewFact::from_input(text, "https://en.wikipedia.org/wiki/Main_Page", category)?;
    Ok(Vote::ALL
        .into_iter()
        .zip(votes)
        .fold(Fact::new(FactId::new(id), &new_fact), |fact, (vote, count)| {
            fact.with_votes(vote, count)
        }))
}

/// Text, category & (interesting, mindblowing, false) votes for [sample_facts]
const SAMPLE_FACTS: [(&str, &str, [u32; 3]); 7] = [
    (
        "React is being developed by Meta (formerly facebook)",
        "technology",
        [24, 9, 4],
    ),
    (
        "Millennial dads spend 3 times as much time with their kids than their fathers spent with \
         them",
        "society",
        [11, 2, 0],
    ),
    ("Lisbon is the capital of Portugal", "society", [8, 3, 1]),
    (
        "The Great Wall of China is visible from space",
        "history",
        [1, 0, 2],
    ),
    ("Octopuses have three hearts", "science", [15, 20, 0]),
    ("Honey never spoils", "health", [2, 1, 2]),
    ("Rust 1.0 was released in May 2015", "technology", [30, 1, 0]),
];

/// A handful of facts across several categories (with none in "finance"), with ids 1 through 7
pub fn sample_facts() -> Result<Vec<Fact>, Failed> {
    SAMPLE_FACTS
        .iter()
        .zip(1..)
        .map(|((text, category, votes), id)| fact(id, text, category, *votes))
        .collect()
}

/// Run an async test function to completion on a fresh runtime
pub fn block_on<F: Future<Output = Result<(), Failed>>>(f: F) -> Result<(), Failed> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(f)
}
