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

//! # A client for PostgREST-style table stores
//!
//! Hosted table stores commonly front a Postgres database with [PostgREST], which maps each table
//! onto a REST resource. Reads are `GET`s with the filter & ordering expressed in the query string:
//!
//! ```text
//! GET /rest/v1/facts?select=*&category=eq.science&order=votesInteresting.desc
//! ```
//!
//! inserts are `POST`s of a JSON array of rows, and updates are `PATCH`es of a JSON object of
//! column values, restricted by the same sort of filter. Asking for `Prefer: return=representation`
//! gets us the affected rows back in either case.
//!
//! [PostgREST]: https://docs.postgrest.org
//!
//! This module builds such requests as [http::Request]s & decodes the responses, but leaves the
//! sending to a [Transport]. In the browser that's [gloo-net]; in the integration tests it's
//! [reqwest]. The `http` crate is the lingua franca between them.
//!
//! [gloo-net]: https://docs.rs/gloo-net
//! [reqwest]: https://docs.rs/reqwest

use std::fmt::Display;

use async_trait::async_trait;
use http::{
    HeaderValue, Method, StatusCode,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use itertools::Itertools;
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use snafu::{Backtrace, prelude::*};
use tap::Pipe;
use tracing::debug;
use url::Url;

use crate::{
    entities::{Fact, NewFact, Vote},
    store::{FactStore, NoRowsSnafu, NoSuchFactSnafu, RestSnafu},
};

type StdResult<T, E> = std::result::Result<T, E>;

/// Path under the store's origin at which tables live
pub const REST_PATH: [&str; 2] = ["rest", "v1"];
/// The one table this application uses
pub const FACTS_TABLE: &str = "facts";
/// Header carrying the store's API key (in addition to the bearer token)
pub const APIKEY_HEADER: &str = "apikey";

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                       module Error type                                        //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Failed to parse {text} as the store's location: {source}"))]
    Api {
        text: String,
        source: url::ParseError,
        backtrace: Backtrace,
    },
    #[snafu(display("{api} can't be used as a base URL"))]
    Base { api: Url, backtrace: Backtrace },
    #[snafu(display("Failed to deserialize the store's response: {source}"))]
    De {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("The API key can't be used in a header: {source}"))]
    Key {
        source: http::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to build an http::Request: {source}"))]
    Request {
        source: http::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("Failed to serialize a request body: {source}"))]
    Ser {
        source: serde_json::Error,
        backtrace: Backtrace,
    },
    #[snafu(display("The store responded with {status}: {body}"))]
    Status {
        status: StatusCode,
        body: String,
        backtrace: Backtrace,
    },
    #[snafu(display("The transport failed: {source}"))]
    Transport {
        source: BoxedError,
        backtrace: Backtrace,
    },
    #[snafu(display("Refusing to update every row of {table}; add a filter"))]
    Unfiltered { table: String, backtrace: Backtrace },
}

pub type Result<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         configuration                                          //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Where the store lives & how to authenticate to it
///
/// Loaded once, at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    api: Url,
    key: SecretString,
}

impl StoreConfig {
    /// Fails if `api` isn't an URL under which tables can be found (`mailto:`, say)
    pub fn new(api: &str, key: &str) -> Result<StoreConfig> {
        let api = Url::parse(api).context(ApiSnafu {
            text: api.to_owned(),
        })?;
        ensure!(!api.cannot_be_a_base(), BaseSnafu { api });
        Ok(StoreConfig {
            api,
            key: SecretString::from(key.to_owned()),
        })
    }
    /// The URL at which `table` may be found, sans query
    pub fn table_url(&self, table: &str) -> Result<Url> {
        let mut url = self.api.clone();
        url.set_query(None);
        url.path_segments_mut()
            .map_err(|_| {
                BaseSnafu {
                    api: self.api.clone(),
                }
                .build()
            })?
            .pop_if_empty()
            .extend(REST_PATH)
            .push(table);
        Ok(url)
    }
    fn request_builder(&self, method: Method, url: &Url) -> Result<http::request::Builder> {
        let key = self.key.expose_secret();
        Ok(http::Request::builder()
            .method(method)
            .uri(url.as_str())
            .header(APIKEY_HEADER, HeaderValue::from_str(key).context(KeySnafu)?)
            .header(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {key}")).context(KeySnafu)?,
            )
            .header(ACCEPT, "application/json"))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                         query builders                                         //
////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ascending => write!(f, "asc"),
            Direction::Descending => write!(f, "desc"),
        }
    }
}

/// A table in the store; the starting point for building requests
#[derive(Clone, Copy, Debug)]
pub struct Table<'a>(&'a str);

impl<'a> Table<'a> {
    pub fn new(name: &'a str) -> Table<'a> {
        Table(name)
    }
    /// Select every column of every row; narrow with [Select::eq]
    pub fn select(&self) -> Select<'a> {
        Select {
            table: self.0,
            filters: Vec::new(),
            order: None,
        }
    }
    pub fn insert<T: Serialize>(&self, rows: &[T]) -> Result<Insert<'a>> {
        Ok(Insert {
            table: self.0,
            body: serde_json::to_vec(rows).context(SerSnafu)?,
        })
    }
    pub fn update(&self) -> Update<'a> {
        Update {
            table: self.0,
            values: serde_json::Map::new(),
            filters: Vec::new(),
        }
    }
}

fn eq_filter(column: &str, value: impl Display) -> (String, String) {
    (column.to_owned(), format!("eq.{value}"))
}

fn with_query<'a>(
    mut url: Url,
    filters: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        filters.into_iter().for_each(|(name, value)| {
            pairs.append_pair(name, value);
        });
    }
    url
}

#[derive(Clone, Debug)]
pub struct Select<'a> {
    table: &'a str,
    filters: Vec<(String, String)>,
    order: Option<(String, Direction)>,
}

impl Select<'_> {
    /// Restrict the selection to rows whose `column` equals `value`
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(eq_filter(column, value));
        self
    }
    pub fn order(mut self, column: &str, direction: Direction) -> Self {
        self.order = Some((column.to_owned(), direction));
        self
    }
    pub fn build(&self, config: &StoreConfig) -> Result<http::Request<Vec<u8>>> {
        let order = self
            .order
            .as_ref()
            .map(|(column, direction)| ("order".to_owned(), format!("{column}.{direction}")));
        let url = with_query(
            config.table_url(self.table)?,
            self.filters
                .iter()
                .chain(order.iter())
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        config
            .request_builder(Method::GET, &url)?
            .body(Vec::new())
            .context(RequestSnafu)
    }
}

#[derive(Clone, Debug)]
pub struct Insert<'a> {
    table: &'a str,
    body: Vec<u8>,
}

impl Insert<'_> {
    pub fn build(&self, config: &StoreConfig) -> Result<http::Request<Vec<u8>>> {
        let url = with_query(config.table_url(self.table)?, []);
        config
            .request_builder(Method::POST, &url)?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .body(self.body.clone())
            .context(RequestSnafu)
    }
}

#[derive(Clone, Debug)]
pub struct Update<'a> {
    table: &'a str,
    values: serde_json::Map<String, serde_json::Value>,
    filters: Vec<(String, String)>,
}

impl Update<'_> {
    /// Set `column` to `value` on every matching row
    pub fn set(mut self, column: &str, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(column.to_owned(), value.into());
        self
    }
    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(eq_filter(column, value));
        self
    }
    pub fn build(&self, config: &StoreConfig) -> Result<http::Request<Vec<u8>>> {
        ensure!(
            !self.filters.is_empty(),
            UnfilteredSnafu {
                table: self.table.to_owned()
            }
        );
        let url = with_query(
            config.table_url(self.table)?,
            self.filters
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        config
            .request_builder(Method::PATCH, &url)?
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .body(serde_json::to_vec(&self.values).context(SerSnafu)?)
            .context(RequestSnafu)
    }
}

/// Decode the rows in a store response
///
/// Anything other than a 2xx is an error; the body is kept for the error message, since the store
/// generally explains itself there.
pub fn rows<T: DeserializeOwned>(rsp: http::Response<Vec<u8>>) -> Result<Vec<T>> {
    let status = rsp.status();
    ensure!(
        status.is_success(),
        StatusSnafu {
            status,
            body: String::from_utf8_lossy(rsp.body()).into_owned(),
        }
    );
    serde_json::from_slice::<Vec<T>>(rsp.body()).context(DeSnafu)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           Transport                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Something that can carry an HTTP request to the store & bring back the response
#[async_trait(?Send)]
pub trait Transport {
    async fn send(
        &self,
        req: http::Request<Vec<u8>>,
    ) -> StdResult<http::Response<Vec<u8>>, BoxedError>;
}

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                           RestStore                                            //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// A [FactStore] backed by a PostgREST endpoint
#[derive(Clone, Debug)]
pub struct RestStore<T> {
    config: StoreConfig,
    transport: T,
}

impl<T: Transport> RestStore<T> {
    pub fn new(config: StoreConfig, transport: T) -> RestStore<T> {
        RestStore { config, transport }
    }
    async fn send<R: DeserializeOwned>(&self, req: http::Request<Vec<u8>>) -> Result<Vec<R>> {
        debug!("{} {}", req.method(), req.uri());
        self.transport
            .send(req)
            .await
            .context(TransportSnafu)?
            .pipe(rows::<R>)
    }
}

#[async_trait(?Send)]
impl<T: Transport> FactStore for RestStore<T> {
    async fn facts(
        &self,
        filter: crate::entities::CategoryFilter,
    ) -> crate::store::Result<Vec<Fact>> {
        let select = Table::new(FACTS_TABLE).select();
        let select = match filter.category() {
            Some(category) => select.eq("category", category),
            None => select,
        };
        let req = select
            .order(Vote::Interesting.column(), Direction::Descending)
            .build(&self.config)
            .context(RestSnafu)?;
        let facts = self.send::<Fact>(req).await.context(RestSnafu)?;
        debug!("Retrieved {} facts for {filter}", facts.len());
        Ok(facts)
    }
    async fn insert(&self, fact: &NewFact) -> crate::store::Result<Fact> {
        let req = Table::new(FACTS_TABLE)
            .insert(std::slice::from_ref(fact))
            .and_then(|insert| insert.build(&self.config))
            .context(RestSnafu)?;
        self.send::<Fact>(req)
            .await
            .context(RestSnafu)?
            .into_iter()
            .next()
            .context(NoRowsSnafu)
    }
    async fn vote(&self, fact: &Fact, vote: Vote) -> crate::store::Result<Fact> {
        let req = Table::new(FACTS_TABLE)
            .update()
            .set(vote.column(), fact.votes(vote).saturating_add(1))
            .eq("id", fact.id())
            .build(&self.config)
            .context(RestSnafu)?;
        self.send::<Fact>(req)
            .await
            .context(RestSnafu)?
            .into_iter()
            .exactly_one()
            .map_err(|_| NoSuchFactSnafu { id: fact.id() }.build())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::Mutex;

    use crate::entities::{Category, CategoryFilter, FactId};

    fn config() -> StoreConfig {
        StoreConfig::new("http://127.0.0.1:54321", "anon-key").unwrap()
    }

    #[test]
    fn table_urls() {
        assert_eq!(
            config().table_url("facts").unwrap().as_str(),
            "http://127.0.0.1:54321/rest/v1/facts"
        );
        assert_eq!(
            StoreConfig::new("https://abc.example.co/", "k")
                .unwrap()
                .table_url("facts")
                .unwrap()
                .as_str(),
            "https://abc.example.co/rest/v1/facts"
        );
        assert!(matches!(
            StoreConfig::new("mailto:me@example.com", "k"),
            Err(Error::Base { .. })
        ));
        assert!(matches!(
            StoreConfig::new("data:text/plain,facts", "k"),
            Err(Error::Base { .. })
        ));
        assert!(matches!(
            StoreConfig::new("not a url", "k"),
            Err(Error::Api { .. })
        ));
    }

    #[test]
    fn select_requests() {
        let req = Table::new("facts")
            .select()
            .eq("category", Category::Science)
            .order("votesInteresting", Direction::Descending)
            .build(&config())
            .unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(
            req.uri().to_string(),
            "http://127.0.0.1:54321/rest/v1/facts?select=*&category=eq.science&order=votesInteresting.desc"
        );
        assert_eq!(req.headers()[APIKEY_HEADER], "anon-key");
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer anon-key");
        assert!(req.body().is_empty());

        let req = Table::new("facts")
            .select()
            .order("votesInteresting", Direction::Ascending)
            .build(&config())
            .unwrap();
        assert_eq!(
            req.uri().to_string(),
            "http://127.0.0.1:54321/rest/v1/facts?select=*&order=votesInteresting.asc"
        );
    }

    #[test]
    fn insert_and_update_requests() {
        let fact = NewFact::from_input("t", "https://x.com", "news").unwrap();
        let req = Table::new("facts")
            .insert(&[fact])
            .unwrap()
            .build(&config())
            .unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.headers()["Prefer"], "return=representation");
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(req.body()).unwrap(),
            serde_json::json!([{"text": "t", "source": "https://x.com", "category": "news"}])
        );

        let req = Table::new("facts")
            .update()
            .set("votesFalse", 4)
            .eq("id", 7)
            .build(&config())
            .unwrap();
        assert_eq!(req.method(), Method::PATCH);
        assert_eq!(
            req.uri().to_string(),
            "http://127.0.0.1:54321/rest/v1/facts?select=*&id=eq.7"
        );
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(req.body()).unwrap(),
            serde_json::json!({"votesFalse": 4})
        );

        assert!(
            Table::new("facts")
                .update()
                .set("votesFalse", 4)
                .build(&config())
                .is_err()
        );
    }

    /// A [Transport] that records requests & answers each with a canned response
    struct Canned {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<http::Request<Vec<u8>>>>,
    }

    impl Canned {
        fn new(status: u16, body: &'static str) -> Canned {
            Canned {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl Transport for &Canned {
        async fn send(
            &self,
            req: http::Request<Vec<u8>>,
        ) -> StdResult<http::Response<Vec<u8>>, BoxedError> {
            self.seen.lock().unwrap().push(req);
            Ok(http::Response::builder()
                .status(self.status)
                .body(self.body.as_bytes().to_vec())?)
        }
    }

    const ROW: &str = r#"[{"id":3,"text":"t","source":"https://x.com","category":"news",
                          "votesInteresting":1,"votesMindblowing":0,"votesFalse":3}]"#;

    #[tokio::test]
    async fn rest_store_votes() {
        let canned = Canned::new(200, ROW);
        let store = RestStore::new(config(), &canned);
        let fact: Fact = serde_json::from_str::<Vec<Fact>>(ROW).unwrap().remove(0);
        let voted = store.vote(&fact, Vote::False).await.unwrap();
        assert_eq!(voted.id(), FactId::new(3));

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(seen[0].body()).unwrap(),
            serde_json::json!({"votesFalse": 4})
        );
        assert!(seen[0].uri().to_string().ends_with("id=eq.3"));
    }

    #[tokio::test]
    async fn rest_store_errors() {
        let canned = Canned::new(500, r#"{"message":"boom"}"#);
        let store = RestStore::new(config(), &canned);
        assert!(store.facts(CategoryFilter::All).await.is_err());

        // An update that matches nothing comes back as an empty array
        let canned = Canned::new(200, "[]");
        let store = RestStore::new(config(), &canned);
        let fact: Fact = serde_json::from_str::<Vec<Fact>>(ROW).unwrap().remove(0);
        assert!(store.vote(&fact, Vote::Interesting).await.is_err());

        let canned = Canned::new(200, "not json");
        let store = RestStore::new(config(), &canned);
        assert!(
            store
                .facts(CategoryFilter::Only(Category::News))
                .await
                .is_err()
        );
    }
}
