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


//! # til-fe HTTP utilities
//!
//! The table store client in `til-shared` speaks [http] types; this module carries them over
//! [gloo_net].

use async_trait::async_trait;
use gloo_net::http::RequestBuilder;
use snafu::prelude::*;

use til_shared::rest::{BoxedError, Transport};

use crate::types::USER_AGENT;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("The request body wasn't UTF-8: {source}"))]
    Body { source: std::string::FromUtf8Error },
    #[snafu(display("{source}"))]
    Gloo { source: gloo_net::Error },
    #[snafu(display("The value for header {name} isn't representable as a string: {source}"))]
    Header {
        name: String,
        source: http::header::ToStrError,
    },
    #[snafu(display("Failed to build an http::Response: {source}"))]
    Response { source: http::Error },
}

/// [Transport] implementation on top of the browser's `fetch()` API
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

impl GlooTransport {
    async fn send_gloo(
        &self,
        req: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, Error> {
        let (parts, body) = req.into_parts();
        let mut builder = RequestBuilder::new(&parts.uri.to_string())
            .method(parts.method)
            .header("User-Agent", USER_AGENT);
        for (name, value) in parts.headers.iter() {
            builder = builder.header(
                name.as_str(),
                value.to_str().context(HeaderSnafu {
                    name: name.as_str().to_owned(),
                })?,
            );
        }
        let req = if body.is_empty() {
            builder.build()
        } else {
            builder.body(String::from_utf8(body).context(BodySnafu)?)
        }
        .context(GlooSnafu)?;

        let rsp = req.send().await.context(GlooSnafu)?;
        let mut builder = http::Response::builder().status(rsp.status());
        for (name, value) in rsp.headers().entries() {
            builder = builder.header(name, value);
        }
        builder
            .body(rsp.binary().await.context(GlooSnafu)?)
            .context(ResponseSnafu)
    }
}

#[async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(
        &self,
        req: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, BoxedError> {
        Ok(self.send_gloo(req).await?)
    }
}
