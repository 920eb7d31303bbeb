// Copyright 2024 the oscompute authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Version numbers and their wire format.

use std::fmt;
use std::str::FromStr;

use reqwest::header::HeaderValue;
use serde::de::{Error as DeError, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Error, ErrorKind};

/// An API version as a pair of (major, minor) numbers.
///
/// Used both for major versions of an endpoint (`v2.1`) and for Compute
/// microversions sent in the `X-OpenStack-Nova-API-Version` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(pub u16, pub u16);

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ApiVersion(major, minor) = self;
        write!(f, "{}.{}", major, minor)
    }
}

impl From<(u16, u16)> for ApiVersion {
    fn from(value: (u16, u16)) -> ApiVersion {
        ApiVersion(value.0, value.1)
    }
}

impl From<ApiVersion> for HeaderValue {
    fn from(value: ApiVersion) -> HeaderValue {
        // Only digits and a dot, cannot fail.
        value.to_string().parse().unwrap()
    }
}

fn parse_component(component: &str, input: &str) -> Result<u16, Error> {
    component.parse().map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("invalid API version {}: expected X.Y or X", input),
        )
    })
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<ApiVersion, Error> {
        let stripped = s.strip_prefix('v').unwrap_or(s);
        let (major, minor) = match stripped.split_once('.') {
            Some((major, minor)) => (parse_component(major, s)?, parse_component(minor, s)?),
            None => (parse_component(stripped, s)?, 0),
        };
        Ok(ApiVersion(major, minor))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

struct VersionVisitor;

impl<'de> Visitor<'de> for VersionVisitor {
    type Value = ApiVersion;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an API version like \"2.1\"")
    }

    fn visit_str<E>(self, value: &str) -> Result<ApiVersion, E>
    where
        E: DeError,
    {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> Result<ApiVersion, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(VersionVisitor)
    }
}
