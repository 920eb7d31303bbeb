// Copyright 2025 the oscompute authors
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

//! Flavor management.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::super::common::{empty_as_default, Link};
use super::super::stream::PaginatedResource;
use super::super::{Error, QueryItem};
use super::protocol::FlavorsRoot;
use super::{detached, Compute};

/// A flavor: a named preset of server dimensions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Flavor {
    /// Unique ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Number of virtual CPUs.
    pub vcpus: u32,
    /// RAM size in MiB.
    pub ram: u64,
    /// Root disk size in GiB.
    pub disk: u64,
    /// Swap size in MiB.
    ///
    /// The wire format uses an empty string for flavors without swap; it is
    /// decoded as 0.
    #[serde(default, deserialize_with = "empty_as_default")]
    pub swap: u64,
    /// Ephemeral disk size in GiB.
    #[serde(default, rename = "OS-FLV-EXT-DATA:ephemeral")]
    pub ephemeral: u64,
    /// Whether the flavor is available to all projects.
    #[serde(default, rename = "os-flavor-access:is_public")]
    pub is_public: Option<bool>,
    /// Links to this flavor.
    #[serde(default)]
    pub links: Vec<Link>,
    /// All fields not modeled above, preserved for lossless round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl Flavor {
    /// Refresh this flavor, fully replacing the local state.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        match &self.client {
            Some(client) => {
                *self = client.get_flavor(&self.id).await?;
                Ok(())
            }
            None => Err(detached("flavor")),
        }
    }
}

impl PaginatedResource for Flavor {
    type Root = FlavorsRoot;

    fn from_root(root: FlavorsRoot) -> (Vec<Flavor>, Vec<Link>) {
        (root.flavors, root.flavors_links)
    }

    fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// A reference to a flavor: an ID that can resolve itself into the flavor.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FlavorRef {
    /// Unique ID of the flavor.
    pub id: String,
    /// Links to the flavor.
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl FlavorRef {
    /// Create a detached reference from an ID.
    ///
    /// The result can be compared and serialized but cannot
    /// [fetch](#method.fetch) the flavor.
    pub fn new<S: Into<String>>(id: S) -> FlavorRef {
        FlavorRef {
            id: id.into(),
            links: Vec::new(),
            client: None,
        }
    }

    /// Fetch the flavor this reference points to.
    ///
    /// Fails with a `DetachedObject` error without issuing any request if the
    /// reference was constructed by hand rather than fetched through a client.
    pub async fn fetch(&self) -> Result<Flavor, Error> {
        match &self.client {
            Some(client) => client.get_flavor(&self.id).await,
            None => Err(detached("flavor reference")),
        }
    }

    pub(crate) fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// A filter for flavor listings.
///
/// Only filters that are explicitly added to the
/// [Query](../struct.Query.html) appear in the request.
#[derive(Debug, Clone)]
pub enum FlavorFilter {
    /// Only flavors with at least this much RAM in MiB.
    MinRam(u64),
    /// Only flavors with at least this large a root disk in GiB.
    MinDisk(u64),
    /// Filter by public availability.
    IsPublic(bool),
    /// Start the listing after the flavor with this ID.
    Marker(String),
    /// Maximum number of flavors per page.
    Limit(usize),
}

impl QueryItem for FlavorFilter {
    fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
        Ok(match self {
            FlavorFilter::MinRam(ram) => ("minRam", ram.to_string().into()),
            FlavorFilter::MinDisk(disk) => ("minDisk", disk.to_string().into()),
            FlavorFilter::IsPublic(public) => ("is_public", public.to_string().into()),
            FlavorFilter::Marker(marker) => ("marker", Cow::Borrowed(marker.as_str())),
            FlavorFilter::Limit(limit) => ("limit", limit.to_string().into()),
        })
    }
}
