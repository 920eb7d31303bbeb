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

//! JSON envelopes of the Compute API.
//!
//! The Compute API nests every payload under a top-level key named after the
//! resource (the *root wrapper*), and returns the navigation links of a
//! listing as a sibling `<resource>_links` key. The structures here spell
//! those envelopes out; nothing about them is inferred at runtime.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::super::common::Link;
use super::flavors::Flavor;
use super::images::Image;
use super::keypairs::{KeyPair, KeyPairCreate};
use super::servers::{Server, ServerCreate, ServerCreated, ServerUpdate};

/// One page of a server listing.
#[derive(Debug, Deserialize)]
pub struct ServersRoot {
    /// Servers of the current page.
    pub servers: Vec<Server>,
    /// Navigation links of the listing.
    #[serde(default)]
    pub servers_links: Vec<Link>,
}

/// A single server.
#[derive(Debug, Deserialize)]
pub struct ServerRoot {
    /// The server.
    pub server: Server,
}

/// The response to a server creation request.
#[derive(Debug, Deserialize)]
pub struct ServerCreatedRoot {
    /// Stub of the created server.
    pub server: ServerCreated,
}

/// A request to create a server.
#[derive(Debug, Serialize)]
pub struct CreateServerRoot {
    /// Parameters of the new server.
    pub server: ServerCreate,
}

/// A request to update a server.
#[derive(Debug, Serialize)]
pub struct ServerUpdateRoot {
    /// Fields to update.
    pub server: ServerUpdate,
}

/// One page of an image listing.
#[derive(Debug, Deserialize)]
pub struct ImagesRoot {
    /// Images of the current page.
    pub images: Vec<Image>,
    /// Navigation links of the listing.
    #[serde(default)]
    pub images_links: Vec<Link>,
}

/// A single image.
#[derive(Debug, Deserialize)]
pub struct ImageRoot {
    /// The image.
    pub image: Image,
}

/// One page of a flavor listing.
#[derive(Debug, Deserialize)]
pub struct FlavorsRoot {
    /// Flavors of the current page.
    pub flavors: Vec<Flavor>,
    /// Navigation links of the listing.
    #[serde(default)]
    pub flavors_links: Vec<Link>,
}

/// A single flavor.
#[derive(Debug, Deserialize)]
pub struct FlavorRoot {
    /// The flavor.
    pub flavor: Flavor,
}

/// A key pair listing.
///
/// Unlike other listings, each item is additionally wrapped in its own
/// `keypair` envelope.
#[derive(Debug, Deserialize)]
pub struct KeyPairsRoot {
    /// Wrapped key pairs.
    pub keypairs: Vec<KeyPairEntry>,
}

/// One item of a key pair listing.
#[derive(Debug, Deserialize)]
pub struct KeyPairEntry {
    /// The key pair.
    pub keypair: KeyPair,
}

/// A single key pair.
#[derive(Debug, Deserialize)]
pub struct KeyPairRoot {
    /// The key pair.
    pub keypair: KeyPair,
}

/// A request to create or import a key pair.
#[derive(Debug, Serialize)]
pub struct KeyPairCreateRoot {
    /// Parameters of the new key pair.
    pub keypair: KeyPairCreate,
}

/// Metadata of a server or an image.
///
/// Used in both directions: responses are unwrapped from it and update
/// requests are wrapped into it.
#[derive(Debug, Deserialize, Serialize)]
pub struct MetadataRoot {
    /// Metadata key/value pairs.
    pub metadata: BTreeMap<String, String>,
}
