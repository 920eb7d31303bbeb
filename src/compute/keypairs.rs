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

//! Key pair management.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::super::common::Link;
use super::super::stream::PaginatedResource;
use super::super::Error;
use super::protocol::KeyPairsRoot;
use super::{detached, Compute};
use crate::protocol_enum;

protocol_enum! {
    #[doc = "Type of a key pair."]
    #[non_exhaustive]
    enum KeyPairType = Unknown {
        #[doc = "An SSH key."]
        Ssh = "ssh",
        #[doc = "An X.509 certificate."]
        X509 = "x509",
        #[doc = "The type is not reported or not recognized."]
        Unknown = "unknown"
    }
}

/// A key pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyPair {
    /// Unique name.
    pub name: String,
    /// Fingerprint of the public key.
    pub fingerprint: String,
    /// The public key.
    pub public_key: String,
    /// Type of the key pair.
    ///
    /// Only reported by the server starting with microversion 2.2.
    #[serde(default, rename = "type")]
    pub key_type: KeyPairType,
    /// The generated private key.
    ///
    /// Only present in the response to a creation request that did not
    /// import an existing public key. The server does not store it.
    #[serde(default)]
    pub private_key: Option<String>,
    /// All fields not modeled above, preserved for lossless round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl KeyPair {
    /// Delete this key pair.
    ///
    /// Deletion is idempotent: the server reporting the key pair as already
    /// gone counts as success.
    pub async fn delete(&self) -> Result<(), Error> {
        match &self.client {
            Some(client) => client.delete_keypair(&self.name).await,
            None => Err(detached("key pair")),
        }
    }
}

impl PaginatedResource for KeyPair {
    type Root = KeyPairsRoot;

    fn from_root(root: KeyPairsRoot) -> (Vec<KeyPair>, Vec<Link>) {
        let keypairs = root
            .keypairs
            .into_iter()
            .map(|entry| entry.keypair)
            .collect();
        // Key pair listings carry no navigation links; the first page is
        // always terminal.
        (keypairs, Vec::new())
    }

    fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// A request to create or import a key pair.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPairCreate {
    /// Unique name for the new key pair.
    pub name: String,
    /// An existing public key to import.
    ///
    /// When omitted, the server generates a new key pair and returns the
    /// private key in the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Type of the key pair (microversion 2.2 and later).
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyPairType>,
}

impl KeyPairCreate {
    /// Create a request to generate a new key pair with the given name.
    pub fn new<S: Into<String>>(name: S) -> KeyPairCreate {
        KeyPairCreate {
            name: name.into(),
            public_key: None,
            key_type: None,
        }
    }
}
