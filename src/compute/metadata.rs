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

//! Metadata of servers and images.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};

use reqwest::Method;

use super::super::Error;
use super::protocol::MetadataRoot;
use super::{detached, Compute};

#[derive(Debug, Clone)]
struct Owner {
    client: Compute,
    resource: &'static str,
    id: String,
}

/// Metadata of a server or an image.
///
/// An ordered string-to-string map that dereferences to the underlying
/// [BTreeMap](std::collections::BTreeMap) for local inspection and mutation.
/// Local changes take effect only when pushed with [update](#method.update).
///
/// Metadata fetched through a [Compute](struct.Compute.html) client remembers
/// which resource it belongs to; a `Metadata` created with `default()` is
/// detached and can only be mutated locally.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    items: BTreeMap<String, String>,
    owner: Option<Owner>,
}

impl Metadata {
    pub(crate) fn new(
        items: BTreeMap<String, String>,
        client: &Compute,
        resource: &'static str,
        id: &str,
    ) -> Metadata {
        Metadata {
            items,
            owner: Some(Owner {
                client: client.clone(),
                resource,
                id: id.to_string(),
            }),
        }
    }

    fn owner(&self) -> Result<&Owner, Error> {
        self.owner.as_ref().ok_or_else(|| detached("metadata"))
    }

    /// Re-fetch the metadata, fully replacing the local map.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        let owner = self.owner()?;
        let root: MetadataRoot = owner
            .client
            .request(
                Method::GET,
                &[owner.resource, owner.id.as_str(), "metadata"],
            )
            .await?
            .fetch_json()
            .await?;
        self.items = root.metadata;
        Ok(())
    }

    /// Push the local map to the server.
    ///
    /// With `overwrite` set, the server's metadata is fully replaced by the
    /// local map (a `PUT` request); otherwise the local map is merged into
    /// the server's metadata (a `POST` request). In both cases the local map
    /// is then replaced by the server's authoritative response, never merged
    /// client-side.
    pub async fn update(&mut self, overwrite: bool) -> Result<(), Error> {
        let owner = self.owner()?;
        let method = if overwrite { Method::PUT } else { Method::POST };
        let body = MetadataRoot {
            metadata: self.items.clone(),
        };
        let root: MetadataRoot = owner
            .client
            .request(
                method,
                &[owner.resource, owner.id.as_str(), "metadata"],
            )
            .await?
            .json(&body)
            .fetch_json()
            .await?;
        self.items = root.metadata;
        Ok(())
    }
}

impl Deref for Metadata {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &BTreeMap<String, String> {
        &self.items
    }
}

impl DerefMut for Metadata {
    fn deref_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.items
    }
}

#[cfg(test)]
pub mod test {
    use maplit::btreemap;

    use super::super::super::ErrorKind;
    use super::Metadata;

    #[test]
    fn test_local_mutation() {
        let mut metadata = Metadata::default();
        let _ = metadata.insert("department".to_string(), "falcon".to_string());
        let _ = metadata.insert("weight".to_string(), "1".to_string());
        assert_eq!(metadata.len(), 2);
        let _ = metadata.remove("weight");
        assert_eq!(
            *metadata,
            btreemap! {"department".to_string() => "falcon".to_string()}
        );
    }

    #[tokio::test]
    async fn test_detached_metadata() {
        let mut metadata = Metadata::default();
        assert_eq!(
            metadata.refresh().await.unwrap_err().kind(),
            ErrorKind::DetachedObject
        );
        assert_eq!(
            metadata.update(true).await.unwrap_err().kind(),
            ErrorKind::DetachedObject
        );
    }
}
