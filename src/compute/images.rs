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

//! Image management.

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;

use super::super::common::{Link, Ref};
use super::super::stream::PaginatedResource;
use super::super::{Error, ErrorKind, QueryItem};
use super::protocol::ImagesRoot;
use super::{detached, Compute};
use crate::protocol_enum;

protocol_enum! {
    #[doc = "Possible image statuses."]
    #[non_exhaustive]
    enum ImageStatus = Unknown {
        #[doc = "The image is fully operational."]
        Active = "ACTIVE",
        #[doc = "The image is being saved from a server."]
        Saving = "SAVING",
        #[doc = "The image has been deleted."]
        Deleted = "DELETED",
        #[doc = "An error occurred while saving the image."]
        Error = "ERROR",
        #[doc = "The status is not reported or not recognized."]
        Unknown = "UNKNOWN"
    }
}

protocol_enum! {
    #[doc = "Image types recognized by the `type` listing filter."]
    #[non_exhaustive]
    enum ImageType = Unknown {
        #[doc = "An operator-provided base image."]
        Base = "BASE",
        #[doc = "A snapshot of a server."]
        Snapshot = "SNAPSHOT",
        #[doc = "The type is not reported or not recognized."]
        Unknown = "UNKNOWN"
    }
}

/// An image.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Image {
    /// Unique ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Image status.
    #[serde(default)]
    pub status: ImageStatus,
    /// When the image was created.
    pub created: DateTime<Utc>,
    /// When the image was last updated.
    pub updated: DateTime<Utc>,
    /// Minimum disk size in GiB required to boot from this image.
    #[serde(default, rename = "minDisk")]
    pub min_disk: u32,
    /// Minimum RAM in MiB required to boot from this image.
    #[serde(default, rename = "minRam")]
    pub min_ram: u32,
    /// Build progress of the image in percent.
    #[serde(default)]
    pub progress: Option<u8>,
    /// Metadata key/value pairs as of the last fetch.
    ///
    /// To modify the metadata, use
    /// [Compute::get_image_metadata](struct.Compute.html#method.get_image_metadata).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// The server this image is a snapshot of, if any.
    #[serde(default)]
    pub server: Option<Ref>,
    /// Links to this image.
    #[serde(default)]
    pub links: Vec<Link>,
    /// All fields not modeled above, preserved for lossless round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl Image {
    fn client(&self) -> Result<&Compute, Error> {
        self.client.as_ref().ok_or_else(|| detached("image"))
    }

    /// Refresh this image, fully replacing the local state.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        *self = self.client()?.get_image(&self.id).await?;
        Ok(())
    }

    /// Delete this image.
    ///
    /// Deletion is idempotent: the server reporting the image as already gone
    /// counts as success. Afterwards the local status is `Unknown` until a
    /// refresh or [wait_until_deleted](#method.wait_until_deleted) confirms
    /// the deletion.
    pub async fn delete(&mut self) -> Result<(), Error> {
        self.client()?.delete_image(&self.id).await?;
        self.status = ImageStatus::Unknown;
        Ok(())
    }

    /// Wait for this image to reach the given status.
    ///
    /// Re-fetches the image at the owning client's poll interval, fully
    /// replacing the local state on every poll, until the reported status
    /// equals `target`. Observing `Error` or `Deleted` (when not the target)
    /// fails the wait with an `OperationFailed` error.
    ///
    /// There is no built-in time limit; use e.g. `tokio::time::timeout` to
    /// bound the wait.
    pub async fn wait_until_status(&mut self, target: ImageStatus) -> Result<(), Error> {
        let interval = self.client()?.poll_interval();
        loop {
            self.refresh().await?;
            if self.status == target {
                return Ok(());
            }
            if matches!(self.status, ImageStatus::Error | ImageStatus::Deleted) {
                return Err(Error::new(
                    ErrorKind::OperationFailed,
                    format!(
                        "image {} is {} while waiting for {}",
                        self.id, self.status, target
                    ),
                ));
            }
            trace!("Image {} is {}, waiting for {}", self.id, self.status, target);
            sleep(interval).await;
        }
    }

    /// Wait for this image to become active.
    ///
    /// A shorthand for [wait_until_status](#method.wait_until_status) with an
    /// `Active` target.
    pub async fn wait_until_active(&mut self) -> Result<(), Error> {
        self.wait_until_status(ImageStatus::Active).await
    }

    /// Wait for this image to be deleted.
    ///
    /// Polls until the server either reports the `Deleted` status or stops
    /// finding the image at all. The local status is `Deleted` afterwards.
    /// There is no built-in time limit.
    pub async fn wait_until_deleted(&mut self) -> Result<(), Error> {
        let interval = self.client()?.poll_interval();
        loop {
            match self.client()?.get_image(&self.id).await {
                Ok(image) => *self = image,
                Err(err) if err.kind() == ErrorKind::ResourceNotFound => {
                    self.status = ImageStatus::Deleted;
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            if self.status == ImageStatus::Deleted {
                return Ok(());
            }
            trace!("Image {} is {}, waiting for deletion", self.id, self.status);
            sleep(interval).await;
        }
    }
}

impl PaginatedResource for Image {
    type Root = ImagesRoot;

    fn from_root(root: ImagesRoot) -> (Vec<Image>, Vec<Link>) {
        (root.images, root.images_links)
    }

    fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// A reference to an image: an ID that can resolve itself into the image.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageRef {
    /// Unique ID of the image.
    pub id: String,
    /// Links to the image.
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl ImageRef {
    /// Create a detached reference from an ID.
    ///
    /// The result can be compared and serialized but cannot
    /// [fetch](#method.fetch) the image.
    pub fn new<S: Into<String>>(id: S) -> ImageRef {
        ImageRef {
            id: id.into(),
            links: Vec::new(),
            client: None,
        }
    }

    /// Fetch the image this reference points to.
    ///
    /// Fails with a `DetachedObject` error without issuing any request if the
    /// reference was constructed by hand rather than fetched through a client.
    pub async fn fetch(&self) -> Result<Image, Error> {
        match &self.client {
            Some(client) => client.get_image(&self.id).await,
            None => Err(detached("image reference")),
        }
    }

    pub(crate) fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// A filter for image listings.
///
/// Only filters that are explicitly added to the
/// [Query](../struct.Query.html) appear in the request.
#[derive(Debug, Clone)]
pub enum ImageFilter {
    /// Filter by exact image name.
    Name(String),
    /// Only images created from the server with this ID.
    Server(String),
    /// Only images that require at least this much RAM in MiB.
    MinRam(u32),
    /// Only images that require at least this disk size in GiB.
    MinDisk(u32),
    /// Filter by image type.
    Type(ImageType),
    /// Only images changed after the given time.
    ChangesSince(DateTime<Utc>),
    /// Start the listing after the image with this ID.
    Marker(String),
    /// Maximum number of images per page.
    Limit(usize),
}

impl QueryItem for ImageFilter {
    fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
        Ok(match self {
            ImageFilter::Name(name) => ("name", Cow::Borrowed(name.as_str())),
            ImageFilter::Server(server) => ("server", Cow::Borrowed(server.as_str())),
            ImageFilter::MinRam(ram) => ("minRam", ram.to_string().into()),
            ImageFilter::MinDisk(disk) => ("minDisk", disk.to_string().into()),
            ImageFilter::Type(tp) => ("type", tp.to_string().into()),
            ImageFilter::ChangesSince(since) => (
                "changes-since",
                since.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
            ),
            ImageFilter::Marker(marker) => ("marker", Cow::Borrowed(marker.as_str())),
            ImageFilter::Limit(limit) => ("limit", limit.to_string().into()),
        })
    }
}
