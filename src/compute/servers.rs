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

//! Server management.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::net::IpAddr;

use chrono::{DateTime, SecondsFormat, Utc};
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;

use super::super::common::{empty_as_default, Link};
use super::super::stream::PaginatedResource;
use super::super::{Error, ErrorKind, QueryItem};
use super::flavors::FlavorRef;
use super::images::ImageRef;
use super::protocol::ServersRoot;
use super::{detached, Compute};
use crate::protocol_enum;

protocol_enum! {
    #[doc = "Possible server statuses."]
    #[non_exhaustive]
    enum ServerStatus = Unknown {
        #[doc = "The server is running."]
        Active = "ACTIVE",
        #[doc = "The server has not finished building yet."]
        Building = "BUILD",
        #[doc = "The server has been deleted."]
        Deleted = "DELETED",
        #[doc = "The server failed; see the fault for details."]
        Error = "ERROR",
        #[doc = "The server is going through a hard reboot."]
        HardReboot = "HARD_REBOOT",
        #[doc = "The server is being migrated to another host."]
        Migrating = "MIGRATING",
        #[doc = "The password of the server is being reset."]
        Password = "PASSWORD",
        #[doc = "The server is paused."]
        Paused = "PAUSED",
        #[doc = "The server is going through a soft reboot."]
        Rebooting = "REBOOT",
        #[doc = "The server is being rebuilt from an image."]
        Rebuilding = "REBUILD",
        #[doc = "The server is entering rescue mode."]
        Rescuing = "RESCUE",
        #[doc = "The server is being resized."]
        Resizing = "RESIZE",
        #[doc = "A resize of the server is being reverted."]
        RevertingResize = "REVERT_RESIZE",
        #[doc = "The server is shelved."]
        Shelved = "SHELVED",
        #[doc = "The server is shelved and its disk removed from the host."]
        ShelvedOffloaded = "SHELVED_OFFLOADED",
        #[doc = "The server is powered off."]
        ShutOff = "SHUTOFF",
        #[doc = "The server is soft-deleted and can still be restored."]
        SoftDeleted = "SOFT_DELETED",
        #[doc = "The server is suspended to disk."]
        Suspended = "SUSPENDED",
        #[doc = "A resize of the server awaits confirmation."]
        VerifyingResize = "VERIFY_RESIZE",
        #[doc = "The status is not reported or not recognized."]
        Unknown = "UNKNOWN"
    }
}

protocol_enum! {
    #[doc = "Possible power states of a server."]
    #[non_exhaustive]
    enum ServerPowerState: u8 = NoState {
        #[doc = "The power state is not reported or not recognized."]
        NoState = 0,
        #[doc = "The server is powered on."]
        Running = 1,
        #[doc = "The server is paused."]
        Paused = 3,
        #[doc = "The server is powered off."]
        Shutdown = 4,
        #[doc = "The server has crashed."]
        Crashed = 6,
        #[doc = "The server is suspended."]
        Suspended = 7
    }
}

protocol_enum! {
    #[doc = "Type of a server address."]
    #[non_exhaustive]
    enum AddressType = Unknown {
        #[doc = "A fixed address on a tenant network."]
        Fixed = "fixed",
        #[doc = "A floating address."]
        Floating = "floating",
        #[doc = "The type is not reported or not recognized."]
        Unknown = "unknown"
    }
}

/// One address of a server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerAddress {
    /// The IP address.
    pub addr: IpAddr,
    /// IP protocol version: 4 or 6.
    pub version: u8,
    /// Type of the address.
    #[serde(default, rename = "OS-EXT-IPS:type")]
    pub addr_type: Option<AddressType>,
    /// MAC address of the corresponding port.
    #[serde(default, rename = "OS-EXT-IPS-MAC:mac_addr")]
    pub mac_addr: Option<String>,
}

/// A fault recorded for a server in the `Error` status.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerFault {
    /// Code of the fault, usually matching an HTTP status.
    pub code: u16,
    /// Human-readable fault message.
    pub message: String,
    /// Detailed fault information, only shown to administrators.
    #[serde(default)]
    pub details: Option<String>,
    /// When the fault happened.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

/// A server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Server {
    /// Unique ID.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Server status.
    #[serde(default)]
    pub status: ServerStatus,
    /// Power state of the server.
    #[serde(default, rename = "OS-EXT-STS:power_state")]
    pub power_state: ServerPowerState,
    /// Reference to the flavor of this server.
    pub flavor: FlavorRef,
    /// Reference to the image this server was created from.
    ///
    /// `None` for servers booted from a volume: the wire format uses an empty
    /// string for them.
    #[serde(default, deserialize_with = "empty_as_default")]
    pub image: Option<ImageRef>,
    /// Addresses of the server, grouped by network name.
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,
    /// Name of the key pair injected into the server.
    #[serde(default)]
    pub key_name: Option<String>,
    /// Availability zone the server runs in.
    #[serde(default, rename = "OS-EXT-AZ:availability_zone")]
    pub availability_zone: Option<String>,
    /// ID of the project that owns the server.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// ID of the user that created the server.
    #[serde(default)]
    pub user_id: Option<String>,
    /// The fault that brought the server into the `Error` status, if any.
    #[serde(default)]
    pub fault: Option<ServerFault>,
    /// Metadata key/value pairs as of the last fetch.
    ///
    /// To modify the metadata, use
    /// [Compute::get_server_metadata](struct.Compute.html#method.get_server_metadata).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// When the server was created.
    pub created: DateTime<Utc>,
    /// When the server was last updated.
    pub updated: DateTime<Utc>,
    /// Links to this server.
    #[serde(default)]
    pub links: Vec<Link>,
    /// All fields not modeled above, preserved for lossless round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl Server {
    fn client(&self) -> Result<&Compute, Error> {
        self.client.as_ref().ok_or_else(|| detached("server"))
    }

    /// Refresh this server, fully replacing the local state.
    pub async fn refresh(&mut self) -> Result<(), Error> {
        *self = self.client()?.get_server(&self.id).await?;
        Ok(())
    }

    /// Delete this server.
    ///
    /// Deletion is idempotent: the server reporting the resource as already
    /// gone counts as success. Afterwards the local status is `Unknown` until
    /// a refresh or [wait_until_deleted](#method.wait_until_deleted) confirms
    /// the deletion.
    pub async fn delete(&mut self) -> Result<(), Error> {
        self.client()?.delete_server(&self.id).await?;
        self.status = ServerStatus::Unknown;
        Ok(())
    }

    /// Wait for this server to reach the given status.
    ///
    /// Re-fetches the server at the owning client's poll interval, fully
    /// replacing the local state on every poll, until the reported status
    /// equals `target`. Observing `Error`, `Deleted` or `SoftDeleted` (when
    /// not the target) fails the wait with an `OperationFailed` error.
    ///
    /// There is no built-in time limit; use e.g. `tokio::time::timeout` to
    /// bound the wait.
    pub async fn wait_until_status(&mut self, target: ServerStatus) -> Result<(), Error> {
        let interval = self.client()?.poll_interval();
        loop {
            self.refresh().await?;
            if self.status == target {
                return Ok(());
            }
            match self.status {
                ServerStatus::Error => {
                    let detail = self
                        .fault
                        .as_ref()
                        .map(|fault| fault.message.as_str())
                        .unwrap_or("no fault recorded");
                    return Err(Error::new(
                        ErrorKind::OperationFailed,
                        format!("server {} went into an error state: {}", self.id, detail),
                    ));
                }
                ServerStatus::Deleted | ServerStatus::SoftDeleted => {
                    return Err(Error::new(
                        ErrorKind::OperationFailed,
                        format!(
                            "server {} was deleted while waiting for {}",
                            self.id, target
                        ),
                    ));
                }
                _ => {}
            }
            trace!(
                "Server {} is {}, waiting for {}",
                self.id,
                self.status,
                target
            );
            sleep(interval).await;
        }
    }

    /// Wait for this server to become active.
    ///
    /// A shorthand for [wait_until_status](#method.wait_until_status) with an
    /// `Active` target.
    pub async fn wait_until_active(&mut self) -> Result<(), Error> {
        self.wait_until_status(ServerStatus::Active).await
    }

    /// Wait for this server to be deleted.
    ///
    /// Polls until the server either reports the `Deleted` status or stops
    /// being found at all. The local status is `Deleted` afterwards.
    /// There is no built-in time limit.
    pub async fn wait_until_deleted(&mut self) -> Result<(), Error> {
        let interval = self.client()?.poll_interval();
        loop {
            match self.client()?.get_server(&self.id).await {
                Ok(server) => *self = server,
                Err(err) if err.kind() == ErrorKind::ResourceNotFound => {
                    self.status = ServerStatus::Deleted;
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
            if self.status == ServerStatus::Deleted {
                return Ok(());
            }
            trace!(
                "Server {} is {}, waiting for deletion",
                self.id,
                self.status
            );
            sleep(interval).await;
        }
    }
}

impl PaginatedResource for Server {
    type Root = ServersRoot;

    fn from_root(root: ServersRoot) -> (Vec<Server>, Vec<Link>) {
        (root.servers, root.servers_links)
    }

    fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
        self.flavor.attach(client);
        if let Some(image) = &mut self.image {
            image.attach(client);
        }
    }
}

/// The stub of a freshly created server.
///
/// A creation request returns only the ID, the links and (if generated) the
/// administrator password of the new server. Use [fetch](#method.fetch) or
/// [wait_until_active](#method.wait_until_active) to get the full server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerCreated {
    /// Unique ID of the new server.
    pub id: String,
    /// Generated administrator password.
    ///
    /// Not reported when password injection is disabled.
    #[serde(default, rename = "adminPass")]
    pub admin_pass: Option<String>,
    /// Links to the new server.
    #[serde(default)]
    pub links: Vec<Link>,
    /// All fields not modeled above.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    #[serde(skip)]
    client: Option<Compute>,
}

impl ServerCreated {
    fn client(&self) -> Result<&Compute, Error> {
        self.client.as_ref().ok_or_else(|| detached("server stub"))
    }

    /// Fetch the full server this stub points to.
    pub async fn fetch(&self) -> Result<Server, Error> {
        self.client()?.get_server(&self.id).await
    }

    /// Wait for the new server to become active and return it.
    ///
    /// Polls the server at the owning client's poll interval. A server
    /// reaching `Error`, `Deleted` or `SoftDeleted` instead fails the wait
    /// with an `OperationFailed` error. There is no built-in time limit.
    pub async fn wait_until_active(&self) -> Result<Server, Error> {
        let mut server = self.fetch().await?;
        server.wait_until_active().await?;
        Ok(server)
    }

    pub(crate) fn attach(&mut self, client: &Compute) {
        self.client = Some(client.clone());
    }
}

/// Parameters of a new server.
#[derive(Debug, Clone, Serialize)]
pub struct ServerCreate {
    /// Name of the new server.
    pub name: String,
    /// ID of the flavor to use.
    #[serde(rename = "flavorRef")]
    pub flavor: String,
    /// ID of the image to boot from.
    ///
    /// May be omitted when booting from a volume.
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Name of an existing key pair to inject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Metadata to set on the new server.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    /// Base64-encoded user data for the server agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Availability zone to schedule the server into.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Parameters not modeled above, merged into the request as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ServerCreate {
    /// Create a request with the two required parameters.
    pub fn new<S1, S2>(name: S1, flavor: S2) -> ServerCreate
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        ServerCreate {
            name: name.into(),
            flavor: flavor.into(),
            image: None,
            key_name: None,
            metadata: BTreeMap::new(),
            user_data: None,
            availability_zone: None,
            extra: BTreeMap::new(),
        }
    }
}

/// Updatable fields of a server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ServerUpdate {
    /// New name of the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description of the server (microversion 2.19 and later).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A filter for server listings.
///
/// Only filters that are explicitly added to the
/// [Query](../struct.Query.html) appear in the request.
#[derive(Debug, Clone)]
pub enum ServerFilter {
    /// Filter by server name (a substring match on most clouds).
    Name(String),
    /// Only servers in the given status.
    Status(ServerStatus),
    /// Only servers created from the image with this ID.
    Image(String),
    /// Only servers using the flavor with this ID.
    Flavor(String),
    /// Only servers changed after the given time.
    ChangesSince(DateTime<Utc>),
    /// Start the listing after the server with this ID.
    Marker(String),
    /// Maximum number of servers per page.
    Limit(usize),
}

impl QueryItem for ServerFilter {
    fn query_item(&self) -> Result<(&str, Cow<str>), Error> {
        Ok(match self {
            ServerFilter::Name(name) => ("name", Cow::Borrowed(name.as_str())),
            ServerFilter::Status(status) => ("status", status.to_string().into()),
            ServerFilter::Image(image) => ("image", Cow::Borrowed(image.as_str())),
            ServerFilter::Flavor(flavor) => ("flavor", Cow::Borrowed(flavor.as_str())),
            ServerFilter::ChangesSince(since) => (
                "changes-since",
                since.to_rfc3339_opts(SecondsFormat::Secs, true).into(),
            ),
            ServerFilter::Marker(marker) => ("marker", Cow::Borrowed(marker.as_str())),
            ServerFilter::Limit(limit) => ("limit", limit.to_string().into()),
        })
    }
}
