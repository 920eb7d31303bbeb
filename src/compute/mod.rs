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

//! Support for the Compute API.
//!
//! The entry point is a [Compute](struct.Compute.html) client created from a
//! [Session](../struct.Session.html). All high-level calls go through it, and
//! every resource it returns keeps a reference back to it for refreshing,
//! waiting and deletion.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscompute::Error> {
//! use oscompute::compute::{Compute, ServerFilter};
//! use oscompute::Query;
//!
//! let compute = Compute::from_env().await?;
//! let filters = Query::default().with(ServerFilter::Name("web".into()));
//! let mut page = compute.list_servers(&filters).await?;
//! loop {
//!     for server in page.items() {
//!         println!("{} is {}", server.name, server.status);
//!     }
//!     page = match page.next_page().await? {
//!         Some(next) => next,
//!         None => break,
//!     };
//! }
//! # Ok(()) }
//! ```

pub mod protocol;

mod flavors;
mod images;
mod keypairs;
mod metadata;
mod servers;

use std::time::Duration;

use log::debug;
use reqwest::{Method, Url};

use super::client::RequestBuilder;
use super::services::{ComputeService, COMPUTE};
use super::session::Session;
use super::stream::{Page, PaginatedResource};
use super::{config, ApiVersion, Error, ErrorKind, Query};

pub use self::flavors::{Flavor, FlavorFilter, FlavorRef};
pub use self::images::{Image, ImageFilter, ImageRef, ImageStatus, ImageType};
pub use self::keypairs::{KeyPair, KeyPairCreate, KeyPairType};
pub use self::metadata::Metadata;
pub use self::servers::{
    AddressType, Server, ServerAddress, ServerCreate, ServerCreated, ServerFault, ServerFilter,
    ServerPowerState, ServerStatus, ServerUpdate,
};

/// The microversion assumed when no other is configured.
pub const DEFAULT_API_VERSION: ApiVersion = ApiVersion(2, 1);

/// The default interval between the polls of a wait operation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// An error for a resource method called on an object without an owner.
pub(crate) fn detached(what: &str) -> Error {
    Error::new(
        ErrorKind::DetachedObject,
        format!(
            "this {} is not attached to a Compute client; \
             fetch it through one to use this method",
            what
        ),
    )
}

/// A client for the Compute API.
///
/// Wraps a [Session](../struct.Session.html) and pins every request to one
/// microversion, sent in the `X-OpenStack-Nova-API-Version` header.
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscompute::Error> {
/// use oscompute::compute::Compute;
/// use oscompute::{ApiVersion, Session};
///
/// let compute = Compute::new(Session::from_env().await?)
///     .with_api_version(ApiVersion(2, 42))?;
/// # Ok(()) }
/// ```
///
/// Cloning a `Compute` client is cheap and produces a client sharing the
/// underlying session.
#[derive(Debug, Clone)]
pub struct Compute {
    session: Session,
    api_version: ApiVersion,
    poll_interval: Duration,
}

impl Compute {
    /// Create a Compute client from an established session.
    pub fn new(session: Session) -> Compute {
        Compute {
            session,
            api_version: DEFAULT_API_VERSION,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Create a Compute client from environment variables.
    ///
    /// Understands the same `OS_` variables as
    /// [Session::from_env](../struct.Session.html#method.from_env), plus
    /// `OS_COMPUTE_API_VERSION` for the microversion.
    pub async fn from_env() -> Result<Compute, Error> {
        let session = Session::from_env().await?;
        let mut compute = Compute::new(session);
        if let Some(version) = config::api_version_from_env()? {
            compute.set_api_version(version)?;
        }
        Ok(compute)
    }

    /// The underlying session.
    #[inline]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The microversion sent with every request.
    #[inline]
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Set the microversion to send with every request.
    ///
    /// Only validates the major version locally: use
    /// [supports_api_version](#method.supports_api_version) to check the
    /// microversion against the range advertised by the server.
    pub fn set_api_version(&mut self, version: ApiVersion) -> Result<(), Error> {
        if version.0 != 2 {
            return Err(Error::new(
                ErrorKind::IncompatibleApiVersion,
                format!(
                    "the Compute API only has major version 2, cannot use {}",
                    version
                ),
            ));
        }
        self.api_version = version;
        Ok(())
    }

    /// Builder twin of [set_api_version](#method.set_api_version).
    #[inline]
    pub fn with_api_version(mut self, version: ApiVersion) -> Result<Compute, Error> {
        self.set_api_version(version)?;
        Ok(self)
    }

    /// Restrict endpoint discovery to the given region.
    ///
    /// Fails immediately if the region name is empty.
    pub fn set_region<S: Into<String>>(&mut self, region: S) -> Result<(), Error> {
        let region = region.into();
        if region.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "region name cannot be empty",
            ));
        }
        self.session.endpoint_filters_mut().set_region(region);
        Ok(())
    }

    /// Builder twin of [set_region](#method.set_region).
    #[inline]
    pub fn with_region<S: Into<String>>(mut self, region: S) -> Result<Compute, Error> {
        self.set_region(region)?;
        Ok(self)
    }

    /// The interval between the polls of a wait operation.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Set the interval between the polls of a wait operation.
    #[inline]
    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Builder twin of [set_poll_interval](#method.set_poll_interval).
    #[inline]
    pub fn with_poll_interval(mut self, interval: Duration) -> Compute {
        self.set_poll_interval(interval);
        self
    }

    /// Pick the highest microversion supported by the server from the given list.
    pub async fn pick_api_version<I>(&self, versions: I) -> Result<Option<ApiVersion>, Error>
    where
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        self.session.pick_api_version(COMPUTE, versions).await
    }

    /// Whether the server supports the given microversion.
    pub async fn supports_api_version(&self, version: ApiVersion) -> Result<bool, Error> {
        self.session.supports_api_version(COMPUTE, version).await
    }

    /// Start a request to the Compute endpoint, normalizing the path.
    pub(crate) async fn request<I>(
        &self,
        method: Method,
        path: I,
    ) -> Result<RequestBuilder<ComputeService>, Error>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        Ok(self
            .session
            .request(COMPUTE, method, path)
            .await?
            .api_version(self.api_version))
    }

    /// Start a request to a complete URL, e.g. one taken from a link.
    pub(crate) fn request_url(&self, method: Method, url: Url) -> RequestBuilder<ComputeService> {
        self.session
            .client()
            .start_request(COMPUTE, method, url)
            .api_version(self.api_version)
    }

    async fn fetch_page<T: PaginatedResource>(
        &self,
        builder: RequestBuilder<ComputeService>,
    ) -> Result<Page<T>, Error> {
        let root = builder.fetch_json::<T::Root>().await?;
        Ok(Page::new(root, self))
    }

    async fn delete_resource(&self, path: &[&str]) -> Result<(), Error> {
        match self.request(Method::DELETE, path).await?.send().await {
            Ok(..) => Ok(()),
            // Idempotent deletion: already gone is as good as deleted.
            Err(err) if err.kind() == ErrorKind::ResourceNotFound => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// List servers, returning the first page in detailed form.
    ///
    /// Filters that are not part of the query are not sent at all.
    pub async fn list_servers(&self, filters: &Query<ServerFilter>) -> Result<Page<Server>, Error> {
        debug!("Listing servers with filters {:?}", filters.0);
        let builder = self
            .request(Method::GET, &["servers", "detail"])
            .await?
            .query(filters);
        self.fetch_page(builder).await
    }

    /// Fetch one server by its ID.
    pub async fn get_server<S: AsRef<str>>(&self, id: S) -> Result<Server, Error> {
        let root: protocol::ServerRoot = self
            .request(Method::GET, &["servers", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        let mut server = root.server;
        server.attach(self);
        Ok(server)
    }

    /// Request creation of a server.
    ///
    /// Server creation is asynchronous: the result is a stub carrying little
    /// more than the ID of the future server. Use
    /// [ServerCreated::wait_until_active](struct.ServerCreated.html#method.wait_until_active)
    /// to wait for the server itself.
    pub async fn create_server(&self, request: ServerCreate) -> Result<ServerCreated, Error> {
        debug!("Creating a server with {:?}", request);
        let body = protocol::CreateServerRoot { server: request };
        let root: protocol::ServerCreatedRoot = self
            .request(Method::POST, &["servers"])
            .await?
            .json(&body)
            .fetch_json()
            .await?;
        let mut created = root.server;
        created.attach(self);
        debug!("Requested creation of server {}", created.id);
        Ok(created)
    }

    /// Update a server, returning its new representation.
    pub async fn update_server<S: AsRef<str>>(
        &self,
        id: S,
        update: ServerUpdate,
    ) -> Result<Server, Error> {
        debug!("Updating server {} with {:?}", id.as_ref(), update);
        let body = protocol::ServerUpdateRoot { server: update };
        let root: protocol::ServerRoot = self
            .request(Method::PUT, &["servers", id.as_ref()])
            .await?
            .json(&body)
            .fetch_json()
            .await?;
        let mut server = root.server;
        server.attach(self);
        Ok(server)
    }

    /// Delete a server by its ID.
    ///
    /// Succeeds if the server does not exist (any more).
    pub async fn delete_server<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        debug!("Deleting server {}", id.as_ref());
        self.delete_resource(&["servers", id.as_ref()]).await
    }

    /// Metadata of the server with the given ID.
    pub async fn get_server_metadata<S: AsRef<str>>(&self, id: S) -> Result<Metadata, Error> {
        let root: protocol::MetadataRoot = self
            .request(Method::GET, &["servers", id.as_ref(), "metadata"])
            .await?
            .fetch_json()
            .await?;
        Ok(Metadata::new(root.metadata, self, "servers", id.as_ref()))
    }

    /// List images, returning the first page in detailed form.
    pub async fn list_images(&self, filters: &Query<ImageFilter>) -> Result<Page<Image>, Error> {
        debug!("Listing images with filters {:?}", filters.0);
        let builder = self
            .request(Method::GET, &["images", "detail"])
            .await?
            .query(filters);
        self.fetch_page(builder).await
    }

    /// Fetch one image by its ID.
    pub async fn get_image<S: AsRef<str>>(&self, id: S) -> Result<Image, Error> {
        let root: protocol::ImageRoot = self
            .request(Method::GET, &["images", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        let mut image = root.image;
        image.attach(self);
        Ok(image)
    }

    /// Delete an image by its ID.
    ///
    /// Succeeds if the image does not exist (any more).
    pub async fn delete_image<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        debug!("Deleting image {}", id.as_ref());
        self.delete_resource(&["images", id.as_ref()]).await
    }

    /// Metadata of the image with the given ID.
    pub async fn get_image_metadata<S: AsRef<str>>(&self, id: S) -> Result<Metadata, Error> {
        let root: protocol::MetadataRoot = self
            .request(Method::GET, &["images", id.as_ref(), "metadata"])
            .await?
            .fetch_json()
            .await?;
        Ok(Metadata::new(root.metadata, self, "images", id.as_ref()))
    }

    /// List flavors, returning the first page in detailed form.
    pub async fn list_flavors(&self, filters: &Query<FlavorFilter>) -> Result<Page<Flavor>, Error> {
        debug!("Listing flavors with filters {:?}", filters.0);
        let builder = self
            .request(Method::GET, &["flavors", "detail"])
            .await?
            .query(filters);
        self.fetch_page(builder).await
    }

    /// Fetch one flavor by its ID.
    pub async fn get_flavor<S: AsRef<str>>(&self, id: S) -> Result<Flavor, Error> {
        let root: protocol::FlavorRoot = self
            .request(Method::GET, &["flavors", id.as_ref()])
            .await?
            .fetch_json()
            .await?;
        let mut flavor = root.flavor;
        flavor.attach(self);
        Ok(flavor)
    }

    /// List key pairs of the current user.
    ///
    /// Key pair listings are not paginated: the returned page is always
    /// terminal.
    pub async fn list_keypairs(&self) -> Result<Page<KeyPair>, Error> {
        debug!("Listing key pairs");
        let builder = self.request(Method::GET, &["os-keypairs"]).await?;
        self.fetch_page(builder).await
    }

    /// Fetch one key pair by its name.
    pub async fn get_keypair<S: AsRef<str>>(&self, name: S) -> Result<KeyPair, Error> {
        let root: protocol::KeyPairRoot = self
            .request(Method::GET, &["os-keypairs", name.as_ref()])
            .await?
            .fetch_json()
            .await?;
        let mut keypair = root.keypair;
        keypair.attach(self);
        Ok(keypair)
    }

    /// Create a key pair, or import one if the request carries a public key.
    ///
    /// Only a creation (not an import) reports the private key in the result.
    pub async fn create_keypair(&self, request: KeyPairCreate) -> Result<KeyPair, Error> {
        debug!("Creating a key pair with {:?}", request);
        let body = protocol::KeyPairCreateRoot { keypair: request };
        let root: protocol::KeyPairRoot = self
            .request(Method::POST, &["os-keypairs"])
            .await?
            .json(&body)
            .fetch_json()
            .await?;
        let mut keypair = root.keypair;
        keypair.attach(self);
        Ok(keypair)
    }

    /// Delete a key pair by its name.
    ///
    /// Succeeds if the key pair does not exist (any more).
    pub async fn delete_keypair<S: AsRef<str>>(&self, name: S) -> Result<(), Error> {
        debug!("Deleting key pair {}", name.as_ref());
        self.delete_resource(&["os-keypairs", name.as_ref()]).await
    }
}
