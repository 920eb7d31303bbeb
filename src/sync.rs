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

//! A blocking wrapper around the Compute client.
//!
//! Nothing here reimplements any API logic: [SyncCompute](struct.SyncCompute.html)
//! owns a single-threaded runtime and drives the asynchronous
//! [Compute](../compute/struct.Compute.html) client on it.

use std::future::Future;
use std::vec;

use tokio::runtime::{Builder, Runtime};

use super::compute::{
    Compute, Flavor, FlavorFilter, Image, ImageFilter, KeyPair, KeyPairCreate, Metadata, Server,
    ServerCreate, ServerCreated, ServerFilter, ServerUpdate,
};
use super::stream::{Page, PaginatedResource};
use super::{ApiVersion, Error, ErrorKind, Query};

fn new_runtime() -> Result<Runtime, Error> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("cannot create a blocking runtime: {}", err),
            )
        })
}

/// A blocking Compute client.
///
/// Mirrors the operations of [Compute](../compute/struct.Compute.html).
/// Since the resources returned by both clients are the same, their
/// asynchronous methods (refreshing, waiting, metadata updates) go through
/// [block_on](#method.block_on):
///
/// ```rust,no_run
/// # fn example() -> Result<(), oscompute::Error> {
/// let compute = oscompute::sync::SyncCompute::from_env()?;
/// let mut server = compute.get_server("22c91117-08de-4894-9aa9-6ef382400985")?;
/// compute.block_on(server.wait_until_active())?;
/// # Ok(()) }
/// ```
///
/// Must not be used inside an asynchronous runtime.
#[derive(Debug)]
pub struct SyncCompute {
    compute: Compute,
    runtime: Runtime,
}

impl SyncCompute {
    /// Create a blocking wrapper around an asynchronous client.
    pub fn new(compute: Compute) -> Result<SyncCompute, Error> {
        Ok(SyncCompute {
            compute,
            runtime: new_runtime()?,
        })
    }

    /// Create a blocking Compute client from environment variables.
    ///
    /// See [Compute::from_env](../compute/struct.Compute.html#method.from_env)
    /// for the variables understood.
    pub fn from_env() -> Result<SyncCompute, Error> {
        let runtime = new_runtime()?;
        let compute = runtime.block_on(Compute::from_env())?;
        Ok(SyncCompute { compute, runtime })
    }

    /// The wrapped asynchronous client.
    #[inline]
    pub fn compute(&self) -> &Compute {
        &self.compute
    }

    /// Mutable access to the wrapped client, e.g. to change its microversion.
    #[inline]
    pub fn compute_mut(&mut self) -> &mut Compute {
        &mut self.compute
    }

    /// Run a future to completion on the underlying runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Pick the highest microversion supported by the server from the given list.
    pub fn pick_api_version<I>(&self, versions: I) -> Result<Option<ApiVersion>, Error>
    where
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        self.runtime.block_on(self.compute.pick_api_version(versions))
    }

    /// Whether the server supports the given microversion.
    pub fn supports_api_version(&self, version: ApiVersion) -> Result<bool, Error> {
        self.runtime
            .block_on(self.compute.supports_api_version(version))
    }

    /// List servers, fetching further pages as the iteration needs them.
    pub fn list_servers(
        &self,
        filters: &Query<ServerFilter>,
    ) -> Result<SyncPages<'_, Server>, Error> {
        let first = self.runtime.block_on(self.compute.list_servers(filters))?;
        Ok(SyncPages::new(self, first))
    }

    /// Fetch one server by its ID.
    pub fn get_server<S: AsRef<str>>(&self, id: S) -> Result<Server, Error> {
        self.runtime.block_on(self.compute.get_server(id))
    }

    /// Request creation of a server.
    pub fn create_server(&self, request: ServerCreate) -> Result<ServerCreated, Error> {
        self.runtime.block_on(self.compute.create_server(request))
    }

    /// Update a server, returning its new representation.
    pub fn update_server<S: AsRef<str>>(
        &self,
        id: S,
        update: ServerUpdate,
    ) -> Result<Server, Error> {
        self.runtime.block_on(self.compute.update_server(id, update))
    }

    /// Delete a server by its ID.
    pub fn delete_server<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        self.runtime.block_on(self.compute.delete_server(id))
    }

    /// Metadata of the server with the given ID.
    pub fn get_server_metadata<S: AsRef<str>>(&self, id: S) -> Result<Metadata, Error> {
        self.runtime.block_on(self.compute.get_server_metadata(id))
    }

    /// List images, fetching further pages as the iteration needs them.
    pub fn list_images(&self, filters: &Query<ImageFilter>) -> Result<SyncPages<'_, Image>, Error> {
        let first = self.runtime.block_on(self.compute.list_images(filters))?;
        Ok(SyncPages::new(self, first))
    }

    /// Fetch one image by its ID.
    pub fn get_image<S: AsRef<str>>(&self, id: S) -> Result<Image, Error> {
        self.runtime.block_on(self.compute.get_image(id))
    }

    /// Delete an image by its ID.
    pub fn delete_image<S: AsRef<str>>(&self, id: S) -> Result<(), Error> {
        self.runtime.block_on(self.compute.delete_image(id))
    }

    /// Metadata of the image with the given ID.
    pub fn get_image_metadata<S: AsRef<str>>(&self, id: S) -> Result<Metadata, Error> {
        self.runtime.block_on(self.compute.get_image_metadata(id))
    }

    /// List flavors, fetching further pages as the iteration needs them.
    pub fn list_flavors(
        &self,
        filters: &Query<FlavorFilter>,
    ) -> Result<SyncPages<'_, Flavor>, Error> {
        let first = self.runtime.block_on(self.compute.list_flavors(filters))?;
        Ok(SyncPages::new(self, first))
    }

    /// Fetch one flavor by its ID.
    pub fn get_flavor<S: AsRef<str>>(&self, id: S) -> Result<Flavor, Error> {
        self.runtime.block_on(self.compute.get_flavor(id))
    }

    /// List key pairs of the current user.
    pub fn list_keypairs(&self) -> Result<SyncPages<'_, KeyPair>, Error> {
        let first = self.runtime.block_on(self.compute.list_keypairs())?;
        Ok(SyncPages::new(self, first))
    }

    /// Fetch one key pair by its name.
    pub fn get_keypair<S: AsRef<str>>(&self, name: S) -> Result<KeyPair, Error> {
        self.runtime.block_on(self.compute.get_keypair(name))
    }

    /// Create a key pair, or import one if the request carries a public key.
    pub fn create_keypair(&self, request: KeyPairCreate) -> Result<KeyPair, Error> {
        self.runtime.block_on(self.compute.create_keypair(request))
    }

    /// Delete a key pair by its name.
    pub fn delete_keypair<S: AsRef<str>>(&self, name: S) -> Result<(), Error> {
        self.runtime.block_on(self.compute.delete_keypair(name))
    }
}

/// A blocking iterator over a paginated listing.
///
/// Yields items, not pages, fetching the next page whenever the current one
/// runs out. A failed fetch yields the error and ends the iteration.
#[derive(Debug)]
pub struct SyncPages<'a, T> {
    client: &'a SyncCompute,
    page: Option<Page<T>>,
    items: vec::IntoIter<T>,
}

impl<'a, T: PaginatedResource> SyncPages<'a, T> {
    fn new(client: &'a SyncCompute, mut first: Page<T>) -> SyncPages<'a, T> {
        let items = first.take_items().into_iter();
        SyncPages {
            client,
            page: Some(first),
            items,
        }
    }
}

impl<'a, T: PaginatedResource> Iterator for SyncPages<'a, T> {
    type Item = Result<T, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.items.next() {
                return Some(Ok(item));
            }
            let current = self.page.take()?;
            match self.client.runtime.block_on(current.next_page()) {
                Ok(Some(mut next)) => {
                    self.items = next.take_items().into_iter();
                    self.page = Some(next);
                }
                Ok(None) => return None,
                // The page is already taken, so the iteration ends here.
                Err(err) => return Some(Err(err)),
            }
        }
    }
}
