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

//! Paginated collections.

#[cfg(feature = "stream")]
use async_stream::try_stream;
#[cfg(feature = "stream")]
use futures::stream::Stream;
use log::trace;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;

use super::common::{find_next_link, Link};
use super::compute::Compute;
use super::Error;

/// A resource that the Compute API returns in paginated listings.
///
/// Implementations connect a resource type to the JSON envelope of its
/// listing and define how a freshly deserialized resource is attached to the
/// client that fetched it.
pub trait PaginatedResource: Sized {
    /// Root JSON envelope of one listing page.
    type Root: DeserializeOwned + Send;

    /// Split a listing envelope into its resources and navigation links.
    fn from_root(root: Self::Root) -> (Vec<Self>, Vec<Link>);

    /// Attach the owning client to this resource (and its nested references).
    fn attach(&mut self, client: &Compute);
}

/// One page of a paginated listing.
///
/// A page holds the items the server returned for one request plus the
/// server-provided link to the following page, if any. Pages are produced by
/// the listing calls on [Compute](../compute/struct.Compute.html); every item
/// is already attached to the client that fetched the page.
///
/// A page without a `next` link is the last one. A `Page` can be cloned, and
/// each clone is an independent cursor over the same fetched data.
#[derive(Debug, Clone)]
pub struct Page<T> {
    items: Vec<T>,
    next: Option<Url>,
    client: Compute,
}

impl<T> Page<T> {
    /// Items of this page.
    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Convert this page into its items, dropping the navigation state.
    #[inline]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Whether this page contains no items.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items in this page.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// The raw link to the next page, if the listing continues past this page.
    #[inline]
    pub fn next_link(&self) -> Option<&Url> {
        self.next.as_ref()
    }

    #[cfg(feature = "sync")]
    pub(crate) fn take_items(&mut self) -> Vec<T> {
        std::mem::take(&mut self.items)
    }
}

impl<T> Page<T>
where
    T: PaginatedResource,
{
    pub(crate) fn new(root: T::Root, client: &Compute) -> Page<T> {
        let (mut items, links) = T::from_root(root);
        for item in items.iter_mut() {
            item.attach(client);
        }
        Page {
            items,
            next: find_next_link(&links),
            client: client.clone(),
        }
    }

    /// Fetch the next page of the listing.
    ///
    /// The server-provided `next` link is requested verbatim (the URL is not
    /// reconstructed from filters), with the authentication and API version
    /// headers of the owning client attached. Returns `None` if this page is
    /// the last one.
    pub async fn next_page(&self) -> Result<Option<Page<T>>, Error> {
        match &self.next {
            Some(link) => {
                trace!("Fetching the next page from {}", link);
                let root = self
                    .client
                    .request_url(Method::GET, link.clone())
                    .fetch_json::<T::Root>()
                    .await?;
                Ok(Some(Page::new(root, &self.client)))
            }
            None => Ok(None),
        }
    }

    /// Convert this page into an asynchronous stream over the whole listing.
    ///
    /// The items of this page are yielded first; each following page is only
    /// fetched when the consumer polls past the last item of the current one.
    #[cfg(feature = "stream")]
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> {
        try_stream! {
            let mut page = self;
            loop {
                for item in std::mem::take(&mut page.items) {
                    yield item;
                }
                match page.next_page().await? {
                    Some(next) => page = next,
                    None => break,
                }
            }
        }
    }
}
