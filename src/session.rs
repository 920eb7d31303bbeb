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

//! The session layer tying authentication to service discovery.

use std::sync::Arc;

use log::trace;
use reqwest::{Client, Method, Url};

use super::cache::EndpointCache;
use super::client::{AuthenticatedClient, RequestBuilder};
use super::config;
use super::services::ServiceType;
use super::utils::url;
use super::{ApiVersion, AuthType, EndpointFilters, Error};

/// An OpenStack API session.
///
/// A session couples an [AuthenticatedClient](client/struct.AuthenticatedClient.html)
/// with the endpoint filters (interface and region), per-service endpoint
/// overrides and a cache of discovered service information.
///
/// # Note
///
/// Clones of a session share the authentication but own their filters and
/// overrides. Changing either on a clone leaves the original untouched and
/// drops the clone's cached discovery results.
#[derive(Debug, Clone)]
pub struct Session {
    client: AuthenticatedClient,
    cache: Arc<EndpointCache>,
}

impl From<AuthenticatedClient> for Session {
    fn from(value: AuthenticatedClient) -> Session {
        Session {
            client: value,
            cache: Arc::new(EndpointCache::new()),
        }
    }
}

impl Session {
    /// Create a session on top of the given authentication.
    ///
    /// The authentication is verified first. Endpoint filters start out
    /// empty, which normally selects the public interface.
    pub async fn new<Auth: AuthType + 'static>(auth_type: Auth) -> Result<Session, Error> {
        let client = AuthenticatedClient::new(Client::new(), auth_type).await?;
        Ok(Session::from(client))
    }

    /// Create a session from environment variables.
    ///
    /// See [config](config/index.html) for the recognized variables.
    #[inline]
    pub async fn from_env() -> Result<Session, Error> {
        config::from_env().await
    }

    /// The authentication type this session uses.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.client.auth_type()
    }

    /// The authenticated client backing this session.
    #[inline]
    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    /// Endpoint filters for this session.
    #[inline]
    pub fn endpoint_filters(&self) -> &EndpointFilters {
        &self.cache.filters
    }

    /// Mutable access to the endpoint filters.
    ///
    /// Drops the cached discovery results of this `Session` (but not of its
    /// clones).
    #[inline]
    pub fn endpoint_filters_mut(&mut self) -> &mut EndpointFilters {
        let cache = Arc::make_mut(&mut self.cache);
        cache.clear();
        &mut cache.filters
    }

    /// Re-validate the authentication and drop cached discovery results.
    ///
    /// # Warning
    ///
    /// Since clones share the authentication object, they observe the
    /// refreshed authentication as well.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        Arc::make_mut(&mut self.cache).clear();
        self.client.refresh().await
    }

    /// Replace the authentication of this `Session`.
    ///
    /// Drops the cached discovery results of this `Session` (but not of its
    /// clones).
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        Arc::make_mut(&mut self.cache).clear();
        self.client.set_auth_type(auth_type);
    }

    /// Force the given endpoint for a service, bypassing the catalog.
    ///
    /// Drops the cached discovery results of this `Session` (but not of its
    /// clones).
    pub fn set_endpoint_override<S: Into<String>>(&mut self, service_type: S, path: Url) {
        let cache = Arc::make_mut(&mut self.cache);
        cache.clear();
        let _ = cache.overrides.insert(service_type.into(), path);
    }

    /// Builder form of [set_auth_type](#method.set_auth_type).
    #[inline]
    pub fn with_auth_type<Auth: AuthType + 'static>(mut self, auth_type: Auth) -> Session {
        self.set_auth_type(auth_type);
        self
    }

    /// Builder form of a filter replacement.
    #[inline]
    pub fn with_endpoint_filters(mut self, endpoint_filters: EndpointFilters) -> Session {
        *self.endpoint_filters_mut() = endpoint_filters;
        self
    }

    /// Builder form of [set_endpoint_override](#method.set_endpoint_override).
    #[inline]
    pub fn with_endpoint_override<S: Into<String>>(mut self, service_type: S, path: Url) -> Session {
        self.set_endpoint_override(service_type, path);
        self
    }

    /// The range of API microversions the service accepts.
    ///
    /// `None` means the service did not report a range, i.e. it does not do
    /// microversioning at all.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscompute::Error> {
    /// let session = oscompute::Session::from_env().await?;
    /// if let Some((min, max)) = session
    ///     .get_api_versions(oscompute::services::COMPUTE)
    ///     .await?
    /// {
    ///     println!("The compute service supports versions {} to {}", min, max);
    /// } else {
    ///     println!("The compute service does not support microversioning");
    /// }
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    pub async fn get_api_versions<Srv: ServiceType + Send>(
        &self,
        service: Srv,
    ) -> Result<Option<(ApiVersion, ApiVersion)>, Error> {
        self.cache
            .with_service_info(&self.client, service, |info| {
                match (info.minimum_version, info.current_version) {
                    (Some(min), Some(max)) => Some((min, max)),
                    _ => None,
                }
            })
            .await
    }

    /// Build a full URL for the given service and path.
    ///
    /// Mostly useful for diagnostics; the `request` family of calls resolves
    /// endpoints on its own.
    pub async fn get_endpoint<Srv, I>(&self, service: Srv, path: I) -> Result<Url, Error>
    where
        Srv: ServiceType + Send,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        let path_iter = path.into_iter();
        self.cache
            .with_service_info(&self.client, service, |info| {
                url::extend(info.root_url.clone(), path_iter)
            })
            .await
    }

    /// The major API version the discovered endpoint speaks.
    ///
    /// `None` when the endpoint did not report one.
    pub async fn get_major_version<Srv: ServiceType + Send>(
        &self,
        service: Srv,
    ) -> Result<Option<ApiVersion>, Error> {
        self.cache
            .with_service_info(&self.client, service, |info| info.major_version)
            .await
    }

    /// Out of `versions`, pick the highest one the service accepts.
    ///
    /// `None` when the service accepts none of them.
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscompute::Error> {
    /// let session = oscompute::Session::from_env().await?;
    /// let candidates = vec![oscompute::ApiVersion(2, 2), oscompute::ApiVersion(2, 42)];
    /// if let Some(version) = session
    ///     .pick_api_version(oscompute::services::COMPUTE, candidates)
    ///     .await?
    /// {
    ///     println!("Using version {}", version);
    /// } else {
    ///     println!("Using the base version");
    /// }
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    pub async fn pick_api_version<Srv, I>(
        &self,
        service: Srv,
        versions: I,
    ) -> Result<Option<ApiVersion>, Error>
    where
        Srv: ServiceType + Send,
        I: IntoIterator<Item = ApiVersion>,
        I::IntoIter: Send,
    {
        let vers = versions.into_iter();
        if vers.size_hint().1 == Some(0) {
            return Ok(None);
        }
        self.cache
            .with_service_info(&self.client, service, |info| {
                vers.filter(|item| info.supports_api_version(*item)).max()
            })
            .await
    }

    /// Whether the service accepts the given API version.
    pub async fn supports_api_version<Srv: ServiceType + Send>(
        &self,
        service: Srv,
        version: ApiVersion,
    ) -> Result<bool, Error> {
        self.cache
            .with_service_info(&self.client, service, |info| {
                info.supports_api_version(version)
            })
            .await
    }

    /// Start an HTTP request against the given service.
    ///
    /// `service` implements [ServiceType](services/trait.ServiceType.html);
    /// the known services live in the [services](services/index.html) module.
    /// `path` is relative to the discovered endpoint, e.g.
    /// `&["servers", "1234"]`.
    ///
    /// The resulting `RequestBuilder` can be customized further, e.g. with an
    /// API version or a JSON body, before it is sent:
    ///
    /// ```rust,no_run
    /// # async fn example() -> Result<(), oscompute::Error> {
    /// use reqwest::Method;
    ///
    /// let session = oscompute::Session::from_env().await?;
    /// let response = session
    ///     .request(oscompute::services::COMPUTE, Method::HEAD, &["servers", "1234"])
    ///     .await?
    ///     .send()
    ///     .await?;
    /// println!("Response: {:?}", response);
    /// # Ok(()) }
    /// # #[tokio::main]
    /// # async fn main() { example().await.unwrap(); }
    /// ```
    ///
    /// The `get`, `post`, `put` and `delete` shorthands below cover the
    /// common methods.
    pub async fn request<Srv, I>(
        &self,
        service: Srv,
        method: Method,
        path: I,
    ) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Send + Clone,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        let url = self.get_endpoint(service.clone(), path).await?;
        trace!("Starting a {} request to {}", method, url);
        Ok(self.client.start_request(service, method, url))
    }

    /// Shorthand for [request](#method.request) with `Method::GET`.
    #[inline]
    pub async fn get<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Send + Clone,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        self.request(service, Method::GET, path).await
    }

    /// Shorthand for [request](#method.request) with `Method::POST`.
    #[inline]
    pub async fn post<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Send + Clone,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        self.request(service, Method::POST, path).await
    }

    /// Shorthand for [request](#method.request) with `Method::PUT`.
    #[inline]
    pub async fn put<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Send + Clone,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        self.request(service, Method::PUT, path).await
    }

    /// Shorthand for [request](#method.request) with `Method::DELETE`.
    #[inline]
    pub async fn delete<Srv, I>(&self, service: Srv, path: I) -> Result<RequestBuilder<Srv>, Error>
    where
        Srv: ServiceType + Send + Clone,
        I: IntoIterator,
        I::Item: AsRef<str>,
        I::IntoIter: Send,
    {
        self.request(service, Method::DELETE, path).await
    }
}
