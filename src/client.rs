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

//! Low-level HTTP client with authentication attached.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Error as HttpError;
use log::trace;
use reqwest::{Body, Client, Method, Request, RequestBuilder as ReqwestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use super::services::VersionedService;
use super::{ApiVersion, AuthType, EndpointFilters, Error};

/// An HTTP client that runs every request through an [AuthType](trait.AuthType.html).
///
/// Cheap to clone: the authentication state is behind an `Arc` and is shared
/// between all clones.
#[derive(Debug, Clone)]
pub struct AuthenticatedClient {
    auth: Arc<dyn AuthType>,
    client: Client,
}

assert_eq_size!(AuthenticatedClient, Option<AuthenticatedClient>);

impl AuthenticatedClient {
    /// Create an authenticated client, verifying the credentials first.
    pub async fn new<Auth: AuthType + 'static>(
        client: Client,
        auth_type: Auth,
    ) -> Result<AuthenticatedClient, Error> {
        auth_type.refresh(&client).await?;
        Ok(AuthenticatedClient::from_parts(client, Arc::new(auth_type)))
    }

    #[inline]
    pub(crate) fn from_parts(client: Client, auth: Arc<dyn AuthType>) -> AuthenticatedClient {
        AuthenticatedClient { auth, client }
    }

    /// The authentication type this client uses.
    #[inline]
    pub fn auth_type(&self) -> &dyn AuthType {
        self.auth.as_ref()
    }

    async fn authenticate(&self, request: ReqwestBuilder) -> Result<Request, Error> {
        let authenticated = self.auth.authenticate(&self.client, request).await?;
        authenticated.build().map_err(Error::from)
    }

    /// Find an endpoint for the given service type, subject to `filters`.
    #[inline]
    pub async fn get_endpoint(
        &self,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        self.auth
            .get_endpoint(&self.client, service_type, filters)
            .await
    }

    /// The underlying `reqwest` client without authentication.
    #[inline]
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Re-validate or re-fetch the authentication.
    ///
    /// Affects all clones of this client as well: they share the
    /// authentication object.
    #[inline]
    pub async fn refresh(&mut self) -> Result<(), Error> {
        self.auth.refresh(&self.client).await
    }

    /// Replace the authentication.
    #[inline]
    pub fn set_auth_type<Auth: AuthType + 'static>(&mut self, auth_type: Auth) {
        self.auth = Arc::new(auth_type);
    }

    /// Replace the underlying `reqwest` client.
    #[inline]
    pub fn set_inner(&mut self, client: Client) {
        self.client = client;
    }

    /// Begin an authenticated request to the given URL.
    #[inline]
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.start_request((), method, url)
    }

    /// Begin an authenticated request tagged with a service marker.
    pub(crate) fn start_request<S>(
        &self,
        service: S,
        method: Method,
        url: Url,
    ) -> RequestBuilder<S> {
        RequestBuilder {
            client: self.clone(),
            inner: self.client.request(method, url),
            service,
        }
    }

    #[cfg(test)]
    pub(crate) fn new_noauth() -> AuthenticatedClient {
        use super::NoAuth;
        AuthenticatedClient::from_parts(Client::new(), Arc::new(NoAuth::without_endpoint()))
    }
}

impl From<AuthenticatedClient> for Client {
    #[inline]
    fn from(value: AuthenticatedClient) -> Client {
        value.client
    }
}

/// A request builder that knows how to authenticate and check responses.
///
/// The type parameter `S` is a service marker; for versioned services it
/// unlocks [api_version](#method.api_version).
#[derive(Debug)]
#[must_use = "a request does nothing until it is sent"]
pub struct RequestBuilder<S = ()> {
    client: AuthenticatedClient,
    inner: ReqwestBuilder,
    service: S,
}

// Errors come wrapped in an envelope keyed by the fault kind, e.g.
// {"itemNotFound": {"code": 404, "message": "..."}}. Identity errors use
// a "title" field instead of "message".
#[derive(Debug, Deserialize)]
struct Fault {
    message: Option<String>,
    title: Option<String>,
}

impl Fault {
    fn into_message(self) -> Option<String> {
        self.message.or(self.title)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FaultBody {
    Wrapped(HashMap<String, Fault>),
    Bare(Fault),
}

fn fault_message(text: String) -> String {
    let parsed = serde_json::from_str::<FaultBody>(&text).ok();
    match parsed {
        Some(FaultBody::Wrapped(map)) => map.into_values().next().and_then(Fault::into_message),
        Some(FaultBody::Bare(fault)) => fault.into_message(),
        None => None,
    }
    .unwrap_or(text)
}

/// Check a response for success, converting an error body into an [Error].
pub async fn check(response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let message = fault_message(response.text().await?);
        trace!("Request failed with {}: {}", status, message);
        Err(Error::new(status.into(), message).with_status(status))
    } else {
        trace!("Request to {} succeeded with {}", response.url(), status);
        Ok(response)
    }
}

impl<S> RequestBuilder<S> {
    #[inline]
    fn map<F>(self, f: F) -> RequestBuilder<S>
    where
        F: FnOnce(ReqwestBuilder) -> ReqwestBuilder,
    {
        RequestBuilder {
            inner: f(self.inner),
            ..self
        }
    }

    /// Attach a request body.
    pub fn body<T: Into<Body>>(self, body: T) -> RequestBuilder<S> {
        self.map(|inner| inner.body(body))
    }

    /// Append one header.
    pub fn header<K, V>(self, key: K, value: V) -> RequestBuilder<S>
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        self.map(|inner| inner.header(key, value))
    }

    /// Append several headers at once.
    pub fn headers(self, headers: HeaderMap) -> RequestBuilder<S> {
        self.map(|inner| inner.headers(headers))
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(self, json: &T) -> RequestBuilder<S> {
        self.map(|inner| inner.json(json))
    }

    /// Append a query string.
    pub fn query<T: Serialize + ?Sized>(self, query: &T) -> RequestBuilder<S> {
        self.map(|inner| inner.query(query))
    }

    /// Override the client-wide timeout for this request only.
    pub fn timeout(self, timeout: Duration) -> RequestBuilder<S> {
        self.map(|inner| inner.timeout(timeout))
    }

    /// Send the request and deserialize the response body as JSON.
    pub async fn fetch_json<T>(self) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        self.send().await?.json::<T>().await.map_err(Error::from)
    }

    /// Send the request, failing on error responses.
    pub async fn send(self) -> Result<Response, Error> {
        check(self.send_unchecked().await?).await
    }

    /// Send the request without inspecting the response status.
    pub async fn send_unchecked(self) -> Result<Response, Error> {
        let request = self.client.authenticate(self.inner).await?;
        trace!("Issuing HTTP {} to {}", request.method(), request.url());
        self.client
            .client
            .execute(request)
            .await
            .map_err(Error::from)
    }
}

impl<S> RequestBuilder<S>
where
    S: VersionedService,
{
    /// Request the given API microversion via the service's version header.
    pub fn api_version<A: Into<ApiVersion>>(self, version: A) -> RequestBuilder<S> {
        let (name, value) = self.service.get_version_header(version.into());
        self.map(|inner| inner.header(name, value))
    }

    /// In-place form of [api_version](#method.api_version).
    pub fn set_api_version<A: Into<ApiVersion>>(&mut self, version: A) {
        take_mut::take(self, |rb| rb.api_version(version));
    }
}

#[cfg(test)]
mod test_request_builder {
    use http::Method;
    use reqwest::Url;

    use super::super::services;
    use super::AuthenticatedClient;

    #[test]
    fn test_api_version() {
        let rb = AuthenticatedClient::new_noauth()
            .start_request(
                services::COMPUTE,
                Method::GET,
                Url::parse("http://127.0.0.1").unwrap(),
            )
            .api_version((2, 42));
        let req = rb.inner.build().unwrap();
        let hdr = req.headers().get("x-openstack-nova-api-version").unwrap();
        assert_eq!(hdr.to_str().unwrap(), "2.42");
    }

    #[test]
    fn test_set_api_version() {
        let mut rb = AuthenticatedClient::new_noauth().start_request(
            services::COMPUTE,
            Method::GET,
            Url::parse("http://127.0.0.1").unwrap(),
        );
        rb.set_api_version((2, 42));
        let req = rb.inner.build().unwrap();
        let hdr = req.headers().get("x-openstack-nova-api-version").unwrap();
        assert_eq!(hdr.to_str().unwrap(), "2.42");
    }
}
