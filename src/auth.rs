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

//! Pluggable authentication.

use std::fmt::Debug;

use async_trait::async_trait;
use http::header::HeaderValue;
use reqwest::{Client, RequestBuilder, Url};
use static_assertions::{assert_impl_all, assert_obj_safe};

use super::catalog::{self, CatalogRecord};
use super::{EndpointFilters, Error, ErrorKind};

/// An authentication mechanism.
///
/// Two responsibilities: attach credentials to an outgoing request and
/// resolve a service type to an endpoint URL.
///
/// Credential lifecycle belongs to the mechanism: `refresh` is invoked once
/// when a `Session` is created, and callers may invoke it again at any point.
#[async_trait]
pub trait AuthType: Debug + Sync + Send {
    /// Attach credentials to an outgoing request.
    async fn authenticate(
        &self,
        client: &Client,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, Error>;

    /// Resolve the root endpoint of the given service.
    async fn get_endpoint(
        &self,
        client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error>;

    /// Renew the credentials if the mechanism supports that.
    async fn refresh(&self, client: &Client) -> Result<(), Error>;
}

assert_obj_safe!(AuthType);

/// Unauthenticated access.
///
/// Requests go out as-is, and every service type resolves to one fixed
/// endpoint:
/// ```rust,no_run
/// # async fn example() -> Result<(), oscompute::Error> {
/// let auth = oscompute::NoAuth::new("https://cloud.local/compute")?;
/// let session = oscompute::Session::new(auth).await?;
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
#[derive(Debug, Clone)]
pub struct NoAuth {
    endpoint: Option<Url>,
}

assert_impl_all!(NoAuth: Send, Sync);

impl NoAuth {
    /// Create unauthenticated access to a fixed endpoint.
    ///
    /// Every `get_endpoint` call, whatever the service type, yields this URL.
    #[inline]
    pub fn new<U>(endpoint: U) -> Result<NoAuth, Error>
    where
        U: AsRef<str>,
    {
        let endpoint = parse_endpoint(endpoint.as_ref())?;
        Ok(NoAuth {
            endpoint: Some(endpoint),
        })
    }

    /// Create unauthenticated access without any endpoint.
    ///
    /// Endpoint resolution always fails, so the result is only usable
    /// together with endpoint overrides.
    #[inline]
    pub fn without_endpoint() -> NoAuth {
        NoAuth { endpoint: None }
    }
}

#[async_trait]
impl AuthType for NoAuth {
    /// Pass the request through unchanged.
    async fn authenticate(
        &self,
        _client: &Client,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        Ok(builder)
    }

    /// Return the fixed endpoint regardless of the service type.
    async fn get_endpoint(
        &self,
        _client: &Client,
        service_type: &str,
        _filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        match self.endpoint {
            Some(ref endpoint) => Ok(endpoint.clone()),
            None => Err(Error::new(
                ErrorKind::EndpointNotFound,
                format!(
                    "no-op authentication has no endpoint, set an override for {}",
                    service_type
                ),
            )),
        }
    }

    /// There is nothing to refresh.
    async fn refresh(&self, _client: &Client) -> Result<(), Error> {
        Ok(())
    }
}

/// Authentication with a pre-issued token.
///
/// Sends the token in the `X-Auth-Token` header of every request. The token
/// is static: renewing it (and re-creating the session) when it expires is the
/// caller's concern. The endpoint comes either from a fixed URL:
///
/// ```rust,no_run
/// # async fn example() -> Result<(), oscompute::Error> {
/// let auth = oscompute::TokenAuth::new("https://cloud.local/compute", "gAAAAAB...")?;
/// let session = oscompute::Session::new(auth).await?;
/// # Ok(()) }
/// # #[tokio::main]
/// # async fn main() { example().await.unwrap(); }
/// ```
///
/// or from a static service catalog (e.g. taken from a token issue response),
/// in which case endpoint filters apply - see
/// [new_with_catalog](#method.new_with_catalog).
#[derive(Debug, Clone)]
pub struct TokenAuth {
    token: HeaderValue,
    endpoint: Option<Url>,
    catalog: Vec<CatalogRecord>,
}

assert_impl_all!(TokenAuth: Send, Sync);

const X_AUTH_TOKEN: http::header::HeaderName = http::header::HeaderName::from_static("x-auth-token");

fn parse_endpoint(endpoint: &str) -> Result<Url, Error> {
    Url::parse(endpoint).map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))
}

fn parse_token(token: &str) -> Result<HeaderValue, Error> {
    let mut value = HeaderValue::from_str(token)
        .map_err(|_| Error::new(ErrorKind::InvalidInput, "invalid characters in the token"))?;
    value.set_sensitive(true);
    Ok(value)
}

impl TokenAuth {
    /// Create token authentication with a fixed endpoint.
    ///
    /// Every `get_endpoint` call, whatever the service type, yields this URL.
    pub fn new<U, T>(endpoint: U, token: T) -> Result<TokenAuth, Error>
    where
        U: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(TokenAuth {
            token: parse_token(token.as_ref())?,
            endpoint: Some(parse_endpoint(endpoint.as_ref())?),
            catalog: Vec::new(),
        })
    }

    /// Create token authentication with a service catalog.
    ///
    /// Endpoints are looked up in the catalog by service type, honoring the
    /// session's endpoint filters (interface and region).
    pub fn new_with_catalog<T>(token: T, catalog: Vec<CatalogRecord>) -> Result<TokenAuth, Error>
    where
        T: AsRef<str>,
    {
        if catalog.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "service catalog cannot be empty",
            ));
        }
        Ok(TokenAuth {
            token: parse_token(token.as_ref())?,
            endpoint: None,
            catalog,
        })
    }
}

#[async_trait]
impl AuthType for TokenAuth {
    /// Add the token header to the request.
    async fn authenticate(
        &self,
        _client: &Client,
        builder: RequestBuilder,
    ) -> Result<RequestBuilder, Error> {
        Ok(builder.header(X_AUTH_TOKEN, self.token.clone()))
    }

    /// Get an endpoint, either fixed or from the catalog.
    async fn get_endpoint(
        &self,
        _client: &Client,
        service_type: &str,
        filters: &EndpointFilters,
    ) -> Result<Url, Error> {
        match self.endpoint {
            Some(ref endpoint) => Ok(endpoint.clone()),
            None => catalog::resolve_url(&self.catalog, service_type, filters),
        }
    }

    /// There is nothing to refresh, the token is static.
    async fn refresh(&self, _client: &Client) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
pub mod test {
    use reqwest::Client;

    use super::super::catalog::test::demo_catalog;
    use super::super::{EndpointFilters, ErrorKind, InterfaceType};
    use super::{AuthType, NoAuth, TokenAuth};

    #[test]
    fn test_noauth_new() {
        let auth = NoAuth::new("http://192.0.2.10:8774/v2.1").unwrap();
        let endpoint = auth.endpoint.unwrap();
        assert_eq!(endpoint.as_str(), "http://192.0.2.10:8774/v2.1");
        assert_eq!(endpoint.port(), Some(8774));
    }

    #[test]
    fn test_noauth_new_fail() {
        let err = NoAuth::new("not a url").err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_noauth_get_endpoint() {
        let auth = NoAuth::new("http://192.0.2.10:8774/v2.1").unwrap();
        let endpoint = auth
            .get_endpoint(&Client::new(), "compute", &Default::default())
            .await
            .unwrap();
        assert_eq!(endpoint.as_str(), "http://192.0.2.10:8774/v2.1");
    }

    #[tokio::test]
    async fn test_noauth_without_endpoint() {
        let auth = NoAuth::without_endpoint();
        let err = auth
            .get_endpoint(&Client::new(), "compute", &Default::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }

    #[tokio::test]
    async fn test_token_auth_header() {
        let auth = TokenAuth::new("http://127.0.0.1:8080/v1", "secret-token").unwrap();
        let client = Client::new();
        let rb = auth
            .authenticate(&client, client.get("http://127.0.0.1:8080/v1"))
            .await
            .unwrap();
        let req = rb.build().unwrap();
        assert_eq!(req.headers()["x-auth-token"], "secret-token");
    }

    #[test]
    fn test_token_auth_invalid_token() {
        let err = TokenAuth::new("http://127.0.0.1:8080/v1", "bad\ntoken")
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_token_auth_fixed_endpoint() {
        let auth = TokenAuth::new("http://127.0.0.1:8080/v1", "secret").unwrap();
        let endpoint = auth
            .get_endpoint(&Client::new(), "compute", &Default::default())
            .await
            .unwrap();
        assert_eq!(endpoint.as_str(), "http://127.0.0.1:8080/v1");
    }

    #[tokio::test]
    async fn test_token_auth_catalog() {
        let auth = TokenAuth::new_with_catalog("secret", demo_catalog()).unwrap();
        let client = Client::new();

        let endpoint = auth
            .get_endpoint(&client, "compute", &Default::default())
            .await
            .unwrap();
        assert_eq!(endpoint.as_str(), "https://host.one/compute");

        let filters = EndpointFilters::new([InterfaceType::Public], "RegionTwo");
        let endpoint = auth.get_endpoint(&client, "compute", &filters).await.unwrap();
        assert_eq!(endpoint.as_str(), "https://host.two:8774/");

        let err = auth
            .get_endpoint(&client, "baremetal", &Default::default())
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::EndpointNotFound);
    }

    #[test]
    fn test_token_auth_empty_catalog() {
        let err = TokenAuth::new_with_catalog("secret", Vec::new()).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
