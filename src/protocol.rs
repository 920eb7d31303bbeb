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

//! JSON structures and protocol bits for version discovery.

use log::{debug, trace, warn};
use reqwest::{Method, Url};
use serde::Deserialize;

use super::client::AuthenticatedClient;
use super::common::Version;
use super::services::ServiceType;
use super::utils::url;
use super::{ApiVersion, Error, ErrorKind};

/// The document served at a version discovery endpoint.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum Root {
    /// A listing of all major versions (usually served at the bare root).
    MultipleVersions {
        /// All advertised major versions.
        versions: Vec<Version>,
    },
    /// A single major version (served at a versioned URL like `/v2.1`).
    OneVersion {
        /// The advertised version.
        version: Version,
    },
}

/// What version discovery told us about one service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The root URL of the service.
    pub root_url: Url,
    /// Discovered major version.
    pub major_version: Option<ApiVersion>,
    /// Highest microversion the service accepts, if reported.
    pub current_version: Option<ApiVersion>,
    /// Lowest microversion the service accepts, if reported.
    pub minimum_version: Option<ApiVersion>,
}

impl TryFrom<Version> for ServiceInfo {
    type Error = Error;

    fn try_from(value: Version) -> Result<ServiceInfo, Error> {
        let self_link = value
            .links
            .into_iter()
            .find(|link| link.rel == "self")
            .ok_or_else(|| {
                Error::new(ErrorKind::InvalidResponse, "version entry has no self link")
            })?;

        Ok(ServiceInfo {
            root_url: self_link.href,
            major_version: Some(value.id),
            current_version: value.version,
            minimum_version: value.min_version,
        })
    }
}

impl Root {
    /// Fetch a version discovery document from the URL.
    pub async fn fetch(
        catalog_type: &'static str,
        client: &AuthenticatedClient,
        endpoint: Url,
    ) -> Result<Root, Error> {
        debug!("Discovering {} versions at {}", catalog_type, endpoint);
        client.request(Method::GET, endpoint).fetch_json().await
    }

    /// Pick a suitable version out of the discovery document.
    pub fn into_service_info<Srv: ServiceType>(self, service: &Srv) -> Result<ServiceInfo, Error> {
        trace!(
            "Version discovery for {} returned {:?}",
            service.catalog_type(),
            self
        );

        match self {
            Root::OneVersion { version } => {
                if !service.major_version_supported(version.id) {
                    return Err(Error::new(
                        ErrorKind::EndpointNotFound,
                        format!("major version {} is not supported", version.id),
                    ));
                }
                if !version.is_stable() {
                    warn!(
                        "The only advertised version {} of the {} API is not stable",
                        version.id,
                        service.catalog_type()
                    );
                }
                version.try_into()
            }
            Root::MultipleVersions { versions } => versions
                .into_iter()
                .filter(|ver| ver.is_stable() && service.major_version_supported(ver.id))
                .max_by_key(|ver| ver.id)
                .ok_or_else(|| Error::new_endpoint_not_found(service.catalog_type()))
                .and_then(ServiceInfo::try_from),
        }
    }
}

impl ServiceInfo {
    /// Whether the service accepts the given API microversion.
    ///
    /// `false` when the supported range cannot be determined.
    #[inline]
    pub fn supports_api_version(&self, version: ApiVersion) -> bool {
        match (self.minimum_version, self.current_version) {
            (Some(min), Some(current)) => (min..=current).contains(&version),
            (None, Some(current)) => version == current,
            (Some(min), None) => version >= min,
            (None, None) => false,
        }
    }

    /// Fetch the service information from the endpoint.
    ///
    /// Tries the endpoint itself first, then walks up to its parents on
    /// HTTP 404: many clouds put versioned URLs like `/v2.1` in the catalog
    /// while the discovery document lives at the root.
    pub async fn fetch<Srv: ServiceType>(
        service: Srv,
        client: &AuthenticatedClient,
        mut endpoint: Url,
    ) -> Result<ServiceInfo, Error> {
        let catalog_type = service.catalog_type();
        if !service.version_discovery_supported() {
            debug!(
                "Service {} is not versioned, taking {} as its root",
                catalog_type, endpoint
            );
            return Ok(ServiceInfo {
                root_url: endpoint,
                major_version: None,
                current_version: None,
                minimum_version: None,
            });
        }

        // Workaround for old versions of Nova returning HTTP endpoints even
        // if accessed via HTTPS.
        let secure = endpoint.scheme() == "https";

        let root = loop {
            match Root::fetch(catalog_type, client, endpoint.clone()).await {
                Ok(root) => break root,
                Err(e) if e.kind() == ErrorKind::ResourceNotFound => {
                    if url::is_root(&endpoint) {
                        return Err(Error::new_endpoint_not_found(catalog_type));
                    }
                    debug!("Got HTTP 404 from {}, trying a parent endpoint", endpoint);
                    endpoint = url::pop(endpoint, true);
                }
                Err(e) => return Err(e),
            }
        };

        let mut info = root.into_service_info(&service)?;
        if secure && info.root_url.scheme() == "http" {
            // The scheme is only changed between two special schemes, which
            // cannot fail.
            info.root_url.set_scheme("https").unwrap();
        }

        debug!("Using {:?} for the {} service", info, catalog_type);
        Ok(info)
    }
}
