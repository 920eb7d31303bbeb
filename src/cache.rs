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

//! Caching of discovered service information.

use std::collections::HashMap;

use log::debug;
use reqwest::Url;
use tokio::sync::RwLock;

use super::client::AuthenticatedClient;
use super::protocol::ServiceInfo;
use super::services::ServiceType;
use super::{EndpointFilters, Error, ErrorKind};

/// A cache of per-service discovery results.
///
/// Holds the endpoint filters and overrides as well, since changing either
/// of them invalidates everything already discovered.
#[derive(Debug)]
pub struct EndpointCache {
    pub filters: EndpointFilters,
    pub overrides: HashMap<String, Url>,
    info: RwLock<HashMap<&'static str, ServiceInfo>>,
}

impl Clone for EndpointCache {
    /// Cloning keeps the filters and overrides but starts with an empty cache.
    fn clone(&self) -> EndpointCache {
        EndpointCache {
            filters: self.filters.clone(),
            overrides: self.overrides.clone(),
            info: RwLock::new(HashMap::new()),
        }
    }
}

impl EndpointCache {
    /// An empty cache with default filters.
    #[inline]
    pub fn new() -> Self {
        EndpointCache {
            filters: EndpointFilters::default(),
            overrides: HashMap::new(),
            info: RwLock::new(HashMap::new()),
        }
    }

    #[cfg(test)]
    pub fn prefilled(service_type: &'static str, service_info: ServiceInfo) -> Self {
        let cache = EndpointCache::new();
        let _ = cache
            .info
            .try_write()
            .unwrap()
            .insert(service_type, service_info);
        cache
    }

    /// Forget everything discovered so far.
    #[inline]
    pub fn clear(&mut self) {
        self.info = RwLock::new(HashMap::new());
    }

    fn endpoint_from_overrides(&self, catalog_type: &str) -> Option<Url> {
        self.overrides.get(catalog_type).cloned()
    }

    /// Run `inspect` over the service information, discovering it first if needed.
    pub async fn with_service_info<Srv, F, T>(
        &self,
        client: &AuthenticatedClient,
        service: Srv,
        inspect: F,
    ) -> Result<T, Error>
    where
        Srv: ServiceType + Send,
        F: FnOnce(&ServiceInfo) -> T + Send,
        T: Send,
    {
        let catalog_type = service.catalog_type();
        {
            let cached = self.info.read().await;
            if let Some(info) = cached.get(catalog_type) {
                return Ok(inspect(info));
            }
        }

        debug!("Running discovery for service {}", catalog_type);

        let mut guard = self.info.write().await;
        // Another task may have finished discovery while we were waiting
        // for the write lock.
        if let Some(info) = guard.get(catalog_type) {
            return Ok(inspect(info));
        }

        let endpoint = match self.endpoint_from_overrides(catalog_type) {
            Some(forced) => forced,
            None => client.get_endpoint(catalog_type, &self.filters).await?,
        };
        if !endpoint.has_host() || endpoint.cannot_be_a_base() {
            return Err(Error::new(
                ErrorKind::InvalidResponse,
                format!(
                    "Service {} has an unusable endpoint {}",
                    catalog_type, endpoint
                ),
            ));
        }

        let info = ServiceInfo::fetch(service, client, endpoint).await?;
        let result = inspect(&info);
        let _ = guard.insert(catalog_type, info);
        Ok(result)
    }
}
