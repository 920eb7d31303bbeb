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

//! Descriptors for the services a cloud exposes.

use http::{HeaderName, HeaderValue};

use super::ApiVersion;

/// A kind of service the client knows how to talk to.
pub trait ServiceType {
    /// The service type as recorded in the catalog.
    fn catalog_type(&self) -> &'static str;

    /// Whether a major version advertised via discovery is usable.
    fn major_version_supported(&self, _version: ApiVersion) -> bool {
        true
    }

    /// Whether the service serves a version discovery document.
    fn version_discovery_supported(&self) -> bool {
        true
    }
}

/// Trait representing a service with API version support.
pub trait VersionedService: ServiceType {
    /// Get the API version header for this service.
    fn get_version_header(&self, version: ApiVersion) -> (HeaderName, HeaderValue);
}

/// A major version selector.
#[derive(Copy, Clone, Debug)]
pub enum VersionSelector {
    /// Match the major component.
    Major(u16),
    /// Match the full version.
    ///
    /// Some services have a minor component in their major versions, e.g. 2.1.
    Exact(ApiVersion),
    /// A range of major versions.
    Range(ApiVersion, ApiVersion),
    /// Any major version.
    Any,
}

impl VersionSelector {
    pub(crate) fn matches(&self, version: ApiVersion) -> bool {
        match self {
            VersionSelector::Major(major) => version.0 == *major,
            VersionSelector::Exact(exact) => version == *exact,
            VersionSelector::Range(v1, v2) => *v1 <= version && version <= *v2,
            VersionSelector::Any => true,
        }
    }
}

/// A service described only by its catalog type and accepted major versions.
#[derive(Copy, Clone, Debug)]
pub struct GenericService {
    catalog_type: &'static str,
    major_version: VersionSelector,
}

impl GenericService {
    /// Describe a service, usable in `const` context.
    pub const fn new(catalog_type: &'static str, versions: VersionSelector) -> GenericService {
        GenericService {
            catalog_type,
            major_version: versions,
        }
    }
}

impl ServiceType for GenericService {
    fn major_version_supported(&self, version: ApiVersion) -> bool {
        self.major_version.matches(version)
    }

    fn catalog_type(&self) -> &'static str {
        self.catalog_type
    }
}

/// The Compute service.
#[derive(Copy, Clone, Debug)]
pub struct ComputeService(());

impl ComputeService {
    /// The constructor, usable in `const` context.
    pub const fn new() -> ComputeService {
        ComputeService(())
    }
}

impl ServiceType for ComputeService {
    fn major_version_supported(&self, version: ApiVersion) -> bool {
        matches!(version, ApiVersion(2, _))
    }

    fn catalog_type(&self) -> &'static str {
        "compute"
    }
}

impl VersionedService for ComputeService {
    fn get_version_header(&self, version: ApiVersion) -> (HeaderName, HeaderValue) {
        // TODO: new-style OpenStack-API-Version header support
        (
            HeaderName::from_static("x-openstack-nova-api-version"),
            version.into(),
        )
    }
}

/// The singleton describing the Compute service.
pub const COMPUTE: ComputeService = ComputeService::new();
