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

//! Filtering of catalog endpoints.

use std::fmt;
use std::str::FromStr;

use crate::catalog::Endpoint;

use super::{Error, ErrorKind};

/// The API interface of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InterfaceType {
    /// The publicly reachable interface (the default).
    #[default]
    Public,
    /// The cloud-internal interface.
    Internal,
    /// The administrative interface.
    Admin,
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        let name = match self {
            InterfaceType::Public => "public",
            InterfaceType::Internal => "internal",
            InterfaceType::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl FromStr for InterfaceType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" | "publicURL" => Ok(InterfaceType::Public),
            "internal" | "internalURL" => Ok(InterfaceType::Internal),
            "admin" | "adminURL" => Ok(InterfaceType::Admin),
            other => Err(Error::new(
                ErrorKind::InvalidInput,
                format!("unknown interface type: {}", other),
            )),
        }
    }
}

impl<T> PartialEq<T> for InterfaceType
where
    T: AsRef<str>,
{
    fn eq(&self, other: &T) -> bool {
        match InterfaceType::from_str(other.as_ref()) {
            Ok(parsed) => parsed == *self,
            Err(..) => false,
        }
    }
}

/// Criteria for selecting an endpoint from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct EndpointFilters {
    /// Acceptable endpoint interfaces in the priority order.
    ///
    /// An empty list accepts any interface.
    pub interfaces: Vec<InterfaceType>,
    /// Cloud region.
    pub region: Option<String>,
}

impl Default for EndpointFilters {
    /// Defaults to the public interface and no region.
    fn default() -> EndpointFilters {
        EndpointFilters {
            interfaces: vec![InterfaceType::Public],
            region: None,
        }
    }
}

impl EndpointFilters {
    /// Build filters from an interface list and a region.
    pub fn new<I, S>(interfaces: I, region: S) -> EndpointFilters
    where
        I: IntoIterator<Item = InterfaceType>,
        S: Into<String>,
    {
        let mut filters = EndpointFilters::default();
        filters.set_interfaces(interfaces);
        filters.set_region(region);
        filters
    }

    /// Whether the endpoint satisfies these filters.
    pub fn check(&self, endpoint: &Endpoint) -> bool {
        self.interface_priority(&endpoint.interface).is_some() && self.check_region(endpoint)
    }

    /// Set one or more acceptable interfaces.
    #[inline]
    pub fn set_interfaces<I: IntoIterator<Item = InterfaceType>>(&mut self, value: I) {
        self.interfaces = value.into_iter().collect();
    }

    /// Builder twin of [set_interfaces](#method.set_interfaces).
    #[inline]
    pub fn with_interfaces<I: IntoIterator<Item = InterfaceType>>(mut self, value: I) -> Self {
        self.set_interfaces(value);
        self
    }

    /// Set the region.
    #[inline]
    pub fn set_region<T: Into<String>>(&mut self, value: T) {
        self.region = Some(value.into());
    }

    /// Builder twin of [set_region](#method.set_region).
    #[inline]
    pub fn with_region<T: Into<String>>(mut self, value: T) -> Self {
        self.set_region(value);
        self
    }

    /// Position of the interface in the priority list, if acceptable.
    ///
    /// With an empty interface list every interface matches with the same
    /// priority.
    pub(crate) fn interface_priority(&self, interface: &str) -> Option<usize> {
        if self.interfaces.is_empty() {
            return Some(0);
        }
        self.interfaces.iter().position(|x| x == &interface)
    }

    pub(crate) fn check_region(&self, endpoint: &Endpoint) -> bool {
        match self.region {
            Some(ref region) => endpoint.region == *region,
            None => true,
        }
    }
}
