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

//! Service catalog records and endpoint lookup.

use log::debug;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::{EndpointFilters, Error};

/// An endpoint of a catalog service.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Endpoint {
    /// Endpoint interface: `public`, `internal` or `admin`.
    pub interface: String,
    /// Region of the endpoint.
    #[serde(default)]
    pub region: String,
    /// The URL to use for API calls.
    pub url: Url,
}

/// A service catalog entry: one service with its endpoints.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CatalogRecord {
    /// Service type, e.g. `compute`.
    #[serde(rename = "type")]
    pub service_type: String,
    /// Service name, e.g. `nova`.
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoints of the service.
    pub endpoints: Vec<Endpoint>,
}

/// Look up an endpoint in the catalog.
///
/// When several endpoints match the filters, the one with the most preferred
/// interface wins.
pub fn find_endpoint<'c>(
    catalog: &'c [CatalogRecord],
    service_type: &str,
    filters: &EndpointFilters,
) -> Result<&'c Endpoint, Error> {
    let record = catalog
        .iter()
        .find(|record| record.service_type == *service_type)
        .ok_or_else(|| Error::new_endpoint_not_found(service_type))?;

    record
        .endpoints
        .iter()
        .filter(|endpoint| filters.check_region(endpoint))
        .filter_map(|endpoint| {
            filters
                .interface_priority(&endpoint.interface)
                .map(|priority| (priority, endpoint))
        })
        .min_by_key(|(priority, _)| *priority)
        .map(|(_, endpoint)| endpoint)
        .ok_or_else(|| Error::new_endpoint_not_found(service_type))
}

/// Look up an endpoint in the catalog and take its URL.
pub fn resolve_url(
    catalog: &[CatalogRecord],
    service_type: &str,
    filters: &EndpointFilters,
) -> Result<Url, Error> {
    let endpoint = find_endpoint(catalog, service_type, filters)?;
    debug!("Selected {:?} for {}", endpoint, service_type);
    Ok(endpoint.url.clone())
}

#[cfg(test)]
pub mod test {
    use super::super::{EndpointFilters, Error, ErrorKind, InterfaceType};
    use super::{CatalogRecord, Endpoint};

    fn endpoint(interface: &str, region: &str, url: &str) -> Endpoint {
        Endpoint {
            interface: String::from(interface),
            region: String::from(region),
            url: url.parse().unwrap(),
        }
    }

    fn compute_service() -> CatalogRecord {
        CatalogRecord {
            service_type: String::from("compute"),
            name: Some(String::from("nova")),
            endpoints: vec![
                endpoint("public", "RegionOne", "https://host.one/compute"),
                endpoint("internal", "RegionOne", "http://192.168.22.1/compute"),
                endpoint("public", "RegionTwo", "https://host.two:8774"),
            ],
        }
    }

    fn image_service() -> CatalogRecord {
        CatalogRecord {
            service_type: String::from("image"),
            name: Some(String::from("glance")),
            endpoints: vec![
                endpoint("public", "RegionOne", "https://host.one/image"),
                endpoint("public", "RegionTwo", "https://host.two:9292"),
            ],
        }
    }

    pub fn demo_catalog() -> Vec<CatalogRecord> {
        vec![compute_service(), image_service()]
    }

    fn find_endpoint<'a>(
        catalog: &'a [CatalogRecord],
        service_type: &str,
        interface: InterfaceType,
        region: Option<&str>,
    ) -> Result<&'a Endpoint, Error> {
        let mut filters = EndpointFilters::default().with_interfaces([interface]);
        if let Some(region) = region {
            filters.set_region(region);
        }
        super::find_endpoint(catalog, service_type, &filters)
    }

    #[test]
    fn test_find_endpoint() {
        let catalog = demo_catalog();

        let e1 = find_endpoint(&catalog, "compute", InterfaceType::Public, None).unwrap();
        assert_eq!(e1.url.as_str(), "https://host.one/compute");

        let e2 = find_endpoint(&catalog, "compute", InterfaceType::Internal, None).unwrap();
        assert_eq!(e2.url.as_str(), "http://192.168.22.1/compute");

        let e3 = find_endpoint(&catalog, "image", InterfaceType::Public, None).unwrap();
        assert_eq!(e3.url.as_str(), "https://host.one/image");
    }

    #[test]
    fn test_find_endpoint_with_region() {
        let catalog = demo_catalog();

        let e1 = find_endpoint(&catalog, "compute", InterfaceType::Public, Some("RegionTwo")).unwrap();
        assert_eq!(e1.url.as_str(), "https://host.two:8774/");

        let e2 = find_endpoint(&catalog, "compute", InterfaceType::Internal, Some("RegionOne")).unwrap();
        assert_eq!(e2.url.as_str(), "http://192.168.22.1/compute");
    }

    #[test]
    fn test_find_endpoint_interface_priority() {
        let catalog = demo_catalog();
        let filters =
            EndpointFilters::default().with_interfaces([InterfaceType::Internal, InterfaceType::Public]);

        let endp = super::find_endpoint(&catalog, "compute", &filters).unwrap();
        assert_eq!(endp.interface, "internal");

        let endp = super::find_endpoint(&catalog, "image", &filters).unwrap();
        assert_eq!(endp.interface, "public");
    }

    fn assert_not_found(result: Result<&Endpoint, Error>) {
        assert_eq!(result.err().unwrap().kind(), ErrorKind::EndpointNotFound);
    }

    #[test]
    fn test_find_endpoint_not_found() {
        let catalog = demo_catalog();

        assert_not_found(find_endpoint(&catalog, "baremetal", InterfaceType::Public, None));
        assert_not_found(find_endpoint(
            &catalog,
            "compute",
            InterfaceType::Public,
            Some("RegionFoo"),
        ));
        assert_not_found(find_endpoint(&catalog, "image", InterfaceType::Internal, None));
        assert_not_found(find_endpoint(
            &catalog,
            "compute",
            InterfaceType::Internal,
            Some("RegionTwo"),
        ));
    }

    #[test]
    fn test_catalog_parse() {
        let catalog: Vec<CatalogRecord> = serde_json::from_str(
            r#"[{
                "type": "compute",
                "name": "nova",
                "endpoints": [{
                    "interface": "public",
                    "region": "RegionOne",
                    "url": "https://host.one/compute"
                }]
            }]"#,
        )
        .unwrap();
        assert_eq!(catalog[0].service_type, "compute");
        assert_eq!(catalog[0].endpoints[0].interface, "public");
    }
}
