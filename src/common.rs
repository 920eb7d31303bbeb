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

//! Protocol structures shared between services.

use reqwest::Url;
use serde::de::{DeserializeOwned, Error as DeError};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::ApiVersion;

/// A link carried by a resource or a collection.
///
/// Appears on resources themselves (`rel = "self"` or `"bookmark"`) and on
/// collections, where a `rel = "next"` link points to the following page.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
pub struct Link {
    /// Where the link points to.
    pub href: Url,
    /// How the link relates to the object carrying it.
    pub rel: String,
}

/// Find the `next` link in a collection's navigation links.
pub(crate) fn find_next_link(links: &[Link]) -> Option<Url> {
    links
        .iter()
        .find(|link| link.rel == "next")
        .map(|link| link.href.clone())
}

/// A plain reference to another resource: an ID plus links.
///
/// Used where this crate does not offer a typed reference with a `fetch`
/// operation, for example the source server of a snapshot image.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Ref {
    /// Identity of the referenced resource.
    pub id: String,
    /// Links under which the resource can be reached.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Status of a major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VersionStatus {
    /// The version the cloud recommends.
    Current,
    /// An older version that is still served.
    Supported,
    /// A version on its way out.
    Deprecated,
    /// Any status this crate does not recognize.
    #[default]
    Unknown,
}

impl VersionStatus {
    /// Whether this status counts as stable.
    ///
    /// An unknown status is treated as stable, only a deprecation is not.
    #[inline]
    pub fn is_stable(&self) -> bool {
        *self != VersionStatus::Deprecated
    }
}

impl From<&str> for VersionStatus {
    fn from(value: &str) -> VersionStatus {
        if value.eq_ignore_ascii_case("current") {
            VersionStatus::Current
        } else if value.eq_ignore_ascii_case("supported") || value.eq_ignore_ascii_case("stable") {
            VersionStatus::Supported
        } else if value.eq_ignore_ascii_case("deprecated") {
            VersionStatus::Deprecated
        } else {
            VersionStatus::Unknown
        }
    }
}

impl From<String> for VersionStatus {
    fn from(value: String) -> VersionStatus {
        VersionStatus::from(value.as_str())
    }
}

impl<'de> Deserialize<'de> for VersionStatus {
    fn deserialize<D>(deserializer: D) -> Result<VersionStatus, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(VersionStatus::from(value.as_str()))
    }
}

/// One major version as described by a version discovery document.
#[derive(Clone, Debug, Deserialize)]
pub struct Version {
    /// Major version ID, e.g. `v2.1`.
    pub id: ApiVersion,
    /// Navigation links, including the version's own endpoint.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Whether the version is current, supported or deprecated.
    #[serde(deserialize_with = "empty_as_default", default)]
    pub status: VersionStatus,
    /// Highest supported microversion.
    #[serde(deserialize_with = "empty_as_default", default)]
    pub version: Option<ApiVersion>,
    /// Lowest supported microversion.
    #[serde(deserialize_with = "empty_as_default", default)]
    pub min_version: Option<ApiVersion>,
}

impl Version {
    /// Whether the status allows using this version by default.
    #[inline]
    pub fn is_stable(&self) -> bool {
        self.status.is_stable()
    }
}

/// Deserialize a value, treating an empty string as the `Default` value.
///
/// The Compute API uses empty strings for absent values in several places,
/// e.g. the image of a volume-backed server or the swap size of a flavor.
pub fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if matches!(&value, Value::String(s) if s.is_empty()) {
        return Ok(T::default());
    }
    serde_json::from_value(value).map_err(D::Error::custom)
}

#[cfg(test)]
pub mod test {
    use serde::{Deserialize, Serialize};

    use super::{empty_as_default, find_next_link, Link, Version, VersionStatus};
    use crate::ApiVersion;

    pub fn compare<T: Serialize>(sample: &str, value: T) {
        let expected: serde_json::Value = serde_json::from_str(sample).unwrap();
        assert_eq!(serde_json::to_value(value).unwrap(), expected);
    }

    #[derive(Debug, Deserialize)]
    struct Flag(bool);

    #[derive(Debug, Deserialize)]
    struct Quirky {
        #[serde(deserialize_with = "empty_as_default")]
        count: u8,
        #[serde(deserialize_with = "empty_as_default")]
        items: Vec<String>,
        #[serde(deserialize_with = "empty_as_default")]
        flag: Option<Flag>,
        #[serde(deserialize_with = "empty_as_default")]
        label: Option<String>,
    }

    #[test]
    fn test_empty_as_default_with_values() {
        let s = r#"{"count": 42, "items": ["value"], "flag": true, "label": "value"}"#;
        let r: Quirky = serde_json::from_str(s).unwrap();
        assert_eq!(r.count, 42);
        assert_eq!(r.items, vec!["value".to_string()]);
        assert!(r.flag.unwrap().0);
        assert_eq!(r.label.unwrap(), "value");
    }

    #[test]
    fn test_empty_as_default_with_empty_string() {
        let s = r#"{"count": "", "items": "", "flag": "", "label": ""}"#;
        let r: Quirky = serde_json::from_str(s).unwrap();
        assert_eq!(r.count, 0);
        assert!(r.items.is_empty());
        assert!(r.flag.is_none());
        assert!(r.label.is_none());
    }

    fn version_with_status(status: VersionStatus) -> Version {
        Version {
            id: ApiVersion(2, 1),
            links: Vec::new(),
            status,
            version: None,
            min_version: None,
        }
    }

    #[test]
    fn test_version_stability() {
        assert!(version_with_status(VersionStatus::Current).is_stable());
        assert!(version_with_status(VersionStatus::Supported).is_stable());
        assert!(version_with_status(VersionStatus::Unknown).is_stable());
        assert!(!version_with_status(VersionStatus::Deprecated).is_stable());
    }

    const NOVA_VERSION_DOC: &str = r#"{
    "id": "v2.1",
    "status": "CURRENT",
    "version": "2.42",
    "min_version": "2.1",
    "updated": "2013-07-23T11:33:21Z",
    "links": [
      {
        "href": "https://cloud.example.com:8774/v2.1/",
        "rel": "self"
      },
      {
        "rel": "describedby",
        "type": "text/html",
        "href": "https://docs.openstack.org/api-ref/compute/"
      }
    ],
    "media-types": [
      {
        "base": "application/json",
        "type": "application/vnd.openstack.compute+json;version=2.1"
      }
    ]
}"#;

    #[test]
    fn test_version_parse() {
        let version: Version = serde_json::from_str(NOVA_VERSION_DOC).unwrap();
        assert_eq!(version.id, ApiVersion(2, 1));
        assert_eq!(version.status, VersionStatus::Current);
        assert_eq!(version.version, Some(ApiVersion(2, 42)));
        assert_eq!(version.min_version, Some(ApiVersion(2, 1)));
    }

    #[test]
    fn test_version_status_from_string() {
        assert_eq!(VersionStatus::from("CURRENT"), VersionStatus::Current);
        assert_eq!(VersionStatus::from("Current"), VersionStatus::Current);
        assert_eq!(VersionStatus::from("STABLE"), VersionStatus::Supported);
        assert_eq!(VersionStatus::from("supported"), VersionStatus::Supported);
        assert_eq!(VersionStatus::from("Deprecated"), VersionStatus::Deprecated);
        assert_eq!(VersionStatus::from("rc1"), VersionStatus::Unknown);
    }

    #[test]
    fn test_version_status_parse() {
        assert_eq!(
            serde_json::from_str::<VersionStatus>("\"CURRENT\"").unwrap(),
            VersionStatus::Current
        );
        assert_eq!(
            serde_json::from_str::<VersionStatus>("\"experimental\"").unwrap(),
            VersionStatus::Unknown
        );
    }

    fn link(rel: &str, href: &str) -> Link {
        Link {
            href: href.parse().unwrap(),
            rel: rel.to_string(),
        }
    }

    #[test]
    fn test_find_next_link() {
        let links = [
            link("self", "https://example.org/v2.1/servers"),
            link("next", "https://example.org/v2.1/servers?marker=abcd"),
        ];
        assert_eq!(
            find_next_link(&links).unwrap().as_str(),
            "https://example.org/v2.1/servers?marker=abcd"
        );
        assert!(find_next_link(&links[..1]).is_none());
        assert!(find_next_link(&[]).is_none());
    }
}
