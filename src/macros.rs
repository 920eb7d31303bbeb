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

//! Macros for defining protocol structures.

/// Defines an enum that maps to and from a fixed set of protocol values.
///
/// The generated enum derives `Clone`, `Copy`, `Debug`, `Hash` and the
/// equality traits, converts to its carrier type via `From`, displays as the
/// protocol value and implements `Serialize`/`Deserialize` by hand.
///
/// In the simplest form the carrier type is a string:
///
/// ```rust
/// oscompute::protocol_enum! {
///     #[doc = "Disk partitioning modes."]
///     enum DiskConfig {
///         Auto = "AUTO",
///         Manual = "MANUAL"
///     }
/// }
/// ```
///
/// A non-string carrier type can be given explicitly; it has to be
/// (de-)serializable itself:
///
/// ```rust
/// oscompute::protocol_enum! {
///     #[doc = "IP protocol versions."]
///     enum IpVersion: u8 {
///         V4 = 4,
///         V6 = 6
///     }
/// }
/// ```
///
/// Both forms above reject unknown input when deserializing. Statuses
/// reported by a server tend to grow new values over time, so for them
/// name one variant after the `=` sign to serve both as the `Default` and
/// as the fallback for unrecognized input:
///
/// ```rust
/// oscompute::protocol_enum! {
///     #[doc = "Possible server statuses."]
///     #[non_exhaustive]
///     enum ServerStatus = Unknown {
///         Active = "ACTIVE",
///         Building = "BUILD",
///         Deleted = "DELETED",
///         Error = "ERROR",
///         ShutOff = "SHUTOFF",
///         Unknown = "UNKNOWN"
///     }
/// }
///
/// oscompute::protocol_enum! {
///     #[doc = "IP protocol versions."]
///     #[non_exhaustive]
///     enum IpVersion: u8 = V4 {
///         V4 = 4,
///         V6 = 6
///     }
/// }
/// ```
#[macro_export]
macro_rules! protocol_enum {
    {$(#[$meta:meta])* enum $name:ident {
        $($(#[$vmeta:meta])* $variant:ident = $value:expr),+
    }} => (
        $crate::protocol_enum! {
            @base $(#[$meta])* $name: String {
                $($(#[$vmeta])* $variant = $value),+
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                let raw = String::deserialize(deserializer)?;
                match raw.as_str() {
                    $($value => Ok($name::$variant)),+,
                    unknown => {
                        use ::serde::de::Error;
                        Err(D::Error::custom(format!(
                            "unrecognized {} value {:?}", stringify!($name), unknown,
                        )))
                    }
                }
            }
        }
    );

    {$(#[$meta:meta])* enum $name:ident = $fallback:ident {
        $($(#[$vmeta:meta])* $variant:ident = $value:expr),+
    }} => (
        $crate::protocol_enum! {
            @base $(#[$meta])* $name: String {
                $($(#[$vmeta])* $variant = $value),+
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::$fallback
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                let raw = String::deserialize(deserializer)?;
                Ok(match raw.as_str() {
                    $($value => $name::$variant),+,
                    _ => $name::$fallback,
                })
            }
        }
    );

    {$(#[$meta:meta])* enum $name:ident: $carrier:ty {
        $($(#[$vmeta:meta])* $variant:ident = $value:expr),+
    }} => (
        $crate::protocol_enum! {
            @base $(#[$meta])* $name: $carrier {
                $($(#[$vmeta])* $variant = $value),+
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                let raw: $carrier = ::serde::de::Deserialize::deserialize(deserializer)?;
                match raw {
                    $($value => Ok($name::$variant)),+,
                    unknown => {
                        use ::serde::de::Error;
                        Err(D::Error::custom(format!(
                            "unrecognized {} value {}", stringify!($name), unknown,
                        )))
                    }
                }
            }
        }
    );

    {$(#[$meta:meta])* enum $name:ident: $carrier:ty = $fallback:ident {
        $($(#[$vmeta:meta])* $variant:ident = $value:expr),+
    }} => (
        $crate::protocol_enum! {
            @base $(#[$meta])* $name: $carrier {
                $($(#[$vmeta])* $variant = $value),+
            }
        }

        impl Default for $name {
            fn default() -> $name {
                $name::$fallback
            }
        }

        impl<'de> ::serde::de::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::std::result::Result<Self, D::Error>
                    where D: ::serde::de::Deserializer<'de> {
                let raw: $carrier = ::serde::de::Deserialize::deserialize(deserializer)?;
                Ok(match raw {
                    $($value => $name::$variant),+,
                    _ => $name::$fallback,
                })
            }
        }
    );

    {@base $(#[$meta:meta])* $name:ident: $carrier:ty {
        $($(#[$vmeta:meta])* $variant:ident = $value:expr),+
    }} => (
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+,
        }

        impl From<$name> for $carrier {
            fn from(value: $name) -> $carrier {
                match value {
                    $($name::$variant => $value.into()),+,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            /// Displays the protocol value.
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                <$carrier>::from(*self).fmt(f)
            }
        }

        impl ::serde::ser::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::std::result::Result<S::Ok, S::Error>
                    where S: ::serde::ser::Serializer {
                <$carrier>::from(*self).serialize(serializer)
            }
        }
    );
}
