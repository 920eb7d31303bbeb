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

//! Asynchronous OpenStack Compute API bindings.
//!
//! Built around two layers:
//!
//! * A [Session](struct.Session.html) handles authentication, endpoint
//!   discovery and plain HTTP requests against any OpenStack service.
//! * A [Compute](compute/struct.Compute.html) client implements the Compute
//!   API on top of a session: servers, images, flavors, key pairs and
//!   metadata, with microversions and transparent pagination.
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), oscompute::Error> {
//! use oscompute::compute::Compute;
//!
//! let compute = Compute::from_env().await?;
//! let flavors = compute.list_flavors(&Default::default()).await?;
//! for flavor in flavors.items() {
//!     println!("{}: {} MiB", flavor.name, flavor.ram);
//! }
//! # Ok(()) }
//! ```
//!
//! # Environment
//!
//! `from_env` constructors understand `OS_AUTH_TYPE` (`none` or
//! `admin_token`), `OS_ENDPOINT`, `OS_TOKEN`, `OS_REGION_NAME`,
//! `OS_INTERFACE` and `OS_COMPUTE_API_VERSION`.
//!
//! # Features
//!
//! * `native-tls` (default) or `rustls` select the TLS implementation.
//! * `stream` (default) enables converting paginated listings into
//!   asynchronous streams.
//! * `sync` (default) enables the blocking [sync](sync/index.html) wrapper.

#![crate_name = "oscompute"]
#![crate_type = "lib"]
// NOTE: a blanket deny(warnings) tends to break on new compiler releases,
// so the lints are spelled out. Extend the list as new ones prove useful.
// Based on https://github.com/rust-unofficial/patterns/
#![deny(
    dead_code,
    improper_ctypes,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    trivial_casts,
    trivial_numeric_casts,
    unconditional_recursion,
    unsafe_code,
    unused,
    unused_allocation,
    unused_comparisons,
    unused_doc_comments,
    unused_import_braces,
    unused_parens,
    unused_qualifications,
    unused_results,
    while_true
)]
#![allow(
    clippy::new_ret_no_self,
    clippy::should_implement_trait,
    clippy::wrong_self_convention
)]

mod apiversion;
mod auth;
mod cache;
mod catalog;
pub mod client;
mod common;
pub mod compute;
mod config;
mod endpointfilters;
mod error;
mod macros;
mod protocol;
mod query;
pub mod services;
mod session;
pub mod stream;
#[cfg(feature = "sync")]
pub mod sync;
mod utils;

pub use crate::apiversion::ApiVersion;
pub use crate::auth::{AuthType, NoAuth, TokenAuth};
pub use crate::catalog::{CatalogRecord, Endpoint};
pub use crate::common::{Link, Ref};
pub use crate::endpointfilters::{EndpointFilters, InterfaceType};
pub use crate::error::{Error, ErrorKind};
pub use crate::query::{Query, QueryItem};
pub use crate::session::Session;
