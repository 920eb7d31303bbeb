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

//! Creating sessions from environment variables.

use std::env;

use log::debug;

use super::auth::{NoAuth, TokenAuth};
use super::session::Session;
use super::utils;
use super::{ApiVersion, Error, ErrorKind, InterfaceType};

/// Create a session from environment variables.
///
/// The authentication type comes from `OS_AUTH_TYPE` and can be `none` or
/// `admin_token`. When the variable is missing, the presence of `OS_TOKEN`
/// decides between the two. Both types require `OS_ENDPOINT`.
///
/// `OS_REGION_NAME` and `OS_INTERFACE`, when set, populate the endpoint
/// filters of the new session. All validation happens before the session is
/// returned.
pub(crate) async fn from_env() -> Result<Session, Error> {
    let auth_type = match env::var("OS_AUTH_TYPE") {
        Ok(value) => value,
        // Infer the authentication type from what is provided.
        Err(..) => {
            if env::var("OS_TOKEN").is_ok() {
                "admin_token".to_string()
            } else {
                "none".to_string()
            }
        }
    };

    let mut session = match auth_type.as_str() {
        "none" => {
            let endpoint = utils::require_env("OS_ENDPOINT")?;
            debug!("Creating an unauthenticated session for {}", endpoint);
            Session::new(NoAuth::new(&endpoint)?).await?
        }
        "admin_token" => {
            let endpoint = utils::require_env("OS_ENDPOINT")?;
            let token = utils::require_env("OS_TOKEN")?;
            debug!("Creating a token session for {}", endpoint);
            Session::new(TokenAuth::new(&endpoint, &token)?).await?
        }
        other => {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                format!("unsupported authentication type {}", other),
            ));
        }
    };

    if let Ok(region) = env::var("OS_REGION_NAME") {
        if region.is_empty() {
            return Err(Error::new(
                ErrorKind::InvalidConfig,
                "OS_REGION_NAME must not be empty when set",
            ));
        }
        session.endpoint_filters_mut().set_region(region);
    }

    if let Ok(interface) = env::var("OS_INTERFACE") {
        let interface = interface.parse::<InterfaceType>().map_err(|err| {
            Error::new(
                ErrorKind::InvalidConfig,
                format!("invalid OS_INTERFACE value: {}", err),
            )
        })?;
        session.endpoint_filters_mut().set_interfaces([interface]);
    }

    Ok(session)
}

/// Read the Compute microversion from the environment, if set.
pub(crate) fn api_version_from_env() -> Result<Option<ApiVersion>, Error> {
    match env::var("OS_COMPUTE_API_VERSION") {
        Ok(value) => {
            let version = value.parse::<ApiVersion>().map_err(|err| {
                Error::new(
                    ErrorKind::InvalidConfig,
                    format!("invalid OS_COMPUTE_API_VERSION value: {}", err),
                )
            })?;
            Ok(Some(version))
        }
        Err(..) => Ok(None),
    }
}

#[cfg(test)]
mod test {
    use std::env;
    use std::sync::Mutex;

    use super::super::{ApiVersion, ErrorKind, InterfaceType};
    use super::{api_version_from_env, from_env};

    // Environment variables are process-global, so every test takes the lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ALL_VARS: &[&str] = &[
        "OS_AUTH_TYPE",
        "OS_COMPUTE_API_VERSION",
        "OS_ENDPOINT",
        "OS_INTERFACE",
        "OS_REGION_NAME",
        "OS_TOKEN",
    ];

    fn clear_env() {
        for var in ALL_VARS {
            env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_from_env_none_auth() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "none");
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        let session = from_env().await.unwrap();
        assert!(format!("{:?}", session.auth_type()).contains("NoAuth"));
        assert!(session.endpoint_filters().region.is_none());
    }

    #[tokio::test]
    async fn test_from_env_token_inferred() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        env::set_var("OS_TOKEN", "secret");
        let session = from_env().await.unwrap();
        assert!(format!("{:?}", session.auth_type()).contains("TokenAuth"));
    }

    #[tokio::test]
    async fn test_from_env_none_inferred() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        let session = from_env().await.unwrap();
        assert!(format!("{:?}", session.auth_type()).contains("NoAuth"));
    }

    #[tokio::test]
    async fn test_from_env_missing_endpoint() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "none");
        let err = from_env().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_from_env_unsupported_auth() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "password");
        let err = from_env().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[tokio::test]
    async fn test_from_env_filters() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "none");
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        env::set_var("OS_REGION_NAME", "RegionOne");
        env::set_var("OS_INTERFACE", "internal");
        let session = from_env().await.unwrap();
        let filters = session.endpoint_filters();
        assert_eq!(filters.region.as_deref(), Some("RegionOne"));
        assert_eq!(filters.interfaces, vec![InterfaceType::Internal]);
    }

    #[tokio::test]
    async fn test_from_env_empty_region() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "none");
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        env::set_var("OS_REGION_NAME", "");
        let err = from_env().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[tokio::test]
    async fn test_from_env_invalid_interface() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        env::set_var("OS_AUTH_TYPE", "none");
        env::set_var("OS_ENDPOINT", "http://127.0.0.1:8774/");
        env::set_var("OS_INTERFACE", "banana");
        let err = from_env().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
    }

    #[test]
    fn test_api_version_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        clear_env();
        assert!(api_version_from_env().unwrap().is_none());

        env::set_var("OS_COMPUTE_API_VERSION", "2.42");
        assert_eq!(api_version_from_env().unwrap(), Some(ApiVersion(2, 42)));

        env::set_var("OS_COMPUTE_API_VERSION", "v2.8");
        assert_eq!(api_version_from_env().unwrap(), Some(ApiVersion(2, 8)));

        env::set_var("OS_COMPUTE_API_VERSION", "banana");
        let err = api_version_from_env().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);

        env::remove_var("OS_COMPUTE_API_VERSION");
    }
}
