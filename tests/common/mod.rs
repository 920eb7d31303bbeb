// Copyright 2025 the oscompute authors
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

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use oscompute::compute::Compute;
use oscompute::{NoAuth, Session};

/// Start a mock cloud with version discovery mounted at its root and create
/// a Compute client against it.
///
/// The discovery document puts the service root at `/v2.1/`, so all further
/// mocks must be mounted under that prefix.
pub async fn setup() -> (MockServer, Compute) {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": {
                "id": "v2.1",
                "status": "CURRENT",
                "version": "2.79",
                "min_version": "2.1",
                "links": [{
                    "rel": "self",
                    "href": format!("{}/v2.1/", mock_server.uri())
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let auth = NoAuth::new(mock_server.uri()).expect("Invalid mock server URL");
    let session = Session::new(auth)
        .await
        .expect("Failed to create a session");
    (mock_server, Compute::new(session))
}
