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

#![cfg(feature = "sync")]

mod common;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, ResponseTemplate};

use oscompute::compute::ServerStatus;
use oscompute::sync::SyncCompute;

fn server_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": "ACTIVE",
        "flavor": {"id": "1", "links": []},
        "image": {"id": "70a599e0", "links": []},
        "created": "2017-02-14T19:23:58Z",
        "updated": "2017-02-14T19:24:43Z"
    })
}

// The mock server must be hosted on a multi-threaded runtime: the blocking
// client drives its own runtime, which cannot poll the mock server's task.
fn start_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Runtime::new().expect("Failed to create a runtime")
}

#[test]
fn test_blocking_listing_across_pages() {
    let runtime = start_runtime();
    let (mock_server, compute) = runtime.block_on(common::setup());
    runtime.block_on(async {
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/detail"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [server_json("1", "one"), server_json("2", "two")],
                "servers_links": [{
                    "rel": "next",
                    "href": format!("{}/v2.1/servers/second-page", mock_server.uri())
                }]
            })))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/second-page"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "servers": [server_json("3", "three")]
            })))
            .mount(&mock_server)
            .await;
    });

    let sync = SyncCompute::new(compute).expect("Failed to create a blocking client");
    let names = sync
        .list_servers(&Default::default())
        .unwrap()
        .map(|result| result.map(|server| server.name))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    assert_eq!(names, vec!["one", "two", "three"]);
}

#[test]
fn test_blocking_get_and_metadata() {
    let runtime = start_runtime();
    let (mock_server, compute) = runtime.block_on(common::setup());
    runtime.block_on(async {
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/1234"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"server": server_json("1234", "web")})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2.1/servers/1234/metadata"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"metadata": {"department": "falcon"}})),
            )
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v2.1/servers/1234/metadata"))
            .and(body_json(json!({
                "metadata": {"department": "falcon", "weight": "1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "metadata": {"department": "falcon", "weight": "1"}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    });

    let sync = SyncCompute::new(compute).expect("Failed to create a blocking client");
    let server = sync.get_server("1234").unwrap();
    assert_eq!(server.name, "web");
    assert_eq!(server.status, ServerStatus::Active);

    let mut metadata = sync.get_server_metadata("1234").unwrap();
    let _ = metadata.insert("weight".to_string(), "1".to_string());
    sync.block_on(metadata.update(false)).unwrap();
    assert_eq!(metadata.len(), 2);
}
