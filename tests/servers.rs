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

mod common;

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, ResponseTemplate};

use oscompute::compute::{ServerCreate, ServerFilter, ServerStatus, ServerUpdate};
use oscompute::{ErrorKind, Query};

fn server_json(id: &str, name: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "status": status,
        "flavor": {"id": "1", "links": []},
        "image": {"id": "70a599e0-31e7-49b7-b260-868f441e862b", "links": []},
        "addresses": {"private": [{"addr": "192.168.0.3", "version": 4}]},
        "metadata": {},
        "created": "2017-02-14T19:23:58Z",
        "updated": "2017-02-14T19:24:43Z"
    })
}

#[tokio::test]
async fn test_list_servers_follows_next_links() {
    let (mock_server, compute) = common::setup().await;

    // The next link points to an arbitrary path to verify that it is
    // followed exactly as returned, not reconstructed from the endpoint.
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [
                server_json("1", "one", "ACTIVE"),
                server_json("2", "two", "ACTIVE"),
            ],
            "servers_links": [{
                "rel": "next",
                "href": format!("{}/v2.1/servers/second-page", mock_server.uri())
            }]
        })))
        .mount(&mock_server)
        .await;
    // Requests to followed links carry the microversion header too.
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/second-page"))
        .and(header("x-openstack-nova-api-version", "2.1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [server_json("3", "three", "SHUTOFF")]
        })))
        .mount(&mock_server)
        .await;

    let first = compute.list_servers(&Default::default()).await.unwrap();
    assert_eq!(first.len(), 2);
    assert!(first.next_link().is_some());

    let second = first.next_page().await.unwrap().unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second.items()[0].name, "three");
    assert_eq!(second.items()[0].status, ServerStatus::ShutOff);
    assert!(second.next_link().is_none());
    assert!(second.next_page().await.unwrap().is_none());
}

#[cfg(feature = "stream")]
#[tokio::test]
async fn test_stream_servers_across_pages() {
    use futures::stream::TryStreamExt;

    let (mock_server, compute) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/detail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [server_json("1", "one", "ACTIVE")],
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
            "servers": [server_json("2", "two", "ACTIVE")]
        })))
        .mount(&mock_server)
        .await;

    let first = compute.list_servers(&Default::default()).await.unwrap();
    let names: Vec<String> = first
        .into_stream()
        .map_ok(|server| server.name)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(names, vec!["one", "two"]);
}

#[tokio::test]
async fn test_list_servers_with_filters() {
    let (mock_server, compute) = common::setup().await;

    // Filters that were not pushed must not appear in the query at all,
    // and the request must carry the pinned microversion.
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/detail"))
        .and(header("x-openstack-nova-api-version", "2.1"))
        .and(query_param("status", "SHUTOFF"))
        .and(query_param("limit", "1"))
        .and(query_param_is_missing("name"))
        .and(query_param_is_missing("marker"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [server_json("3", "three", "SHUTOFF")]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let query = Query::default()
        .with(ServerFilter::Status(ServerStatus::ShutOff))
        .with(ServerFilter::Limit(1));
    let page = compute.list_servers(&query).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items()[0].id, "3");
}

#[tokio::test]
async fn test_create_server_and_wait_until_active() {
    let (mock_server, mut compute) = common::setup().await;
    compute.set_poll_interval(Duration::from_millis(1));

    Mock::given(method("POST"))
        .and(path("/v2.1/servers"))
        .and(body_json(json!({
            "server": {
                "name": "test-vm",
                "flavorRef": "1",
                "imageRef": "70a599e0-31e7-49b7-b260-868f441e862b"
            }
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "server": {
                "id": "new-id",
                "adminPass": "secret",
                "links": []
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    // The first fetch sees the server still building, later ones active.
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/new-id"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"server": server_json("new-id", "test-vm", "BUILD")})),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/new-id"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"server": server_json("new-id", "test-vm", "ACTIVE")})),
        )
        .mount(&mock_server)
        .await;

    let mut request = ServerCreate::new("test-vm", "1");
    request.image = Some("70a599e0-31e7-49b7-b260-868f441e862b".to_string());
    let created = compute.create_server(request).await.unwrap();
    assert_eq!(created.id, "new-id");
    assert_eq!(created.admin_pass.as_deref(), Some("secret"));

    let server = created.wait_until_active().await.unwrap();
    assert_eq!(server.status, ServerStatus::Active);
    assert_eq!(server.name, "test-vm");
}

#[tokio::test]
async fn test_wait_until_active_fails_on_error_state() {
    let (mock_server, mut compute) = common::setup().await;
    compute.set_poll_interval(Duration::from_millis(1));

    let mut broken = server_json("broken", "doomed", "ERROR");
    broken["fault"] = json!({
        "code": 500,
        "message": "No valid host was found",
        "created": "2017-02-14T19:23:58Z"
    });
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"server": broken})))
        .mount(&mock_server)
        .await;

    let mut server = compute.get_server("broken").await.unwrap();
    let err = server.wait_until_active().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OperationFailed);
    assert!(err.to_string().contains("No valid host was found"));
}

#[tokio::test]
async fn test_update_server() {
    let (mock_server, compute) = common::setup().await;

    Mock::given(method("PUT"))
        .and(path("/v2.1/servers/1234"))
        .and(body_json(json!({"server": {"name": "renamed"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"server": server_json("1234", "renamed", "ACTIVE")})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let update = ServerUpdate {
        name: Some("renamed".to_string()),
        ..ServerUpdate::default()
    };
    let server = compute.update_server("1234", update).await.unwrap();
    assert_eq!(server.name, "renamed");
    // The result is attached: accessor methods must not fail.
    assert_eq!(
        server.flavor.fetch().await.unwrap_err().kind(),
        ErrorKind::ResourceNotFound
    );
}

#[tokio::test]
async fn test_fetch_flavor_through_server() {
    let (mock_server, compute) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/1234"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"server": server_json("1234", "one", "ACTIVE")})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/flavors/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "flavor": {
                "id": "1",
                "name": "m1.tiny",
                "vcpus": 1,
                "ram": 512,
                "disk": 1,
                "swap": ""
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let server = compute.get_server("1234").await.unwrap();
    assert_eq!(server.flavor.id, "1");

    let flavor = server.flavor.fetch().await.unwrap();
    assert_eq!(flavor.id, server.flavor.id);
    assert_eq!(flavor.name, "m1.tiny");
    assert_eq!(flavor.vcpus, 1);
    assert_eq!(flavor.swap, 0);
}

#[tokio::test]
async fn test_delete_server_and_wait() {
    let (mock_server, compute) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/gone"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"server": server_json("gone", "old", "ACTIVE")})),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v2.1/servers/gone"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2.1/servers/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "itemNotFound": {"message": "Instance could not be found", "code": 404}
        })))
        .mount(&mock_server)
        .await;

    let mut server = compute.get_server("gone").await.unwrap();
    server.delete().await.unwrap();
    assert_eq!(server.status, ServerStatus::Unknown);

    server.wait_until_deleted().await.unwrap();
    assert_eq!(server.status, ServerStatus::Deleted);
}

#[tokio::test]
async fn test_server_metadata_merge() {
    let (mock_server, compute) = common::setup().await;

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
            "metadata": {"department": "falcon", "weight": "1", "added-on-server": "yes"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut metadata = compute.get_server_metadata("1234").await.unwrap();
    assert_eq!(metadata["department"], "falcon");

    let _ = metadata.insert("weight".to_string(), "1".to_string());
    metadata.update(false).await.unwrap();
    // The local map is replaced by the authoritative response.
    assert_eq!(metadata.len(), 3);
    assert_eq!(metadata["added-on-server"], "yes");
}

#[tokio::test]
async fn test_server_metadata_overwrite() {
    let (mock_server, compute) = common::setup().await;

    Mock::given(method("GET"))
        .and(path("/v2.1/servers/4321/metadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "metadata": {"department": "falcon", "stale": "yes"}
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/v2.1/servers/4321/metadata"))
        .and(body_json(json!({"metadata": {"department": "owl"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"metadata": {"department": "owl"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut metadata = compute.get_server_metadata("4321").await.unwrap();
    metadata.clear();
    let _ = metadata.insert("department".to_string(), "owl".to_string());
    metadata.update(true).await.unwrap();
    assert_eq!(metadata.len(), 1);
    assert_eq!(metadata["department"], "owl");
}
