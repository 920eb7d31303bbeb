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

use std::env;

use oscompute::compute::Compute;

#[tokio::main]
async fn main() {
    env_logger::init();
    let id = env::args().nth(1).expect("Expected a server ID");

    let compute = Compute::from_env()
        .await
        .expect("Failed to create a Compute client from the environment");

    let mut metadata = compute
        .get_server_metadata(&id)
        .await
        .expect("Failed to fetch server metadata");
    println!("Current metadata of server {}:", id);
    for (key, value) in metadata.iter() {
        println!("  {} = {}", key, value);
    }

    let _ = metadata.insert("touched_by".into(), "oscompute".into());
    metadata
        .update(false)
        .await
        .expect("Failed to update server metadata");

    metadata
        .refresh()
        .await
        .expect("Failed to refresh server metadata");
    println!("Updated metadata of server {}:", id);
    for (key, value) in metadata.iter() {
        println!("  {} = {}", key, value);
    }
}
