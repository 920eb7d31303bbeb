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

use oscompute::compute::{Compute, ServerCreate};

#[tokio::main]
async fn main() {
    env_logger::init();
    let name = env::args().nth(1).expect("Expected a server name");
    let flavor = env::args().nth(2).expect("Expected a flavor ID");
    let image = env::args().nth(3).expect("Expected an image ID");

    let compute = Compute::from_env()
        .await
        .expect("Failed to create a Compute client from the environment");

    let mut request = ServerCreate::new(name, flavor);
    request.image = Some(image);
    let created = compute
        .create_server(request)
        .await
        .expect("Failed to request server creation");
    println!("Requested server {}, waiting for it to build", created.id);

    let server = created
        .wait_until_active()
        .await
        .expect("Server did not become active");
    println!("Server {} is {}", server.name, server.status);
    for (network, addresses) in &server.addresses {
        for address in addresses {
            println!("  {}: {}", network, address.addr);
        }
    }
}
