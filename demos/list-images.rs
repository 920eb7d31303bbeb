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

use futures::pin_mut;
use futures::stream::TryStreamExt;

use oscompute::compute::Compute;

#[tokio::main]
async fn main() {
    env_logger::init();
    let compute = Compute::from_env()
        .await
        .expect("Failed to create a Compute client from the environment");

    let first_page = compute
        .list_images(&Default::default())
        .await
        .expect("Failed to list images");
    let images = first_page.into_stream();
    pin_mut!(images);
    while let Some(image) = images
        .try_next()
        .await
        .expect("Failed to fetch the next image")
    {
        println!(
            "ID = {}, Name = {}, Status = {}",
            image.id, image.name, image.status
        );
    }
    println!("Done listing");
}
