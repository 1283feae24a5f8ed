/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::time::Duration;

use stitch_reactive::prelude::*;

// Declare the submodules.
pub mod actors;
pub mod collaborators;

/// Upper bound for any single wait in these tests.
pub const WAIT: Duration = Duration::from_secs(2);

/// Builds an output actor over `dependencies` rendering `template`.
pub fn output_actor(dependencies: &[&str], template: &str) -> anyhow::Result<OutputActor> {
    Ok(OutputActor::with_dependencies(dependencies.iter().copied())?
        .with_template("output", template))
}

/// Drains a stream, failing the test if it does not end in time.
pub async fn drain(stream: OutputStream) -> anyhow::Result<Vec<OutputFragment>> {
    Ok(tokio::time::timeout(WAIT, stream.collect_all()).await?)
}

/// Polls `condition` until it holds, failing after [`WAIT`].
pub async fn eventually(mut condition: impl FnMut() -> bool) -> anyhow::Result<()> {
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?;
    Ok(())
}
