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

#![allow(dead_code)]

use serde_json::json;
use stitch_reactive::prelude::*;
use stitch_test::prelude::*;

use crate::setup::actors::RecordingActor;
use crate::setup::{drain, eventually, output_actor};

mod setup;

/// Addressed messages reach only their receiver; broadcasts reach everyone but the sender.
#[stitch_test]
async fn routes_by_receiver_or_broadcast() -> anyhow::Result<()> {
    let coordinator = Coordinator::new();
    let mut journals = Vec::new();
    for id in ["a", "b", "c"] {
        let actor = RecordingActor::new(id)?;
        journals.push(actor.journal.clone());
        coordinator.register(ManagedActor::new(actor).start())?;
    }
    assert_eq!(coordinator.ids(), vec!["a", "b", "c"]);

    let addressed = Message::builder(MessageType::Begin, "a")
        .receiver("b")
        .build()?;
    assert_eq!(coordinator.try_dispatch(addressed).await?, 1);
    assert_eq!(coordinator.try_dispatch(Message::begin("a")?).await?, 2);

    eventually(|| journals[1].lock().received.len() == 2).await?;
    eventually(|| journals[2].lock().received.len() == 1).await?;
    assert!(journals[0].lock().received.is_empty());

    coordinator.stop_all().await?;
    Ok(())
}

/// Routing problems are reported by `try_dispatch` and only logged by `dispatch`.
#[stitch_test]
async fn routing_failures() -> anyhow::Result<()> {
    let coordinator = Coordinator::new();
    let handle = ManagedActor::new(RecordingActor::new("a")?).start();
    coordinator.register(handle.clone())?;
    assert_eq!(
        coordinator.register(handle.clone()),
        Err(DispatchError::DuplicateActor("a".to_owned()))
    );

    let lost = Message::builder(MessageType::Begin, "a")
        .receiver("nobody")
        .build()?;
    assert_eq!(
        coordinator.try_dispatch(lost.clone()).await,
        Err(DispatchError::UnknownReceiver("nobody".to_owned()))
    );
    coordinator.dispatch(lost).await;

    let to_self = Message::builder(MessageType::Begin, "a").receiver("a").build()?;
    assert_eq!(coordinator.try_dispatch(to_self).await?, 1);

    handle.stop().await?;
    let to_stopped = Message::builder(MessageType::Begin, "z")
        .receiver("a")
        .build()?;
    assert!(matches!(
        coordinator.try_dispatch(to_stopped).await,
        Err(DispatchError::Closed(_))
    ));
    assert_eq!(coordinator.try_dispatch(Message::begin("z")?).await?, 0);

    assert!(coordinator.deregister("a").is_some());
    assert!(coordinator.is_empty());
    Ok(())
}

/// A whole pipeline over the coordinator, run twice with a reset in between.
///
/// **Scenario:**
/// 1. Register the output actor and two producers.
/// 2. Producers broadcast chunks and content; the output actor aggregates them.
/// 3. Reset everything through the coordinator and run again.
///
/// **Verification:**
/// - Each run ends in a success fragment rendering only that run's contributions.
#[stitch_test]
async fn pipeline_runs_twice() -> anyhow::Result<()> {
    let coordinator = Coordinator::new();
    let output = output_actor(&["search", "llm"], "{{search.title}}: {{llm.text}}")?.start();
    coordinator.register(output.actor().clone())?;
    for id in ["search", "llm"] {
        coordinator.register(ManagedActor::new(RecordingActor::new(id)?).start())?;
    }
    assert_eq!(coordinator.len(), 3);

    for (title, text) in [("Rust", "fast"), ("Tokio", "async")] {
        let stream = output.get_output()?;
        coordinator
            .dispatch(Message::chunk("search", json!({"title": title}))?)
            .await;
        coordinator
            .dispatch(Message::chunk("llm", json!({"text": text}))?)
            .await;
        coordinator.dispatch(Message::content("search", json!(title))?).await;
        coordinator.dispatch(Message::content("llm", json!(text))?).await;

        let fragments = drain(stream).await?;
        assert_eq!(fragments.len(), 3);
        assert_eq!(
            fragments[2].to_json(),
            json!({
                "output": format!("{title}: {text}"),
                "chunks": {"search": title, "llm": text}
            })
        );

        let finished = output.run_id();
        coordinator.reset_all().await;
        eventually(|| output.run_id() != finished).await?;
    }

    coordinator.stop_all().await?;
    assert_eq!(output.actor().state(), ActorState::Stopped);
    Ok(())
}
