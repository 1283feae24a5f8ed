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
use crate::setup::eventually;

mod setup;

/// Starting resets the actor once; stopping invokes `on_stop` once, however often it is
/// requested.
///
/// **Scenario:**
/// 1. Start a `RecordingActor`.
/// 2. Stop it twice, and request a stop once more.
///
/// **Verification:**
/// - One reset, one stop, and the handle reports `Stopped`.
#[stitch_test]
async fn lifecycle_hooks_run_once() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let managed = ManagedActor::new(actor);
    let handle = managed.handle();
    assert_eq!(handle.state(), ActorState::Fresh);

    let handle = managed.start();
    assert_eq!(handle.state(), ActorState::Running);
    handle.stop().await?;
    handle.stop().await?;
    handle.request_stop();

    assert_eq!(handle.state(), ActorState::Stopped);
    let journal = journal.lock();
    assert_eq!(journal.resets, 1);
    assert_eq!(journal.stops, 1);
    Ok(())
}

/// Messages are handled in the order they were sent, and resets are ordered with them.
#[stitch_test]
async fn messages_and_resets_keep_order() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let handle = ManagedActor::new(actor).start();

    for n in 0..10 {
        handle.send(Message::content("upstream", json!(n))?).await?;
    }
    handle.reset().await?;
    handle.send(Message::content("upstream", json!("after"))?).await?;

    eventually(|| journal.lock().received.len() == 11).await?;
    let journal_view = journal.lock();
    let received: Vec<_> = journal_view
        .received
        .iter()
        .filter_map(|message| message.content_value().cloned())
        .collect();
    let expected: Vec<_> = (0..10).map(|n| json!(n)).collect();
    assert_eq!(&received[..10], &expected[..]);
    assert_eq!(received[10], json!("after"));
    assert_eq!(journal_view.resets, 2);
    drop(journal_view);
    handle.stop().await?;
    Ok(())
}

/// Messages queued ahead of a stop are handled before `on_stop`.
#[stitch_test]
async fn stop_drains_the_inbox_first() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let managed = ManagedActor::new(actor);
    let handle = managed.handle();
    for n in 0..5 {
        handle.send(Message::content("upstream", json!(n))?).await?;
    }
    handle.request_stop();

    let handle = managed.start();
    handle.stop().await?;
    let journal = journal.lock();
    assert_eq!(journal.received.len(), 5);
    assert_eq!(journal.stops, 1);
    Ok(())
}

/// A handler error is contained: it reaches `on_error`, later messages are dropped until the
/// next reset, and the actor keeps running.
#[stitch_test]
async fn handler_errors_fail_the_run_not_the_actor() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let handle = ManagedActor::new(actor).start();

    handle.send(Message::content("upstream", json!("fail"))?).await?;
    handle.send(Message::content("upstream", json!("dropped"))?).await?;
    handle.reset().await?;
    handle.send(Message::content("upstream", json!("kept"))?).await?;

    eventually(|| journal.lock().received.len() == 1).await?;
    {
        let journal = journal.lock();
        assert_eq!(journal.errors, vec!["refusing `fail`".to_owned()]);
        assert_eq!(
            journal.received[0].content_value(),
            Some(&json!("kept"))
        );
    }
    assert_eq!(handle.state(), ActorState::Running);
    handle.stop().await?;
    Ok(())
}

/// A panicking handler is caught and treated like an error.
#[stitch_test]
async fn handler_panics_are_contained() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let handle = ManagedActor::new(actor).start();

    handle.send(Message::content("upstream", json!("panic"))?).await?;
    eventually(|| !journal.lock().errors.is_empty()).await?;
    assert!(journal.lock().errors[0].contains("asked to panic"));

    handle.reset().await?;
    handle.send(Message::content("upstream", json!("fine"))?).await?;
    eventually(|| journal.lock().received.len() == 1).await?;
    handle.stop().await?;
    assert_eq!(journal.lock().stops, 1);
    Ok(())
}

/// Once stopped, an actor accepts nothing.
#[stitch_test]
async fn stopped_actor_rejects_messages() -> anyhow::Result<()> {
    let handle = ManagedActor::new(RecordingActor::new("producer")?).start();
    handle.stop().await?;

    let result = handle.send(Message::begin("upstream")?).await;
    assert_eq!(result, Err(DispatchError::Closed("producer".to_owned())));
    assert!(handle.reset().await.is_err());
    assert!(handle.is_closed());
    Ok(())
}

/// A full bounded inbox makes `try_send` fail fast instead of waiting.
#[stitch_test]
async fn bounded_inbox_reports_full() -> anyhow::Result<()> {
    let managed = ManagedActor::new(RecordingActor::new("producer")?.with_inbox_capacity(1));
    let handle = managed.handle();

    handle.try_send(Message::begin("upstream")?)?;
    assert_eq!(
        handle.try_send(Message::begin("upstream")?),
        Err(DispatchError::Full("producer".to_owned()))
    );

    let handle = managed.start();
    handle.send(Message::begin("upstream")?).await?;
    handle.stop().await?;
    Ok(())
}

/// Stopping an actor that never started needs no task.
#[stitch_test]
async fn stopping_a_fresh_actor() -> anyhow::Result<()> {
    let actor = RecordingActor::new("producer")?;
    let journal = actor.journal.clone();
    let managed = ManagedActor::new(actor);
    managed.handle().stop().await?;
    assert_eq!(managed.handle().state(), ActorState::Stopped);

    let handle = managed.start();
    eventually(|| journal.lock().stops == 1).await?;
    assert_eq!(handle.state(), ActorState::Stopped);
    Ok(())
}
