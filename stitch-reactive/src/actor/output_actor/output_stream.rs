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

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, trace, warn};

use crate::actor::output_actor::OutputFragment;
use crate::common::types::{channel, ChannelReceiver, ChannelSender};

/// Crate-internal: the producing side of one run's fragment buffer.
///
/// Owned exclusively by the output actor. Dropping it, or calling
/// [`finish`](Self::finish), ends the consumer stream once the buffered fragments drain.
#[derive(Debug)]
pub(crate) struct FragmentQueue {
    outbox: Option<ChannelSender<OutputFragment>>,
}

impl FragmentQueue {
    /// Creates a queue and the receiver handed to the run's consumer.
    pub(crate) fn new(capacity: Option<usize>) -> (Self, ChannelReceiver<OutputFragment>) {
        let (outbox, inbox) = channel(capacity);
        (
            Self {
                outbox: Some(outbox),
            },
            inbox,
        )
    }

    /// A queue that accepts nothing, used before the first run.
    pub(crate) const fn closed() -> Self {
        Self { outbox: None }
    }

    /// Returns `true` once the terminal fragment has been pushed.
    #[cfg(test)]
    pub(crate) const fn is_finished(&self) -> bool {
        self.outbox.is_none()
    }

    /// Appends a fragment behind everything already buffered.
    ///
    /// A consumer that has gone away is not an error for the producer; the fragment is
    /// dropped and logged.
    pub(crate) async fn push(&self, fragment: OutputFragment) {
        let Some(outbox) = &self.outbox else {
            warn!("Fragment pushed after the stream finished, dropping");
            return;
        };
        if outbox.send(fragment).await.is_err() {
            trace!("Output consumer gone, dropping fragment");
        }
    }

    /// Pushes the terminal fragment and closes the queue.
    pub(crate) async fn finish(&mut self, fragment: OutputFragment) {
        debug_assert!(fragment.is_terminal());
        self.push(fragment).await;
        self.outbox = None;
    }
}

/// The consumer side of one run's output: a lazy, ordered, finite stream of
/// [`OutputFragment`]s.
///
/// Yields buffered fragments in the order the output actor produced them, suspends while the
/// buffer is empty, and ends right after the run's single terminal fragment. Dropping the
/// stream never affects the output actor.
///
/// # Example
///
/// ```no_run
/// use futures::StreamExt;
/// use stitch_reactive::prelude::*;
///
/// async fn print_run(output: &OutputHandle) -> anyhow::Result<()> {
///     let mut stream = output.get_output()?;
///     while let Some(fragment) = stream.next().await {
///         println!("{}", fragment.to_json());
///     }
///     Ok(())
/// }
/// ```
pub struct OutputStream {
    inner: BoxStream<'static, OutputFragment>,
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream").finish_non_exhaustive()
    }
}

impl OutputStream {
    pub(crate) fn new(receiver: ChannelReceiver<OutputFragment>) -> Self {
        let inner = stream::unfold(Some(receiver), |state| async move {
            let mut receiver = state?;
            let fragment = receiver.recv().await?;
            trace!(terminal = fragment.is_terminal(), "Yielding output fragment");
            if fragment.is_terminal() {
                Some((fragment, None))
            } else {
                Some((fragment, Some(receiver)))
            }
        })
        .boxed();
        Self { inner }
    }

    /// Ends the stream as soon as `token` is cancelled.
    ///
    /// Cancellation is observed while waiting for the next fragment; the underlying buffer
    /// is released when the stream is dropped.
    #[must_use]
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        let inner = self
            .inner
            .take_until(async move {
                token.cancelled().await;
                info!("Output stream cancelled");
            })
            .boxed();
        Self { inner }
    }

    /// Collects every remaining fragment.
    pub async fn collect_all(self) -> Vec<OutputFragment> {
        self.collect().await
    }
}

impl Stream for OutputStream {
    type Item = OutputFragment;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::common::EditScript;

    #[tokio::test]
    async fn ends_after_terminal_fragment() {
        let (mut queue, receiver) = FragmentQueue::new(None);
        let delta = OutputFragment::delta(
            "output",
            EditScript::replace_all("", "a"),
            "A",
            Value::from("a"),
        );
        queue.push(delta.clone()).await;
        queue.finish(OutputFragment::interrupted()).await;
        assert!(queue.is_finished());
        queue.push(delta.clone()).await;
        let fragments = OutputStream::new(receiver).collect_all().await;
        assert_eq!(fragments, vec![delta, OutputFragment::interrupted()]);
    }

    #[tokio::test]
    async fn cancellation_stops_a_waiting_consumer() {
        let (_queue, receiver) = FragmentQueue::new(None);
        let token = CancellationToken::new();
        let stream = OutputStream::new(receiver).with_cancellation(token.clone());
        let consumer = tokio::spawn(stream.collect_all());
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
        let fragments = tokio::time::timeout(Duration::from_secs(1), consumer)
            .await
            .unwrap()
            .unwrap();
        assert!(fragments.is_empty());
    }

    #[tokio::test]
    async fn dropped_consumer_does_not_fail_producer() {
        let (mut queue, receiver) = FragmentQueue::new(Some(1));
        drop(receiver);
        queue.push(OutputFragment::interrupted()).await;
        queue.finish(OutputFragment::interrupted()).await;
    }
}
