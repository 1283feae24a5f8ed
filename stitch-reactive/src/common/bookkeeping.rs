//! Audit records and the sinks and deferred handles that carry them.

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

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use derive_new::new;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::trace;
use uuid::Uuid;

use crate::traits::BookkeepingSink;

/// One audit record: a full snapshot of an actor's rendered output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct BookkeepingData {
    /// The actor that produced the snapshot.
    pub actor_id: String,
    /// The run the snapshot belongs to.
    pub run_id: Uuid,
    /// The complete rendered output at the time of the record.
    pub output: String,
}

/// Failures of the bookkeeping path. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookkeepingError {
    /// The consuming side of the sink has gone away.
    #[error("bookkeeping sink is closed")]
    Closed,
    /// The run ended, or was reset, without producing a final record.
    #[error("run ended without bookkeeping data")]
    Abandoned,
}

/// A sink forwarding records into an unbounded channel.
///
/// Clones share the same channel, so any number of actors can append concurrently without
/// waiting on the consumer.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    outbox: mpsc::UnboundedSender<BookkeepingData>,
}

impl ChannelSink {
    /// Creates a sink and the receiver an auditing consumer reads from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BookkeepingData>) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        (Self { outbox }, inbox)
    }
}

impl BookkeepingSink for ChannelSink {
    fn append(&self, record: BookkeepingData) -> Result<(), BookkeepingError> {
        self.outbox
            .send(record)
            .map_err(|_| BookkeepingError::Closed)
    }
}

/// A sink that discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl BookkeepingSink for NullSink {
    fn append(&self, record: BookkeepingData) -> Result<(), BookkeepingError> {
        trace!(actor = %record.actor_id, "Discarding bookkeeping record");
        Ok(())
    }
}

/// Creates a connected promise/future pair for one run's final bookkeeping record.
#[must_use]
pub fn bookkeeping_pair() -> (BookkeepingPromise, BookkeepingFuture) {
    let (sender, receiver) = oneshot::channel();
    (BookkeepingPromise { sender }, BookkeepingFuture { receiver })
}

/// The resolving side of a [`BookkeepingFuture`]. Consumed on resolution, so a run
/// resolves at most once.
#[derive(Debug)]
pub struct BookkeepingPromise {
    sender: oneshot::Sender<BookkeepingData>,
}

impl BookkeepingPromise {
    /// Resolves the paired future. A future that was already dropped is ignored.
    pub fn resolve(self, record: BookkeepingData) {
        if self.sender.send(record).is_err() {
            trace!("Bookkeeping future dropped before resolution");
        }
    }
}

/// Resolves to a run's final bookkeeping record once the run completes, errors or stops.
///
/// Resolves to [`BookkeepingError::Abandoned`] if the run is reset or its actor dropped
/// before it finished.
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct BookkeepingFuture {
    receiver: oneshot::Receiver<BookkeepingData>,
}

impl Future for BookkeepingFuture {
    type Output = Result<BookkeepingData, BookkeepingError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|resolved| resolved.map_err(|_| BookkeepingError::Abandoned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(output: &str) -> BookkeepingData {
        BookkeepingData::new("output".into(), Uuid::new_v4(), output.into())
    }

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (sink, mut inbox) = ChannelSink::channel();
        let other = sink.clone();
        sink.append(record("a")).unwrap();
        other.append(record("b")).unwrap();
        assert_eq!(inbox.recv().await.unwrap().output, "a");
        assert_eq!(inbox.recv().await.unwrap().output, "b");
    }

    #[tokio::test]
    async fn closed_sink_is_swallowed_by_bookkeep() {
        let (sink, inbox) = ChannelSink::channel();
        drop(inbox);
        assert_eq!(sink.append(record("a")), Err(BookkeepingError::Closed));
        sink.bookkeep(record("a"));
    }

    #[tokio::test]
    async fn promise_resolves_future_once() {
        let (promise, future) = bookkeeping_pair();
        promise.resolve(record("final"));
        assert_eq!(future.await.unwrap().output, "final");
    }

    #[tokio::test]
    async fn dropped_promise_abandons_future() {
        let (promise, future) = bookkeeping_pair();
        drop(promise);
        assert_eq!(future.await, Err(BookkeepingError::Abandoned));
    }
}
