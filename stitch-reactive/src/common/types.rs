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

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{SendError, TrySendError};

/// Crate-internal: the sending half of a channel that is either bounded or unbounded.
///
/// Inboxes and fragment buffers are unbounded unless configured otherwise; both modes keep
/// FIFO order.
#[derive(Debug)]
pub(crate) enum ChannelSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

/// Crate-internal: the receiving half matching [`ChannelSender`].
#[derive(Debug)]
pub(crate) enum ChannelReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

/// Creates a channel, bounded when `capacity` is set. A capacity of zero is raised to one.
pub(crate) fn channel<T>(capacity: Option<usize>) -> (ChannelSender<T>, ChannelReceiver<T>) {
    match capacity {
        Some(capacity) => {
            let (sender, receiver) = mpsc::channel(capacity.max(1));
            (ChannelSender::Bounded(sender), ChannelReceiver::Bounded(receiver))
        }
        None => {
            let (sender, receiver) = mpsc::unbounded_channel();
            (
                ChannelSender::Unbounded(sender),
                ChannelReceiver::Unbounded(receiver),
            )
        }
    }
}

impl<T> Clone for ChannelSender<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Bounded(sender) => Self::Bounded(sender.clone()),
            Self::Unbounded(sender) => Self::Unbounded(sender.clone()),
        }
    }
}

impl<T> ChannelSender<T> {
    /// Sends a value, waiting for capacity on a bounded channel.
    pub(crate) async fn send(&self, value: T) -> Result<(), SendError<T>> {
        match self {
            Self::Bounded(sender) => sender.send(value).await,
            Self::Unbounded(sender) => sender.send(value),
        }
    }

    /// Sends a value without waiting.
    pub(crate) fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        match self {
            Self::Bounded(sender) => sender.try_send(value),
            Self::Unbounded(sender) => sender
                .send(value)
                .map_err(|SendError(value)| TrySendError::Closed(value)),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        match self {
            Self::Bounded(sender) => sender.is_closed(),
            Self::Unbounded(sender) => sender.is_closed(),
        }
    }
}

impl<T> ChannelReceiver<T> {
    pub(crate) async fn recv(&mut self) -> Option<T> {
        match self {
            Self::Bounded(receiver) => receiver.recv().await,
            Self::Unbounded(receiver) => receiver.recv().await,
        }
    }

    /// Takes the next buffered value without waiting.
    pub(crate) fn try_recv(&mut self) -> Option<T> {
        match self {
            Self::Bounded(receiver) => receiver.try_recv().ok(),
            Self::Unbounded(receiver) => receiver.try_recv().ok(),
        }
    }

    /// Closes the channel; values already buffered can still be received.
    pub(crate) fn close(&mut self) {
        match self {
            Self::Bounded(receiver) => receiver.close(),
            Self::Unbounded(receiver) => receiver.close(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bounded_and_unbounded_keep_order() {
        for capacity in [None, Some(2)] {
            let (sender, mut receiver) = channel(capacity);
            sender.send(1).await.unwrap();
            sender.send(2).await.unwrap();
            assert_eq!(receiver.recv().await, Some(1));
            assert_eq!(receiver.recv().await, Some(2));
        }
    }

    #[tokio::test]
    async fn full_bounded_channel_rejects_try_send() {
        let (sender, _receiver) = channel(Some(0));
        sender.try_send("first").unwrap();
        assert!(matches!(sender.try_send("second"), Err(TrySendError::Full("second"))));
    }

    #[tokio::test]
    async fn dropped_receiver_closes_sender() {
        let (sender, receiver) = channel::<u8>(None);
        drop(receiver);
        assert!(sender.is_closed());
        assert!(matches!(sender.try_send(1), Err(TrySendError::Closed(1))));
    }
}
