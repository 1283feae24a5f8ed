//! The output aggregator: the terminal actor that turns upstream contributions into one
//! consumer-facing stream.
//!
//! Per run the [`OutputActor`] merges every `CONTENT_STREAM_CHUNK` from its dependencies
//! into an [`AggregatedDocument`], renders it through a template, and queues a
//! [`OutputFragment::Delta`] carrying the text edit and the raw chunk. Once every dependency
//! has sent its final `CONTENT`, it queues [`OutputFragment::Complete`]. An `ERRORS` message
//! or a stop ends the run with [`OutputFragment::Failed`] instead. Consumers read the run
//! through the [`OutputStream`] obtained from the [`OutputHandle`].

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

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, instrument, trace, warn};
use uuid::Uuid;

use crate::actor::{ActorConfig, ActorHandle, ManagedActor};
use crate::common::config::CONFIG;
use crate::common::types::ChannelReceiver;
use crate::common::{
    bookkeeping_pair, BookkeepingData, BookkeepingFuture, BookkeepingPromise, DeltaEngine,
    HandlebarsRenderer, NullSink, TemplateError,
};
use crate::message::{DispatchError, Message, MessageType};
use crate::traits::{BookkeepingSink, PipelineActor, Renderer};

pub use document::{AggregatedDocument, AggregatorState};
pub use fragment::{OutputFragment, OUTPUT_INTERRUPTED};
pub use output_error::OutputError;
pub use output_stream::OutputStream;

use output_stream::FragmentQueue;

mod document;
mod fragment;
mod output_error;
mod output_stream;

/// The consumer-side pieces of the current run, waiting to be claimed.
#[derive(Debug)]
struct RunSlot {
    run_id: Uuid,
    receiver: Option<ChannelReceiver<OutputFragment>>,
    bookkeeping: Option<BookkeepingFuture>,
}

/// Aggregates upstream contributions into the run's output stream.
///
/// Configure with the builder methods, then call [`start`](Self::start) to spawn it and
/// obtain its [`OutputHandle`].
///
/// ```no_run
/// use std::sync::Arc;
/// use stitch_reactive::prelude::*;
///
/// # async fn demo() -> anyhow::Result<()> {
/// let config = ActorConfig::new("output")?.with_dependencies(["search", "llm"])?;
/// let output = OutputActor::new(config)
///     .with_template("output", "{{search.title}}: {{llm.text}}")
///     .with_bookkeeping_sink(Arc::new(NullSink))
///     .start();
/// let stream = output.get_output()?;
/// # drop(stream);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct OutputActor {
    config: ActorConfig,
    templates: HashMap<String, String>,
    template_key: String,
    spread_senders: HashSet<String>,
    renderer: Arc<dyn Renderer>,
    sink: Arc<dyn BookkeepingSink>,
    delta_engine: DeltaEngine,
    buffer_capacity: Option<usize>,

    run_id: Uuid,
    document: AggregatedDocument,
    state: AggregatorState,
    queue: FragmentQueue,
    promise: Option<BookkeepingPromise>,

    slot: Arc<Mutex<RunSlot>>,
    generation: watch::Sender<u64>,
}

impl OutputActor {
    /// Creates an output actor with the defaults from the global configuration: Handlebars
    /// rendering, a discarding bookkeeping sink, no templates and no spread senders.
    pub fn new(config: ActorConfig) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            config,
            templates: HashMap::new(),
            template_key: CONFIG.defaults.output_template_key.clone(),
            spread_senders: HashSet::new(),
            renderer: Arc::new(HandlebarsRenderer::default()),
            sink: Arc::new(NullSink),
            delta_engine: DeltaEngine::from_config(&CONFIG),
            buffer_capacity: CONFIG.limits.output_buffer_capacity,
            run_id: Uuid::nil(),
            document: AggregatedDocument::default(),
            state: AggregatorState::default(),
            queue: FragmentQueue::closed(),
            promise: None,
            slot: Arc::new(Mutex::new(RunSlot {
                run_id: Uuid::nil(),
                receiver: None,
                bookkeeping: None,
            })),
            generation,
        }
    }

    /// Creates an output actor with the configured default id and the given dependencies.
    ///
    /// # Errors
    ///
    /// Returns an error if a dependency id is empty or equals the output actor's id.
    pub fn with_dependencies<I, S>(dependencies: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let config = ActorConfig::new(CONFIG.defaults.output_actor_id.clone())?
            .with_dependencies(dependencies)?;
        Ok(Self::new(config))
    }

    /// Registers a template under `key`.
    #[must_use]
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    /// Selects which registered template is rendered for the consumer.
    #[must_use]
    pub fn with_template_key(mut self, key: impl Into<String>) -> Self {
        self.template_key = key.into();
        self
    }

    /// Marks senders whose chunks merge at the top level of the document.
    #[must_use]
    pub fn with_spread_senders<I, S>(mut self, senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spread_senders.extend(senders.into_iter().map(Into::into));
        self
    }

    /// Replaces the template renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Replaces the bookkeeping sink.
    #[must_use]
    pub fn with_bookkeeping_sink(mut self, sink: Arc<dyn BookkeepingSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the delta engine.
    #[must_use]
    pub fn with_delta_engine(mut self, delta_engine: DeltaEngine) -> Self {
        self.delta_engine = delta_engine;
        self
    }

    /// Bounds the fragment buffer. The actor then waits for the consumer when it is full.
    #[must_use]
    pub const fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = Some(capacity);
        self
    }

    /// The current run's state.
    pub const fn state(&self) -> AggregatorState {
        self.state
    }

    /// The current run's document.
    pub const fn document(&self) -> &AggregatedDocument {
        &self.document
    }

    /// Spawns the actor on its own processing task and returns its handle.
    ///
    /// Must be called within a Tokio runtime. The first run is ready when this returns.
    pub fn start(self) -> OutputHandle {
        let slot = Arc::clone(&self.slot);
        let generation = self.generation.subscribe();
        let actor = ManagedActor::new(self).start();
        OutputHandle {
            actor,
            slot,
            generation,
        }
    }

    fn render(&self) -> Result<String, TemplateError> {
        let template = self
            .templates
            .get(&self.template_key)
            .ok_or_else(|| TemplateError::MissingTemplate(self.template_key.clone()))?;
        self.renderer
            .render(template, &Value::Object(self.document.stitched().clone()))
    }

    fn snapshot(&self) -> BookkeepingData {
        BookkeepingData::new(
            self.config.id().to_owned(),
            self.run_id,
            self.document.rendered_output().to_owned(),
        )
    }

    /// Moves the run into a terminal state and queues its terminal fragment.
    async fn finish(&mut self, state: AggregatorState, fragment: OutputFragment) {
        self.state = state;
        self.queue.finish(fragment).await;
        if let Some(promise) = self.promise.take() {
            promise.resolve(self.snapshot());
        }
        debug!(actor = %self.config.id(), run = %self.run_id, %state, "Run finished");
    }

    fn accepts(&self, message: &Message) -> bool {
        if self.state.is_terminal() {
            debug!(
                sender = %message.sender(),
                state = %self.state,
                "Ignoring {} after the run ended",
                message.message_type()
            );
            return false;
        }
        if !self.config.dependencies().contains(message.sender()) {
            debug!(
                sender = %message.sender(),
                "Ignoring {} from a non-dependency",
                message.message_type()
            );
            return false;
        }
        true
    }

    #[instrument(skip(self, message), fields(sender = %message.sender()))]
    async fn on_chunk(&mut self, message: &Message) {
        if !self.accepts(message) {
            return;
        }
        let Some(chunk) = message.chunk_value() else {
            return;
        };
        let sender = message.sender();
        let spread = self.spread_senders.contains(sender);

        let stitched = match self.document.stitch_chunk(sender, chunk, spread) {
            Ok(stitched) => stitched,
            Err(e) => {
                error!("Error stitching content stream chunk: {e}");
                return;
            }
        };
        self.document.replace_stitched(stitched);

        let rendered = match self.render() {
            Ok(rendered) => rendered,
            Err(e) => {
                error!("Error rendering content stream chunk: {e}");
                return;
            }
        };
        let previous = self.document.replace_rendered(rendered);
        let edit = self
            .delta_engine
            .delta(&previous, self.document.rendered_output());

        self.sink.bookkeep(self.snapshot());
        trace!(ops = edit.ops().len(), "Queueing delta fragment");
        self.queue
            .push(OutputFragment::delta(
                &self.template_key,
                edit,
                sender,
                chunk.clone(),
            ))
            .await;
    }

    #[instrument(skip(self, message), fields(sender = %message.sender()))]
    async fn on_content(&mut self, message: &Message) {
        if !self.accepts(message) {
            return;
        }
        let Some(content) = message.content_value() else {
            return;
        };
        self.document
            .record_content(message.sender(), content.clone());
        if self.document.is_complete(self.config.dependencies()) {
            trace!("All dependencies delivered content");
            let fragment = OutputFragment::complete(
                self.document.rendered_output().to_owned(),
                self.document.messages_by_sender().clone(),
            );
            self.finish(AggregatorState::Draining, fragment).await;
        }
    }

    #[instrument(skip(self, message), fields(sender = %message.sender()))]
    async fn on_upstream_errors(&mut self, message: &Message) {
        if self.state.is_terminal() {
            debug!(state = %self.state, "Ignoring errors after the run ended");
            return;
        }
        let errors: Vec<String> = message
            .error_details()
            .unwrap_or_default()
            .iter()
            .map(|detail| detail.message.clone())
            .collect();
        error!("Error in output actor: {errors:?}");
        self.finish(AggregatorState::ErrorTerminal, OutputFragment::failed(errors))
            .await;
    }
}

#[async_trait]
impl PipelineActor for OutputActor {
    fn config(&self) -> &ActorConfig {
        &self.config
    }

    fn reset(&mut self) {
        let (queue, receiver) = FragmentQueue::new(self.buffer_capacity);
        let (promise, bookkeeping) = bookkeeping_pair();
        self.run_id = Uuid::new_v4();
        self.document = AggregatedDocument::default();
        self.state = AggregatorState::Collecting;
        self.queue = queue;
        self.promise = Some(promise);
        *self.slot.lock() = RunSlot {
            run_id: self.run_id,
            receiver: Some(receiver),
            bookkeeping: Some(bookkeeping),
        };
        self.generation.send_modify(|generation| *generation += 1);
        trace!(actor = %self.config.id(), run = %self.run_id, "Run reset");
    }

    async fn on_receive(&mut self, message: &Message) -> anyhow::Result<()> {
        match message.message_type() {
            MessageType::Errors => self.on_upstream_errors(message).await,
            MessageType::ContentStreamChunk => self.on_chunk(message).await,
            MessageType::Content => self.on_content(message).await,
            marker => trace!(sender = %message.sender(), "Ignoring {marker}"),
        }
        Ok(())
    }

    async fn on_stop(&mut self) {
        if self.state.is_terminal() {
            trace!(actor = %self.config.id(), state = %self.state, "Stop after run ended");
            return;
        }
        self.finish(AggregatorState::StoppedTerminal, OutputFragment::interrupted())
            .await;
    }

    async fn on_error(&mut self, error: anyhow::Error) {
        error!(actor = %self.config.id(), "Unhandled error in output actor: {error:?}");
        if !self.state.is_terminal() {
            self.finish(
                AggregatorState::ErrorTerminal,
                OutputFragment::failed(vec![error.to_string()]),
            )
            .await;
        }
    }
}

/// A clonable handle to a running [`OutputActor`].
///
/// Hands out each run's [`OutputStream`] and [`BookkeepingFuture`], once per run each, and
/// forwards sends, resets and stops to the underlying [`ActorHandle`].
#[derive(Debug, Clone)]
pub struct OutputHandle {
    actor: ActorHandle,
    slot: Arc<Mutex<RunSlot>>,
    generation: watch::Receiver<u64>,
}

impl OutputHandle {
    /// The underlying actor handle, e.g. for registration with a
    /// [`Coordinator`](crate::common::Coordinator).
    pub const fn actor(&self) -> &ActorHandle {
        &self.actor
    }

    /// The output actor's id.
    pub fn id(&self) -> &str {
        self.actor.id()
    }

    /// The id of the current run.
    pub fn run_id(&self) -> Uuid {
        self.slot.lock().run_id
    }

    /// Takes the current run's output stream.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::StreamTaken`] if the stream for this run was already taken.
    pub fn get_output(&self) -> Result<OutputStream, OutputError> {
        let mut slot = self.slot.lock();
        let receiver = slot
            .receiver
            .take()
            .ok_or(OutputError::StreamTaken(slot.run_id))?;
        Ok(OutputStream::new(receiver))
    }

    /// Takes the deferred handle resolving to the current run's final bookkeeping record.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::BookkeepingTaken`] if it was already taken for this run.
    pub fn get_bookkeeping_data(&self) -> Result<BookkeepingFuture, OutputError> {
        let mut slot = self.slot.lock();
        slot.bookkeeping
            .take()
            .ok_or(OutputError::BookkeepingTaken(slot.run_id))
    }

    /// Delivers a message to the output actor.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Closed`] if the actor has stopped.
    pub async fn send(&self, message: Message) -> Result<(), DispatchError> {
        self.actor.send(message).await
    }

    /// Starts a new run and waits until its stream and bookkeeping handle are available.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Dispatch`] if the actor no longer accepts signals, or
    /// [`OutputError::Stopped`] if it stops before processing the reset.
    pub async fn reset(&self) -> Result<(), OutputError> {
        let mut generation = self.generation.clone();
        let seen = *generation.borrow_and_update();
        self.actor.reset().await?;
        generation
            .wait_for(|current| *current > seen)
            .await
            .map_err(|_| OutputError::Stopped(self.actor.id().to_owned()))?;
        Ok(())
    }

    /// Stops the output actor, ending the current run with an interruption if it has not
    /// finished.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor does not stop within the shutdown timeout.
    pub async fn stop(&self) -> anyhow::Result<()> {
        if self.slot.lock().receiver.take().is_some() {
            warn!(actor = %self.actor.id(), "Stopping with an unclaimed output stream");
        }
        self.actor.stop().await
    }
}

