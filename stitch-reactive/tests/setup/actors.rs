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

use std::sync::Arc;

use anyhow::bail;
use parking_lot::Mutex;
use stitch_reactive::prelude::*;

/// What a [`RecordingActor`] observed, shared with the test.
#[derive(Debug, Default)]
pub struct Journal {
    pub received: Vec<Message>,
    pub resets: usize,
    pub stops: usize,
    pub errors: Vec<String>,
}

/// Records every hook invocation. Fails on content `"fail"` and panics on content `"panic"`.
#[derive(Debug)]
pub struct RecordingActor {
    config: ActorConfig,
    pub journal: Arc<Mutex<Journal>>,
}

impl RecordingActor {
    pub fn new(id: &str) -> anyhow::Result<Self> {
        Ok(Self {
            config: ActorConfig::new(id)?,
            journal: Arc::default(),
        })
    }

    pub fn with_inbox_capacity(mut self, capacity: usize) -> Self {
        self.config = self.config.with_inbox_capacity(capacity);
        self
    }
}

#[async_trait]
impl PipelineActor for RecordingActor {
    fn config(&self) -> &ActorConfig {
        &self.config
    }

    fn reset(&mut self) {
        self.journal.lock().resets += 1;
    }

    async fn on_receive(&mut self, message: &Message) -> anyhow::Result<()> {
        match message.content_value().and_then(|value| value.as_str()) {
            Some("fail") => bail!("refusing `fail`"),
            Some("panic") => panic!("asked to panic"),
            _ => {}
        }
        self.journal.lock().received.push(message.clone());
        Ok(())
    }

    async fn on_stop(&mut self) {
        self.journal.lock().stops += 1;
    }

    async fn on_error(&mut self, error: anyhow::Error) {
        self.journal.lock().errors.push(error.to_string());
    }
}
