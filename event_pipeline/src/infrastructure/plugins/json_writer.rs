// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # JSON Writer Plugin
//!
//! Writes each event as one JSON line to a file. One arg: the output
//! filename, resolved under the builder's data root.
//!
//! All module references to the same resolved path share a single open
//! file, held in a process-wide cache. Concurrent writes are serialized by
//! a dedicated writer task per file, fed through a bounded channel; the file
//! opens once in a builder startup callback (idempotent when several modules
//! share it) and closes - flushing and syncing - in a shutdown callback.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use event_pipeline_domain::{Event, EventError};

use crate::application::services::stack::EventPlugin;
use crate::infrastructure::builder::registry::PluginBuilder;
use crate::infrastructure::builder::stack_builder::StackBuilder;
use crate::infrastructure::config::stack_config::ItemDef;

/// Default class name of the component builder
pub const BUILD_CLASS: &str = "jsonwriter";

/// Capacity of the per-file write channel
const DATA_BUFFER_SIZE: usize = 100;

/// Process-wide cache of shared output files, keyed by resolved path
static SHARED_FILES: Lazy<Mutex<HashMap<PathBuf, Arc<JsonFile>>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Returns the registry builder for the json writer plugin
pub fn builder() -> PluginBuilder {
    Box::new(build)
}

fn build(builder: &mut StackBuilder, def: &ItemDef) -> Result<Arc<dyn EventPlugin>, EventError> {
    debug!(args = ?def.args, "building jsonwriter plugin");
    if def.args.len() != 1 {
        return Err(EventError::build_error("required arg"));
    }
    let path = builder.data_path(&def.args[0]);
    let file = shared_file(path);

    let startup = Arc::clone(&file);
    builder.on_startup(Box::new(move || {
        async move { startup.open(DATA_BUFFER_SIZE).await }.boxed()
    }));
    let teardown = Arc::clone(&file);
    builder.on_shutdown(Box::new(move || {
        async move {
            teardown.close().await;
            Ok(())
        }
        .boxed()
    }));

    Ok(Arc::new(JsonWriterPlugin { file }))
}

fn shared_file(path: PathBuf) -> Arc<JsonFile> {
    let mut files = SHARED_FILES.lock();
    Arc::clone(
        files
            .entry(path.clone())
            .or_insert_with(|| Arc::new(JsonFile::new(path))),
    )
}

struct JsonWriterPlugin {
    file: Arc<JsonFile>,
}

#[async_trait]
impl EventPlugin for JsonWriterPlugin {
    async fn apply(&self, event: &mut Event) -> Result<(), EventError> {
        self.file.write(event.clone()).await;
        Ok(())
    }
}

struct WriterState {
    sender: mpsc::Sender<Event>,
    task: JoinHandle<()>,
}

/// A shared JSON output file with a single writer task.
struct JsonFile {
    path: PathBuf,
    state: Mutex<Option<WriterState>>,
}

impl JsonFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            state: Mutex::new(None),
        }
    }

    /// Opens the file and starts the writer task. A second open on an
    /// already open file is a no-op, so several modules can share the path.
    async fn open(&self, capacity: usize) -> Result<(), EventError> {
        if self.state.lock().is_some() {
            return Ok(());
        }
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .await
            .map_err(|err| EventError::io_error(format!("opening '{}': {}", self.path.display(), err)))?;

        let (sender, receiver) = mpsc::channel(capacity);
        let task = tokio::spawn(write_loop(file, receiver));
        *self.state.lock() = Some(WriterState { sender, task });
        Ok(())
    }

    /// Queues an event for the writer task; dropped silently when closed.
    async fn write(&self, event: Event) {
        let sender = match self.state.lock().as_ref() {
            Some(state) => state.sender.clone(),
            None => return,
        };
        let _ = sender.send(event).await;
    }

    /// Stops the writer task and waits for it to flush and sync.
    async fn close(&self) {
        let state = self.state.lock().take();
        if let Some(state) = state {
            drop(state.sender);
            let _ = state.task.await;
        }
    }
}

async fn write_loop(mut file: tokio::fs::File, mut receiver: mpsc::Receiver<Event>) {
    while let Some(event) = receiver.recv().await {
        let mut line = match serde_json::to_vec(&event) {
            Ok(line) => line,
            Err(err) => {
                warn!(%err, "skipping unserializable event");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(err) = file.write_all(&line).await {
            warn!(%err, "writing event line failed");
        }
    }
    let _ = file.flush().await;
    let _ = file.sync_all().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use event_pipeline_domain::{EventCode, EventLevel};

    #[tokio::test]
    async fn test_write_one_line_per_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let file = shared_file(path.clone());
        file.open(DATA_BUFFER_SIZE).await.unwrap();
        // second open on the same shared file is a no-op
        file.open(DATA_BUFFER_SIZE).await.unwrap();

        let mut event = Event::new(EventCode::new(1000), EventLevel::Info);
        event.id = "abc".to_string();
        file.write(event.clone()).await;
        event.id = "def".to_string();
        file.write(event).await;
        file.close().await;

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Event = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, "abc");
    }

    #[tokio::test]
    async fn test_write_after_close_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.json");
        let file = shared_file(path.clone());
        file.open(DATA_BUFFER_SIZE).await.unwrap();
        file.close().await;

        file.write(Event::new(EventCode::new(1), EventLevel::Info)).await;
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_shared_cache_returns_same_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("same.json");
        let a = shared_file(path.clone());
        let b = shared_file(path);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
