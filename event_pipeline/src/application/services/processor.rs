// /////////////////////////////////////////////////////////////////////////////
// Event Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Event Processor
//!
//! The top-level dispatcher: a bounded request queue, a static pool of
//! workers, the schema catalog, the stack graph, and the hook runner.
//!
//! ## Ingress
//!
//! Two operations feed the queue, with distinct validation rules:
//!
//! - [`Processor::notify_event`] accepts locally originated events: the id
//!   and the audit trail must be empty, the code must resolve in the
//!   catalog, and the data map must validate against the definition. The
//!   processor then assigns a fresh GUID, stamps the reception time, seeds
//!   the audit trail with its own identity, and enriches the event from the
//!   catalog.
//! - [`Processor::forward_event`] accepts events from peer processors: the
//!   id and trail must be non-empty, and the processor rejects the event
//!   when its own identity already appears in the trail (forward loop). It
//!   then appends itself to the trail.
//!
//! Validation failures reject the event before anything is enqueued; no
//! hooks fire for rejected events. Details go to the log together with the
//! peer identity; callers get a low-cardinality error kind.
//!
//! ## Dispatch
//!
//! Accepted events enqueue into a bounded channel; producers block when it
//! is full, giving natural backpressure to the ingress. Workers dequeue
//! requests and run them through the main stack. Worker count and buffer
//! size are fixed at construction.
//!
//! ## Shutdown
//!
//! [`Processor::close`] is idempotent: it seals the queue, lets the workers
//! drain what was already accepted, and waits for them to exit. In-flight
//! requests are never aborted.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use event_pipeline_domain::{
    Event, EventDatabase, EventDef, EventError, EventForwarder, EventNotifier, EventSource, ProcessInfo,
    WorkerCount,
};

use crate::application::services::hooks::{Hooks, HooksRunner};
use crate::application::services::stack::{ProcessContext, Stack};

/// Default capacity of the request queue
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Generator of globally unique event ids.
pub type GuidGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Per-in-flight-event record.
///
/// Created on enqueue, mutated only by the worker that owns it, and dropped
/// when the worker completes the outermost stack.
pub struct Request {
    /// The event being processed
    pub event: Event,
    /// When the request entered the queue
    pub enqueued: DateTime<Utc>,
    /// When a worker picked the request up
    pub started: Option<DateTime<Utc>>,
    /// When the main stack completed
    pub finished: Option<DateTime<Utc>>,
    /// `"<stack>.<module>"` entries in execution order
    pub stack_trace: Vec<String>,
    /// Peer that submitted the event, when it came over a transport
    pub peer: Option<SocketAddr>,
    /// Active jump frames, used for loop detection
    pub(crate) jumps: Vec<String>,
}

impl Request {
    pub(crate) fn new(event: Event, peer: Option<SocketAddr>) -> Self {
        Self {
            event,
            enqueued: Utc::now(),
            started: None,
            finished: None,
            stack_trace: Vec::new(),
            peer,
            jumps: Vec::new(),
        }
    }
}

/// Construction options for a [`Processor`].
pub struct ProcessorOptions {
    /// Number of dispatch workers
    pub workers: WorkerCount,
    /// Capacity of the bounded request queue
    pub buffer_size: usize,
    /// Generator for event GUIDs
    pub guid_gen: GuidGenerator,
    /// Identity this processor stamps into audit trails
    pub source: EventSource,
    /// Hook registrations, installed before workers start
    pub hooks: Hooks,
}

impl ProcessorOptions {
    /// Sets the worker count
    pub fn with_workers(mut self, workers: WorkerCount) -> Self {
        self.workers = workers;
        self
    }

    /// Sets the queue capacity
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        if size > 0 {
            self.buffer_size = size;
        }
        self
    }

    /// Sets a custom GUID generator
    pub fn with_guid_gen(mut self, guid_gen: GuidGenerator) -> Self {
        self.guid_gen = guid_gen;
        self
    }

    /// Sets the processor identity
    pub fn with_source(mut self, source: EventSource) -> Self {
        self.source = source;
        self
    }

    /// Sets the hook registrations
    pub fn with_hooks(mut self, hooks: Hooks) -> Self {
        self.hooks = hooks;
        self
    }
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            workers: WorkerCount::default_for_system(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            guid_gen: Arc::new(|| Uuid::new_v4().to_string()),
            source: EventSource::default_source(),
            hooks: Hooks::new(),
        }
    }
}

/// The event dispatcher.
///
/// Owns the queue and the workers exclusively; holds shared read-only
/// references to the catalog and the stack graph.
pub struct Processor {
    db: Arc<dyn EventDatabase>,
    guid_gen: GuidGenerator,
    source: EventSource,
    queue: RwLock<Option<mpsc::Sender<Request>>>,
    closed: AtomicBool,
    workers: AsyncMutex<Vec<JoinHandle<()>>>,
}

impl Processor {
    /// Creates a processor and starts its workers immediately.
    ///
    /// `main` is the entry stack for every request; `others` are jump
    /// targets, indexed by name.
    pub fn new(
        main: Arc<Stack>,
        others: Vec<Arc<Stack>>,
        db: Arc<dyn EventDatabase>,
        options: ProcessorOptions,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(options.buffer_size);

        let mut stacks = HashMap::with_capacity(others.len());
        for stack in others {
            stacks.insert(stack.name().to_string(), stack);
        }
        let ctx = Arc::new(ProcessContext {
            stacks,
            hooks: HooksRunner::new(options.hooks),
        });

        let worker_count = options.workers.value();
        info!(workers = worker_count, "starting event processor");
        let receiver = Arc::new(AsyncMutex::new(receiver));
        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let receiver = Arc::clone(&receiver);
            let main = Arc::clone(&main);
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(worker_loop(worker_id, receiver, main, ctx)));
        }

        Self {
            db,
            guid_gen: options.guid_gen,
            source: options.source,
            queue: RwLock::new(Some(sender)),
            closed: AtomicBool::new(false),
            workers: AsyncMutex::new(handles),
        }
    }

    /// Identity this processor stamps into audit trails
    pub fn source(&self) -> &EventSource {
        &self.source
    }

    /// Accepts a locally originated event; returns its assigned id.
    pub async fn notify_event(&self, peer: Option<SocketAddr>, mut event: Event) -> Result<String, EventError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EventError::Unavailable);
        }

        let def = match self.validate_notify(&event) {
            Ok(def) => def,
            Err(err) => {
                warn!(peer = %peer_label(&peer), %err, "notify event rejected");
                return Err(err);
            }
        };

        let now = Utc::now();
        event.id = (self.guid_gen)();
        event.received = Some(now);
        event.processors = vec![ProcessInfo {
            received: now,
            processor: self.source.clone(),
        }];
        let event = def.complete(&event);

        let id = event.id.clone();
        self.enqueue(Request::new(event, peer)).await?;
        Ok(id)
    }

    /// Accepts an event forwarded from a peer processor.
    pub async fn forward_event(&self, peer: Option<SocketAddr>, mut event: Event) -> Result<(), EventError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(EventError::Unavailable);
        }

        if let Err(err) = self.validate_forward(&event) {
            warn!(peer = %peer_label(&peer), %err, "forward event rejected");
            return Err(err);
        }

        event.processors.push(ProcessInfo {
            received: Utc::now(),
            processor: self.source.clone(),
        });

        self.enqueue(Request::new(event, peer)).await
    }

    /// Closes the processor: seals the queue and waits for the workers to
    /// drain. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("closing event processor");
        self.queue.write().take();
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            let _ = handle.await;
        }
    }

    fn validate_notify(&self, event: &Event) -> Result<EventDef, EventError> {
        if !event.id.is_empty() {
            return Err(EventError::bad_request("id not empty"));
        }
        if !event.processors.is_empty() {
            return Err(EventError::bad_request("processors not empty"));
        }
        let def = self
            .db
            .find_by_code(event.code)
            .ok_or_else(|| EventError::bad_request(format!("code '{}' not found", event.code)))?;
        def.validate_data(event)
            .map_err(|err| EventError::bad_request(format!("data not valid: {}", err)))?;
        Ok(def)
    }

    fn validate_forward(&self, event: &Event) -> Result<(), EventError> {
        if event.id.is_empty() {
            return Err(EventError::bad_request("event id is empty"));
        }
        if event.processors.is_empty() {
            return Err(EventError::bad_request("event processors is empty"));
        }
        if event
            .processors
            .iter()
            .any(|info| info.processor == self.source)
        {
            return Err(EventError::internal_loop(format!(
                "processor '{}' already in audit trail",
                self.source
            )));
        }
        Ok(())
    }

    async fn enqueue(&self, request: Request) -> Result<(), EventError> {
        let sender = match self.queue.read().as_ref() {
            Some(sender) => sender.clone(),
            None => return Err(EventError::Unavailable),
        };
        sender.send(request).await.map_err(|_| EventError::Unavailable)
    }
}

#[async_trait]
impl EventNotifier for Processor {
    async fn notify_event(&self, event: Event) -> Result<String, EventError> {
        Processor::notify_event(self, None, event).await
    }
}

#[async_trait]
impl EventForwarder for Processor {
    async fn forward_event(&self, event: Event) -> Result<(), EventError> {
        Processor::forward_event(self, None, event).await
    }
}

async fn worker_loop(
    worker_id: usize,
    receiver: Arc<AsyncMutex<mpsc::Receiver<Request>>>,
    main: Arc<Stack>,
    ctx: Arc<ProcessContext>,
) {
    debug!(worker = worker_id, "starting worker");
    loop {
        let request = { receiver.lock().await.recv().await };
        let Some(mut request) = request else { break };

        ctx.hooks.before_proc(&request);
        request.started = Some(Utc::now());
        let (status, _) = main.process(&ctx, &mut request).await;
        request.finished = Some(Utc::now());
        ctx.hooks.after_proc(&request);

        // only call finish hooks on a successful terminal action
        if status.is_terminal_success() {
            ctx.hooks.finish_proc(&request);
        }
    }
    debug!(worker = worker_id, "closing worker");
}

fn peer_label(peer: &Option<SocketAddr>) -> String {
    peer.map(|addr| addr.to_string()).unwrap_or_else(|| "local".to_string())
}
