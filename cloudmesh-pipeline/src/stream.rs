//! Streaming delivery state machine
//!
//! One worker thread runs the heavy stages (transform application, voxel
//! downsampling) to completion, then hands batches back over a bounded
//! channel. The bounded send is the pipeline's yield point: every batch
//! waits for the consumer, and the cancellation flag is checked between
//! batches, never inside a running stage. The run handle discards any
//! batch still in flight when the flag was raised, so cancellation does
//! not race batch delivery. Batches arrive strictly in production order
//! and already-delivered batches are never rolled back.

use cloudmesh_algorithms::{apply_transform, downsample};
use cloudmesh_core::{Error, GlobalTransform, Point3f, Result};
use crossbeam_channel::{bounded, Receiver};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Full point sets above this count are delivered in chunks; smaller sets
/// arrive as a single batch.
pub const STREAMING_THRESHOLD: usize = 100_000;

/// Size of the initial renderable batch.
pub const FIRST_CHUNK_SIZE: usize = 20_000;

/// Size of every subsequent batch (the last one carries the remainder).
pub const CHUNK_SIZE: usize = 50_000;

/// States of one load-and-render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    TransformComputing,
    Downsampling,
    FirstChunkReady,
    StreamingChunks,
    Complete,
    Cancelled,
}

/// One delivered batch of reduced points with its parallel provenance
/// tags and absolute offset into the reduced sequence.
#[derive(Debug, Clone)]
pub struct Batch {
    pub offset: usize,
    pub positions: Vec<Point3f>,
    pub provenance: Vec<u32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Events delivered to the consumer, in order.
#[derive(Debug)]
pub enum PipelineEvent {
    /// The worker entered a new state.
    StateChanged(PipelineState),
    /// A batch of reduced points is ready to render.
    Batch(Batch),
    /// All batches were delivered.
    Complete { total_points: usize },
    /// The run stopped at a batch boundary after a cancellation request.
    Cancelled,
}

/// Shared cooperative cancellation flag.
///
/// Setting it never interrupts an in-progress stage or batch; it takes
/// effect at the next batch boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Handle to an in-flight pipeline run.
pub struct PipelineRun {
    events: Receiver<PipelineEvent>,
    token: CancelToken,
    handle: Option<JoinHandle<()>>,
}

impl PipelineRun {
    /// Receive the next event, blocking; `None` once the worker is done.
    ///
    /// Once [`cancel`](Self::cancel) has returned, batch events are
    /// discarded here rather than surfaced: a batch committed by the
    /// worker before it observed the flag is still drained off the
    /// channel, but the consumer never sees a batch after cancelling.
    pub fn next_event(&self) -> Option<PipelineEvent> {
        loop {
            let event = self.events.recv().ok()?;
            if self.token.is_cancelled() && matches!(event, PipelineEvent::Batch(_)) {
                continue;
            }
            return Some(event);
        }
    }

    /// Drain the run to completion, collecting every delivered batch in
    /// order. A run that ends at a cancellation boundary yields
    /// [`Error::Cancelled`] instead of its partial batches.
    pub fn collect_batches(self) -> Result<Vec<Batch>> {
        let mut batches = Vec::new();
        while let Some(event) = self.next_event() {
            match event {
                PipelineEvent::Batch(batch) => batches.push(batch),
                PipelineEvent::Cancelled => return Err(Error::Cancelled),
                PipelineEvent::StateChanged(_) | PipelineEvent::Complete { .. } => {}
            }
        }
        Ok(batches)
    }

    /// Request cancellation at the next batch boundary.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The run's cancellation token.
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Stop consuming and wait for the worker to exit. Undelivered events
    /// are discarded; the worker stops at its next send once the channel
    /// disconnects. Dropping the run does the same.
    pub fn join(mut self) {
        drop(std::mem::replace(&mut self.events, bounded(0).1));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for PipelineRun {
    fn drop(&mut self) {
        // Unblock and stop the worker if the consumer walked away.
        self.token.cancel();
        drop(std::mem::replace(&mut self.events, bounded(0).1));
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Start a pipeline run over a snapshot of the accumulated set.
///
/// `points` and `tags` must be in lock-step. The transform is applied to
/// the snapshot, the result is downsampled at `level`, and the reduced
/// set is delivered per the chunking contract: everything at once when
/// the snapshot is at or below [`STREAMING_THRESHOLD`], otherwise a
/// [`FIRST_CHUNK_SIZE`] batch followed by [`CHUNK_SIZE`] batches.
pub fn start(
    points: Vec<Point3f>,
    tags: Vec<u32>,
    transform: GlobalTransform,
    level: u8,
) -> PipelineRun {
    let token = CancelToken::new();
    let worker_token = token.clone();
    // Rendezvous channel: a send completes only when the consumer takes
    // the event, so the worker never runs ahead of delivery.
    let (tx, rx) = bounded(0);

    let handle = std::thread::spawn(move || {
        run_stages(points, tags, transform, level, worker_token, tx);
    });

    PipelineRun {
        events: rx,
        token,
        handle: Some(handle),
    }
}

fn run_stages(
    mut points: Vec<Point3f>,
    tags: Vec<u32>,
    transform: GlobalTransform,
    level: u8,
    token: CancelToken,
    tx: crossbeam_channel::Sender<PipelineEvent>,
) {
    let streaming = points.len() > STREAMING_THRESHOLD;

    macro_rules! send {
        ($event:expr) => {
            if tx.send($event).is_err() {
                // Consumer dropped the run; nothing left to deliver.
                return;
            }
        };
    }
    macro_rules! check_cancel {
        () => {
            if token.is_cancelled() {
                send!(PipelineEvent::StateChanged(PipelineState::Cancelled));
                send!(PipelineEvent::Cancelled);
                return;
            }
        };
    }

    send!(PipelineEvent::StateChanged(PipelineState::TransformComputing));
    apply_transform(&mut points, &transform);
    check_cancel!();

    send!(PipelineEvent::StateChanged(PipelineState::Downsampling));
    let (reduced, reduced_tags) = downsample(&points, Some(&tags), level);
    // Transient buffers go away here, the same on every exit path.
    drop(points);
    drop(tags);
    let reduced_tags = reduced_tags.unwrap_or_default();
    let total = reduced.len();
    check_cancel!();

    if !streaming {
        send!(PipelineEvent::Batch(Batch {
            offset: 0,
            positions: reduced,
            provenance: reduced_tags,
        }));
        send!(PipelineEvent::StateChanged(PipelineState::Complete));
        send!(PipelineEvent::Complete {
            total_points: total
        });
        return;
    }

    let first = FIRST_CHUNK_SIZE.min(total);
    send!(PipelineEvent::StateChanged(PipelineState::FirstChunkReady));
    send!(PipelineEvent::Batch(Batch {
        offset: 0,
        positions: reduced[..first].to_vec(),
        provenance: reduced_tags[..first].to_vec(),
    }));

    send!(PipelineEvent::StateChanged(PipelineState::StreamingChunks));
    let mut offset = first;
    while offset < total {
        check_cancel!();
        let end = (offset + CHUNK_SIZE).min(total);
        send!(PipelineEvent::Batch(Batch {
            offset,
            positions: reduced[offset..end].to_vec(),
            provenance: reduced_tags[offset..end].to_vec(),
        }));
        offset = end;
    }

    send!(PipelineEvent::StateChanged(PipelineState::Complete));
    send!(PipelineEvent::Complete {
        total_points: total
    });
}
