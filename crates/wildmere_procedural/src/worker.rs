//! # Background Chunk Generation
//!
//! A fixed pool of threads that turns chunk coordinates into generated
//! [`TerrainChunk`]s. The main tick submits work and later drains a
//! completion queue; it never blocks on generation unless it asks to.
//!
//! ```text
//! main tick ──submit(coord)──> [job channel] ──> worker 0..N
//!     ^                                              │ generate()
//!     └──────drain_completed()── [done channel] <────┘
//! ```
//!
//! Height sampling is a pure function, so workers share nothing but the
//! two channels.

use std::collections::HashSet;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::chunk::{ChunkCoord, ChunkKey, ChunkLayout, TerrainChunk};
use crate::heightfield::HeightFieldGenerator;

/// Threads generating chunks off the main tick.
pub struct ChunkWorkerPool {
    layout: ChunkLayout,
    generator: HeightFieldGenerator,
    job_tx: Option<Sender<ChunkCoord>>,
    done_tx: Sender<TerrainChunk>,
    done_rx: Receiver<TerrainChunk>,
    workers: Vec<JoinHandle<()>>,
    pending: HashSet<ChunkKey>,
}

impl ChunkWorkerPool {
    /// Starts `threads` workers (at least one).
    ///
    /// If the OS refuses to spawn any thread, submitted chunks are
    /// generated inline instead.
    #[must_use]
    pub fn new(threads: usize, layout: ChunkLayout, generator: HeightFieldGenerator) -> Self {
        let (job_tx, job_rx) = unbounded::<ChunkCoord>();
        let (done_tx, done_rx) = unbounded();

        let mut workers = Vec::with_capacity(threads.max(1));
        for id in 0..threads.max(1) {
            let jobs = job_rx.clone();
            let done = done_tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("chunk-worker-{id}"))
                .spawn(move || Self::worker_loop(&jobs, &done, layout, generator));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => tracing::error!("Failed to spawn chunk worker {}: {}", id, e),
            }
        }

        if workers.is_empty() {
            tracing::warn!("No chunk workers running; generating inline");
        } else {
            tracing::debug!("Chunk worker pool started with {} threads", workers.len());
        }

        Self {
            layout,
            generator,
            job_tx: Some(job_tx),
            done_tx,
            done_rx,
            workers,
            pending: HashSet::new(),
        }
    }

    fn worker_loop(
        jobs: &Receiver<ChunkCoord>,
        done: &Sender<TerrainChunk>,
        layout: ChunkLayout,
        generator: HeightFieldGenerator,
    ) {
        // Ends when the pool drops its job sender.
        while let Ok(coord) = jobs.recv() {
            let chunk = TerrainChunk::generated(coord, layout, &generator);
            if done.send(chunk).is_err() {
                break;
            }
        }
    }

    /// Layout every chunk in this pool is generated with.
    #[must_use]
    pub const fn layout(&self) -> ChunkLayout {
        self.layout
    }

    /// Queues a chunk. Returns `false` if it is already in flight.
    pub fn submit(&mut self, coord: ChunkCoord) -> bool {
        if !self.pending.insert(coord.key()) {
            return false;
        }

        let queued = match (&self.job_tx, self.workers.is_empty()) {
            (Some(tx), false) => tx.send(coord).is_ok(),
            _ => false,
        };
        if !queued {
            let chunk = TerrainChunk::generated(coord, self.layout, &self.generator);
            // done_rx lives as long as self, so this cannot fail.
            let _ = self.done_tx.send(chunk);
        }
        true
    }

    /// True if the chunk was submitted and has not been drained yet.
    #[must_use]
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord.key())
    }

    /// Chunks submitted but not yet drained.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Everything finished so far, without blocking.
    pub fn drain_completed(&mut self) -> Vec<TerrainChunk> {
        let done: Vec<_> = self.done_rx.try_iter().collect();
        for chunk in &done {
            self.pending.remove(&chunk.key());
        }
        done
    }

    /// Blocks until every pending chunk is done or `timeout` elapses.
    pub fn wait_all(&mut self, timeout: Duration) -> Vec<TerrainChunk> {
        let deadline = Instant::now() + timeout;
        let mut done = Vec::with_capacity(self.pending.len());
        while !self.pending.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.done_rx.recv_timeout(remaining) {
                Ok(chunk) => {
                    self.pending.remove(&chunk.key());
                    done.push(chunk);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!("Timed out with {} chunks still generating", self.pending.len());
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        done
    }
}

impl Drop for ChunkWorkerPool {
    fn drop(&mut self) {
        // Closing the job channel stops every worker after its current chunk.
        self.job_tx.take();
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("Chunk worker panicked");
            }
        }
    }
}

impl std::fmt::Debug for ChunkWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkWorkerPool")
            .field("workers", &self.workers.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_generates_same_chunk_as_inline() {
        let layout = ChunkLayout::default();
        let gen = HeightFieldGenerator::new();
        let mut pool = ChunkWorkerPool::new(2, layout, gen);

        assert!(pool.submit(ChunkCoord::new(1, -1)));
        assert!(!pool.submit(ChunkCoord::new(1, -1)), "duplicate submit is ignored");
        assert!(pool.is_pending(ChunkCoord::new(1, -1)));

        let done = pool.wait_all(Duration::from_secs(30));
        assert_eq!(done.len(), 1);
        assert_eq!(pool.pending_count(), 0);

        let inline = TerrainChunk::generated(ChunkCoord::new(1, -1), layout, &gen);
        assert_eq!(done[0].vertices(), inline.vertices());
        assert_eq!(done[0].indices(), inline.indices());
    }

    #[test]
    fn test_pool_drains_many() {
        let mut pool = ChunkWorkerPool::new(4, ChunkLayout::new(16, 1.0), HeightFieldGenerator::new());
        for coord in ChunkCoord::new(0, 0).neighborhood(2) {
            pool.submit(coord);
        }
        assert_eq!(pool.pending_count(), 25);

        let mut done = pool.wait_all(Duration::from_secs(30));
        done.extend(pool.drain_completed());
        assert_eq!(done.len(), 25);
        let keys: HashSet<_> = done.iter().map(TerrainChunk::key).collect();
        assert_eq!(keys.len(), 25);
    }
}
