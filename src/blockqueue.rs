//! The tile scheduler: a single shared atomic cursor over the flattened pixel range, handed out
//! in `TILE`-sized chunks to whichever worker thread asks next. A single counter needs no
//! mutex, so the cursor is a lock-free `atomic::Atomic<usize>` compare-and-swap loop rather than
//! a `Mutex<usize>`.

use atomic::{Atomic, Ordering};

pub const TILE: usize = 4096;

/// A half-open pixel index range `[start, end)` into the flattened `width * height` buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Block {
    pub start: usize,
    pub end: usize,
}

pub struct BlockQueue {
    cursor: Atomic<usize>,
    total: usize,
    tile: usize,
}

impl BlockQueue {
    pub fn new(total: usize) -> Self {
        BlockQueue::with_tile(total, TILE)
    }

    pub fn with_tile(total: usize, tile: usize) -> Self {
        BlockQueue { cursor: Atomic::new(0), total, tile: tile.max(1) }
    }

    /// Atomically claims the next tile, or `None` once the cursor has reached `total`.
    pub fn next(&self) -> Option<Block> {
        let mut start = self.cursor.load(Ordering::Relaxed);
        loop {
            if start >= self.total {
                return None;
            }
            let end = (start + self.tile).min(self.total);
            match self.cursor.compare_exchange(start, end, Ordering::SeqCst, Ordering::Relaxed) {
                Ok(_) => return Some(Block { start, end }),
                Err(observed) => start = observed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn single_threaded_exhausts_the_full_range() {
        let queue = BlockQueue::with_tile(10_000, 4096);
        let mut covered = 0;
        while let Some(block) = queue.next() {
            covered += block.end - block.start;
        }
        assert_eq!(covered, 10_000);
        assert!(queue.next().is_none());
    }

    #[test]
    fn concurrent_workers_partition_the_range_without_overlap_or_gaps() {
        let queue = Arc::new(BlockQueue::with_tile(100_000, 4096));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(block) = queue.next() {
                        claimed.push(block);
                    }
                    claimed
                })
            })
            .collect();
        let mut all: Vec<Block> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_by_key(|b| b.start);
        let mut expected_start = 0;
        for block in &all {
            assert_eq!(block.start, expected_start);
            expected_start = block.end;
        }
        assert_eq!(expected_start, 100_000);
    }
}
