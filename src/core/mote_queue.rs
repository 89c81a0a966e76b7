/// Stagger queue for text motes thrown into the same map cell.
///
/// Motes that arrive together are released one `delay` apart instead of
/// being drawn on top of each other. After each release the queue stays
/// "settling" for `delay` steps so that a mote arriving just afterwards is
/// still spaced out from the one already on screen.
use std::collections::VecDeque;

use crate::core::host::{SpawnError, TextSpawner};
use crate::schema::effect::FloatingText;

#[derive(Debug, Clone)]
struct QueuedMote {
    mote: FloatingText,
    /// Steps left until release.
    release_in: u32,
}

#[derive(Debug, Clone)]
pub struct TextMoteQueue {
    pending: VecDeque<QueuedMote>,
    /// Steps until a fresh mote may be released without overlapping.
    settle: u32,
    delay: u32,
    released: u64,
}

impl TextMoteQueue {
    pub fn new(delay: u32) -> Self {
        Self {
            pending: VecDeque::new(),
            settle: 0,
            delay,
            released: 0,
        }
    }

    /// Appends a mote and returns its release offset in steps.
    pub fn enqueue(&mut self, mote: FloatingText) -> u32 {
        let release_in = match self.pending.back() {
            Some(last) => last.release_in.saturating_add(self.delay),
            None => self.settle,
        };
        self.pending.push_back(QueuedMote { mote, release_in });
        release_in
    }

    /// Runs one scheduling step: spawns every mote that is due, then counts
    /// the rest down. Returns `Ok(false)` once nothing is pending.
    ///
    /// A mote whose cell is out of bounds is dropped on its own. If the map
    /// itself is gone the whole queue is discarded and the error returned.
    pub fn advance<S: TextSpawner + ?Sized>(
        &mut self,
        spawner: &mut S,
    ) -> Result<bool, SpawnError> {
        while self.pending.front().is_some_and(|q| q.release_in == 0) {
            let Some(queued) = self.pending.pop_front() else {
                break;
            };
            match spawner.spawn_text(&queued.mote) {
                Ok(_) => self.released += 1,
                Err(err @ SpawnError::MapUnavailable(_)) => {
                    self.pending.clear();
                    self.settle = 0;
                    return Err(err);
                }
                Err(err) => {
                    tracing::debug!("Dropping text mote '{}': {}", queued.mote.text, err);
                }
            }
            self.settle = self.delay;
        }

        for queued in self.pending.iter_mut() {
            queued.release_in -= 1;
        }
        self.settle = self.settle.saturating_sub(1);

        Ok(!self.pending.is_empty())
    }

    /// Still worth keeping: something is pending or a release is settling.
    pub fn is_valid(&self) -> bool {
        !self.pending.is_empty() || self.settle > 0
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Remaining release offsets in queue order.
    pub fn release_offsets(&self) -> Vec<u32> {
        self.pending.iter().map(|q| q.release_in).collect()
    }

    /// Number of motes successfully handed to the spawner.
    pub fn released(&self) -> u64 {
        self.released
    }
}
