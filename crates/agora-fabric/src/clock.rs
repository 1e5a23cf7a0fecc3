use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use agora_types::TemporalAnchor;

struct HlcState {
    physical_ms: u64,
    logical: u32,
}

/// Hybrid Logical Clock stamping links.
///
/// Combines wall-clock time with a logical counter to produce strictly
/// increasing [`TemporalAnchor`] values.
///
/// # Rules
///
/// - **Local event**: `physical = max(wall_clock, state.physical)`.
///   If physical advanced, `logical = 0`; otherwise `logical += 1`.
/// - **Receive**: `physical = max(wall_clock, state.physical, received.physical)`,
///   with logical strictly greater than both local and received counters when
///   the physical component ties.
///
/// A replica that observes a link and then creates one therefore stamps the
/// new link strictly after the observed one.
pub struct HybridLogicalClock {
    node_id: u16,
    state: Mutex<HlcState>,
}

impl HybridLogicalClock {
    pub fn new(node_id: u16) -> Self {
        Self {
            node_id,
            state: Mutex::new(HlcState {
                physical_ms: 0,
                logical: 0,
            }),
        }
    }

    /// Stamp a local event.
    pub fn now(&self) -> TemporalAnchor {
        let wall = Self::wall_clock_ms();
        let mut state = self.state.lock().expect("HLC mutex poisoned");

        let (physical, logical) = if wall > state.physical_ms {
            (wall, 0)
        } else {
            successor(state.physical_ms, state.logical)
        };

        state.physical_ms = physical;
        state.logical = logical;
        TemporalAnchor::new(physical, logical, self.node_id)
    }

    /// Advance past a received stamp. The returned anchor is strictly greater
    /// than both the previous local state and `received`.
    pub fn update(&self, received: &TemporalAnchor) -> TemporalAnchor {
        let wall = Self::wall_clock_ms();
        let mut state = self.state.lock().expect("HLC mutex poisoned");

        let max = wall.max(state.physical_ms).max(received.physical_ms);
        let (physical, logical) = if max > state.physical_ms && max > received.physical_ms {
            (max, 0)
        } else if max == state.physical_ms && max == received.physical_ms {
            successor(max, state.logical.max(received.logical))
        } else if max == state.physical_ms {
            successor(max, state.logical)
        } else {
            successor(max, received.logical)
        };

        state.physical_ms = physical;
        state.logical = logical;
        TemporalAnchor::new(physical, logical, self.node_id)
    }

    /// The most recent stamp issued or observed, without advancing.
    pub fn last(&self) -> TemporalAnchor {
        let state = self.state.lock().expect("HLC mutex poisoned");
        TemporalAnchor::new(state.physical_ms, state.logical, self.node_id)
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }

    fn wall_clock_ms() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// The next `(physical, logical)` pair. An exhausted logical counter rolls
/// over into the next millisecond.
fn successor(physical: u64, logical: u32) -> (u64, u32) {
    match logical.checked_add(1) {
        Some(next) => (physical, next),
        None => (physical.saturating_add(1), 0),
    }
}

/// The agent's write path clock: per-agent link sequence plus HLC stamp.
///
/// `next` allocates both under one mutex, so concurrent `create` calls on the
/// same agent get distinct sequences whose stamps increase in sequence order.
pub struct WriteClock {
    hlc: HybridLogicalClock,
    sequence: Mutex<u64>,
}

impl WriteClock {
    pub fn new(node_id: u16) -> Self {
        Self {
            hlc: HybridLogicalClock::new(node_id),
            sequence: Mutex::new(0),
        }
    }

    /// Allocate the next `(sequence, stamp)` pair. Sequences start at 1.
    pub fn next(&self) -> (u64, TemporalAnchor) {
        let mut sequence = self.sequence.lock().expect("sequence mutex poisoned");
        *sequence += 1;
        (*sequence, self.hlc.now())
    }

    /// Fold in a stamp seen on a received or replayed link.
    pub fn observe(&self, stamp: &TemporalAnchor) {
        self.hlc.update(stamp);
    }

    /// Never hand out a sequence at or below `sequence` again.
    pub fn restore_sequence(&self, sequence: u64) {
        let mut current = self.sequence.lock().expect("sequence mutex poisoned");
        *current = (*current).max(sequence);
    }

    /// The last sequence handed out (0 before the first write).
    pub fn last_sequence(&self) -> u64 {
        *self.sequence.lock().expect("sequence mutex poisoned")
    }

    pub fn hlc(&self) -> &HybridLogicalClock {
        &self.hlc
    }
}
