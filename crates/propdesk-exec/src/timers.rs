use std::cmp::Ordering;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use propdesk_core::TimerDelay;
use propdesk_core::TimerToken;
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Scheduled {
    due_ms: u64,
    seq: u64,
    token: TimerToken,
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due_ms, self.seq).cmp(&(other.due_ms, other.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One-shot timers on a virtual millisecond clock. Timers cannot be
/// cancelled; the reducer drops tokens that are no longer current.
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due_ms: u64, token: TimerToken) {
        self.heap.push(Reverse(Scheduled {
            due_ms,
            seq: self.next_seq,
            token,
        }));
        self.next_seq += 1;
    }

    /// Earliest timer due at or before `now_ms`; ties fire in scheduling
    /// order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerToken)> {
        match self.heap.peek() {
            Some(Reverse(next)) if next.due_ms <= now_ms => {}
            _ => return None,
        }
        self.heap
            .pop()
            .map(|Reverse(scheduled)| (scheduled.due_ms, scheduled.token))
    }

    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(next)| next.due_ms)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

/// Source of simulated camera latency.
#[derive(Debug)]
pub struct FeedLatency {
    rng: StdRng,
}

impl FeedLatency {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn delay_ms(&mut self, delay: TimerDelay) -> u64 {
        match delay {
            TimerDelay::Fixed(ms) => ms,
            TimerDelay::Jitter { min_ms, max_ms } => {
                let (low, high) = if min_ms <= max_ms {
                    (min_ms, max_ms)
                } else {
                    (max_ms, min_ms)
                };
                self.rng.gen_range(low..=high)
            }
        }
    }
}
