use std::time::{Duration, Instant};

/// Turns bursts of file changes into background reloads.
///
/// Each reload is tagged with a generation. A manual rescan bumps the generation, so a
/// background result started before it is dropped instead of replacing newer data.
#[derive(Clone, Debug)]
pub struct ReloadSchedule {
    debounce: Duration,
    max_delay: Duration,
    pending: bool,
    first_change_at: Option<Instant>,
    deadline: Option<Instant>,
    in_flight: bool,
    generation: u64,
}

impl ReloadSchedule {
    pub fn new(debounce: Duration, max_delay: Duration) -> Self {
        Self {
            debounce,
            max_delay,
            pending: false,
            first_change_at: None,
            deadline: None,
            in_flight: false,
            generation: 0,
        }
    }

    pub fn note_change(&mut self, now: Instant) {
        self.pending = true;
        self.deadline = Some(now + self.debounce);
        if self.first_change_at.is_none() {
            self.first_change_at = Some(now);
        }
    }

    /// Returns the generation to tag a new background reload with, when one is due.
    pub fn start_due(&mut self, now: Instant) -> Option<u64> {
        if !self.pending || self.in_flight {
            return None;
        }
        let due_by_debounce = self.deadline.is_some_and(|due| now >= due);
        let due_by_max_delay = self
            .first_change_at
            .is_some_and(|first| now.duration_since(first) >= self.max_delay);
        if !(due_by_debounce || due_by_max_delay) {
            return None;
        }

        self.clear_pending();
        self.in_flight = true;
        Some(self.generation)
    }

    /// Records a finished background reload; `false` means its result is stale.
    pub fn finish(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// A synchronous reload covers every change seen so far.
    pub fn rescan(&mut self) {
        self.clear_pending();
        self.in_flight = false;
        self.generation = self.generation.wrapping_add(1);
    }

    fn clear_pending(&mut self) {
        self.pending = false;
        self.first_change_at = None;
        self.deadline = None;
    }
}
