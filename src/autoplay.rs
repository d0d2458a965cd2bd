use crate::notes::NoteIndex;
use rand::Rng;
use std::collections::HashMap;

/// Minimum wall-clock gap between auto-pressed keys.
pub const FIRE_INTERVAL_MS: u64 = 350;
/// How long each auto-pressed note is held before release.
pub const HOLD_MS: u64 = 300;

/// Timer-driven random key presser.
///
/// While enabled, at most one key fires per interval window; its release is
/// scheduled and drained on later frames. Timestamps are caller-supplied
/// milliseconds so the scheduler stays clock-free and testable.
pub struct AutoPlay {
    enabled: bool,
    last_fire_ms: u64,
    pending: HashMap<NoteIndex, u64>,
}

impl AutoPlay {
    pub fn new() -> Self {
        Self {
            enabled: false,
            last_fire_ms: 0,
            pending: HashMap::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Pick a key to auto-press this frame, if enabled and the interval has
    /// elapsed. Re-picking a note whose release is still pending overwrites
    /// the schedule entry (last pick wins); the router's re-trigger handling
    /// makes the overlap harmless.
    pub fn pick(
        &mut self,
        now_ms: u64,
        playable: &[NoteIndex],
        rng: &mut impl Rng,
    ) -> Option<NoteIndex> {
        if !self.enabled || playable.is_empty() {
            return None;
        }
        if now_ms.saturating_sub(self.last_fire_ms) <= FIRE_INTERVAL_MS {
            return None;
        }

        self.last_fire_ms = now_ms;
        let note = playable[rng.gen_range(0..playable.len())];
        self.pending.insert(note, now_ms + HOLD_MS);
        Some(note)
    }

    /// Notes whose scheduled release time has elapsed; entries are removed.
    /// Runs regardless of the enabled flag so releases still drain after
    /// auto-play is toggled off.
    pub fn due_releases(&mut self, now_ms: u64) -> Vec<NoteIndex> {
        let due: Vec<NoteIndex> = self
            .pending
            .iter()
            .filter(|(_, &t)| now_ms >= t)
            .map(|(&n, _)| n)
            .collect();
        for n in &due {
            self.pending.remove(n);
        }
        due
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for AutoPlay {
    fn default() -> Self {
        Self::new()
    }
}
