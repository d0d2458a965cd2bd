use rand::Rng;
use std::collections::VecDeque;

pub const BAR_COUNT: usize = 120;
pub const MAX_BAR_HEIGHT: f32 = 150.0;

/// Rise/decay rates in height units per second.
pub const RISE_SPEED: f32 = 300.0;
pub const DECAY_RATE: f32 = 10.0;

/// How many recent bars feed the sine overlay amplitude.
const WAVE_WINDOW: usize = 10;
/// Amplitude cap: half the 270px lower panel minus a margin.
pub const WAVE_AMPLITUDE_CAP: f32 = 115.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn random(rng: &mut impl Rng) -> Self {
        Self {
            r: rng.gen_range(50..=200),
            g: rng.gen_range(50..=200),
            b: rng.gen_range(50..=200),
        }
    }

    /// 0x00RRGGBB packing for softbuffer surfaces.
    pub fn pack(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// Smoothed rise/decay animation feeding a rolling bar history.
///
/// This is a synthetic decay animation, not signal analysis: note-on events
/// inject burst values, and an unconditional `add_value(0, dt)` per frame
/// keeps the level decaying toward zero. The bar history is a fixed-length
/// ring; its length never changes after construction.
pub struct Visualizer {
    current_level: f32,
    bars: VecDeque<f32>,
    colors: Vec<Rgb>,
}

impl Visualizer {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            current_level: 0.0,
            bars: std::iter::repeat(0.0).take(BAR_COUNT).collect(),
            colors: (0..BAR_COUNT).map(|_| Rgb::random(rng)).collect(),
        }
    }

    /// Advance the level toward `value * 1.5` (capped), rate-limited by
    /// RISE_SPEED upward and DECAY_RATE downward, then record it.
    ///
    /// Called once per frame with value 0 for continuous decay, plus once
    /// per note-on burst, so it may run more than once within a frame.
    pub fn add_value(&mut self, value: f32, dt: f32, rng: &mut impl Rng) {
        let target = (value * 1.5).min(MAX_BAR_HEIGHT);

        if target > self.current_level {
            self.current_level += RISE_SPEED * dt;
            if self.current_level > target {
                self.current_level = target;
            }
        } else {
            self.current_level -= DECAY_RATE * dt;
            if self.current_level < 0.0 {
                self.current_level = 0.0;
            }
        }

        self.bars.pop_front();
        self.bars.push_back(self.current_level);
        self.sync_colors(rng);
    }

    /// Keep the color table length-matched with the bar history: append
    /// random colors when short, drop the oldest when long.
    fn sync_colors(&mut self, rng: &mut impl Rng) {
        while self.colors.len() < self.bars.len() {
            self.colors.push(Rgb::random(rng));
        }
        if self.colors.len() > self.bars.len() {
            let excess = self.colors.len() - self.bars.len();
            self.colors.drain(..excess);
        }
    }

    pub fn current_level(&self) -> f32 {
        self.current_level
    }

    pub fn bars(&self) -> impl Iterator<Item = f32> + '_ {
        self.bars.iter().copied()
    }

    pub fn bar_count(&self) -> usize {
        self.bars.len()
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn randomize_colors(&mut self, rng: &mut impl Rng) {
        for c in self.colors.iter_mut() {
            *c = Rgb::random(rng);
        }
    }

    pub fn reset_level(&mut self) {
        self.current_level = 0.0;
    }

    /// Sine overlay amplitude: mean of the most recent bars, capped.
    pub fn wave_amplitude(&self) -> f32 {
        if self.bars.len() < WAVE_WINDOW {
            return 0.0;
        }
        let sum: f32 = self.bars.iter().rev().take(WAVE_WINDOW).sum();
        (sum / WAVE_WINDOW as f32).min(WAVE_AMPLITUDE_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn rise_is_rate_limited() {
        let mut v = Visualizer::new(&mut rng());
        // Target is min(100 * 1.5, 150) = 150; one step of 300 u/s over 0.1s.
        v.add_value(100.0, 0.1, &mut rng());
        assert_eq!(v.current_level(), 30.0);
    }

    #[test]
    fn rise_clamps_at_target() {
        let mut v = Visualizer::new(&mut rng());
        // Target 15; a full second of rise would overshoot to 300.
        v.add_value(10.0, 1.0, &mut rng());
        assert_eq!(v.current_level(), 15.0);
    }

    #[test]
    fn decay_is_rate_limited_and_floored() {
        let mut v = Visualizer::new(&mut rng());
        v.add_value(100.0, 0.1, &mut rng()); // level 30
        v.add_value(0.0, 0.5, &mut rng());
        assert_eq!(v.current_level(), 25.0); // 30 - 10 * 0.5

        // Long silence never goes below zero.
        for _ in 0..100 {
            v.add_value(0.0, 1.0, &mut rng());
        }
        assert_eq!(v.current_level(), 0.0);
    }

    #[test]
    fn level_stays_bounded() {
        let mut v = Visualizer::new(&mut rng());
        let mut r = rng();
        for i in 0..1000 {
            let value = (i % 7) as f32 * 40.0;
            let dt = (i % 3) as f32 * 0.05;
            v.add_value(value, dt, &mut r);
            assert!(v.current_level() >= 0.0);
            assert!(v.current_level() <= MAX_BAR_HEIGHT);
        }
    }

    #[test]
    fn bar_history_length_is_invariant() {
        let mut v = Visualizer::new(&mut rng());
        let mut r = rng();
        assert_eq!(v.bar_count(), BAR_COUNT);
        for _ in 0..500 {
            v.add_value(75.0, 0.016, &mut r);
            assert_eq!(v.bar_count(), BAR_COUNT);
            assert_eq!(v.colors().len(), BAR_COUNT);
        }
    }

    #[test]
    fn newest_bar_carries_current_level() {
        let mut v = Visualizer::new(&mut rng());
        v.add_value(100.0, 0.1, &mut rng());
        assert_eq!(v.bars().last(), Some(30.0));
    }

    #[test]
    fn reset_level_zeroes_immediately() {
        let mut v = Visualizer::new(&mut rng());
        v.add_value(100.0, 0.2, &mut rng());
        assert!(v.current_level() > 0.0);
        v.reset_level();
        assert_eq!(v.current_level(), 0.0);
    }

    #[test]
    fn wave_amplitude_is_recent_mean_capped() {
        let mut v = Visualizer::new(&mut rng());
        assert_eq!(v.wave_amplitude(), 0.0);

        // Drive the level to the max and hold it there long enough that the
        // last 10 bars are all at MAX_BAR_HEIGHT.
        let mut r = rng();
        for _ in 0..20 {
            v.add_value(100.0, 0.1, &mut r);
        }
        assert_eq!(v.wave_amplitude(), WAVE_AMPLITUDE_CAP);
    }

    #[test]
    fn randomize_colors_keeps_length() {
        let mut v = Visualizer::new(&mut rng());
        let before = v.colors().to_vec();
        v.randomize_colors(&mut StdRng::seed_from_u64(99));
        assert_eq!(v.colors().len(), before.len());
        assert_ne!(v.colors(), &before[..]);
    }

    #[test]
    fn rgb_pack_layout() {
        let c = Rgb {
            r: 0x12,
            g: 0x34,
            b: 0x56,
        };
        assert_eq!(c.pack(), 0x0012_3456);
    }
}
