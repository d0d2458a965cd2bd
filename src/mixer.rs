use crate::clips::ClipCatalog;
use crate::router::ChannelCommand;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One playback channel per note index, bound at construction and never
/// reassigned. Runs on the audio thread; the control thread talks to it
/// through `ChannelCommand`s and samples the shared busy flags read-only.
pub struct ChannelMixer {
    sample_rate_hz: f32,
    channels: Vec<Channel>,
    busy: Arc<Vec<AtomicBool>>,
}

struct Channel {
    clip: Option<Arc<[f32]>>,
    pos: usize,
    gain: f32,
    /// Per-sample gain decrement while fading; 0.0 when not fading.
    fade_step: f32,
    playing: bool,
}

impl Channel {
    fn new(clip: Option<Arc<[f32]>>) -> Self {
        Self {
            clip,
            pos: 0,
            gain: 1.0,
            fade_step: 0.0,
            playing: false,
        }
    }
}

impl ChannelMixer {
    pub fn new(catalog: &ClipCatalog, sample_rate_hz: u32) -> Self {
        let channels: Vec<Channel> = catalog
            .clips()
            .iter()
            .map(|c| Channel::new(c.clone()))
            .collect();
        let busy = Arc::new(
            (0..channels.len())
                .map(|_| AtomicBool::new(false))
                .collect::<Vec<_>>(),
        );
        Self {
            sample_rate_hz: sample_rate_hz.max(1) as f32,
            channels,
            busy,
        }
    }

    /// Shared busy flags, one per channel, for control-side sampling.
    pub fn busy_flags(&self) -> Arc<Vec<AtomicBool>> {
        self.busy.clone()
    }

    pub fn apply(&mut self, command: ChannelCommand) {
        match command {
            ChannelCommand::PlayLooped(note) => {
                let Some(ch) = self.channels.get_mut(note.0 as usize) else {
                    return;
                };
                // Restart from the top with a clean gain; a re-trigger on a
                // fading channel replaces it outright, never overlaps it.
                ch.pos = 0;
                ch.gain = 1.0;
                ch.fade_step = 0.0;
                ch.playing = ch.clip.is_some();
                self.busy[note.0 as usize].store(ch.playing, Ordering::Relaxed);
            }
            ChannelCommand::Stop(note) => {
                let Some(ch) = self.channels.get_mut(note.0 as usize) else {
                    return;
                };
                ch.playing = false;
                self.busy[note.0 as usize].store(false, Ordering::Relaxed);
            }
            ChannelCommand::FadeOut(note, ms) => {
                let Some(ch) = self.channels.get_mut(note.0 as usize) else {
                    return;
                };
                if ch.playing && ch.fade_step == 0.0 {
                    let samples = (self.sample_rate_hz * ms as f32 / 1000.0).max(1.0);
                    ch.fade_step = ch.gain / samples;
                }
            }
        }
    }

    fn render_sample(&mut self) -> f32 {
        let mut acc = 0.0f32;

        for (i, ch) in self.channels.iter_mut().enumerate() {
            if !ch.playing {
                continue;
            }
            let Some(clip) = &ch.clip else {
                ch.playing = false;
                continue;
            };

            acc += clip[ch.pos] * ch.gain;
            ch.pos = (ch.pos + 1) % clip.len();

            if ch.fade_step > 0.0 {
                ch.gain -= ch.fade_step;
                if ch.gain <= 0.0 {
                    ch.gain = 1.0;
                    ch.fade_step = 0.0;
                    ch.playing = false;
                    self.busy[i].store(false, Ordering::Relaxed);
                }
            }
        }

        // Soft limiter so overlapping loops don't clip harshly.
        acc / (1.0 + acc.abs())
    }

    pub fn render_f32_interleaved(&mut self, out: &mut [f32], out_channels: usize) {
        assert!(out_channels >= 1);
        assert!(out.len() % out_channels == 0);

        let frames = out.len() / out_channels;
        for frame in 0..frames {
            let s = self.render_sample();
            let base = frame * out_channels;
            for ch in 0..out_channels {
                out[base + ch] = s;
            }
        }
    }

    pub fn render_i16_interleaved(&mut self, out: &mut [i16], out_channels: usize) {
        assert!(out_channels >= 1);
        assert!(out.len() % out_channels == 0);

        let frames = out.len() / out_channels;
        for frame in 0..frames {
            let s = (self.render_sample() * i16::MAX as f32) as i16;
            let base = frame * out_channels;
            for ch in 0..out_channels {
                out[base + ch] = s;
            }
        }
    }
}
