use crate::clips::ClipCatalog;
use crate::mixer::ChannelMixer;
use crate::notes::NoteIndex;
use crate::router::ChannelCommand;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// cpal-backed playback for the fixed per-note channel pool.
///
/// Commands are fire-and-forget: they cross to the audio callback over a
/// channel and are drained at the start of each buffer. The frame thread
/// never blocks on audio.
pub struct AudioOutput {
    tx: Sender<ChannelCommand>,
    busy: Arc<Vec<AtomicBool>>,
    // Keep stream alive.
    _stream: cpal::Stream,
}

impl AudioOutput {
    pub fn new(catalog: &ClipCatalog) -> Result<Self, String> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| "no default output device".to_string())?;

        let supported = device
            .default_output_config()
            .map_err(|e| format!("default_output_config: {e}"))?;

        let (tx, rx) = crossbeam_channel::unbounded();

        let sample_rate = supported.sample_rate().0;
        let out_channels = supported.channels() as usize;

        let mixer = ChannelMixer::new(catalog, sample_rate);
        let busy = mixer.busy_flags();

        let stream = match supported.sample_format() {
            cpal::SampleFormat::F32 => {
                let config: cpal::StreamConfig = supported.into();
                build_stream_f32(&device, &config, rx, mixer, out_channels)?
            }
            cpal::SampleFormat::I16 => {
                let config: cpal::StreamConfig = supported.into();
                build_stream_i16(&device, &config, rx, mixer, out_channels)?
            }
            other => return Err(format!("unsupported sample format: {other:?}")),
        };

        Ok(Self {
            tx,
            busy,
            _stream: stream,
        })
    }

    pub fn apply(&self, command: ChannelCommand) {
        let _ = self.tx.send(command);
    }

    /// Read-only sample of the channel's busy flag; true while looping or
    /// still fading out.
    pub fn is_busy(&self, note: NoteIndex) -> bool {
        self.busy
            .get(note.0 as usize)
            .map_or(false, |b| b.load(Ordering::Relaxed))
    }
}

fn drain_commands(rx: &Receiver<ChannelCommand>, mixer: &mut ChannelMixer) {
    while let Ok(c) = rx.try_recv() {
        mixer.apply(c);
    }
}

fn build_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<ChannelCommand>,
    mut mixer: ChannelMixer,
    out_channels: usize,
) -> Result<cpal::Stream, String> {
    let err_fn = |e| log::error!("cpal stream error: {e}");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [f32], _| {
                drain_commands(&rx, &mut mixer);
                mixer.render_f32_interleaved(data, out_channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| format!("build_output_stream(f32): {e}"))?;

    stream.play().map_err(|e| format!("stream.play: {e}"))?;

    Ok(stream)
}

fn build_stream_i16(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<ChannelCommand>,
    mut mixer: ChannelMixer,
    out_channels: usize,
) -> Result<cpal::Stream, String> {
    let err_fn = |e| log::error!("cpal stream error: {e}");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [i16], _| {
                drain_commands(&rx, &mut mixer);
                mixer.render_i16_interleaved(data, out_channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| format!("build_output_stream(i16): {e}"))?;

    stream.play().map_err(|e| format!("stream.play: {e}"))?;

    Ok(stream)
}
