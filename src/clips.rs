use crate::notes::NoteIndex;
use std::path::Path;
use std::sync::Arc;

/// Per-note audio clips, loaded once at startup from `{dir}/{index}.wav`.
///
/// A missing or corrupt file is logged and skipped; that note index then has
/// no bound clip and every playback operation for it no-ops. Only a missing
/// audio device is fatal, never a missing clip.
pub struct ClipCatalog {
    clips: Vec<Option<Arc<[f32]>>>,
}

impl ClipCatalog {
    pub fn load(dir: &Path, note_count: usize) -> Self {
        let mut clips = Vec::with_capacity(note_count);
        for i in 0..note_count {
            let path = dir.join(format!("{i}.wav"));
            match load_wav_mono(&path) {
                Ok(samples) if !samples.is_empty() => {
                    clips.push(Some(samples.into()));
                }
                Ok(_) => {
                    log::warn!("clip {} is empty, skipping", path.display());
                    clips.push(None);
                }
                Err(e) => {
                    log::warn!("could not load clip {}: {e}", path.display());
                    clips.push(None);
                }
            }
        }
        let loaded = clips.iter().filter(|c| c.is_some()).count();
        log::info!("loaded {loaded}/{note_count} note clips from {}", dir.display());

        Self { clips }
    }

    /// Build directly from samples; used by the mixer tests.
    pub fn from_clips(clips: Vec<Option<Arc<[f32]>>>) -> Self {
        Self { clips }
    }

    pub fn note_count(&self) -> usize {
        self.clips.len()
    }

    pub fn has_clip(&self, note: NoteIndex) -> bool {
        self.clips
            .get(note.0 as usize)
            .map_or(false, |c| c.is_some())
    }

    pub fn clip(&self, note: NoteIndex) -> Option<Arc<[f32]>> {
        self.clips.get(note.0 as usize)?.clone()
    }

    pub fn clips(&self) -> &[Option<Arc<[f32]>>] {
        &self.clips
    }

    pub fn bound_notes(&self) -> Vec<NoteIndex> {
        self.clips
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_some())
            .map(|(i, _)| NoteIndex(i as u8))
            .collect()
    }
}

/// Decode a WAV file to mono f32, averaging channels.
fn load_wav_mono(path: &Path) -> Result<Vec<f32>, String> {
    let mut reader = hound::WavReader::open(path).map_err(|e| e.to_string())?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| e.to_string())?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| e.to_string())?
        }
    };

    let mut mono = Vec::with_capacity(interleaved.len() / channels);
    for frame in interleaved.chunks_exact(channels) {
        mono.push(frame.iter().sum::<f32>() / channels as f32);
    }
    Ok(mono)
}
