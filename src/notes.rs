/// 0-based pitch identifier within the configured octave range.
///
/// Index 0 is the lowest C; each octave spans 12 indices. The pitch-class
/// name is derived positionally, so the same table serves any octave count.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NoteIndex(pub u8);

pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

impl NoteIndex {
    pub fn name(self) -> &'static str {
        NOTE_NAMES[(self.0 % 12) as usize]
    }

    pub fn is_black(self) -> bool {
        matches!(self.0 % 12, 1 | 3 | 6 | 8 | 10)
    }

    pub fn octave(self) -> u8 {
        self.0 / 12
    }
}

/// Total number of note indices for an octave count.
pub fn note_count(octaves: u8) -> usize {
    octaves as usize * 12
}
