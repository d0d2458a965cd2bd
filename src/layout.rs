use crate::notes::NoteIndex;

/// Fixed window geometry shared by layout and the desktop frontend.
pub const WINDOW_WIDTH: u32 = 1000;
pub const WINDOW_HEIGHT: u32 = 700;

pub const WHITE_KEY_WIDTH: f32 = 40.0;
pub const WHITE_KEY_HEIGHT: f32 = 200.0;
pub const BLACK_KEY_WIDTH: f32 = 24.0;
pub const BLACK_KEY_HEIGHT: f32 = 120.0;

/// Top edge of the key row.
pub const KEYBOARD_TOP: f32 = (WINDOW_HEIGHT - 250) as f32;

/// Semitone offset of each white-key letter within an octave (C D E F G A B).
const WHITE_SEMITONES: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Which white keys in an octave carry a black key to their upper right.
/// Positions 2 (E) and 6 (B) skip, giving the standard 5-per-octave pattern.
const HAS_BLACK_AFTER: [bool; 7] = [true, true, false, true, true, true, false];

#[derive(Debug, Clone)]
pub struct Key {
    pub note: NoteIndex,
    pub is_black: bool,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Only field mutated after construction; owned by note-on/note-off.
    pub pressed: bool,
}

impl Key {
    fn new(note: NoteIndex, is_black: bool, x: f32) -> Self {
        let (width, height) = if is_black {
            (BLACK_KEY_WIDTH, BLACK_KEY_HEIGHT)
        } else {
            (WHITE_KEY_WIDTH, WHITE_KEY_HEIGHT)
        };
        Self {
            note,
            is_black,
            x,
            y: KEYBOARD_TOP,
            width,
            height,
            pressed: false,
        }
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// Geometric arrangement of white and black keys for an octave count.
///
/// White keys tile left to right at fixed width, centered in the window.
/// Each black key is centered over the boundary between its left white key
/// and the next, one semitone above the left white note. Pure layout:
/// deterministic and independent of rendering.
pub struct Keyboard {
    pub white_keys: Vec<Key>,
    pub black_keys: Vec<Key>,
}

impl Keyboard {
    pub fn new(octaves: u8) -> Self {
        let total_white = octaves as usize * 7;
        let start_x = (WINDOW_WIDTH as f32 - total_white as f32 * WHITE_KEY_WIDTH) / 2.0;

        let mut white_keys = Vec::with_capacity(total_white);
        let mut x = start_x;
        for octave in 0..octaves {
            for &semi in WHITE_SEMITONES.iter() {
                let note = NoteIndex(octave * 12 + semi);
                white_keys.push(Key::new(note, false, x));
                x += WHITE_KEY_WIDTH;
            }
        }

        // Black keys go between a white key and its right neighbor, so the
        // last white key never carries one.
        let mut black_keys = Vec::new();
        for (i, white) in white_keys.iter().enumerate().take(total_white.saturating_sub(1)) {
            if HAS_BLACK_AFTER[i % 7] {
                let note = NoteIndex(white.note.0 + 1);
                let bx = white.x + WHITE_KEY_WIDTH - BLACK_KEY_WIDTH / 2.0;
                black_keys.push(Key::new(note, true, bx));
            }
        }

        Self {
            white_keys,
            black_keys,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.white_keys.iter().chain(self.black_keys.iter())
    }

    /// Hit test for pointer play; black keys sit on top so they win.
    pub fn key_at(&self, x: f32, y: f32) -> Option<&Key> {
        self.black_keys
            .iter()
            .find(|k| k.contains(x, y))
            .or_else(|| self.white_keys.iter().find(|k| k.contains(x, y)))
    }

    pub fn note_at(&self, x: f32, y: f32) -> Option<NoteIndex> {
        self.key_at(x, y).map(|k| k.note)
    }

    /// Updates every key sharing the note index. Visual highlight is
    /// decoupled from whether the note has a loaded clip.
    pub fn set_pressed(&mut self, note: NoteIndex, pressed: bool) {
        for key in self
            .white_keys
            .iter_mut()
            .chain(self.black_keys.iter_mut())
        {
            if key.note == note {
                key.pressed = pressed;
            }
        }
    }

    pub fn pressed_notes(&self) -> Vec<NoteIndex> {
        self.keys().filter(|k| k.pressed).map(|k| k.note).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_octaves_have_standard_key_counts() {
        let kb = Keyboard::new(2);
        assert_eq!(kb.white_keys.len(), 14);
        assert_eq!(kb.black_keys.len(), 10);
    }

    #[test]
    fn white_note_indices_follow_octave_pattern() {
        let kb = Keyboard::new(2);
        let notes: Vec<u8> = kb.white_keys.iter().map(|k| k.note.0).collect();
        assert_eq!(
            notes,
            vec![0, 2, 4, 5, 7, 9, 11, 12, 14, 16, 17, 19, 21, 23]
        );
    }

    #[test]
    fn black_note_is_semitone_above_left_white() {
        let kb = Keyboard::new(2);
        let notes: Vec<u8> = kb.black_keys.iter().map(|k| k.note.0).collect();
        assert_eq!(notes, vec![1, 3, 6, 8, 10, 13, 15, 18, 20, 22]);
        assert!(kb.black_keys.iter().all(|k| k.is_black));
    }

    #[test]
    fn same_color_keys_never_overlap_in_x() {
        let kb = Keyboard::new(2);
        for keys in [&kb.white_keys, &kb.black_keys] {
            for pair in keys.windows(2) {
                assert!(pair[0].x + pair[0].width <= pair[1].x + 1.0e-3);
            }
        }
    }

    #[test]
    fn black_keys_straddle_white_boundaries() {
        let kb = Keyboard::new(1);
        let c_sharp = &kb.black_keys[0];
        let c = &kb.white_keys[0];
        assert_eq!(c_sharp.x, c.x + WHITE_KEY_WIDTH - BLACK_KEY_WIDTH / 2.0);
    }

    #[test]
    fn hit_test_prefers_black_keys() {
        let kb = Keyboard::new(1);
        let c_sharp = &kb.black_keys[0];
        // Right edge of C# overhangs the D white key.
        let x = c_sharp.x + c_sharp.width - 1.0;
        let y = KEYBOARD_TOP + 1.0;
        assert_eq!(kb.note_at(x, y), Some(NoteIndex(1)));
        // Below the black key's reach only the white key remains.
        let y_low = KEYBOARD_TOP + BLACK_KEY_HEIGHT + 10.0;
        assert_eq!(kb.note_at(x, y_low), Some(NoteIndex(2)));
    }

    #[test]
    fn hit_test_misses_outside_keyboard() {
        let kb = Keyboard::new(2);
        assert_eq!(kb.note_at(0.0, 0.0), None);
        assert_eq!(kb.note_at(10.0, KEYBOARD_TOP + 10.0), None);
    }

    #[test]
    fn set_pressed_updates_all_keys_for_index() {
        let mut kb = Keyboard::new(2);
        kb.set_pressed(NoteIndex(4), true);
        assert_eq!(kb.pressed_notes(), vec![NoteIndex(4)]);
        kb.set_pressed(NoteIndex(4), false);
        assert!(kb.pressed_notes().is_empty());
    }
}
