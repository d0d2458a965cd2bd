use crate::notes::NoteIndex;

/// Logical keyboard input, decoupled from any windowing toolkit.
/// Frontends translate their raw key events into this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UiKey {
    Char(char),
    Space,
}

/// One-shot session mutations bound to shortcut keys. These sit outside the
/// note on/off state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ToggleAutoPlay,
    RandomizeColors,
    ResetLevel,
}

struct NoteKeyTableEntry {
    ch: char,
    note: NoteIndex,
}

/// Physical-key layout: bottom letter row plays the first octave's white
/// keys, the top letter row the second; the home row and number row carry
/// the black keys between them.
const NOTE_KEY_TABLE: [NoteKeyTableEntry; 24] = [
    // White keys, first octave (C..B)
    NoteKeyTableEntry { ch: 'z', note: NoteIndex(0) },
    NoteKeyTableEntry { ch: 'x', note: NoteIndex(2) },
    NoteKeyTableEntry { ch: 'c', note: NoteIndex(4) },
    NoteKeyTableEntry { ch: 'v', note: NoteIndex(5) },
    NoteKeyTableEntry { ch: 'b', note: NoteIndex(7) },
    NoteKeyTableEntry { ch: 'n', note: NoteIndex(9) },
    NoteKeyTableEntry { ch: 'm', note: NoteIndex(11) },
    // White keys, second octave
    NoteKeyTableEntry { ch: 'q', note: NoteIndex(12) },
    NoteKeyTableEntry { ch: 'w', note: NoteIndex(14) },
    NoteKeyTableEntry { ch: 'e', note: NoteIndex(16) },
    NoteKeyTableEntry { ch: 'r', note: NoteIndex(17) },
    NoteKeyTableEntry { ch: 't', note: NoteIndex(19) },
    NoteKeyTableEntry { ch: 'y', note: NoteIndex(21) },
    NoteKeyTableEntry { ch: 'u', note: NoteIndex(23) },
    // Black keys, first octave (C#..A#)
    NoteKeyTableEntry { ch: 's', note: NoteIndex(1) },
    NoteKeyTableEntry { ch: 'd', note: NoteIndex(3) },
    NoteKeyTableEntry { ch: 'g', note: NoteIndex(6) },
    NoteKeyTableEntry { ch: 'h', note: NoteIndex(8) },
    NoteKeyTableEntry { ch: 'j', note: NoteIndex(10) },
    // Black keys, second octave
    NoteKeyTableEntry { ch: '2', note: NoteIndex(13) },
    NoteKeyTableEntry { ch: '3', note: NoteIndex(15) },
    NoteKeyTableEntry { ch: '5', note: NoteIndex(18) },
    NoteKeyTableEntry { ch: '6', note: NoteIndex(20) },
    NoteKeyTableEntry { ch: '7', note: NoteIndex(22) },
];

pub fn note_for_key(key: UiKey) -> Option<NoteIndex> {
    let UiKey::Char(ch) = key else {
        return None;
    };
    NOTE_KEY_TABLE
        .iter()
        .find(|e| e.ch == ch)
        .map(|e| e.note)
}

pub fn shortcut_for_key(key: UiKey) -> Option<Shortcut> {
    match key {
        UiKey::Space => Some(Shortcut::ToggleAutoPlay),
        UiKey::Char('p') => Some(Shortcut::RandomizeColors),
        UiKey::Char('l') => Some(Shortcut::ResetLevel),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_note_key_examples() {
        for pair in [('z', 0), ('m', 11), ('q', 12), ('u', 23), ('s', 1), ('7', 22)] {
            assert_eq!(note_for_key(UiKey::Char(pair.0)), Some(NoteIndex(pair.1)));
        }
    }

    #[test]
    fn every_note_key_is_unique_and_in_range() {
        let mut seen = std::collections::HashSet::new();
        for e in NOTE_KEY_TABLE.iter() {
            assert!(seen.insert(e.ch), "duplicate key binding {:?}", e.ch);
            assert!(e.note.0 < 24);
        }
        assert_eq!(seen.len(), 24);
    }

    #[test]
    fn unmapped_keys_yield_nothing() {
        assert_eq!(note_for_key(UiKey::Char('a')), None);
        assert_eq!(note_for_key(UiKey::Space), None);
    }

    #[test]
    fn shortcut_bindings() {
        assert_eq!(shortcut_for_key(UiKey::Space), Some(Shortcut::ToggleAutoPlay));
        assert_eq!(
            shortcut_for_key(UiKey::Char('p')),
            Some(Shortcut::RandomizeColors)
        );
        assert_eq!(shortcut_for_key(UiKey::Char('l')), Some(Shortcut::ResetLevel));
        assert_eq!(shortcut_for_key(UiKey::Char('z')), None);
    }
}
