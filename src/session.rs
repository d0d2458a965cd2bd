use crate::autoplay::AutoPlay;
use crate::input::{self, Shortcut, UiKey};
use crate::layout::Keyboard;
use crate::notes::NoteIndex;
use crate::router::{ChannelCommand, PlaybackRouter};
use crate::visualizer::Visualizer;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    Released,
}

/// Discrete input, queued by the frontend and drained once per frame in
/// arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { state: KeyState, key: UiKey },
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    PointerMoved { x: f32, y: f32 },
}

/// Single context object for one run of the toy: keyboard geometry and
/// highlight state, playback routing, the visualizer, and the auto-play
/// scheduler. All mutation happens on the frame thread through
/// `push_event` + `tick`; the audio side only ever receives commands.
pub struct Session {
    keyboard: Keyboard,
    router: PlaybackRouter,
    visualizer: Visualizer,
    autoplay: AutoPlay,
    playable: Vec<NoteIndex>,

    queue: Vec<InputEvent>,
    pointer_down: bool,
    pointer_pos: (f32, f32),
}

impl Session {
    pub fn new(
        octaves: u8,
        bound_notes: impl IntoIterator<Item = NoteIndex>,
        rng: &mut impl Rng,
    ) -> Self {
        let router = PlaybackRouter::new(bound_notes);
        let mut playable: Vec<NoteIndex> = router.bound_notes().collect();
        playable.sort();

        Self {
            keyboard: Keyboard::new(octaves),
            router,
            visualizer: Visualizer::new(rng),
            autoplay: AutoPlay::new(),
            playable,
            queue: Vec::new(),
            pointer_down: false,
            pointer_pos: (0.0, 0.0),
        }
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn visualizer(&self) -> &Visualizer {
        &self.visualizer
    }

    pub fn autoplay_enabled(&self) -> bool {
        self.autoplay.enabled()
    }

    pub fn active_notes(&self) -> impl Iterator<Item = NoteIndex> + '_ {
        self.router.active_notes()
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.queue.push(event);
    }

    /// One frame: drain queued input in order, re-evaluate held-pointer
    /// state, run the auto-play scheduler, then apply the unconditional
    /// decay step. Returns the audio commands to hand to the output.
    pub fn tick(&mut self, now_ms: u64, dt: f32, rng: &mut impl Rng) -> Vec<ChannelCommand> {
        let mut commands = Vec::new();

        let events = std::mem::take(&mut self.queue);
        for event in events {
            self.handle_event(event, dt, rng, &mut commands);
        }

        if self.pointer_down {
            self.reevaluate_pointer(dt, rng, &mut commands);
        }

        if let Some(note) = self.autoplay.pick(now_ms, &self.playable, rng) {
            self.note_on(note, dt, rng, &mut commands);
        }
        for note in self.autoplay.due_releases(now_ms) {
            self.note_off(note, &mut commands);
        }

        // Always decay, even with no input.
        self.visualizer.add_value(0.0, dt, rng);

        commands
    }

    fn handle_event(
        &mut self,
        event: InputEvent,
        dt: f32,
        rng: &mut impl Rng,
        commands: &mut Vec<ChannelCommand>,
    ) {
        match event {
            InputEvent::Key { state, key } => match state {
                KeyState::Pressed => {
                    if let Some(shortcut) = input::shortcut_for_key(key) {
                        self.apply_shortcut(shortcut, rng);
                    } else if let Some(note) = input::note_for_key(key) {
                        self.note_on(note, dt, rng, commands);
                    }
                }
                KeyState::Released => {
                    if let Some(note) = input::note_for_key(key) {
                        self.note_off(note, commands);
                    }
                }
            },
            InputEvent::PointerDown { x, y } => {
                self.pointer_down = true;
                self.pointer_pos = (x, y);
                if let Some(note) = self.keyboard.note_at(x, y) {
                    self.note_on(note, dt, rng, commands);
                }
            }
            InputEvent::PointerUp { x, y } => {
                self.pointer_down = false;
                self.pointer_pos = (x, y);
                if let Some(note) = self.keyboard.note_at(x, y) {
                    self.note_off(note, commands);
                }
            }
            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = (x, y);
            }
        }
    }

    /// Held-pointer semantics: press the key currently under the pointer if
    /// it is not already pressed, and release every other pressed key the
    /// pointer has moved away from.
    fn reevaluate_pointer(
        &mut self,
        dt: f32,
        rng: &mut impl Rng,
        commands: &mut Vec<ChannelCommand>,
    ) {
        let (x, y) = self.pointer_pos;
        let hit = self.keyboard.note_at(x, y);

        let stale: Vec<NoteIndex> = self
            .keyboard
            .pressed_notes()
            .into_iter()
            .filter(|&n| Some(n) != hit)
            .collect();
        for note in stale {
            self.note_off(note, commands);
        }

        if let Some(note) = hit {
            let already = self
                .keyboard
                .keys()
                .any(|k| k.note == note && k.pressed);
            if !already {
                self.note_on(note, dt, rng, commands);
            }
        }
    }

    fn apply_shortcut(&mut self, shortcut: Shortcut, rng: &mut impl Rng) {
        match shortcut {
            Shortcut::ToggleAutoPlay => self.autoplay.toggle(),
            Shortcut::RandomizeColors => self.visualizer.randomize_colors(rng),
            Shortcut::ResetLevel => self.visualizer.reset_level(),
        }
    }

    fn note_on(
        &mut self,
        note: NoteIndex,
        dt: f32,
        rng: &mut impl Rng,
        commands: &mut Vec<ChannelCommand>,
    ) {
        self.keyboard.set_pressed(note, true);
        let effects = self.router.note_on(note, rng);
        if let Some(burst) = effects.burst {
            self.visualizer.add_value(burst, dt, rng);
        }
        commands.extend(effects.commands);
    }

    fn note_off(&mut self, note: NoteIndex, commands: &mut Vec<ChannelCommand>) {
        self.keyboard.set_pressed(note, false);
        commands.extend(self.router.note_off(note).commands);
    }

    /// Commands that silence everything, for shutdown.
    pub fn stop_all(&mut self) -> Vec<ChannelCommand> {
        let active: Vec<NoteIndex> = self.router.active_notes().collect();
        let mut commands = Vec::new();
        for note in active {
            self.note_off(note, &mut commands);
        }
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoplay::{FIRE_INTERVAL_MS, HOLD_MS};
    use crate::layout::{BLACK_KEY_HEIGHT, KEYBOARD_TOP};
    use crate::router::FADE_OUT_MS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    fn session() -> Session {
        Session::new(2, (0..24).map(NoteIndex), &mut rng())
    }

    fn press(s: &mut Session, ch: char) {
        s.push_event(InputEvent::Key {
            state: KeyState::Pressed,
            key: UiKey::Char(ch),
        });
    }

    fn release(s: &mut Session, ch: char) {
        s.push_event(InputEvent::Key {
            state: KeyState::Released,
            key: UiKey::Char(ch),
        });
    }

    #[test]
    fn key_press_starts_loop_and_highlights() {
        let mut s = session();
        press(&mut s, 'z');
        let cmds = s.tick(10, DT, &mut rng());

        assert_eq!(cmds, vec![ChannelCommand::PlayLooped(NoteIndex(0))]);
        assert!(s.keyboard().keys().any(|k| k.note == NoteIndex(0) && k.pressed));
        assert!(s.active_notes().any(|n| n == NoteIndex(0)));
    }

    #[test]
    fn key_release_fades_and_unhighlights() {
        let mut s = session();
        press(&mut s, 'z');
        s.tick(10, DT, &mut rng());

        release(&mut s, 'z');
        let cmds = s.tick(26, DT, &mut rng());

        assert_eq!(
            cmds,
            vec![ChannelCommand::FadeOut(NoteIndex(0), FADE_OUT_MS)]
        );
        assert!(s.active_notes().next().is_none());
        assert!(s.keyboard().pressed_notes().is_empty());
    }

    #[test]
    fn unbound_note_still_highlights_but_stays_silent() {
        let mut s = Session::new(2, [NoteIndex(0)], &mut rng());
        press(&mut s, 'q'); // note 12, no clip
        let cmds = s.tick(10, DT, &mut rng());

        assert!(cmds.is_empty());
        assert_eq!(s.keyboard().pressed_notes(), vec![NoteIndex(12)]);
    }

    #[test]
    fn note_on_bursts_the_visualizer() {
        let mut s = session();
        press(&mut s, 'c');
        s.tick(10, DT, &mut rng());
        // One rise step of 300 u/s over dt, minus nothing: strictly positive.
        assert!(s.visualizer().current_level() > 0.0);
    }

    #[test]
    fn tick_decays_without_input() {
        let mut s = session();
        press(&mut s, 'c');
        s.tick(10, 0.1, &mut rng());
        let after_press = s.visualizer().current_level();

        release(&mut s, 'c');
        s.tick(30, 0.1, &mut rng());
        let mut level = s.visualizer().current_level();
        assert!(level < after_press + 30.0); // release frame still decays

        for i in 0..50 {
            s.tick(50 + i * 16, 0.1, &mut rng());
            let next = s.visualizer().current_level();
            assert!(next <= level);
            level = next;
        }
    }

    #[test]
    fn pointer_down_plays_key_under_cursor() {
        let mut s = session();
        let x = s.keyboard().white_keys[0].x + 5.0;
        let y = KEYBOARD_TOP + BLACK_KEY_HEIGHT + 10.0; // below black keys
        s.push_event(InputEvent::PointerDown { x, y });
        let cmds = s.tick(10, DT, &mut rng());

        assert!(cmds.contains(&ChannelCommand::PlayLooped(NoteIndex(0))));
    }

    #[test]
    fn held_pointer_moving_across_keys_retargets() {
        let mut s = session();
        let y = KEYBOARD_TOP + BLACK_KEY_HEIGHT + 10.0;
        let first_x = s.keyboard().white_keys[0].x + 5.0;
        let second_x = s.keyboard().white_keys[1].x + 5.0;

        s.push_event(InputEvent::PointerDown { x: first_x, y });
        s.tick(10, DT, &mut rng());

        s.push_event(InputEvent::PointerMoved { x: second_x, y });
        let cmds = s.tick(26, DT, &mut rng());

        // Old key released, new key pressed, within the same frame.
        assert!(cmds.contains(&ChannelCommand::FadeOut(NoteIndex(0), FADE_OUT_MS)));
        assert!(cmds.contains(&ChannelCommand::PlayLooped(NoteIndex(2))));
        assert_eq!(s.keyboard().pressed_notes(), vec![NoteIndex(2)]);
    }

    #[test]
    fn held_pointer_does_not_retrigger_same_key() {
        let mut s = session();
        let y = KEYBOARD_TOP + BLACK_KEY_HEIGHT + 10.0;
        let x = s.keyboard().white_keys[0].x + 5.0;

        s.push_event(InputEvent::PointerDown { x, y });
        s.tick(10, DT, &mut rng());

        // Pointer stays put over several frames: no further commands.
        for i in 0..5 {
            let cmds = s.tick(30 + i * 16, DT, &mut rng());
            assert!(cmds.is_empty());
        }
    }

    #[test]
    fn pointer_up_releases_key() {
        let mut s = session();
        let y = KEYBOARD_TOP + BLACK_KEY_HEIGHT + 10.0;
        let x = s.keyboard().white_keys[0].x + 5.0;

        s.push_event(InputEvent::PointerDown { x, y });
        s.tick(10, DT, &mut rng());
        s.push_event(InputEvent::PointerUp { x, y });
        let cmds = s.tick(26, DT, &mut rng());

        assert_eq!(
            cmds,
            vec![ChannelCommand::FadeOut(NoteIndex(0), FADE_OUT_MS)]
        );
    }

    #[test]
    fn space_toggles_autoplay_and_it_fires() {
        let mut s = session();
        assert!(!s.autoplay_enabled());

        s.push_event(InputEvent::Key {
            state: KeyState::Pressed,
            key: UiKey::Space,
        });
        s.tick(10, DT, &mut rng());
        assert!(s.autoplay_enabled());

        // Past the interval: a random note fires and later releases itself.
        let cmds = s.tick(FIRE_INTERVAL_MS + 20, DT, &mut rng());
        assert!(cmds
            .iter()
            .any(|c| matches!(c, ChannelCommand::PlayLooped(_))));
        assert_eq!(s.active_notes().count(), 1);

        let cmds = s.tick(FIRE_INTERVAL_MS + 20 + HOLD_MS, DT, &mut rng());
        assert!(cmds
            .iter()
            .any(|c| matches!(c, ChannelCommand::FadeOut(_, FADE_OUT_MS))));
        assert_eq!(s.active_notes().count(), 0);
    }

    #[test]
    fn reset_level_shortcut_zeroes_visualizer() {
        let mut s = session();
        press(&mut s, 'z');
        s.tick(10, 0.1, &mut rng());
        assert!(s.visualizer().current_level() > 0.0);

        press(&mut s, 'l');
        s.tick(26, 0.0, &mut rng());
        assert_eq!(s.visualizer().current_level(), 0.0);
    }

    #[test]
    fn stop_all_releases_every_active_note() {
        let mut s = session();
        press(&mut s, 'z');
        press(&mut s, 'c');
        s.tick(10, DT, &mut rng());
        assert_eq!(s.active_notes().count(), 2);

        let cmds = s.stop_all();
        assert_eq!(cmds.len(), 2);
        assert!(cmds
            .iter()
            .all(|c| matches!(c, ChannelCommand::FadeOut(_, FADE_OUT_MS))));
        assert_eq!(s.active_notes().count(), 0);
    }
}
