use crate::notes::NoteIndex;
use rand::Rng;
use std::collections::HashSet;

/// Release fade duration applied on note-off.
pub const FADE_OUT_MS: u64 = 150;

/// Burst magnitude range fed to the visualizer on each successful note-on.
const BURST_MIN: f32 = 50.0;
const BURST_MAX: f32 = 100.0;

/// Fire-and-forget request for the audio subsystem. Each note index is
/// served by a dedicated playback channel for the process lifetime, so the
/// note identifies the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelCommand {
    PlayLooped(NoteIndex),
    /// Immediate stop, no fade. Used for clean re-triggers.
    Stop(NoteIndex),
    FadeOut(NoteIndex, u64),
}

#[derive(Debug, Default)]
pub struct RouterEffects {
    pub commands: Vec<ChannelCommand>,
    /// Amplitude proxy for this trigger, to feed the visualizer.
    pub burst: Option<f32>,
}

/// Maps discrete note-on/note-off events to sustained looping playback.
///
/// Per-note state machine: Idle -> Sounding -> Idle. The active set mirrors
/// which channels are looping; a note fading out after note-off is already
/// Idle here, and a rapid re-trigger restarts its channel cleanly without
/// waiting for the fade to finish.
pub struct PlaybackRouter {
    /// Notes with a loaded clip; playback ops for any other note no-op.
    bound: HashSet<NoteIndex>,
    active: HashSet<NoteIndex>,
}

impl PlaybackRouter {
    pub fn new(bound_notes: impl IntoIterator<Item = NoteIndex>) -> Self {
        Self {
            bound: bound_notes.into_iter().collect(),
            active: HashSet::new(),
        }
    }

    pub fn has_clip(&self, note: NoteIndex) -> bool {
        self.bound.contains(&note)
    }

    pub fn is_active(&self, note: NoteIndex) -> bool {
        self.active.contains(&note)
    }

    pub fn active_notes(&self) -> impl Iterator<Item = NoteIndex> + '_ {
        self.active.iter().copied()
    }

    pub fn bound_notes(&self) -> impl Iterator<Item = NoteIndex> + '_ {
        self.bound.iter().copied()
    }

    pub fn note_on(&mut self, note: NoteIndex, rng: &mut impl Rng) -> RouterEffects {
        let mut effects = RouterEffects::default();

        if !self.bound.contains(&note) {
            return effects;
        }

        // If this note is already sounding, stop it first so we only ever
        // have one loop instance playing at a time.
        if self.active.remove(&note) {
            effects.commands.push(ChannelCommand::Stop(note));
        }

        self.active.insert(note);
        effects.commands.push(ChannelCommand::PlayLooped(note));
        effects.burst = Some(rng.gen_range(BURST_MIN..=BURST_MAX));

        effects
    }

    /// Idempotent: note-off for a note that is not sounding changes nothing.
    /// The active set drops the note now, not when the fade completes.
    pub fn note_off(&mut self, note: NoteIndex) -> RouterEffects {
        let mut effects = RouterEffects::default();

        if self.bound.contains(&note) && self.active.remove(&note) {
            effects
                .commands
                .push(ChannelCommand::FadeOut(note, FADE_OUT_MS));
        }

        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn router() -> PlaybackRouter {
        PlaybackRouter::new((0..24).map(NoteIndex))
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn note_on_starts_loop_and_activates() {
        let mut r = router();
        let fx = r.note_on(NoteIndex(5), &mut rng());

        assert_eq!(fx.commands, vec![ChannelCommand::PlayLooped(NoteIndex(5))]);
        assert!(r.is_active(NoteIndex(5)));
        let burst = fx.burst.unwrap();
        assert!((50.0..=100.0).contains(&burst));
    }

    #[test]
    fn note_on_without_clip_is_silent() {
        let mut r = PlaybackRouter::new([NoteIndex(0)]);
        let fx = r.note_on(NoteIndex(9), &mut rng());

        assert!(fx.commands.is_empty());
        assert!(fx.burst.is_none());
        assert!(!r.is_active(NoteIndex(9)));
    }

    #[test]
    fn retrigger_stops_before_restarting() {
        let mut r = router();
        r.note_on(NoteIndex(3), &mut rng());
        let fx = r.note_on(NoteIndex(3), &mut rng());

        assert_eq!(
            fx.commands,
            vec![
                ChannelCommand::Stop(NoteIndex(3)),
                ChannelCommand::PlayLooped(NoteIndex(3)),
            ]
        );
        // Exactly one active instance.
        assert_eq!(r.active_notes().count(), 1);
    }

    #[test]
    fn note_off_fades_and_deactivates_immediately() {
        let mut r = router();
        r.note_on(NoteIndex(7), &mut rng());
        let fx = r.note_off(NoteIndex(7));

        assert_eq!(
            fx.commands,
            vec![ChannelCommand::FadeOut(NoteIndex(7), FADE_OUT_MS)]
        );
        assert!(!r.is_active(NoteIndex(7)));
    }

    #[test]
    fn note_off_when_inactive_is_noop() {
        let mut r = router();
        let fx = r.note_off(NoteIndex(2));
        assert!(fx.commands.is_empty());

        // Same for a second release after the first.
        r.note_on(NoteIndex(2), &mut rng());
        r.note_off(NoteIndex(2));
        let fx = r.note_off(NoteIndex(2));
        assert!(fx.commands.is_empty());
    }

    #[test]
    fn rapid_on_off_on_restarts_cleanly() {
        let mut r = router();
        r.note_on(NoteIndex(0), &mut rng());
        r.note_off(NoteIndex(0));
        // Fade still in flight; re-trigger must not wait for it.
        let fx = r.note_on(NoteIndex(0), &mut rng());

        assert_eq!(fx.commands, vec![ChannelCommand::PlayLooped(NoteIndex(0))]);
        assert!(r.is_active(NoteIndex(0)));
    }
}
