//! # Piano Visualizer
//!
//! An on-screen two-octave piano that plays looping per-note clips and
//! drives a decaying bar/wave visualizer.
//!
//! * **Playing**: bottom and top letter rows play white keys, the rows
//!   between them the black keys; clicking or dragging across the drawn
//!   keyboard works too.
//! * **Sound**: each note index owns a dedicated looping playback channel;
//!   releasing a key fades its channel out over 150ms.
//! * **Extras**: SPACE toggles auto-play (random timed key presses),
//!   P rerolls the visualizer colors, L clears the level.
//!
//! Clips are read from `assets/wav/<note index>.wav`; missing files are
//! logged and the corresponding keys simply stay silent.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    piano_glow::desktop_frontend::run()
}
