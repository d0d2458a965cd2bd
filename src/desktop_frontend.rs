use crate::clips::ClipCatalog;
use crate::input::UiKey;
use crate::layout::{Key, WINDOW_HEIGHT, WINDOW_WIDTH};
use crate::notes;
use crate::output::AudioOutput;
use crate::pixel_font;
use crate::session::{InputEvent, KeyState, Session};
use crate::visualizer::Visualizer;

use rand::Rng;
use softbuffer::{Context, Surface};
use std::error::Error;
use std::num::NonZeroU32;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use winit::{
    event::{ElementState, Event, MouseButton, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::{Window, WindowBuilder},
};

const OCTAVES: u8 = 2;
const CLIP_DIR: &str = "assets/wav";
const FRAME: Duration = Duration::from_micros(16_667); // 60 FPS target

// Palette (0x00RRGGBB).
const DARK_BG: u32 = 0x000F0F19;
const PANEL_BG: u32 = 0x00191923;
const WHITE_KEY: u32 = 0x00F5F5FF;
const BLACK_KEY: u32 = 0x000A0A0F;
const GRAY: u32 = 0x0050505A;
const LIGHT_GRAY: u32 = 0x00B4B4BE;
const GOLD: u32 = 0x00FFCB6B;
const PURPLE: u32 = 0x00B446F0;
const TEAL: u32 = 0x0046D2D2;
const DARK_PURPLE: u32 = 0x00320F46;
const SHADOW: u32 = 0x00323232;

/// Bottom section height holding the key row; the visualizer panel is
/// everything above it.
const LOWER_SECTION: u32 = 270;

pub fn run() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let catalog = ClipCatalog::load(Path::new(CLIP_DIR), notes::note_count(OCTAVES));
    let audio = AudioOutput::new(&catalog)?;

    let mut rng = rand::thread_rng();
    let mut session = Session::new(OCTAVES, catalog.bound_notes(), &mut rng);

    let event_loop = EventLoop::new()?;
    let window = Rc::new(
        WindowBuilder::new()
            .with_title("Piano Visualizer")
            .with_inner_size(winit::dpi::LogicalSize::new(
                WINDOW_WIDTH as f64,
                WINDOW_HEIGHT as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)?,
    );

    let context = Context::new(window.clone()).expect("Failed to create graphics context");
    let mut surface = Surface::new(&context, window.clone()).expect("Failed to create surface");

    let start = Instant::now();
    let mut last_frame = Instant::now();
    let mut cursor_pos = (0.0f32, 0.0f32);

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    for c in session.stop_all() {
                        audio.apply(c);
                    }
                    elwt.exit();
                }

                WindowEvent::KeyboardInput { event, .. } => {
                    if event.repeat {
                        return;
                    }
                    let state = match event.state {
                        ElementState::Pressed => KeyState::Pressed,
                        ElementState::Released => KeyState::Released,
                    };
                    if let Some(key) = ui_key_from_winit(&event.logical_key) {
                        session.push_event(InputEvent::Key { state, key });
                    }
                }

                WindowEvent::MouseInput { state, button, .. } => {
                    if button == MouseButton::Left {
                        let (x, y) = cursor_pos;
                        let ev = match state {
                            ElementState::Pressed => InputEvent::PointerDown { x, y },
                            ElementState::Released => InputEvent::PointerUp { x, y },
                        };
                        session.push_event(ev);
                    }
                }

                WindowEvent::CursorMoved { position, .. } => {
                    cursor_pos = (position.x as f32, position.y as f32);
                    session.push_event(InputEvent::PointerMoved {
                        x: cursor_pos.0,
                        y: cursor_pos.1,
                    });
                }

                WindowEvent::Resized(physical_size) => {
                    if let (Some(w), Some(h)) = (
                        NonZeroU32::new(physical_size.width),
                        NonZeroU32::new(physical_size.height),
                    ) {
                        surface.resize(w, h).expect("Failed to resize surface");
                    }
                }

                WindowEvent::RedrawRequested => {
                    let size = window.inner_size();
                    if let (Some(w), Some(h)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    {
                        surface.resize(w, h).expect("Failed to resize surface");
                    }
                    draw_frame(
                        &mut surface,
                        size.width,
                        size.height,
                        &session,
                        start.elapsed().as_millis() as u64,
                        &mut rng,
                    );
                }

                _ => {}
            },

            Event::AboutToWait => {
                let now = Instant::now();
                if now.duration_since(last_frame) >= FRAME {
                    let dt = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;

                    let now_ms = start.elapsed().as_millis() as u64;
                    for c in session.tick(now_ms, dt, &mut rng) {
                        audio.apply(c);
                    }
                    window.request_redraw();
                }
                elwt.set_control_flow(ControlFlow::WaitUntil(last_frame + FRAME));
            }

            _ => {}
        }
    })?;

    Ok(())
}

fn ui_key_from_winit(key: &winit::keyboard::Key) -> Option<UiKey> {
    use winit::keyboard::{Key as WinitKey, NamedKey};

    match key {
        WinitKey::Named(NamedKey::Space) => Some(UiKey::Space),
        WinitKey::Character(s) => {
            let ch = s.chars().next()?;
            Some(UiKey::Char(ch.to_ascii_lowercase()))
        }
        _ => None,
    }
}

fn draw_frame(
    surface: &mut Surface<Rc<Window>, Rc<Window>>,
    width: u32,
    height: u32,
    session: &Session,
    ticks_ms: u64,
    rng: &mut impl Rng,
) {
    let Ok(mut buffer) = surface.buffer_mut() else {
        return;
    };
    let (w, h) = (width as usize, height as usize);
    if buffer.len() < w * h {
        return;
    }
    buffer.fill(DARK_BG);

    draw_star_dots(&mut buffer, w, h, rng);
    draw_visualizer(&mut buffer, w, h, session.visualizer(), ticks_ms);
    draw_keyboard(&mut buffer, w, h, session);
    draw_banner_text(&mut buffer, w, h, session.autoplay_enabled());

    let _ = buffer.present();
}

/// Faint twinkling dots over the upper half, redrawn at random each frame.
fn draw_star_dots(buf: &mut [u32], w: usize, h: usize, rng: &mut impl Rng) {
    for _ in 0..20 {
        let x = rng.gen_range(0..w as i32);
        let y = rng.gen_range(0..(h as i32 / 2).max(1));
        let size = rng.gen_range(1..=3);
        let v = rng.gen_range(50u32..=150);
        let color = (v << 16) | (v << 8) | v;
        fill_rect(buf, w, h, x, y, size, size, color);
    }
}

fn draw_visualizer(buf: &mut [u32], w: usize, h: usize, vis: &Visualizer, ticks_ms: u64) {
    let panel_bottom = (h as i32 - LOWER_SECTION as i32).max(0);

    fill_rect(buf, w, h, 0, 0, w as i32, panel_bottom, PANEL_BG);
    stroke_rect(buf, w, h, 0, 0, w as i32, panel_bottom, DARK_PURPLE);

    // Bars, oldest on the left.
    let bar_width = w as f32 / vis.bar_count().max(1) as f32;
    for (i, (height_px, color)) in vis.bars().zip(vis.colors().iter()).enumerate() {
        let x = (i as f32 * bar_width) as i32;
        let bh = height_px as i32;
        fill_rect(
            buf,
            w,
            h,
            x,
            panel_bottom - bh,
            (bar_width - 1.0).max(1.0) as i32,
            bh,
            color.pack(),
        );
    }

    // Sine overlay: amplitude from recent bars, phase from wall-clock time.
    let amp = vis.wave_amplitude();
    if amp > 0.0 {
        let t = ticks_ms as f32 * 0.002;
        let mid = panel_bottom / 2;
        let mut prev_y: Option<i32> = None;
        for x in 0..w as i32 {
            let y = mid + ((x as f32 * 0.05 + t * 3.0).sin() * amp) as i32;
            let (y0, y1) = match prev_y {
                Some(p) => (p.min(y), p.max(y)),
                None => (y, y),
            };
            fill_rect(buf, w, h, x, y0, 1, y1 - y0 + 2, TEAL);
            prev_y = Some(y);
        }
    }
}

fn draw_keyboard(buf: &mut [u32], w: usize, h: usize, session: &Session) {
    for key in &session.keyboard().white_keys {
        draw_key(buf, w, h, key);
    }
    // Black keys last; they sit on top.
    for key in &session.keyboard().black_keys {
        draw_key(buf, w, h, key);
    }
}

fn draw_key(buf: &mut [u32], w: usize, h: usize, key: &Key) {
    let (x, y) = (key.x as i32, key.y as i32);
    let (kw, kh) = (key.width as i32, key.height as i32);

    fill_rect(buf, w, h, x + 3, y + 3, kw, kh, SHADOW);

    let base = if key.is_black { BLACK_KEY } else { WHITE_KEY };
    let highlight = if key.is_black { GOLD } else { PURPLE };
    let color = if key.pressed { highlight } else { base };
    fill_rect(buf, w, h, x, y, kw, kh, color);

    let border = if key.pressed { highlight } else { GRAY };
    stroke_rect(buf, w, h, x, y, kw, kh, border);

    if !key.is_black {
        let label = key.note.name();
        let tw = pixel_font::text_width(label, 1, 1);
        pixel_font::draw_text_u32(
            buf,
            w,
            h,
            x + kw / 2 - tw / 2,
            y + kh - 25,
            label,
            GRAY,
            1,
            1,
        );
    }
}

fn draw_banner_text(buf: &mut [u32], w: usize, h: usize, autoplay: bool) {
    draw_centered(buf, w, h, 15, "PIANO VISUALIZER", GOLD, 2, 1);
    draw_centered(
        buf,
        w,
        h,
        55,
        "PLAY Z-M AND Q-U WHITE - S D G H J AND 2 3 5 6 7 BLACK - OR CLICK",
        LIGHT_GRAY,
        1,
        1,
    );
    draw_centered(
        buf,
        w,
        h,
        70,
        "SPACE AUTO-PLAY - P RANDOM COLORS - L CLEAR",
        LIGHT_GRAY,
        1,
        1,
    );

    if autoplay {
        let y = h as i32 - LOWER_SECTION as i32 + 6;
        draw_centered(buf, w, h, y, "AUTO-PLAY MODE - PRESS SPACE TO STOP", TEAL, 2, 1);
    }
}

fn draw_centered(
    buf: &mut [u32],
    w: usize,
    h: usize,
    y: i32,
    text: &str,
    color: u32,
    scale_num: i32,
    scale_den: i32,
) {
    let tw = pixel_font::text_width(text, scale_num, scale_den);
    pixel_font::draw_text_u32(
        buf,
        w,
        h,
        w as i32 / 2 - tw / 2,
        y,
        text,
        color,
        scale_num,
        scale_den,
    );
}

fn fill_rect(buf: &mut [u32], w: usize, h: usize, x: i32, y: i32, rw: i32, rh: i32, color: u32) {
    let x0 = x.max(0) as usize;
    let y0 = y.max(0) as usize;
    let x1 = (x + rw).min(w as i32).max(0) as usize;
    let y1 = (y + rh).min(h as i32).max(0) as usize;

    for py in y0..y1 {
        let row = py * w;
        for px in x0..x1 {
            buf[row + px] = color;
        }
    }
}

fn stroke_rect(buf: &mut [u32], w: usize, h: usize, x: i32, y: i32, rw: i32, rh: i32, color: u32) {
    fill_rect(buf, w, h, x, y, rw, 1, color);
    fill_rect(buf, w, h, x, y + rh - 1, rw, 1, color);
    fill_rect(buf, w, h, x, y, 1, rh, color);
    fill_rect(buf, w, h, x + rw - 1, y, 1, rh, color);
}
