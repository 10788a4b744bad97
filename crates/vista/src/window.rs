//! Interactive window surface.
//!
//! ```text
//! ┌────────────── main thread ──────────────┐   ┌── vista-render ──┐
//! │ keys ─▶ SharedIntent ───────────────────┼──▶│ RenderLoop::run  │
//! │ take_frame ─▶ 0RGB ─▶ update_with_buffer│◀──┤ publish          │
//! └─────────────────────────────────────────┘   └──────────────────┘
//! ```

use std::sync::Arc;

use minifb::{Key, MouseMode, Window, WindowOptions};
use vista_core::{FrameConsumer, TripleBuffer};
use vista_rendering::{RenderLoop, SharedIntent};

use crate::input::{intent_from_keys, HostKey};
use crate::HostError;

const TITLE: &str = "VISTA - WASD/arrows to fly, Q/E to look, Esc to quit";

fn host_key(key: Key) -> Option<HostKey> {
    Some(match key {
        Key::W => HostKey::W,
        Key::A => HostKey::A,
        Key::S => HostKey::S,
        Key::D => HostKey::D,
        Key::Q => HostKey::Q,
        Key::E => HostKey::E,
        Key::Up => HostKey::Up,
        Key::Down => HostKey::Down,
        Key::Left => HostKey::Left,
        Key::Right => HostKey::Right,
        _ => return None,
    })
}

/// Packed RGBA to minifb's `0RGB`.
#[inline]
fn to_0rgb(color: u32) -> u32 {
    let r = color & 0xff;
    let g = (color >> 8) & 0xff;
    let b = (color >> 16) & 0xff;
    (r << 16) | (g << 8) | b
}

/// Runs the render loop on its own thread and shows frames until Esc or close.
///
/// Returns the number of frames rendered.
pub fn run(
    render_loop: RenderLoop,
    intent: &Arc<SharedIntent>,
    frames: &Arc<TripleBuffer>,
    mut consumer: FrameConsumer,
) -> Result<u64, HostError> {
    let (width, height) = frames.dimensions();
    let mut window = Window::new(
        TITLE,
        width,
        height,
        WindowOptions {
            resize: true,
            ..WindowOptions::default()
        },
    )
    .map_err(|e| HostError::Window(e.to_string()))?;
    window.set_target_fps(60);

    let render_thread = render_loop.spawn()?;
    let mut display = Vec::new();
    let mut surface = (width, height);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if render_thread.is_finished() {
            break;
        }

        let keys: Vec<HostKey> = window.get_keys().into_iter().filter_map(host_key).collect();
        let pointer = window
            .get_mouse_pos(MouseMode::Discard)
            .map(|(x, y)| (x as i32, y as i32));
        intent.set(intent_from_keys(&keys, pointer));

        let (w, h) = {
            let view = consumer.take_frame();
            display.clear();
            display.extend(view.iter().copied().map(to_0rgb));
            (view.width(), view.height())
        };

        if w > 0 && h > 0 {
            window
                .update_with_buffer(&display, w, h)
                .map_err(|e| HostError::Window(e.to_string()))?;
        } else {
            window.update();
        }

        let size = window.get_size();
        if size != surface && size.0 > 0 && size.1 > 0 {
            frames.resize(size.0, size.1)?;
            surface = size;
        }
    }

    Ok(render_thread.stop()?)
}
