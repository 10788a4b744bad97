//! Keyboard translation.
//!
//! | Key          | Intent      |
//! |--------------|-------------|
//! | W / Up       | forward     |
//! | S / Down     | back        |
//! | A / Left     | turn left   |
//! | D / Right    | turn right  |
//! | Q            | look up     |
//! | E            | look down   |

use vista_rendering::Intent;

/// Keys the host reacts to, independent of the windowing backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HostKey {
    /// Letter W.
    W,
    /// Letter A.
    A,
    /// Letter S.
    S,
    /// Letter D.
    D,
    /// Letter Q.
    Q,
    /// Letter E.
    E,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
}

/// Builds the intent for the set of keys currently held.
///
/// Opposing keys held together cancel in [`Camera::advance`](vista_rendering::Camera::advance).
#[must_use]
pub fn intent_from_keys(keys: &[HostKey], pointer: Option<(i32, i32)>) -> Intent {
    let mut intent = Intent {
        pointer,
        ..Intent::default()
    };
    for key in keys {
        match key {
            HostKey::W | HostKey::Up => intent.forward = true,
            HostKey::S | HostKey::Down => intent.back = true,
            HostKey::A | HostKey::Left => intent.left = true,
            HostKey::D | HostKey::Right => intent.right = true,
            HostKey::Q => intent.look_up = true,
            HostKey::E => intent.look_down = true,
        }
    }
    intent
}
