//! Pointers: mice, touches and pens.

use crate::geometry::Position;
use bitflags::bitflags;
use cgmath::Point2;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::trace;

/// Identifies a pointer among all currently active pointers.
///
/// Identities are unique only while a pointer is active; a released identity may be handed out
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PointerId(pub u16);

impl PointerId {
    /// The identity shared by every mouse. Mice don’t do multi-touch, so there is only ever one.
    pub const MOUSE: PointerId = PointerId(0);
}

/// Types of pointing devices.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    /// A mouse or any other indirect cursor.
    Mouse = 0,

    /// Touch input from a finger or something of the sort.
    Touch = 1,

    /// Pen input.
    Pen = 2,
}

impl PointerKind {
    pub fn is_mouse(self) -> bool {
        self == PointerKind::Mouse
    }

    pub fn is_touch(self) -> bool {
        self == PointerKind::Touch
    }

    pub fn is_pen(self) -> bool {
        self == PointerKind::Pen
    }
}

bitflags! {
    /// Pointer button state.
    ///
    /// Buttons of different pointer kinds share bits: the primary contact of a touch or pen is the
    /// left mouse button, the pen barrel button is the right mouse button.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PointerButtons: u8 {
        const LEFT_MOUSE = 1;
        const TOUCH_CONTACT = 1;
        const PEN_CONTACT = 1;
        const MIDDLE_MOUSE = 2;
        const RIGHT_MOUSE = 4;
        const PEN_BARREL = 4;
        const X1_BACK_MOUSE = 8;
        const X2_FORWARD_MOUSE = 16;
        const PEN_ERASER = 32;
    }
}

impl PointerButtons {
    pub const NONE: PointerButtons = PointerButtons::empty();

    /// Maps a platform mouse button number (0 = left, 1 = right, 2 = middle, 3/4 = back/forward)
    /// to a button. Unknown numbers map to no button.
    pub fn from_platform_button(button: i32) -> PointerButtons {
        match button {
            0 => PointerButtons::LEFT_MOUSE,
            1 => PointerButtons::RIGHT_MOUSE,
            2 => PointerButtons::MIDDLE_MOUSE,
            3 => PointerButtons::X1_BACK_MOUSE,
            4 => PointerButtons::X2_FORWARD_MOUSE,
            _ => PointerButtons::NONE,
        }
    }
}

/// A snapshot of a pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: PointerId,

    /// The identity the input source uses for this pointer (e.g. a digitizer touch slot).
    pub external_id: u32,

    pub kind: PointerKind,

    /// Location, in whatever space the current receiver expects.
    pub position: Position,

    /// The button whose state changed in this event, if any.
    pub button: PointerButtons,

    /// All buttons currently held.
    pub buttons: PointerButtons,
}

impl Pointer {
    /// Creates a pointer with no buttons, at the origin.
    pub fn new(id: PointerId, kind: PointerKind) -> Pointer {
        Pointer {
            id,
            external_id: 0,
            kind,
            position: Point2::new(0., 0.),
            button: PointerButtons::NONE,
            buttons: PointerButtons::NONE,
        }
    }

    /// The process’ one mouse pointer.
    pub fn mouse() -> Pointer {
        Pointer::new(PointerId::MOUSE, PointerKind::Mouse)
    }

    /// Returns a copy at a different position.
    pub fn at(mut self, position: Position) -> Pointer {
        self.position = position;
        self
    }
}

#[derive(Debug, Default)]
struct Allocations {
    ids: HashSet<PointerId>,
    external: HashMap<(PointerKind, u32), PointerId>,
}

/// Allocates pointer identities.
///
/// One table is shared by every window of a host: a finger belongs to no window in particular
/// until it lands on one. The mouse identity is reserved on creation.
#[derive(Debug)]
pub struct PointerTable {
    inner: Mutex<Allocations>,
}

impl Default for PointerTable {
    fn default() -> Self {
        PointerTable::new()
    }
}

impl PointerTable {
    pub fn new() -> PointerTable {
        let mut allocations = Allocations::default();
        allocations.ids.insert(PointerId::MOUSE);
        allocations
            .external
            .insert((PointerKind::Mouse, 0), PointerId::MOUSE);
        PointerTable {
            inner: Mutex::new(allocations),
        }
    }

    /// Assigns the pointer the first free identity at or after its current one.
    ///
    /// Returns `None` only if every identity is taken.
    pub fn allocate(&self, mut pointer: Pointer) -> Option<Pointer> {
        let mut inner = self.inner.lock();
        let start = pointer.id.0;
        loop {
            if !inner.ids.contains(&pointer.id) {
                break;
            }
            pointer.id = PointerId(pointer.id.0.wrapping_add(1));
            if pointer.id.0 == start {
                return None;
            }
        }
        inner.ids.insert(pointer.id);
        inner
            .external
            .insert((pointer.kind, pointer.external_id), pointer.id);
        trace!(id = pointer.id.0, kind = ?pointer.kind, "allocated pointer");
        Some(pointer)
    }

    /// Frees the pointer’s identity. The mouse identity is never freed.
    pub fn release(&self, pointer: &Pointer) {
        if pointer.id == PointerId::MOUSE {
            return;
        }
        let mut inner = self.inner.lock();
        inner.ids.remove(&pointer.id);
        if inner.external.get(&(pointer.kind, pointer.external_id)) == Some(&pointer.id) {
            inner.external.remove(&(pointer.kind, pointer.external_id));
        }
        trace!(id = pointer.id.0, "released pointer");
    }

    /// Looks up the identity assigned to an input source’s pointer.
    pub fn lookup(&self, kind: PointerKind, external_id: u32) -> Option<PointerId> {
        self.inner.lock().external.get(&(kind, external_id)).copied()
    }

    pub fn is_active(&self, id: PointerId) -> bool {
        self.inner.lock().ids.contains(&id)
    }

    /// Number of active identities, the mouse included.
    pub fn active(&self) -> usize {
        self.inner.lock().ids.len()
    }
}
