//! The table of open windows, keyed by platform handle.

use crate::error::{Error, Result};
use crate::events::{EventSender, PointerEvent, SizeEvent};
use crate::geometry::{Position, Rectangle};
use cgmath::Point2;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Identifies a platform window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowHandle(pub u64);

#[derive(Debug)]
struct Entry {
    events: EventSender,
    /// Content area in screen coordinates; unset until the platform reports it.
    frame: Rectangle,
}

/// Open windows and the queues that feed them.
#[derive(Debug, Default)]
pub struct Registry {
    windows: Mutex<HashMap<WindowHandle, Entry>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry::default()
    }

    /// Adds a window. With `exclusive`, fails if any other window is open.
    pub(crate) fn register(
        &self,
        handle: WindowHandle,
        events: EventSender,
        exclusive: bool,
    ) -> Result<()> {
        let mut windows = self.windows.lock();
        if windows.contains_key(&handle) {
            return Err(Error::DuplicateWindow(handle));
        }
        if exclusive && !windows.is_empty() {
            return Err(Error::SingleWindowOnly);
        }
        windows.insert(
            handle,
            Entry {
                events,
                frame: Rectangle::default(),
            },
        );
        debug!(?handle, "registered window");
        Ok(())
    }

    pub(crate) fn unregister(&self, handle: WindowHandle) {
        if self.windows.lock().remove(&handle).is_some() {
            debug!(?handle, "unregistered window");
        }
    }

    pub fn contains(&self, handle: WindowHandle) -> bool {
        self.windows.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty()
    }

    pub(crate) fn sender(&self, handle: WindowHandle) -> Option<EventSender> {
        self.windows.lock().get(&handle).map(|e| e.events.clone())
    }

    /// Records where a window’s content area is on screen. Returns false for unknown handles.
    pub fn set_frame(&self, handle: WindowHandle, frame: Rectangle) -> bool {
        match self.windows.lock().get_mut(&handle) {
            Some(entry) => {
                entry.frame = frame;
                true
            }
            None => false,
        }
    }

    pub fn frame(&self, handle: WindowHandle) -> Option<Rectangle> {
        self.windows.lock().get(&handle).map(|e| e.frame)
    }

    pub(crate) fn resize(&self, handle: WindowHandle, event: SizeEvent) -> bool {
        match self.sender(handle) {
            Some(events) => {
                events.resize(event);
                true
            }
            None => false,
        }
    }

    pub(crate) fn redraw(&self, handle: WindowHandle) -> bool {
        match self.sender(handle) {
            Some(events) => {
                events.redraw();
                true
            }
            None => false,
        }
    }

    /// Sends a pointer event whose position is already normalized to the window.
    pub(crate) fn pointer(&self, handle: WindowHandle, event: PointerEvent) -> bool {
        // the send may block, so it happens outside the lock
        match self.sender(handle) {
            Some(events) => {
                events.pointer(event);
                true
            }
            None => false,
        }
    }

    /// Sends a pointer event positioned in screen coordinates to every window, mapped into each
    /// window’s normalized space. Windows whose frame is unknown are skipped. Returns the number of
    /// windows reached.
    pub(crate) fn broadcast(&self, event: PointerEvent) -> usize {
        let targets: Vec<_> = self
            .windows
            .lock()
            .iter()
            .map(|(handle, entry)| (*handle, entry.events.clone(), entry.frame))
            .collect();

        let mut reached = 0;
        for (handle, events, frame) in targets {
            let position = match normalize(frame, event.pointer.position) {
                Some(position) => position,
                None => {
                    trace!(?handle, "skipping window without a frame");
                    continue;
                }
            };
            events.pointer(PointerEvent {
                phase: event.phase,
                pointer: event.pointer.at(position),
            });
            reached += 1;
        }
        reached
    }
}

/// Maps a screen point into a frame’s normalized space, where the frame spans (0, 0)–(1, 1).
pub fn normalize(frame: Rectangle, p: Position) -> Option<Position> {
    if frame.is_unset() || frame.width() == 0. || frame.height() == 0. {
        return None;
    }
    Some(Point2::new(
        (p.x - frame.min.x) / frame.width(),
        (p.y - frame.min.y) / frame.height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{event_channel, PointerPhase};
    use crate::pointer::Pointer;
    use cgmath::Point2;
    use pretty_assertions::assert_eq;

    fn frame(x: f64, y: f64, w: f64, h: f64) -> Rectangle {
        Rectangle::new(Point2::new(x, y), Point2::new(x + w, y + h))
    }

    #[test]
    fn normalizing_screen_points() {
        let f = frame(100., 50., 200., 100.);
        assert_eq!(normalize(f, Point2::new(100., 50.)), Some(Point2::new(0., 0.)));
        assert_eq!(normalize(f, Point2::new(200., 100.)), Some(Point2::new(0.5, 0.5)));
        assert_eq!(normalize(f, Point2::new(0., 0.)), Some(Point2::new(-0.5, -0.5)));
        assert_eq!(normalize(Rectangle::default(), Point2::new(1., 1.)), None);
    }

    #[test]
    fn registration() {
        let registry = Registry::new();
        let (a, _ra) = event_channel();
        let (b, _rb) = event_channel();

        registry.register(WindowHandle(1), a.clone(), false).unwrap();
        assert!(matches!(
            registry.register(WindowHandle(1), b.clone(), false),
            Err(Error::DuplicateWindow(WindowHandle(1)))
        ));
        assert!(matches!(
            registry.register(WindowHandle(2), b.clone(), true),
            Err(Error::SingleWindowOnly)
        ));
        registry.register(WindowHandle(2), b, false).unwrap();
        assert_eq!(registry.len(), 2);

        registry.unregister(WindowHandle(1));
        assert!(!registry.contains(WindowHandle(1)));
        assert!(!registry.set_frame(WindowHandle(1), frame(0., 0., 1., 1.)));
        assert!(!registry.redraw(WindowHandle(1)));
    }

    #[test]
    fn broadcast_maps_into_each_frame() {
        let registry = Registry::new();
        let (a, ra) = event_channel();
        let (b, rb) = event_channel();
        let (c, rc) = event_channel();
        registry.register(WindowHandle(1), a, false).unwrap();
        registry.register(WindowHandle(2), b, false).unwrap();
        registry.register(WindowHandle(3), c, false).unwrap();
        registry.set_frame(WindowHandle(1), frame(0., 0., 100., 100.));
        registry.set_frame(WindowHandle(2), frame(100., 0., 100., 100.));

        let event = PointerEvent {
            phase: PointerPhase::Down,
            pointer: Pointer::mouse().at(Point2::new(150., 25.)),
        };
        assert_eq!(registry.broadcast(event), 2);

        let pa = ra.pointer.try_recv().unwrap();
        let pb = rb.pointer.try_recv().unwrap();
        assert_eq!(pa.pointer.position, Point2::new(1.5, 0.25));
        assert_eq!(pb.pointer.position, Point2::new(0.5, 0.25));
        assert_eq!(pb.phase, PointerPhase::Down);
        assert!(rc.pointer.try_recv().is_err());
    }
}
