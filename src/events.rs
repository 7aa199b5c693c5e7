//! Events delivered to a window’s event loop, and the queues that carry them.
//!
//! Every window has one queue per event kind. Size and draw queues hold a single pending event:
//!
//! - a newer size event replaces a pending one;
//! - a redraw request is dropped while another is pending.
//!
//! Pointer events keep their order. Downs and ups are never dropped, since losing one would break
//! a gesture, but a move replaces the pointer’s pending move if nothing of that pointer was queued
//! after it. No sender ever blocks, so it is safe to feed input from the window thread itself.
//!
//! Work items queue up without bound; each carries its own reply channel.

use crate::error::{Error, Result};
use crate::geometry::Size;
use crate::pointer::Pointer;
use crate::tree::ViewTree;
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Window size change, as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeEvent {
    /// Logical size: the size of the root view.
    pub size: Size,

    /// Size in device pixels.
    pub pixels: Size,
}

/// A redraw request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawEvent;

/// Phases of a pointer gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer event on its way to a window.
///
/// The pointer position is normalized to the window’s content area: (0, 0) is the top left corner
/// and (1, 1) the bottom right. The window loop scales it to logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub pointer: Pointer,
}

/// A unit of work to run on the window thread.
pub(crate) struct WorkItem(pub(crate) Box<dyn FnOnce(&mut ViewTree) + Send + 'static>);

/// Requests redraws of a window. Requests coalesce: at most one is ever pending.
#[derive(Debug, Clone)]
pub struct Redraw(Sender<DrawEvent>);

impl Redraw {
    pub(crate) fn channel() -> (Redraw, Receiver<DrawEvent>) {
        let (send, recv) = channel::bounded(1);
        (Redraw(send), recv)
    }

    /// A redraw handle that goes nowhere, for trees that aren’t attached to a window.
    pub fn detached() -> Redraw {
        Redraw::channel().0
    }

    /// Requests a redraw. Returns false if the request was folded into a pending one (or nobody is
    /// listening).
    pub fn request(&self) -> bool {
        self.0.try_send(DrawEvent).is_ok()
    }
}

/// Pointer events waiting for a window loop.
type PendingPointers = Arc<Mutex<VecDeque<PointerEvent>>>;

/// Sends pointer events. The queue itself is unbounded; `wake` holds at most one pending signal
/// that there is something to take.
#[derive(Debug, Clone)]
pub(crate) struct PointerSender {
    pending: PendingPointers,
    wake: Sender<()>,
}

/// Receives pointer events, in order.
#[derive(Debug)]
pub(crate) struct PointerReceiver {
    pending: PendingPointers,
    pub(crate) wake: Receiver<()>,
}

fn pointer_channel() -> (PointerSender, PointerReceiver) {
    let pending = PendingPointers::default();
    let (wake, recv_wake) = channel::bounded(1);
    (
        PointerSender {
            pending: Arc::clone(&pending),
            wake,
        },
        PointerReceiver {
            pending,
            wake: recv_wake,
        },
    )
}

impl PointerSender {
    fn send(&self, event: PointerEvent) {
        {
            let mut pending = self.pending.lock();
            let last = pending
                .iter()
                .rposition(|e| e.pointer.id == event.pointer.id);
            match last {
                Some(i) if pending[i].phase == PointerPhase::Move
                    && event.phase == PointerPhase::Move =>
                {
                    trace!("replacing pending pointer move");
                    pending[i] = event;
                }
                _ => pending.push_back(event),
            }
        }
        match self.wake.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => (),
            Err(TrySendError::Disconnected(())) => {
                trace!("dropping pointer event for closed window");
                self.pending.lock().clear();
            }
        }
    }
}

impl PointerReceiver {
    /// Takes every pending event, oldest first.
    pub(crate) fn take(&self) -> VecDeque<PointerEvent> {
        core::mem::take(&mut *self.pending.lock())
    }

    /// Takes the oldest pending event.
    #[cfg(test)]
    pub(crate) fn try_recv(&self) -> Result<PointerEvent, channel::TryRecvError> {
        self.pending.lock().pop_front().ok_or(channel::TryRecvError::Empty)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }
}

/// The sending half of a window’s queues. Cheap to clone; safe to use from any thread.
#[derive(Debug, Clone)]
pub(crate) struct EventSender {
    work: Sender<WorkItem>,
    size: Sender<SizeEvent>,
    // used to throw away a stale pending size event
    stale_size: Receiver<SizeEvent>,
    redraw: Redraw,
    pointer: PointerSender,
}

/// The receiving half of a window’s queues. Owned by the window loop.
#[derive(Debug)]
pub(crate) struct EventReceiver {
    pub(crate) work: Receiver<WorkItem>,
    pub(crate) size: Receiver<SizeEvent>,
    pub(crate) draw: Receiver<DrawEvent>,
    pub(crate) pointer: PointerReceiver,
}

pub(crate) fn event_channel() -> (EventSender, EventReceiver) {
    let (send_work, recv_work) = channel::unbounded();
    let (send_size, recv_size) = channel::bounded(1);
    let (redraw, recv_draw) = Redraw::channel();
    let (send_pointer, recv_pointer) = pointer_channel();
    (
        EventSender {
            work: send_work,
            size: send_size,
            stale_size: recv_size.clone(),
            redraw,
            pointer: send_pointer,
        },
        EventReceiver {
            work: recv_work,
            size: recv_size,
            draw: recv_draw,
            pointer: recv_pointer,
        },
    )
}

impl core::fmt::Debug for WorkItem {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "WorkItem(..)")
    }
}

impl EventSender {
    /// Queues a work item.
    pub(crate) fn submit(&self, item: WorkItem) -> Result<()> {
        self.work.send(item).map_err(|_| Error::WindowClosed)
    }

    /// Queues a size event, replacing any pending one.
    pub(crate) fn resize(&self, mut event: SizeEvent) {
        loop {
            match self.size.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(e)) => {
                    if self.stale_size.try_recv().is_ok() {
                        trace!("replacing pending size event");
                    }
                    event = e;
                }
                Err(TrySendError::Disconnected(_)) => {
                    trace!("dropping size event for closed window");
                    return;
                }
            }
        }
    }

    pub(crate) fn redraw(&self) -> bool {
        self.redraw.request()
    }

    pub(crate) fn redraw_handle(&self) -> Redraw {
        self.redraw.clone()
    }

    /// Queues a pointer event. Never blocks.
    pub(crate) fn pointer(&self, event: PointerEvent) {
        self.pointer.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pointer::{Pointer, PointerId};
    use cgmath::{Point2, Vector2};

    fn size_event(w: f64) -> SizeEvent {
        SizeEvent {
            size: Vector2::new(w, w),
            pixels: Vector2::new(2. * w, 2. * w),
        }
    }

    #[test]
    fn redraw_requests_coalesce() {
        let (redraw, recv) = Redraw::channel();
        assert!(redraw.request());
        for _ in 0..10 {
            assert!(!redraw.request());
        }
        assert_eq!(recv.len(), 1);
        recv.try_recv().unwrap();
        assert!(recv.try_recv().is_err());
        assert!(redraw.request());
    }

    #[test]
    fn detached_redraw_goes_nowhere() {
        let redraw = Redraw::detached();
        assert!(!redraw.request());
    }

    #[test]
    fn latest_size_wins() {
        let (send, recv) = event_channel();
        send.resize(size_event(100.));
        send.resize(size_event(200.));
        send.resize(size_event(300.));
        assert_eq!(recv.size.len(), 1);
        assert_eq!(recv.size.try_recv().unwrap(), size_event(300.));
    }

    fn pointer_event(phase: PointerPhase, pointer: Pointer, x: f64) -> PointerEvent {
        PointerEvent {
            phase,
            pointer: pointer.at(Point2::new(x, x)),
        }
    }

    #[test]
    fn latest_move_wins() {
        let (send, recv) = event_channel();
        let mouse = Pointer::mouse();
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.1));
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.9));
        assert_eq!(recv.pointer.len(), 1);
        assert_eq!(recv.pointer.wake.len(), 1);
        assert_eq!(
            recv.pointer.try_recv().unwrap().pointer.position,
            Point2::new(0.9, 0.9)
        );
    }

    #[test]
    fn gesture_transitions_are_kept_in_order() {
        let (send, recv) = event_channel();
        let mouse = Pointer::mouse();
        send.pointer(pointer_event(PointerPhase::Down, mouse, 0.1));
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.2));
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.3));
        send.pointer(pointer_event(PointerPhase::Up, mouse, 0.4));
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.5));

        let pending: Vec<_> = recv
            .pointer
            .take()
            .into_iter()
            .map(|e| (e.phase, e.pointer.position.x))
            .collect();
        assert_eq!(
            pending,
            vec![
                (PointerPhase::Down, 0.1),
                (PointerPhase::Move, 0.3),
                (PointerPhase::Up, 0.4),
                (PointerPhase::Move, 0.5),
            ]
        );
        assert!(recv.pointer.try_recv().is_err());
    }

    #[test]
    fn moves_of_other_pointers_are_kept() {
        let (send, recv) = event_channel();
        let mouse = Pointer::mouse();
        let touch = Pointer {
            id: PointerId(3),
            ..Pointer::mouse()
        };
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.1));
        send.pointer(pointer_event(PointerPhase::Move, touch, 0.2));
        send.pointer(pointer_event(PointerPhase::Move, mouse, 0.3));
        let pending: Vec<_> = recv
            .pointer
            .take()
            .into_iter()
            .map(|e| (e.pointer.id, e.pointer.position.x))
            .collect();
        assert_eq!(pending, vec![(PointerId::MOUSE, 0.3), (PointerId(3), 0.2)]);
    }

    #[test]
    fn pointer_events_for_closed_windows_are_dropped() {
        let (send, recv) = event_channel();
        let pending = Arc::clone(&recv.pointer.pending);
        drop(recv);
        send.pointer(pointer_event(PointerPhase::Down, Pointer::mouse(), 0.5));
        assert!(pending.lock().is_empty());
    }

    #[test]
    fn closed_window_rejects_work() {
        let (send, recv) = event_channel();
        drop(recv);
        assert!(matches!(
            send.submit(WorkItem(Box::new(|_| ()))),
            Err(Error::WindowClosed)
        ));
    }
}
