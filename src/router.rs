//! Pointer routing.

use crate::events::{PointerEvent, PointerPhase};
use crate::pointer::{Pointer, PointerId};
use crate::tree::ViewTree;
use crate::view::ViewId;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Routes pointer events to views.
///
/// A pointer-down goes to whatever view is under it, and that view captures the pointer: the
/// pointer’s moves and its up go to the same view, wherever they land, until the up releases the
/// capture. Moves and ups of pointers without a capture are dropped.
#[derive(Debug, Default)]
pub struct PointerRouter {
    captures: HashMap<PointerId, ViewId>,
}

impl PointerRouter {
    pub fn new() -> PointerRouter {
        PointerRouter::default()
    }

    /// The view that captured a pointer, if any.
    pub fn capture(&self, id: PointerId) -> Option<ViewId> {
        self.captures.get(&id).copied()
    }

    /// Number of gestures in progress.
    pub fn active(&self) -> usize {
        self.captures.len()
    }

    /// Routes an event whose pointer position is in window space. Returns the view that received
    /// it.
    pub fn dispatch(&mut self, tree: &mut ViewTree, event: PointerEvent) -> Option<ViewId> {
        match event.phase {
            PointerPhase::Down => self.pointer_down(tree, event.pointer),
            PointerPhase::Move => self.pointer_move(tree, event.pointer),
            PointerPhase::Up => self.pointer_up(tree, event.pointer),
        }
    }

    pub fn pointer_down(&mut self, tree: &mut ViewTree, pointer: Pointer) -> Option<ViewId> {
        let root = tree.root();
        let target = tree
            .map_from_parent(root, pointer.position)
            .and_then(|p| tree.view_at(root, p));
        let target = match target {
            Some(target) => target,
            None => {
                trace!(id = pointer.id.0, "pointer down outside of the root view");
                return None;
            }
        };

        if let Some(previous) = self.captures.insert(pointer.id, target) {
            warn!(
                id = pointer.id.0,
                ?previous,
                "pointer down while already captured; starting a new gesture"
            );
        }
        debug!(id = pointer.id.0, view = ?target, "pointer captured");

        let local = local_pointer(tree, target, pointer)?;
        tree.with_view(target, |view, cx| view.pointer_down(cx, &local));
        Some(target)
    }

    pub fn pointer_move(&mut self, tree: &mut ViewTree, pointer: Pointer) -> Option<ViewId> {
        let target = self.captured(tree, pointer.id)?;
        let local = local_pointer(tree, target, pointer)?;
        tree.with_view(target, |view, cx| view.pointer_move(cx, &local));
        Some(target)
    }

    pub fn pointer_up(&mut self, tree: &mut ViewTree, pointer: Pointer) -> Option<ViewId> {
        let target = self.captured(tree, pointer.id)?;
        let local = local_pointer(tree, target, pointer);
        if let Some(local) = local {
            tree.with_view(target, |view, cx| view.pointer_up(cx, &local));
        }
        self.captures.remove(&pointer.id);
        debug!(id = pointer.id.0, view = ?target, "pointer released");
        Some(target)
    }

    /// Looks up a capture, dropping it if the view has left the tree.
    fn captured(&mut self, tree: &ViewTree, id: PointerId) -> Option<ViewId> {
        let target = match self.captures.get(&id) {
            Some(target) => *target,
            None => {
                trace!(id = id.0, "dropping event for uncaptured pointer");
                return None;
            }
        };
        if !tree.contains(target) {
            trace!(id = id.0, view = ?target, "captured view is gone; dropping capture");
            self.captures.remove(&id);
            return None;
        }
        Some(target)
    }
}

/// The pointer with its position mapped from window space into the view’s space.
fn local_pointer(tree: &ViewTree, view: ViewId, pointer: Pointer) -> Option<Pointer> {
    Some(pointer.at(tree.map_from_window(view, pointer.position)?))
}
