use crate::error::TreeError;
use crate::events::Redraw;
use crate::geometry::{Position, Rectangle, Size};
use crate::graphics::Graphics;
use crate::transform::Transform;
use crate::view::{View, ViewCx, ViewId};
use cgmath::{EuclideanSpace, Point2};
use core::cell::Cell;
use core::fmt;
use std::collections::HashMap;

/// A node in the view tree.
struct TreeNode {
    /// The view behavior. Checked out (`None`) while one of its pointer hooks runs.
    view: Option<Box<dyn View>>,
    /// The immediate superview.
    superview: Option<ViewId>,
    /// An ordered list of all subviews, back to front.
    subviews: Vec<ViewId>,
    /// Position in the superview’s space.
    position: Position,
    /// Size in the superview’s space.
    size: Size,
    /// Internal coordinate system; unset means `(0, 0)`–`size`.
    rect: Rectangle,
    /// Memoized transform to window space.
    to_window: Cell<Option<Transform>>,
}

impl TreeNode {
    fn new(view: Box<dyn View>, superview: Option<ViewId>, position: Position, size: Size) -> Self {
        TreeNode {
            view: Some(view),
            superview,
            subviews: Vec::new(),
            position,
            size,
            rect: Rectangle::default(),
            to_window: Cell::new(None),
        }
    }

    fn rect(&self) -> Rectangle {
        if self.rect.is_unset() {
            Rectangle::from_size(self.size)
        } else {
            self.rect
        }
    }

    /// Maps the node’s own space into its superview’s space: translate by `-rect.min`, scale by
    /// `size / rect.size`, translate by `position`.
    fn parent_transform(&self) -> Transform {
        let offset = self.position.to_vec();
        if self.rect.is_unset() {
            return Transform::translate(offset);
        }
        let rect = self.rect;
        Transform::translate(-rect.min.to_vec())
            .compose(Transform::scale(
                self.size.x / rect.width(),
                self.size.y / rect.height(),
            ))
            .compose(Transform::translate(offset))
    }
}

/// A tree of views, each with its own coordinate system.
///
/// The tree owns every view; subviews are referred to by id, and each node refers back to its
/// superview by id. The root’s superview is the window itself, so the root’s parent space is window
/// space.
///
/// Transforms to window space are cached per node. Changing a node’s position, size, rect or
/// superview clears the cache of its whole subtree; the next lookup recomputes it from the nearest
/// valid ancestor.
///
/// Removed views are kept until the next draw, which lets them release what they hold in the
/// graphics backend.
pub struct ViewTree {
    nodes: HashMap<ViewId, TreeNode>,
    root: ViewId,
    redraw: Redraw,
    removed: Vec<Box<dyn View>>,
}

impl fmt::Debug for ViewTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ViewTree")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("removed", &self.removed.len())
            .finish_non_exhaustive()
    }
}

impl ViewTree {
    /// Creates a tree with the given root view, sized `size` and positioned at the window origin.
    pub fn new(root: Box<dyn View>, size: Size, redraw: Redraw) -> ViewTree {
        let root_id = ViewId::new();
        let mut nodes = HashMap::new();
        nodes.insert(root_id, TreeNode::new(root, None, Point2::new(0., 0.), size));
        ViewTree {
            nodes,
            root: root_id,
            redraw,
            removed: Vec::new(),
        }
    }

    pub fn root(&self) -> ViewId {
        self.root
    }

    pub fn contains(&self, id: ViewId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of views, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn node(&self, id: ViewId) -> Result<&TreeNode, TreeError> {
        self.nodes.get(&id).ok_or(TreeError::NoSuchView(id))
    }

    fn node_mut(&mut self, id: ViewId) -> Result<&mut TreeNode, TreeError> {
        self.nodes.get_mut(&id).ok_or(TreeError::NoSuchView(id))
    }

    /// Adds a view as the frontmost subview of `superview`.
    pub fn insert(
        &mut self,
        superview: ViewId,
        view: Box<dyn View>,
        position: Position,
        size: Size,
    ) -> Result<ViewId, TreeError> {
        self.node(superview)?;
        let id = ViewId::new();
        self.nodes
            .insert(id, TreeNode::new(view, Some(superview), position, size));
        self.node_mut(superview)?.subviews.push(id);
        self.redraw();
        Ok(id)
    }

    /// Removes a view and all of its subviews.
    pub fn remove(&mut self, id: ViewId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootView);
        }
        self.unlink(id)?;

        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.remove(&id) {
                stack.extend(node.subviews);
                self.removed.extend(node.view);
            }
        }
        self.redraw();
        Ok(())
    }

    /// Moves a view (with its subviews) to the front of another superview.
    pub fn reparent(&mut self, id: ViewId, superview: ViewId) -> Result<(), TreeError> {
        if id == self.root {
            return Err(TreeError::RootView);
        }
        self.node(id)?;
        self.node(superview)?;

        // the new superview must not be inside the subtree being moved
        let mut ancestor = Some(superview);
        while let Some(a) = ancestor {
            if a == id {
                return Err(TreeError::Cycle(id));
            }
            ancestor = self.nodes.get(&a).and_then(|n| n.superview);
        }

        self.unlink(id)?;
        self.node_mut(superview)?.subviews.push(id);
        self.node_mut(id)?.superview = Some(superview);
        self.invalidate(id);
        self.redraw();
        Ok(())
    }

    /// Removes a view from its superview’s subview list.
    fn unlink(&mut self, id: ViewId) -> Result<(), TreeError> {
        if let Some(superview) = self.node(id)?.superview {
            let subviews = &mut self.node_mut(superview)?.subviews;
            if let Some(pos) = subviews.iter().position(|s| *s == id) {
                subviews.remove(pos);
            }
        }
        Ok(())
    }

    /// Moves a view to `index` in its superview’s subview list (0 is the back). Indices past the
    /// end move it to the front.
    pub fn reorder(&mut self, id: ViewId, index: usize) -> Result<(), TreeError> {
        let superview = self.node(id)?.superview.ok_or(TreeError::RootView)?;
        let subviews = &mut self.node_mut(superview)?.subviews;
        if let Some(pos) = subviews.iter().position(|s| *s == id) {
            subviews.remove(pos);
        }
        let index = index.min(subviews.len());
        subviews.insert(index, id);
        self.redraw();
        Ok(())
    }

    /// Moves a view in front of its siblings.
    pub fn bring_to_front(&mut self, id: ViewId) -> Result<(), TreeError> {
        self.reorder(id, usize::MAX)
    }

    pub fn superview(&self, id: ViewId) -> Option<ViewId> {
        self.nodes.get(&id)?.superview
    }

    /// Subviews, back to front.
    pub fn subviews(&self, id: ViewId) -> Option<&[ViewId]> {
        self.nodes.get(&id).map(|n| &n.subviews[..])
    }

    /// Returns the view behavior, unless the view doesn’t exist or is busy handling an event.
    pub fn view(&self, id: ViewId) -> Option<&dyn View> {
        self.nodes.get(&id)?.view.as_deref()
    }

    pub fn view_mut(&mut self, id: ViewId) -> Option<&mut (dyn View + 'static)> {
        self.nodes.get_mut(&id)?.view.as_deref_mut()
    }

    /// Returns the view behavior as a concrete type.
    pub fn view_as<T: View>(&self, id: ViewId) -> Option<&T> {
        self.view(id)?.as_any().downcast_ref()
    }

    pub fn view_as_mut<T: View>(&mut self, id: ViewId) -> Option<&mut T> {
        self.view_mut(id)?.as_any_mut().downcast_mut()
    }

    /// Runs `f` with the view behavior checked out of the tree, so that it may mutate the tree.
    pub(crate) fn with_view<R>(
        &mut self,
        id: ViewId,
        f: impl FnOnce(&mut dyn View, &mut ViewCx<'_>) -> R,
    ) -> Option<R> {
        let mut view = self.nodes.get_mut(&id)?.view.take()?;
        let result = f(&mut *view, &mut ViewCx { tree: self, id });
        match self.nodes.get_mut(&id) {
            Some(node) => node.view = Some(view),
            // the view removed itself
            None => self.removed.push(view),
        }
        Some(result)
    }

    pub fn position(&self, id: ViewId) -> Option<Position> {
        self.nodes.get(&id).map(|n| n.position)
    }

    pub fn size(&self, id: ViewId) -> Option<Size> {
        self.nodes.get(&id).map(|n| n.size)
    }

    /// The view’s internal coordinate system: the explicit rect, or `(0, 0)`–`size` if unset.
    pub fn rect(&self, id: ViewId) -> Option<Rectangle> {
        self.nodes.get(&id).map(TreeNode::rect)
    }

    /// The explicit rect, which is the unset sentinel unless [`set_rect`](Self::set_rect) was
    /// called.
    pub fn explicit_rect(&self, id: ViewId) -> Option<Rectangle> {
        self.nodes.get(&id).map(|n| n.rect)
    }

    pub fn move_to(&mut self, id: ViewId, position: Position) -> Result<(), TreeError> {
        self.node_mut(id)?.position = position;
        self.invalidate(id);
        self.redraw();
        Ok(())
    }

    pub fn resize(&mut self, id: ViewId, size: Size) -> Result<(), TreeError> {
        self.node_mut(id)?.size = size;
        self.invalidate(id);
        self.redraw();
        Ok(())
    }

    /// Sets the internal coordinate system. Pass `Rectangle::default()` to unset it.
    ///
    /// An explicit rect must have a non-zero width and height.
    pub fn set_rect(&mut self, id: ViewId, rect: Rectangle) -> Result<(), TreeError> {
        self.node_mut(id)?.rect = rect;
        self.invalidate(id);
        self.redraw();
        Ok(())
    }

    /// Clears the cached window transform of a view and all of its descendants.
    fn invalidate(&self, id: ViewId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            if let Some(node) = self.nodes.get(&id) {
                node.to_window.set(None);
                stack.extend(node.subviews.iter().copied());
            }
        }
    }

    /// The transform from the view’s space to its superview’s space.
    pub fn parent_transform(&self, id: ViewId) -> Option<Transform> {
        self.nodes.get(&id).map(TreeNode::parent_transform)
    }

    /// The transform from the view’s space to window space.
    pub fn transform_to_window(&self, id: ViewId) -> Option<Transform> {
        let node = self.nodes.get(&id)?;
        if let Some(transform) = node.to_window.get() {
            return Some(transform);
        }
        let local = node.parent_transform();
        let transform = match node.superview {
            Some(superview) => local.compose(self.transform_to_window(superview)?),
            None => local,
        };
        node.to_window.set(Some(transform));
        Some(transform)
    }

    pub fn map_to_parent(&self, id: ViewId, p: Position) -> Option<Position> {
        Some(self.parent_transform(id)?.apply(p))
    }

    pub fn map_from_parent(&self, id: ViewId, p: Position) -> Option<Position> {
        Some(self.parent_transform(id)?.invert().apply(p))
    }

    pub fn map_to_window(&self, id: ViewId, p: Position) -> Option<Position> {
        Some(self.transform_to_window(id)?.apply(p))
    }

    pub fn map_from_window(&self, id: ViewId, p: Position) -> Option<Position> {
        Some(self.transform_to_window(id)?.invert().apply(p))
    }

    /// Finds the frontmost view under `p`, which is in `id`’s own space.
    ///
    /// Returns `None` if `p` is outside `id`’s rect; otherwise the deepest subview containing the
    /// point, or `id` itself.
    pub fn view_at(&self, id: ViewId, p: Position) -> Option<ViewId> {
        let node = self.nodes.get(&id)?;
        if !node.rect().contains(p) {
            return None;
        }
        for subview in node.subviews.iter().rev() {
            let child = match self.nodes.get(subview) {
                Some(child) => child,
                None => continue,
            };
            let q = child.parent_transform().invert().apply(p);
            if let Some(hit) = self.view_at(*subview, q) {
                return Some(hit);
            }
        }
        Some(id)
    }

    /// Draws every view, back to front. Views removed since the last draw release their
    /// resources first.
    pub fn draw(&mut self, gfx: &mut dyn Graphics) {
        self.release_removed(gfx);
        let root = self.root;
        self.draw_view(root, gfx);
    }

    fn release_removed(&mut self, gfx: &mut dyn Graphics) {
        for mut view in self.removed.drain(..) {
            view.release(gfx);
        }
    }

    /// Releases the resources of every view, removed or not. Called when the window goes away.
    pub(crate) fn release_all(&mut self, gfx: &mut dyn Graphics) {
        self.release_removed(gfx);
        for node in self.nodes.values_mut() {
            if let Some(view) = node.view.as_mut() {
                view.release(gfx);
            }
        }
    }

    fn draw_view(&mut self, id: ViewId, gfx: &mut dyn Graphics) {
        let transform = match self.transform_to_window(id) {
            Some(transform) => transform,
            None => return,
        };
        gfx.set_view_transform(transform);

        let subviews = match self.nodes.get_mut(&id) {
            Some(node) => {
                let bounds = node.rect();
                if let Some(view) = node.view.as_mut() {
                    view.draw(gfx, bounds);
                }
                node.subviews.clone()
            }
            None => return,
        };
        for subview in subviews {
            self.draw_view(subview, gfx);
        }
    }

    /// Requests a redraw of the window this tree belongs to.
    pub fn redraw(&self) {
        self.redraw.request();
    }
}
