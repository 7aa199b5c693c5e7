use crate::geometry::{Rectangle, Size};
use crate::graphics::Graphics;
use crate::pointer::Pointer;
use crate::tree::ViewTree;
use core::any::Any;
use core::fmt;
use uuid::Uuid;

/// A unique identifier for a view.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u32, u16, u16, [u8; 8]);

impl ViewId {
    pub(crate) fn new() -> ViewId {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ViewId(a, b, c, *d)
    }
}

/// Views that paint something.
pub trait Drawable {
    /// Paints the view.
    ///
    /// The backend’s view transform has already been set to this view’s window transform, so
    /// drawing happens in the view’s own coordinate space; `bounds` is its rect.
    fn draw(&mut self, gfx: &mut dyn Graphics, bounds: Rectangle) {
        let _ = (gfx, bounds);
    }

    /// Releases anything the view holds in the backend. Called on the window thread once the view
    /// has been removed from its tree, or when its window closes.
    fn release(&mut self, gfx: &mut dyn Graphics) {
        let _ = gfx;
    }
}

/// Views that receive pointer input.
///
/// Pointer positions are in the receiving view’s own coordinate space. Once a view has received a
/// `pointer_down`, it keeps receiving that pointer’s moves and its up, wherever they happen.
pub trait PointerTarget {
    fn pointer_down(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        let _ = (cx, pointer);
    }

    fn pointer_move(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        let _ = (cx, pointer);
    }

    fn pointer_up(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        let _ = (cx, pointer);
    }
}

/// The behavior of a node in a [`ViewTree`].
///
/// Implemented for everything that is [`Drawable`], a [`PointerTarget`], `Send` and `Debug`; the
/// tree only ever holds views behind this trait.
pub trait View: Drawable + PointerTarget + Any + fmt::Debug + Send {
    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> View for T
where
    T: Drawable + PointerTarget + Any + fmt::Debug + Send,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// An empty view that does absolutely nothing. Useful as a container.
impl Drawable for () {}
impl PointerTarget for () {}

/// Handed to pointer hooks: the tree the view lives in, and which view it is.
///
/// The view’s own behavior is checked out of the tree while the hook runs, so looking it up
/// through [`ViewTree::view`] yields `None`; everything else about the view (position, size,
/// subviews) is there.
pub struct ViewCx<'a> {
    pub(crate) tree: &'a mut ViewTree,
    pub(crate) id: ViewId,
}

impl<'a> ViewCx<'a> {
    /// The view being called.
    pub fn id(&self) -> ViewId {
        self.id
    }

    pub fn tree(&self) -> &ViewTree {
        self.tree
    }

    pub fn tree_mut(&mut self) -> &mut ViewTree {
        self.tree
    }

    /// The view’s size in its superview’s space.
    pub fn size(&self) -> Size {
        self.tree.size(self.id).unwrap_or_else(|| Size::new(0., 0.))
    }

    /// The view’s own coordinate system.
    pub fn bounds(&self) -> Rectangle {
        self.tree.rect(self.id).unwrap_or_default()
    }

    /// Requests a redraw of the window.
    pub fn redraw(&self) {
        self.tree.redraw();
    }
}

impl<'a> fmt::Debug for ViewCx<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ViewCx").field("id", &self.id).finish()
    }
}
