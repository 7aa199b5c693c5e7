use crate::color::Color;
use crate::events::PointerPhase;
use crate::geometry::Rectangle;
use crate::graphics::{BufferId, Graphics, Triangle, Vertex};
use crate::pointer::Pointer;
use crate::view::{Drawable, PointerTarget, ViewCx};
use cgmath::{Matrix4, Point2, SquareMatrix};
use core::fmt;

/// Handles pointer events on a layer.
pub type PointerHandler = Box<dyn FnMut(&mut ViewCx<'_>, PointerPhase, &Pointer) + Send>;

/// A view that fills its bounds with a background color and may react to pointers.
pub struct Layer {
    /// Background color, with which the layer bounds will be filled.
    pub background: Color,

    pub pointer_action: Option<PointerHandler>,

    /// The uploaded fill and what it was built from.
    fill: Option<(BufferId, Rectangle, Color)>,
}

struct DebugifyOption<'a, T>(&'a Option<T>);
impl<'a, T> fmt::Debug for DebugifyOption<'a, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_some() {
            write!(f, "Some(..)")
        } else {
            write!(f, "None")
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Layer")
            .field("background", &self.background)
            .field("pointer_action", &DebugifyOption(&self.pointer_action))
            .finish()
    }
}

impl Default for Layer {
    fn default() -> Self {
        Layer {
            background: Color::TRANSPARENT,
            pointer_action: None,
            fill: None,
        }
    }
}

impl Layer {
    pub fn new(background: Color) -> Layer {
        Layer {
            background,
            ..Layer::default()
        }
    }

    pub fn with_pointer_action<F>(mut self, action: F) -> Layer
    where
        F: FnMut(&mut ViewCx<'_>, PointerPhase, &Pointer) + Send + 'static,
    {
        self.pointer_action = Some(Box::new(action));
        self
    }

    fn handle_pointer(&mut self, cx: &mut ViewCx<'_>, phase: PointerPhase, pointer: &Pointer) {
        if let Some(action) = &mut self.pointer_action {
            action(cx, phase, pointer);
        }
    }
}

/// Two triangles covering a rectangle.
fn quad(rect: Rectangle, color: Color) -> [Triangle; 2] {
    let v = |x, y| Vertex {
        position: Point2::new(x, y),
        color,
    };
    let (x0, x1, y0, y1) = rect.bounds();
    [
        [v(x0, y0), v(x1, y0), v(x1, y1)],
        [v(x0, y0), v(x1, y1), v(x0, y1)],
    ]
}

impl Drawable for Layer {
    fn draw(&mut self, gfx: &mut dyn Graphics, bounds: Rectangle) {
        if self.background.a <= 0. {
            return;
        }
        let buffer = match self.fill {
            Some((buffer, rect, color)) if rect == bounds && color == self.background => buffer,
            stale => {
                if let Some((buffer, ..)) = stale {
                    gfx.release_buffer(buffer);
                }
                let buffer = gfx.create_buffer(&quad(bounds, self.background));
                self.fill = Some((buffer, bounds, self.background));
                buffer
            }
        };
        gfx.draw(buffer, Matrix4::identity());
    }

    fn release(&mut self, gfx: &mut dyn Graphics) {
        if let Some((buffer, ..)) = self.fill.take() {
            gfx.release_buffer(buffer);
        }
    }
}

impl PointerTarget for Layer {
    fn pointer_down(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.handle_pointer(cx, PointerPhase::Down, pointer);
    }

    fn pointer_move(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.handle_pointer(cx, PointerPhase::Move, pointer);
    }

    fn pointer_up(&mut self, cx: &mut ViewCx<'_>, pointer: &Pointer) {
        self.handle_pointer(cx, PointerPhase::Up, pointer);
    }
}
