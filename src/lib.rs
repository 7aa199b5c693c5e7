//! A small GUI toolkit core: windows, a tree of views with their own coordinate systems, and
//! pointer input routed to the right view.
//!
//! Platform glue creates a [`Host`] and feeds it native events; each [`Window`] runs its own
//! thread that owns the window’s [`ViewTree`], its [`PointerRouter`] and its [`Graphics`]
//! backend. Other threads reach a window through a [`WindowProxy`].
//!
//! ```no_run
//! use wren::{headless::Headless, Host, Layer, Color, WindowConfig, WindowHandle};
//!
//! let host = Host::default();
//! let (init, _log) = Headless::init();
//! let window = host
//!     .open_window(
//!         WindowHandle(1),
//!         WindowConfig::default(),
//!         Box::new(Layer::new(Color::WHITE)),
//!         init,
//!     )
//!     .unwrap();
//! let views = window.with_tree(|tree| tree.len()).unwrap();
//! assert_eq!(views, 1);
//! ```

pub mod color;
pub mod config;
pub mod digitizer;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graphics;
pub mod headless;
mod host;
mod layer;
pub mod pointer;
pub mod registry;
mod router;
pub mod transform;
mod tree;
mod view;
mod window;

pub use color::Color;
pub use config::{HostConfig, WindowConfig};
pub use error::{Error, Result, TreeError};
pub use geometry::{Position, Rectangle, Size};
pub use graphics::{Graphics, GraphicsError, GraphicsInit};
pub use host::{Host, MouseEventKind};
pub use layer::{Layer, PointerHandler};
pub use pointer::{Pointer, PointerButtons, PointerId, PointerKind};
pub use registry::WindowHandle;
pub use router::PointerRouter;
pub use transform::Transform;
pub use tree::ViewTree;
pub use view::{Drawable, PointerTarget, View, ViewCx, ViewId};
pub use window::{Window, WindowProxy};
