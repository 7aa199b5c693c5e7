//! The application context that platform glue talks to.

use crate::config::{HostConfig, WindowConfig};
use crate::digitizer::TouchSample;
use crate::error::{Error, Result};
use crate::events::{PointerEvent, PointerPhase, SizeEvent};
use crate::geometry::{Rectangle, Size};
use crate::graphics::GraphicsInit;
use crate::pointer::{Pointer, PointerButtons, PointerId, PointerKind, PointerTable};
use crate::registry::{Registry, WindowHandle};
use crate::view::View;
use crate::window::Window;
use cgmath::Point2;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::process;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::{debug, error, trace, warn};

/// Kinds of native mouse events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseEventKind {
    /// The mouse moved with no buttons held.
    Moved,
    /// The mouse moved with a button held.
    Dragged,
    Down,
    Up,
}

/// Connects platform input to windows.
///
/// The host owns everything windows share: the window registry, the pointer identity table and
/// the state of the mouse and of digitizer touches. Platform glue calls its entry points from
/// whatever thread native events arrive on; unknown window handles are ignored.
#[derive(Debug)]
pub struct Host {
    config: HostConfig,
    registry: Arc<Registry>,
    pointers: PointerTable,
    mouse: Mutex<Pointer>,
    touches: Mutex<HashMap<u8, Pointer>>,
    main_thread: ThreadId,
}

impl Default for Host {
    fn default() -> Self {
        Host::new(HostConfig::default())
    }
}

impl Host {
    /// Creates a host. The calling thread becomes the host’s main thread.
    pub fn new(config: HostConfig) -> Host {
        Host {
            config,
            registry: Arc::new(Registry::new()),
            pointers: PointerTable::new(),
            mouse: Mutex::new(Pointer::mouse()),
            touches: Mutex::new(HashMap::new()),
            main_thread: thread::current().id(),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Open windows.
    pub fn windows(&self) -> &Registry {
        &self.registry
    }

    pub(crate) fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn pointers(&self) -> &PointerTable {
        &self.pointers
    }

    pub fn main_thread(&self) -> ThreadId {
        self.main_thread
    }

    /// Opens a window; see [`Window::open`].
    pub fn open_window(
        &self,
        handle: WindowHandle,
        config: WindowConfig,
        root: Box<dyn View>,
        init: GraphicsInit,
    ) -> Result<Window> {
        Window::open(self, handle, config, root, init)
    }

    /// Fails unless called on the thread that created the host.
    pub fn check_main_thread(&self) -> Result<()> {
        let actual = thread::current().id();
        if actual == self.main_thread {
            Ok(())
        } else {
            Err(Error::WrongThread {
                expected: self.main_thread,
                actual,
            })
        }
    }

    /// Runs the application.
    ///
    /// `app` is started on its own thread, then `platform` (the native event loop) runs on the
    /// calling thread until it returns, after which the app thread is joined. Native UI toolkits
    /// must be driven from the thread the process started on, so calling this from any thread but
    /// the host’s main thread aborts the process.
    pub fn run<P, A>(self: &Arc<Self>, platform: P, app: A) -> Result<()>
    where
        P: FnOnce(&Arc<Host>),
        A: FnOnce(Arc<Host>) + Send + 'static,
    {
        if let Err(e) = self.check_main_thread() {
            error!(error = %e, "host run off its main thread");
            process::abort();
        }

        let host = Arc::clone(self);
        let app = thread::Builder::new()
            .name("app".into())
            .spawn(move || app(host))
            .map_err(Error::Spawn)?;
        debug!("running platform event loop");
        platform(self);

        if app.join().is_err() {
            error!("app thread panicked");
        }
        Ok(())
    }

    /// A window’s content area changed size.
    pub fn resize_event(&self, handle: WindowHandle, logical: Size, pixels: Size) {
        let event = SizeEvent {
            size: logical,
            pixels,
        };
        if !self.registry.resize(handle, event) {
            warn!(?handle, "resize event for unknown window");
        }
    }

    /// The platform is ready for a window to draw.
    pub fn draw_ready(&self, handle: WindowHandle) {
        if !self.registry.redraw(handle) {
            warn!(?handle, "draw request for unknown window");
        }
    }

    /// Records where a window’s content area is on screen, for mapping digitizer touches.
    pub fn set_window_frame(&self, handle: WindowHandle, frame: Rectangle) {
        if !self.registry.set_frame(handle, frame) {
            warn!(?handle, "frame update for unknown window");
        }
    }

    /// A native mouse event.
    ///
    /// `x` and `y` are normalized to the window’s content area. `button` is the platform’s button
    /// index (0 left, 1 right, 2 middle, 3 and 4 the side buttons). Keyboard modifiers are
    /// accepted for the platform’s convenience and not interpreted.
    ///
    /// Never blocks, so it may be called from any thread, the window’s own included.
    pub fn mouse_event(
        &self,
        handle: WindowHandle,
        x: f64,
        y: f64,
        kind: MouseEventKind,
        button: i32,
        modifiers: u32,
    ) {
        if !self.registry.contains(handle) {
            warn!(?handle, "mouse event for unknown window");
            return;
        }

        let event = {
            let mut mouse = self.mouse.lock();
            mouse.position = Point2::new(x, y);
            let phase = match kind {
                MouseEventKind::Moved | MouseEventKind::Dragged => {
                    mouse.button = PointerButtons::NONE;
                    PointerPhase::Move
                }
                MouseEventKind::Down => {
                    let button = PointerButtons::from_platform_button(button);
                    mouse.button = button;
                    mouse.buttons |= button;
                    PointerPhase::Down
                }
                MouseEventKind::Up => {
                    let button = PointerButtons::from_platform_button(button);
                    mouse.button = button;
                    mouse.buttons &= !button;
                    PointerPhase::Up
                }
            };
            PointerEvent {
                phase,
                pointer: *mouse,
            }
        };
        trace!(?handle, phase = ?event.phase, modifiers, "mouse event");
        self.registry.pointer(handle, event);
    }

    /// A digitizer touch changed. The touch goes to every open window, mapped through each
    /// window’s frame. Returns the number of windows reached. Never blocks.
    pub fn digitizer_sample(&self, sample: TouchSample) -> usize {
        let extent = self.config.digitizer_extent;
        let position = Point2::new(
            extent.x * f64::from(sample.x) / f64::from(u16::MAX),
            extent.y * f64::from(sample.y) / f64::from(u16::MAX),
        );

        let event = {
            let mut touches = self.touches.lock();
            match touches.get(&sample.id).copied() {
                None if !sample.pressed => {
                    trace!(id = sample.id, "ignoring lift of an unknown touch");
                    return 0;
                }
                None => {
                    let pointer = Pointer {
                        external_id: u32::from(sample.id) << 2,
                        button: PointerButtons::TOUCH_CONTACT,
                        buttons: PointerButtons::TOUCH_CONTACT,
                        ..Pointer::new(PointerId(0), PointerKind::Touch)
                    };
                    let pointer = match self.pointers.allocate(pointer) {
                        Some(pointer) => pointer.at(position),
                        None => {
                            warn!(id = sample.id, "out of pointer identities");
                            return 0;
                        }
                    };
                    touches.insert(sample.id, pointer);
                    PointerEvent {
                        phase: PointerPhase::Down,
                        pointer,
                    }
                }
                Some(mut pointer) if sample.pressed => {
                    pointer.button = PointerButtons::NONE;
                    pointer.position = position;
                    touches.insert(sample.id, pointer);
                    PointerEvent {
                        phase: PointerPhase::Move,
                        pointer,
                    }
                }
                Some(mut pointer) => {
                    touches.remove(&sample.id);
                    self.pointers.release(&pointer);
                    pointer.button = PointerButtons::TOUCH_CONTACT;
                    pointer.buttons = PointerButtons::NONE;
                    pointer.position = position;
                    PointerEvent {
                        phase: PointerPhase::Up,
                        pointer,
                    }
                }
            }
        };
        self.registry.broadcast(event)
    }
}
