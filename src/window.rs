//! Windows and their event loops.

use crate::config::WindowConfig;
use crate::error::{Error, Result};
use crate::events::{
    event_channel, EventReceiver, EventSender, PointerEvent, Redraw, SizeEvent, WorkItem,
};
use crate::geometry::Size;
use crate::graphics::{Graphics, GraphicsError, GraphicsInit};
use crate::host::Host;
use crate::registry::{Registry, WindowHandle};
use crate::router::PointerRouter;
use crate::tree::ViewTree;
use crate::view::View;
use cgmath::Point2;
use crossbeam::channel::{self, select, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use tracing::{debug, error, trace};

/// An open window.
///
/// Each window runs its own thread, which owns the view tree, the pointer router and the graphics
/// backend. Everything else talks to it through its queues. Dropping the handle closes the window
/// and waits for its thread to finish.
#[derive(Debug)]
pub struct Window {
    proxy: WindowProxy,
    title: String,
    registry: Arc<Registry>,
    close: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl Window {
    /// Opens a window on a host.
    ///
    /// `init` runs on the new window thread and creates the graphics backend there; if it fails,
    /// so does this. The root view is sized to the configured window size.
    pub fn open(
        host: &Host,
        handle: WindowHandle,
        config: WindowConfig,
        root: Box<dyn View>,
        init: GraphicsInit,
    ) -> Result<Window> {
        let registry = Arc::clone(host.registry());
        let (events, recv) = event_channel();
        registry.register(handle, events.clone(), host.config().single_window)?;

        let (send_close, recv_close) = channel::bounded(0);
        let (send_ready, recv_ready) = channel::bounded(1);
        let redraw = events.redraw_handle();
        let size = config.size;

        let spawned = thread::Builder::new()
            .name(format!("window {}", config.title))
            .spawn(move || {
                let gfx = match init() {
                    Ok(gfx) => gfx,
                    Err(e) => {
                        let _ = send_ready.send(Err(e));
                        return;
                    }
                };
                let _ = send_ready.send(Ok(()));
                WindowLoop::new(handle, gfx, root, size, redraw, recv, recv_close).run();
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                registry.unregister(handle);
                return Err(Error::Spawn(e));
            }
        };

        let ready: Result<(), GraphicsError> = match recv_ready.recv() {
            Ok(ready) => ready,
            Err(_) => {
                // the initializer panicked
                registry.unregister(handle);
                let _ = thread.join();
                return Err(Error::WindowClosed);
            }
        };
        if let Err(e) = ready {
            registry.unregister(handle);
            let _ = thread.join();
            error!(?handle, error = %e, "failed to initialize graphics");
            return Err(e.into());
        }

        debug!(?handle, title = %config.title, "opened window");
        Ok(Window {
            proxy: WindowProxy {
                handle,
                events,
                thread: thread.thread().id(),
            },
            title: config.title,
            registry,
            close: Some(send_close),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> WindowHandle {
        self.proxy.handle
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// A cloneable handle for talking to the window from other threads.
    pub fn proxy(&self) -> WindowProxy {
        self.proxy.clone()
    }

    /// See [`WindowProxy::with_tree`].
    pub fn with_tree<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ViewTree) -> R + Send + 'static,
        R: Send + 'static,
    {
        self.proxy.with_tree(f)
    }

    pub fn redraw(&self) {
        self.proxy.redraw();
    }

    /// Closes the window and waits for its thread to finish.
    pub fn close(mut self) {
        self.inner_close();
    }

    fn inner_close(&mut self) {
        self.registry.unregister(self.proxy.handle);
        drop(self.close.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(handle = ?self.proxy.handle, "window thread panicked");
            }
        }
        debug!(handle = ?self.proxy.handle, "closed window");
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.inner_close();
        }
    }
}

/// Sends requests to a window’s thread. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WindowProxy {
    handle: WindowHandle,
    events: EventSender,
    thread: ThreadId,
}

impl WindowProxy {
    pub fn handle(&self) -> WindowHandle {
        self.handle
    }

    /// Runs `f` on the window thread and waits for its result.
    ///
    /// Fails with [`Error::WindowThread`] when called from the window thread itself (e.g. from a
    /// view hook), which would otherwise deadlock, and with [`Error::WindowClosed`] if the window
    /// goes away before `f` has run.
    pub fn with_tree<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut ViewTree) -> R + Send + 'static,
        R: Send + 'static,
    {
        if thread::current().id() == self.thread {
            return Err(Error::WindowThread);
        }
        let (send_reply, recv_reply) = channel::bounded(1);
        self.events.submit(WorkItem(Box::new(move |tree| {
            let _ = send_reply.send(f(tree));
        })))?;
        recv_reply.recv().map_err(|_| Error::WindowClosed)
    }

    /// Queues `f` to run on the window thread without waiting for it. Safe to call from anywhere.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ViewTree) + Send + 'static,
    {
        self.events.submit(WorkItem(Box::new(f)))
    }

    /// Requests a redraw.
    pub fn redraw(&self) {
        self.events.redraw();
    }
}

enum LoopEvent {
    Work(WorkItem),
    Size(SizeEvent),
    Draw,
    Pointer,
    Close,
}

/// State owned by a window thread.
struct WindowLoop {
    handle: WindowHandle,
    gfx: Box<dyn Graphics>,
    tree: ViewTree,
    router: PointerRouter,
    size: SizeEvent,
    events: EventReceiver,
    close: Receiver<()>,
}

impl WindowLoop {
    fn new(
        handle: WindowHandle,
        mut gfx: Box<dyn Graphics>,
        root: Box<dyn View>,
        size: Size,
        redraw: Redraw,
        events: EventReceiver,
        close: Receiver<()>,
    ) -> WindowLoop {
        gfx.set_projection(size);
        let tree = ViewTree::new(root, size, redraw);
        tree.redraw();
        WindowLoop {
            handle,
            gfx,
            tree,
            router: PointerRouter::new(),
            size: SizeEvent { size, pixels: size },
            events,
            close,
        }
    }

    fn run(mut self) {
        trace!(handle = ?self.handle, "window loop started");
        loop {
            match self.next() {
                LoopEvent::Work(WorkItem(f)) => f(&mut self.tree),
                LoopEvent::Size(event) => self.resize(event),
                LoopEvent::Draw => self.draw(),
                LoopEvent::Pointer => {
                    for event in self.events.pointer.take() {
                        self.pointer(event);
                    }
                }
                LoopEvent::Close => break,
            }
        }
        self.tree.release_all(&mut *self.gfx);
        trace!(handle = ?self.handle, "window loop ended");
    }

    /// Waits for the next event. A disconnected queue means every sender is gone, which closes the
    /// loop just like the close signal.
    fn next(&self) -> LoopEvent {
        select! {
            recv(self.events.work) -> item => item.map_or(LoopEvent::Close, LoopEvent::Work),
            recv(self.events.size) -> event => event.map_or(LoopEvent::Close, LoopEvent::Size),
            recv(self.events.draw) -> event => event.map_or(LoopEvent::Close, |_| LoopEvent::Draw),
            recv(self.events.pointer.wake) -> woken => {
                woken.map_or(LoopEvent::Close, |_| LoopEvent::Pointer)
            }
            recv(self.close) -> _ => LoopEvent::Close,
        }
    }

    fn resize(&mut self, event: SizeEvent) {
        trace!(handle = ?self.handle, size = ?event.size, "resize");
        self.size = event;
        let root = self.tree.root();
        // resizing the root requests the redraw
        let _ = self.tree.resize(root, event.size);
        self.gfx.set_projection(event.size);
    }

    fn draw(&mut self) {
        trace!(handle = ?self.handle, "draw");
        self.gfx.clear();
        self.tree.draw(&mut *self.gfx);
        self.gfx.present();
    }

    fn pointer(&mut self, mut event: PointerEvent) {
        let p = event.pointer.position;
        event.pointer.position = Point2::new(p.x * self.size.size.x, p.y * self.size.size.y);
        trace!(handle = ?self.handle, phase = ?event.phase, position = ?event.pointer.position, "pointer");
        self.router.dispatch(&mut self.tree, event);
    }
}
