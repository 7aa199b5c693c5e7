//! A graphics backend that renders nothing and records every call.
//!
//! Useful off-screen, and for checking what a window asked its backend to do.

use crate::geometry::Size;
use crate::graphics::{self, BufferId, Graphics, GraphicsInit, Triangle};
use crate::transform::Transform;
use cgmath::{Matrix4, SquareMatrix};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetProjection(Size),
    SetViewTransform(Transform),
    Clear,
    /// A buffer was created from this many triangles.
    CreateBuffer(BufferId, usize),
    ReleaseBuffer(BufferId),
    /// A buffer was drawn with the full model-view-projection matrix.
    Draw(BufferId, Matrix4<f32>),
    Present,
}

/// Shared handle to the commands a [`Headless`] backend has recorded.
#[derive(Debug, Clone, Default)]
pub struct CommandLog(Arc<Mutex<Vec<Command>>>);

impl CommandLog {
    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Command> {
        std::mem::take(&mut *self.0.lock())
    }

    /// Returns a copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<Command> {
        self.0.lock().clone()
    }

    /// Counts the recorded commands matching `f`.
    pub fn count(&self, f: impl Fn(&Command) -> bool) -> usize {
        self.0.lock().iter().filter(|c| f(c)).count()
    }

    fn push(&self, command: Command) {
        self.0.lock().push(command);
    }
}

/// The headless backend.
#[derive(Debug)]
pub struct Headless {
    log: CommandLog,
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    next_buffer: u32,
    buffers: HashMap<BufferId, Vec<f32>>,
}

impl Headless {
    pub fn new() -> (Headless, CommandLog) {
        let log = CommandLog::default();
        let gfx = Headless {
            log: log.clone(),
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            next_buffer: 1,
            buffers: HashMap::new(),
        };
        (gfx, log)
    }

    /// An initializer for [`Window::open`](crate::Window::open) that never fails.
    pub fn init() -> (GraphicsInit, CommandLog) {
        let (gfx, log) = Headless::new();
        let init: GraphicsInit = Box::new(move || Ok(Box::new(gfx) as Box<dyn Graphics>));
        (init, log)
    }

    /// The packed vertex data of a live buffer.
    pub fn buffer(&self, buffer: BufferId) -> Option<&[f32]> {
        self.buffers.get(&buffer).map(|data| &data[..])
    }
}

impl Graphics for Headless {
    fn set_projection(&mut self, size: Size) {
        self.projection = graphics::orthographic(size);
        self.log.push(Command::SetProjection(size));
    }

    fn set_view_transform(&mut self, transform: Transform) {
        self.view = transform.to_matrix();
        self.log.push(Command::SetViewTransform(transform));
    }

    fn clear(&mut self) {
        self.log.push(Command::Clear);
    }

    fn create_buffer(&mut self, triangles: &[Triangle]) -> BufferId {
        let id = BufferId(self.next_buffer);
        self.next_buffer += 1;
        self.buffers.insert(id, graphics::vertex_data(triangles));
        self.log.push(Command::CreateBuffer(id, triangles.len()));
        id
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
        self.log.push(Command::ReleaseBuffer(buffer));
    }

    fn draw(&mut self, buffer: BufferId, model: Matrix4<f32>) {
        if !self.buffers.contains_key(&buffer) {
            warn!(?buffer, "drawing a buffer that does not exist");
            return;
        }
        let mvp = graphics::mvp(self.projection, self.view, model);
        self.log.push(Command::Draw(buffer, mvp));
    }

    fn present(&mut self) {
        self.log.push(Command::Present);
    }
}
