//! Errors.

use crate::graphics::GraphicsError;
use crate::registry::WindowHandle;
use crate::view::ViewId;
use std::io;
use std::thread::ThreadId;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced to callers of the toolkit.
#[derive(Debug, Error)]
pub enum Error {
    #[error("only a single window is supported on this platform")]
    SingleWindowOnly,

    #[error("window {0:?} is already open")]
    DuplicateWindow(WindowHandle),

    #[error("called on thread {actual:?}, but the host was created on {expected:?}")]
    WrongThread { expected: ThreadId, actual: ThreadId },

    #[error("blocking window call made from the window's own thread")]
    WindowThread,

    #[error("window has closed")]
    WindowClosed,

    #[error(transparent)]
    Graphics(#[from] GraphicsError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("failed to spawn window thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors from structural view tree operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("no such view: {0:?}")]
    NoSuchView(ViewId),

    #[error("the root view cannot be removed or moved")]
    RootView,

    #[error("view {0:?} cannot become a descendant of itself")]
    Cycle(ViewId),
}
