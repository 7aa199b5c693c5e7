//! Traits for graphics backends.
//!
//! The backend is created on the window thread and only ever used there. A typical backend wraps a
//! GL context with one shader program (see [`VERTEX_SHADER`] and [`FRAGMENT_SHADER`]) and a set of
//! vertex buffers filled from [`vertex_data`].

use crate::color::Color;
use crate::geometry::{Position, Size};
use crate::transform::Transform;
use cgmath::Matrix4;
use thiserror::Error;

/// Refers to a vertex buffer owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// A vertex with a position (in view space) and a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Position,
    pub color: Color,
}

pub type Triangle = [Vertex; 3];

/// Number of floats per vertex in [`vertex_data`]: x, y, r, g, b, a.
pub const COORDS_PER_VERTEX: usize = 6;

/// Vertex attributes of [`VERTEX_SHADER`] in the order [`vertex_data`] packs them, with the number
/// of floats in each. Backends bind their attribute pointers from this.
pub const VERTEX_ATTRIBUTES: [(&str, usize); 2] = [("pos", 2), ("color", 4)];

/// A drawing backend.
pub trait Graphics {
    /// Sets the projection for a window of the given logical size.
    fn set_projection(&mut self, size: Size);

    /// Sets the view transform used by subsequent draws.
    fn set_view_transform(&mut self, transform: Transform);

    /// Clears the surface.
    fn clear(&mut self);

    /// Uploads triangles into a new vertex buffer.
    fn create_buffer(&mut self, triangles: &[Triangle]) -> BufferId;

    /// Frees a vertex buffer.
    fn release_buffer(&mut self, buffer: BufferId);

    /// Draws a buffer with the given model matrix, under the current projection and view
    /// transform.
    fn draw(&mut self, buffer: BufferId, model: Matrix4<f32>);

    /// Presents the finished frame.
    fn present(&mut self);
}

/// Creates a backend. Runs on the window thread, after which the backend must stay there.
pub type GraphicsInit =
    Box<dyn FnOnce() -> Result<Box<dyn Graphics>, GraphicsError> + Send + 'static>;

/// Errors that may occur while setting up a backend.
#[derive(Debug, Error)]
pub enum GraphicsError {
    #[error("failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("failed to link shader program: {log}")]
    ProgramLink { log: String },

    #[error("failed to set up rendering context: {0}")]
    Context(String),
}

/// Transforms view-space vertices by the `mvp` uniform (see [`mvp`]).
pub const VERTEX_SHADER: &str = "#version 100
uniform mat4 mvp;
attribute vec2 pos;
attribute vec4 color;
varying vec4 vColor;

void main() {
    gl_Position = mvp * vec4(pos, 0, 1);
    vColor = color;
}
";

pub const FRAGMENT_SHADER: &str = "#version 100
precision mediump float;
varying vec4 vColor;

void main() {
    gl_FragColor = vColor;
}
";

/// The projection for a window of the given size: origin at the top left, y pointing down.
pub fn orthographic(size: Size) -> Matrix4<f32> {
    let w = size.x as f32;
    let h = size.y as f32;
    #[rustfmt::skip]
    let m = Matrix4::new(
        2. / w, 0., 0., 0.,
        0., -2. / h, 0., 0.,
        0., 0., -1., 0.,
        -1., 1., -1., 1.,
    );
    m
}

/// Combines projection, view and model matrices in the order the vertex shader expects.
pub fn mvp(projection: Matrix4<f32>, view: Matrix4<f32>, model: Matrix4<f32>) -> Matrix4<f32> {
    projection * view * model
}

/// Packs triangles into interleaved vertex data, [`COORDS_PER_VERTEX`] floats per vertex.
pub fn vertex_data(triangles: &[Triangle]) -> Vec<f32> {
    let mut data = Vec::with_capacity(triangles.len() * 3 * COORDS_PER_VERTEX);
    for triangle in triangles {
        for vertex in triangle {
            data.push(vertex.position.x as f32);
            data.push(vertex.position.y as f32);
            data.extend_from_slice(&vertex.color.to_array());
        }
    }
    data
}
