//! Rendering
//!
//! `draw` turns a state snapshot into depth-ordered commands and triangle
//! lists; `pipeline` uploads those through WebGPU in the browser build.

pub mod draw;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use draw::{DepthLayer, DrawCommand, Shape, Surface, VertexSurface, build_draw_list, render};
pub use pipeline::{RenderError, RenderState};
pub use vertex::Vertex;
