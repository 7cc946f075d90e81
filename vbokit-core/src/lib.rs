/// vbokit Core Library - model decoding, vertex packing and row-vector math
///
/// Decodes PMD model files into typed records, packs vertices into
/// interleaved buffers with computed strides and offsets, and provides the
/// row-major matrices used for model/view/projection composition.

pub mod builder;
pub mod error;
pub mod layout;
pub mod matrix;
pub mod pmd;
pub mod projection;
pub mod quaternion;
pub mod scene;
pub mod text;
pub mod transform;
pub mod vector;

// Re-export commonly used types
pub use builder::{IndexBuffer, MeshBuilder, MeshData, Topology, Vertex};
pub use error::{DecodeError, Error, Result};
pub use layout::{AttributeLayout, ScalarType, Semantics, VertexLayout};
pub use matrix::{Mat3, Mat4};
pub use pmd::{decode, Decoder, Material, Model};
pub use projection::{Camera, CameraSettings, ProjectionMode};
pub use quaternion::Quaternion;
pub use scene::{Node, RenderContext, Scene};
pub use text::{ShiftJis, TextEncoding, Utf8};
pub use transform::Transform;
pub use vector::{Vec3, Vec4};
