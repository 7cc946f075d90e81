//! Interleaved mesh building.
//!
//! [`MeshBuilder`] packs [`Vertex`] records into a byte buffer according to a
//! [`VertexLayout`] and appends sequential `u32` indices. Triangles pushed
//! without normals get a flat face normal. Nothing is deduplicated: every
//! primitive owns its vertex copies.

use log::trace;

use crate::error::{Error, Result};
use crate::layout::{ScalarType, Semantics, VertexLayout};
use crate::vector::Vec3;

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Primitive type of the finished buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangle,
    Line,
}

/// One vertex before packing.
///
/// Each field feeds the layout attribute with the matching [`Semantics`];
/// fields the layout does not declare are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    /// `None` lets [`MeshBuilder::push_triangle`] compute a face normal.
    /// Packed as zeros when no normal is ever resolved.
    pub normal: Option<Vec3>,
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: None,
            color: WHITE,
            uv: [0.0, 0.0],
        }
    }

    pub fn with_normal(mut self, normal: Vec3) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.uv = [u, v];
        self
    }

    /// Scalars of the group bound to `semantics`
    fn group(&self, semantics: Semantics) -> Option<[f32; 4]> {
        match semantics {
            Semantics::Position => Some(extend(self.position.to_array())),
            Semantics::Normal => Some(extend(self.normal.unwrap_or_default().to_array())),
            Semantics::Color => Some(self.color),
            Semantics::TexCoord => Some([self.uv[0], self.uv[1], 0.0, 0.0]),
            Semantics::String => None,
        }
    }
}

fn extend(v: [f32; 3]) -> [f32; 4] {
    [v[0], v[1], v[2], 0.0]
}

/// Widest attribute a [`Vertex`] can fill for each semantic
fn group_width(semantics: Semantics) -> Option<usize> {
    match semantics {
        Semantics::Position | Semantics::Normal => Some(3),
        Semantics::Color => Some(4),
        Semantics::TexCoord => Some(2),
        Semantics::String => None,
    }
}

/// Index buffer in the width its producer uses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexBuffer {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexBuffer {
    pub fn len(&self) -> usize {
        match self {
            IndexBuffer::U16(v) => v.len(),
            IndexBuffer::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value_type(&self) -> ScalarType {
        match self {
            IndexBuffer::U16(_) => ScalarType::U16,
            IndexBuffer::U32(_) => ScalarType::U32,
        }
    }

    pub fn get(&self, i: usize) -> Option<u32> {
        match self {
            IndexBuffer::U16(v) => v.get(i).map(|&x| u32::from(x)),
            IndexBuffer::U32(v) => v.get(i).copied(),
        }
    }

    /// Little-endian bytes for upload
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            IndexBuffer::U16(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            IndexBuffer::U32(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        }
    }
}

/// Finished buffers handed to a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<u8>,
    pub indices: IndexBuffer,
    pub layout: VertexLayout,
    pub topology: Topology,
    pub vertex_count: usize,
}

impl MeshData {
    pub fn stride(&self) -> usize {
        self.layout.stride()
    }
}

/// Growable interleaved vertex buffer plus index buffer
#[derive(Debug, Clone)]
pub struct MeshBuilder {
    layout: VertexLayout,
    vertices: Vec<u8>,
    indices: Vec<u32>,
    vertex_count: usize,
    topology: Topology,
}

impl MeshBuilder {
    /// Check once that every attribute maps onto a [`Vertex`] field.
    pub fn new(layout: VertexLayout) -> Result<Self> {
        let mut seen = Vec::new();
        for a in layout.attributes() {
            let Some(width) = group_width(a.semantics) else {
                continue;
            };
            if seen.contains(&a.semantics) {
                return Err(Error::layout(format!(
                    "{:?} declared more than once",
                    a.semantics
                )));
            }
            if a.elements > width {
                return Err(Error::layout(format!(
                    "{:?} has {} elements, at most {} supported",
                    a.semantics, a.elements, width
                )));
            }
            seen.push(a.semantics);
        }

        Ok(Self {
            layout,
            vertices: Vec::new(),
            indices: Vec::new(),
            vertex_count: 0,
            topology: Topology::Triangle,
        })
    }

    pub fn layout(&self) -> &VertexLayout {
        &self.layout
    }

    pub fn stride(&self) -> usize {
        self.layout.stride()
    }

    pub fn pack_format(&self) -> String {
        self.layout.pack_format()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }

    /// Last write wins; one builder should not mix lines and triangles.
    pub fn set_topology(&mut self, topology: Topology) {
        self.topology = topology;
    }

    /// Append one vertex given as flat scalars in layout order.
    ///
    /// Fails when the count differs from the layout's element count.
    pub fn push_values(&mut self, values: &[f32]) -> Result<()> {
        let expected = self.layout.element_count();
        if values.len() != expected {
            return Err(Error::layout(format!(
                "{} values for layout {} expecting {}",
                values.len(),
                self.layout,
                expected
            )));
        }

        let record = self.begin_record();
        let mut rest = values;
        for a in self.layout.attributes() {
            let (head, tail) = rest.split_at(a.elements);
            write_attribute(&mut self.vertices[record..], a.byte_offset(), a.value_type, head);
            rest = tail;
        }
        self.vertex_count += 1;
        Ok(())
    }

    /// Append one vertex without an index
    pub fn push_vertex(&mut self, v: &Vertex) {
        let record = self.begin_record();
        for a in self.layout.attributes() {
            if let Some(group) = v.group(a.semantics) {
                write_attribute(
                    &mut self.vertices[record..],
                    a.byte_offset(),
                    a.value_type,
                    &group[..a.elements],
                );
            }
        }
        self.vertex_count += 1;
    }

    fn begin_record(&mut self) -> usize {
        let start = self.vertices.len();
        self.vertices.resize(start + self.layout.stride(), 0);
        start
    }

    fn next_index(&self) -> u32 {
        self.vertex_count as u32
    }

    pub fn push_line(&mut self, begin: &Vertex, end: &Vertex) {
        let i = self.next_index();
        self.push_vertex(begin);
        self.push_vertex(end);
        self.indices.extend([i, i + 1]);
    }

    /// Append a triangle; if any vertex lacks a normal all three get
    /// `normalize(normalize(p0 - p1) x normalize(p2 - p1))`.
    pub fn push_triangle(&mut self, v0: &Vertex, v1: &Vertex, v2: &Vertex) {
        let (mut v0, mut v1, mut v2) = (*v0, *v1, *v2);
        let missing = v0.normal.is_none() || v1.normal.is_none() || v2.normal.is_none();
        if missing && self.layout.find(Semantics::Normal).is_some() {
            let normal = face_normal(v0.position, v1.position, v2.position);
            v0.normal = Some(normal);
            v1.normal = Some(normal);
            v2.normal = Some(normal);
        }

        let i = self.next_index();
        self.push_vertex(&v0);
        self.push_vertex(&v1);
        self.push_vertex(&v2);
        self.indices.extend([i, i + 1, i + 2]);
    }

    /// Two triangles: `(v0, v1, v2)` and `(v2, v3, v0)`
    pub fn push_quad(&mut self, v0: &Vertex, v1: &Vertex, v2: &Vertex, v3: &Vertex) {
        self.push_triangle(v0, v1, v2);
        self.push_triangle(v2, v3, v0);
    }

    /// Flat quad of half-size `s` in the XY plane facing +Z
    pub fn create_quad(&mut self, s: f32) {
        self.topology = Topology::Triangle;
        let n = Vec3::new(0.0, 0.0, 1.0);
        self.push_quad(
            &Vertex::new(Vec3::new(-s, -s, 0.0)).with_normal(n).with_uv(0.0, 0.0),
            &Vertex::new(Vec3::new(s, -s, 0.0)).with_normal(n).with_uv(1.0, 0.0),
            &Vertex::new(Vec3::new(s, s, 0.0)).with_normal(n).with_uv(1.0, 1.0),
            &Vertex::new(Vec3::new(-s, s, 0.0)).with_normal(n).with_uv(0.0, 1.0),
        );
    }

    /// X/Y/Z axis lines colored red/green/blue
    pub fn create_axis(&mut self, size: f32) {
        self.topology = Topology::Line;
        let origin = Vec3::zero();
        let axes = [
            (Vec3::new(size, 0.0, 0.0), [1.0, 0.0, 0.0, 1.0]),
            (Vec3::new(0.0, size, 0.0), [0.0, 1.0, 0.0, 1.0]),
            (Vec3::new(0.0, 0.0, size), [0.0, 0.0, 1.0, 1.0]),
        ];
        for (tip, color) in axes {
            self.push_line(
                &Vertex::new(origin).with_color(color),
                &Vertex::new(tip).with_color(color),
            );
        }
    }

    /// Ground grid on Y = 0 with `2 * count + 1` lines per direction
    pub fn create_grid(&mut self, delta: f32, count: i32) {
        self.topology = Topology::Line;
        let size = delta * count as f32;
        let up = Vec3::new(0.0, 1.0, 0.0);
        let line = |a: Vec3, b: Vec3| (Vertex::new(a).with_normal(up), Vertex::new(b).with_normal(up));

        for i in -count..=count {
            let x = i as f32 * delta;
            let (a, b) = line(Vec3::new(x, 0.0, -size), Vec3::new(x, 0.0, size));
            self.push_line(&a, &b);
        }
        for i in -count..=count {
            let z = i as f32 * delta;
            let (a, b) = line(Vec3::new(-size, 0.0, z), Vec3::new(size, 0.0, z));
            self.push_line(&a, &b);
        }
    }

    /// Axis-aligned cube of half-size `s`, one color per corner
    pub fn create_cube(&mut self, s: f32) {
        self.topology = Topology::Triangle;
        let corners = [
            Vec3::new(-s, -s, s),
            Vec3::new(s, -s, s),
            Vec3::new(s, s, s),
            Vec3::new(-s, s, s),
            Vec3::new(-s, -s, -s),
            Vec3::new(s, -s, -s),
            Vec3::new(s, s, -s),
            Vec3::new(-s, s, -s),
        ];
        let colors = [
            [0.0, 0.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 1.0],
            [0.0, 1.0, 1.0, 1.0],
            [1.0, 0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0, 1.0],
            [1.0, 1.0, 0.0, 1.0],
        ];
        let faces = [
            ([0, 1, 2, 3], Vec3::new(0.0, 0.0, 1.0)),
            ([5, 4, 7, 6], Vec3::new(0.0, 0.0, -1.0)),
            ([1, 5, 6, 2], Vec3::new(1.0, 0.0, 0.0)),
            ([4, 0, 3, 7], Vec3::new(-1.0, 0.0, 0.0)),
            ([4, 5, 1, 0], Vec3::new(0.0, -1.0, 0.0)),
            ([6, 7, 3, 2], Vec3::new(0.0, 1.0, 0.0)),
        ];

        for (quad, normal) in faces {
            let [a, b, c, d] = quad.map(|i: usize| {
                Vertex::new(corners[i])
                    .with_normal(normal)
                    .with_color(colors[i])
            });
            self.push_quad(&a, &b, &c, &d);
        }
    }

    /// Hand the finished buffers over
    pub fn finish(self) -> MeshData {
        trace!(
            "mesh finished: {} vertices, {} indices, {} bytes",
            self.vertex_count,
            self.indices.len(),
            self.vertices.len()
        );
        MeshData {
            vertices: self.vertices,
            indices: IndexBuffer::U32(self.indices),
            layout: self.layout,
            topology: self.topology,
            vertex_count: self.vertex_count,
        }
    }
}

fn write_attribute(record: &mut [u8], offset: usize, value_type: ScalarType, values: &[f32]) {
    let size = value_type.size();
    for (i, &value) in values.iter().enumerate() {
        let start = offset + i * size;
        value_type.write(value, &mut record[start..start + size]);
    }
}

/// Flat normal of the triangle `p0, p1, p2` (corner at `p1`)
pub fn face_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    let v01 = (p0 - p1).normalized();
    let v21 = (p2 - p1).normalized();
    v01.cross(v21).normalized()
}
