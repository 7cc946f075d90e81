//! PMD binary model decoder.
//!
//! Layout, all little-endian and unpadded:
//!
//! | field          | size                 |
//! |----------------|----------------------|
//! | magic `Pmd`    | 3                    |
//! | version `1.0`  | 4 (f32)              |
//! | name           | 20 (Shift-JIS)       |
//! | comment        | 256 (Shift-JIS)      |
//! | vertex count   | 4 (u32)              |
//! | vertices       | count * 38           |
//! | index count    | 4 (u32)              |
//! | indices        | count * 2 (u16)      |
//! | material count | 4 (u32)              |
//! | materials      | count * 70           |
//!
//! Anything after the materials is ignored. Only sizes are checked; the
//! decoded values are not validated against each other.

use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use nom::{
    bytes::complete::take,
    multi::count,
    number::complete::{le_f32, le_i16, le_i8, le_u16, le_u32},
    IResult,
};

use crate::builder::{IndexBuffer, MeshBuilder, MeshData, Topology, Vertex};
use crate::error::{DecodeError, Error, Result};
use crate::layout::{AttributeLayout, ScalarType, Semantics, VertexLayout};
use crate::matrix::Mat4;
use crate::text::{ShiftJis, TextEncoding};
use crate::vector::Vec3;

pub const MAGIC: &[u8] = b"Pmd";
pub const VERSION: f32 = 1.0;
pub const NAME_SIZE: usize = 20;
pub const COMMENT_SIZE: usize = 256;
pub const TEXTURE_SIZE: usize = 20;
pub const VERTEX_SIZE: usize = 38;
pub const MATERIAL_SIZE: usize = 70;
/// Metres per model unit
pub const UNIT_SCALE: f32 = 1.58 / 20.0;
/// Separates the color texture from the sphere map in a texture field
pub const TEXTURE_SEPARATOR: char = '*';

/// Axis convention of the source data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    YUpZForward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    XPositive,
    XNegative,
    YPositive,
    YNegative,
    ZPositive,
    ZNegative,
}

impl Direction {
    pub fn to_vec3(self) -> Vec3 {
        match self {
            Direction::XPositive => Vec3::new(1.0, 0.0, 0.0),
            Direction::XNegative => Vec3::new(-1.0, 0.0, 0.0),
            Direction::YPositive => Vec3::new(0.0, 1.0, 0.0),
            Direction::YNegative => Vec3::new(0.0, -1.0, 0.0),
            Direction::ZPositive => Vec3::new(0.0, 0.0, 1.0),
            Direction::ZNegative => Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

/// Descriptive data attached to a decoded model
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub name: String,
    pub comment: String,
    pub coordinate: Coordinate,
    pub up: Direction,
    pub forward: Direction,
    pub right: Direction,
    /// Metres per model unit (fixed for the format, not read from the file)
    pub unit_scale: f32,
    /// Directory relative texture names are resolved against
    pub base_path: PathBuf,
}

impl Metadata {
    pub fn new(name: impl Into<String>, comment: impl Into<String>, base_path: &Path) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
            coordinate: Coordinate::YUpZForward,
            up: Direction::YPositive,
            forward: Direction::ZNegative,
            right: Direction::XNegative,
            unit_scale: UNIT_SCALE,
            base_path: base_path.to_path_buf(),
        }
    }

    /// Uniform scale from model units to metres
    pub fn to_meters(&self) -> Mat4 {
        Mat4::scale(self.unit_scale, self.unit_scale, self.unit_scale)
    }
}

/// 38-byte vertex record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: [f32; 2],
    pub bones: [i16; 2],
    pub weight: i8,
    pub flag: i8,
}

/// 70-byte material record
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub diffuse: [f32; 4],
    pub specularity: f32,
    pub specular: [f32; 3],
    pub ambient: [f32; 3],
    pub toon_index: i8,
    pub flag: i8,
    /// Length of this material's run in the index buffer
    pub index_count: u32,
    /// Raw texture field, possibly `color.bmp*sphere.sph`
    pub texture: String,
}

impl Material {
    /// Color texture name, `None` when the field is empty
    pub fn texture_file(&self) -> Option<&str> {
        let name = match self.texture.split_once(TEXTURE_SEPARATOR) {
            Some((first, _)) => first,
            None => &self.texture,
        };
        (!name.is_empty()).then_some(name)
    }

    /// Secondary (sphere map) texture after the separator
    pub fn sphere_map(&self) -> Option<&str> {
        self.texture
            .split_once(TEXTURE_SEPARATOR)
            .map(|(_, second)| second)
            .filter(|s| !s.is_empty())
    }
}

/// A run of the index buffer drawn with one material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Submesh<'a> {
    pub start: usize,
    pub count: usize,
    pub material: &'a Material,
}

/// Decoded model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub metadata: Metadata,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u16>,
    pub materials: Vec<Material>,
}

impl Model {
    /// Material runs in order, starting at index 0
    pub fn submeshes(&self) -> Vec<Submesh<'_>> {
        let mut start = 0;
        self.materials
            .iter()
            .map(|material| {
                let count = material.index_count as usize;
                let run = Submesh {
                    start,
                    count,
                    material,
                };
                start += count;
                run
            })
            .collect()
    }

    /// Whether the material runs cover the index buffer exactly
    pub fn index_runs_consistent(&self) -> bool {
        let total: u64 = self.materials.iter().map(|m| u64::from(m.index_count)).sum();
        total == self.indices.len() as u64
    }

    /// Texture path of `material` joined onto the base path
    pub fn resolve_texture(&self, material: &Material) -> Option<PathBuf> {
        material
            .texture_file()
            .map(|name| self.metadata.base_path.join(name))
    }

    /// Layout of the raw 38-byte record for direct upload.
    ///
    /// Bone and flag bytes stay in the record as padding.
    pub fn vertex_layout() -> Result<VertexLayout> {
        VertexLayout::with_stride(
            vec![
                AttributeLayout::new(Semantics::Position, ScalarType::F32, 3).at(0),
                AttributeLayout::new(Semantics::Normal, ScalarType::F32, 3).at(12),
                AttributeLayout::new(Semantics::TexCoord, ScalarType::F32, 2).at(24),
            ],
            VERTEX_SIZE,
        )
    }

    /// Vertices packed back into 38-byte records
    pub fn vertex_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.vertices.len() * VERTEX_SIZE);
        for v in &self.vertices {
            write_vertex(&mut out, v);
        }
        out
    }

    /// Buffers for a renderer that reads the file layout as-is
    pub fn to_mesh_data(&self) -> Result<MeshData> {
        Ok(MeshData {
            vertices: self.vertex_bytes(),
            indices: IndexBuffer::U16(self.indices.clone()),
            layout: Self::vertex_layout()?,
            topology: Topology::Triangle,
            vertex_count: self.vertices.len(),
        })
    }

    /// Re-pack the triangles into `layout` through a [`MeshBuilder`].
    ///
    /// The result is unindexed: each triangle gets its own three vertices.
    /// Triangles referencing missing vertices are skipped.
    pub fn build_mesh(&self, layout: VertexLayout) -> Result<MeshData> {
        let mut builder = MeshBuilder::new(layout)?;
        let mut skipped = 0;
        for tri in self.indices.chunks_exact(3) {
            let corners: Option<Vec<Vertex>> = tri
                .iter()
                .map(|&i| {
                    self.vertices.get(usize::from(i)).map(|v| {
                        Vertex::new(v.position)
                            .with_normal(v.normal)
                            .with_uv(v.uv[0], v.uv[1])
                    })
                })
                .collect();
            match corners.as_deref() {
                Some([a, b, c]) => builder.push_triangle(a, b, c),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!("{}: skipped {} triangles with bad indices", self.metadata.name, skipped);
        }
        Ok(builder.finish())
    }
}

/// Decoder with a configurable text encoding for name, comment and
/// texture fields
pub struct Decoder {
    encoding: Box<dyn TextEncoding>,
}

impl Decoder {
    pub fn new(encoding: impl TextEncoding + 'static) -> Self {
        Self {
            encoding: Box::new(encoding),
        }
    }

    pub fn decode(&self, data: &[u8], base_path: &Path) -> std::result::Result<Model, DecodeError> {
        let (input, magic) = section(data, "magic", MAGIC.len(), take(MAGIC.len()))?;
        if magic != MAGIC {
            return Err(DecodeError::BadMagic {
                expected: MAGIC,
                found: magic.to_vec(),
            });
        }

        let (input, version) = section(input, "version", 4, le_f32)?;
        if version != VERSION {
            return Err(DecodeError::UnsupportedVersion {
                found: version,
                supported: VERSION,
            });
        }

        let (input, name) = section(input, "name", NAME_SIZE, take(NAME_SIZE))?;
        let name = self.encoding.decode(name);
        debug!("name: {}", name);
        let (input, comment) = section(input, "comment", COMMENT_SIZE, take(COMMENT_SIZE))?;
        let comment = self.encoding.decode(comment);
        debug!("comment: {}", comment);

        let (input, n) = section(input, "vertex count", 4, le_u32)?;
        let (input, vertices) = records(input, "vertices", n, VERTEX_SIZE, vertex_record)?;
        debug!("{} vertices, {} bytes", vertices.len(), vertices.len() * VERTEX_SIZE);

        let (input, n) = section(input, "index count", 4, le_u32)?;
        let (input, indices) = records(input, "indices", n, 2, le_u16)?;
        debug!("{} indices", indices.len());

        let (input, n) = section(input, "material count", 4, le_u32)?;
        let encoding = &*self.encoding;
        let (input, materials) = records(input, "materials", n, MATERIAL_SIZE, |i| {
            material_record(i, encoding)
        })?;
        debug!("{} materials", materials.len());

        if !input.is_empty() {
            trace!("{} trailing bytes ignored", input.len());
        }

        let model = Model {
            metadata: Metadata::new(name, comment, base_path),
            vertices,
            indices,
            materials,
        };
        if !model.index_runs_consistent() {
            warn!(
                "material runs do not cover the {} indices of {}",
                model.indices.len(),
                model.metadata.name
            );
        }
        Ok(model)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(ShiftJis)
    }
}

/// Decode `data` with Shift-JIS text fields
pub fn decode(data: &[u8], base_path: impl AsRef<Path>) -> std::result::Result<Model, DecodeError> {
    Decoder::default().decode(data, base_path.as_ref())
}

/// Run `parser` after checking that `needed` bytes remain
fn section<'a, O, F>(
    input: &'a [u8],
    section: &'static str,
    needed: usize,
    mut parser: F,
) -> std::result::Result<(&'a [u8], O), DecodeError>
where
    F: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
{
    let truncated = DecodeError::TruncatedData {
        section,
        needed,
        available: input.len(),
    };
    if input.len() < needed {
        return Err(truncated);
    }
    parser(input).map_err(|_| truncated)
}

/// `n` fixed-size records; the size check runs before anything is allocated
fn records<'a, O, F>(
    input: &'a [u8],
    name: &'static str,
    n: u32,
    size: usize,
    parser: F,
) -> std::result::Result<(&'a [u8], Vec<O>), DecodeError>
where
    F: FnMut(&'a [u8]) -> IResult<&'a [u8], O>,
{
    let n = n as usize;
    let needed = n.checked_mul(size).unwrap_or(usize::MAX);
    section(input, name, needed, count(parser, n))
}

fn vec3(input: &[u8]) -> IResult<&[u8], Vec3> {
    let (input, x) = le_f32(input)?;
    let (input, y) = le_f32(input)?;
    let (input, z) = le_f32(input)?;
    Ok((input, Vec3::new(x, y, z)))
}

fn floats<const N: usize>(mut input: &[u8]) -> IResult<&[u8], [f32; N]> {
    let mut out = [0.0; N];
    for v in &mut out {
        let (rest, x) = le_f32(input)?;
        *v = x;
        input = rest;
    }
    Ok((input, out))
}

fn vertex_record(input: &[u8]) -> IResult<&[u8], ModelVertex> {
    let (input, position) = vec3(input)?;
    let (input, normal) = vec3(input)?;
    let (input, uv) = floats::<2>(input)?;
    let (input, bone0) = le_i16(input)?;
    let (input, bone1) = le_i16(input)?;
    let (input, weight) = le_i8(input)?;
    let (input, flag) = le_i8(input)?;
    Ok((
        input,
        ModelVertex {
            position,
            normal,
            uv,
            bones: [bone0, bone1],
            weight,
            flag,
        },
    ))
}

fn material_record<'a>(
    input: &'a [u8],
    encoding: &dyn TextEncoding,
) -> IResult<&'a [u8], Material> {
    let (input, diffuse) = floats::<4>(input)?;
    let (input, specularity) = le_f32(input)?;
    let (input, specular) = floats::<3>(input)?;
    let (input, ambient) = floats::<3>(input)?;
    let (input, toon_index) = le_i8(input)?;
    let (input, flag) = le_i8(input)?;
    let (input, index_count) = le_u32(input)?;
    let (input, texture) = take(TEXTURE_SIZE)(input)?;
    Ok((
        input,
        Material {
            diffuse,
            specularity,
            specular,
            ambient,
            toon_index,
            flag,
            index_count,
            texture: encoding.decode(texture),
        },
    ))
}

/// Serialize `model` in the layout [`decode`] reads.
///
/// Text that does not fit its field fails with [`Error::FieldOverflow`];
/// text the encoding cannot represent fails with [`Error::Unencodable`].
pub fn encode(model: &Model, encoding: &dyn TextEncoding) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(
        MAGIC.len()
            + 4
            + NAME_SIZE
            + COMMENT_SIZE
            + 12
            + model.vertices.len() * VERTEX_SIZE
            + model.indices.len() * 2
            + model.materials.len() * MATERIAL_SIZE,
    );
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION.to_le_bytes());
    write_text(&mut out, "name", &model.metadata.name, NAME_SIZE, encoding)?;
    write_text(&mut out, "comment", &model.metadata.comment, COMMENT_SIZE, encoding)?;

    out.extend_from_slice(&(model.vertices.len() as u32).to_le_bytes());
    for v in &model.vertices {
        write_vertex(&mut out, v);
    }

    out.extend_from_slice(&(model.indices.len() as u32).to_le_bytes());
    for i in &model.indices {
        out.extend_from_slice(&i.to_le_bytes());
    }

    out.extend_from_slice(&(model.materials.len() as u32).to_le_bytes());
    for m in &model.materials {
        write_floats(&mut out, &m.diffuse);
        write_floats(&mut out, &[m.specularity]);
        write_floats(&mut out, &m.specular);
        write_floats(&mut out, &m.ambient);
        out.extend_from_slice(&m.toon_index.to_le_bytes());
        out.extend_from_slice(&m.flag.to_le_bytes());
        out.extend_from_slice(&m.index_count.to_le_bytes());
        write_text(&mut out, "texture", &m.texture, TEXTURE_SIZE, encoding)?;
    }
    Ok(out)
}

fn write_floats(out: &mut Vec<u8>, values: &[f32]) {
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
}

fn write_vertex(out: &mut Vec<u8>, v: &ModelVertex) {
    write_floats(out, &v.position.to_array());
    write_floats(out, &v.normal.to_array());
    write_floats(out, &v.uv);
    out.extend_from_slice(&v.bones[0].to_le_bytes());
    out.extend_from_slice(&v.bones[1].to_le_bytes());
    out.extend_from_slice(&v.weight.to_le_bytes());
    out.extend_from_slice(&v.flag.to_le_bytes());
}

fn write_text(
    out: &mut Vec<u8>,
    field: &'static str,
    text: &str,
    width: usize,
    encoding: &dyn TextEncoding,
) -> Result<()> {
    let bytes = encoding
        .encode(text)
        .ok_or(Error::Unencodable { field })?;
    if bytes.len() > width {
        return Err(Error::FieldOverflow {
            field,
            len: bytes.len(),
            max: width,
        });
    }
    out.extend_from_slice(&bytes);
    out.resize(out.len() + width - bytes.len(), 0);
    Ok(())
}
