/// Model inspection: text summary and terminal preview of a decoded model
use std::fmt;
use std::path::PathBuf;

use vbokit_core::{Model, Vec3};

pub mod preview;

pub use preview::AsciiPreview;

/// Command-line options of the inspect binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub path: PathBuf,
    pub preview: bool,
}

impl Options {
    /// Parse arguments without the program name. The model path is the
    /// first argument that is not a `--` flag; flags may come before or
    /// after it.
    pub fn parse(args: &[String]) -> Option<Self> {
        let path = args.iter().find(|a| !a.starts_with("--"))?;
        Some(Self {
            path: PathBuf::from(path),
            preview: args.iter().any(|a| a == "--preview"),
        })
    }
}

/// One material run of the index buffer
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRun {
    pub start: usize,
    pub count: usize,
    pub diffuse: [f32; 4],
    pub texture: Option<PathBuf>,
    pub sphere_map: Option<String>,
}

/// Everything printed for a model
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub name: String,
    pub comment: String,
    pub vertex_count: usize,
    pub index_count: usize,
    pub runs: Vec<MaterialRun>,
    pub runs_consistent: bool,
    pub stride: usize,
    pub vertex_buffer_bytes: usize,
    pub index_buffer_bytes: usize,
    pub bounds: Option<(Vec3, Vec3)>,
    pub unit_scale: f32,
}

impl Summary {
    pub fn new(model: &Model) -> vbokit_core::Result<Self> {
        let mesh = model.to_mesh_data()?;
        let runs = model
            .submeshes()
            .into_iter()
            .map(|run| MaterialRun {
                start: run.start,
                count: run.count,
                diffuse: run.material.diffuse,
                texture: model.resolve_texture(run.material),
                sphere_map: run.material.sphere_map().map(str::to_string),
            })
            .collect();

        Ok(Self {
            name: model.metadata.name.clone(),
            comment: model.metadata.comment.clone(),
            vertex_count: model.vertices.len(),
            index_count: model.indices.len(),
            runs,
            runs_consistent: model.index_runs_consistent(),
            stride: mesh.stride(),
            vertex_buffer_bytes: mesh.vertices.len(),
            index_buffer_bytes: mesh.indices.to_bytes().len(),
            bounds: bounds(model),
            unit_scale: model.metadata.unit_scale,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.index_count / 3
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "name:      {}", self.name)?;
        for (i, line) in self.comment.lines().enumerate() {
            let label = if i == 0 { "comment:" } else { "" };
            writeln!(f, "{:<10} {}", label, line)?;
        }
        writeln!(
            f,
            "vertices:  {} ({} bytes, stride {})",
            self.vertex_count, self.vertex_buffer_bytes, self.stride
        )?;
        writeln!(
            f,
            "indices:   {} ({} triangles, {} bytes)",
            self.index_count,
            self.triangle_count(),
            self.index_buffer_bytes
        )?;
        if let Some((min, max)) = self.bounds {
            let size = max - min;
            writeln!(
                f,
                "size:      {:.2} x {:.2} x {:.2} units ({:.2} m tall)",
                size.x,
                size.y,
                size.z,
                size.y * self.unit_scale
            )?;
        }
        writeln!(f, "materials: {}", self.runs.len())?;
        for (i, run) in self.runs.iter().enumerate() {
            let [r, g, b, a] = run.diffuse;
            write!(
                f,
                "  #{:<3} [{}..{}) diffuse ({:.2}, {:.2}, {:.2}, {:.2})",
                i,
                run.start,
                run.start + run.count,
                r,
                g,
                b,
                a
            )?;
            if let Some(texture) = &run.texture {
                write!(f, " texture {}", texture.display())?;
            }
            if let Some(sphere) = &run.sphere_map {
                write!(f, " sphere {}", sphere)?;
            }
            writeln!(f)?;
        }
        if !self.runs_consistent {
            writeln!(f, "warning:   material runs do not cover the index buffer")?;
        }
        Ok(())
    }
}

/// Axis-aligned bounds of the vertex positions
pub fn bounds(model: &Model) -> Option<(Vec3, Vec3)> {
    let mut positions = model.vertices.iter().map(|v| v.position);
    let first = positions.next()?;
    Some(positions.fold((first, first), |(min, max), p| {
        (
            Vec3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
            Vec3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use vbokit_core::pmd::{Metadata, ModelVertex};
    use vbokit_core::Material;

    fn model() -> Model {
        let vertex = |x: f32, y: f32| ModelVertex {
            position: Vec3::new(x, y, 0.0),
            normal: Vec3::new(0.0, 0.0, -1.0),
            uv: [0.0, 0.0],
            bones: [0, 0],
            weight: 100,
            flag: 0,
        };
        let material = |count: u32, texture: &str| Material {
            diffuse: [1.0, 0.5, 0.25, 1.0],
            specularity: 0.0,
            specular: [0.0; 3],
            ambient: [0.0; 3],
            toon_index: 0,
            flag: 0,
            index_count: count,
            texture: texture.to_string(),
        };
        Model {
            metadata: Metadata::new("box", "first\nsecond", Path::new("data")),
            vertices: vec![vertex(-1.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 20.0)],
            indices: vec![0, 1, 2, 2, 1, 0],
            materials: vec![material(3, "skin.bmp*gloss.sph"), material(3, "")],
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = Summary::new(&model()).unwrap();
        assert_eq!(summary.vertex_count, 3);
        assert_eq!(summary.triangle_count(), 2);
        assert_eq!(summary.stride, 38);
        assert_eq!(summary.vertex_buffer_bytes, 114);
        assert_eq!(summary.index_buffer_bytes, 12);
        assert!(summary.runs_consistent);
        assert_eq!(summary.runs[1].start, 3);
        assert_eq!(
            summary.runs[0].texture,
            Some(Path::new("data").join("skin.bmp"))
        );
        assert_eq!(summary.runs[0].sphere_map.as_deref(), Some("gloss.sph"));
        assert_eq!(summary.runs[1].texture, None);
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_options_flag_position() {
        let expected = Options {
            path: PathBuf::from("model.pmd"),
            preview: true,
        };
        assert_eq!(
            Options::parse(&args(&["model.pmd", "--preview"])),
            Some(expected.clone())
        );
        assert_eq!(
            Options::parse(&args(&["--preview", "model.pmd"])),
            Some(expected)
        );

        let plain = Options::parse(&args(&["dir/model.pmd"])).unwrap();
        assert_eq!(plain.path, Path::new("dir/model.pmd"));
        assert!(!plain.preview);

        assert_eq!(Options::parse(&args(&["--preview"])), None);
        assert_eq!(Options::parse(&[]), None);
    }

    #[test]
    fn test_bounds() {
        let (min, max) = bounds(&model()).unwrap();
        assert_eq!(min, Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(1.0, 20.0, 0.0));

        let mut empty = model();
        empty.vertices.clear();
        assert_eq!(bounds(&empty), None);
    }

    #[test]
    fn test_display() {
        let mut m = model();
        m.materials[1].index_count = 9;
        let text = Summary::new(&m).unwrap().to_string();
        assert!(text.contains("name:      box"));
        assert!(text.contains("comment:   first\n           second"));
        assert!(text.contains("1.58 m tall"));
        assert!(text.contains("sphere gloss.sph"));
        assert!(text.contains("warning:"));
    }
}
