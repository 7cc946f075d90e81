/// ASCII rasterizer for a quick look at a model in the terminal
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use vbokit_core::pmd::ModelVertex;
use vbokit_core::{Camera, Mat4, Model, Vec3};

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Character-cell framebuffer with a depth buffer
pub struct AsciiPreview {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
}

impl AsciiPreview {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
        }
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
    }

    /// Model matrix centring the model's bounds on the origin, in metres
    pub fn fit_matrix(model: &Model) -> Mat4 {
        let center = crate::bounds(model)
            .map(|(min, max)| (min + max) * 0.5)
            .unwrap_or_default();
        Mat4::translate(-center.x, -center.y, -center.z) * model.metadata.to_meters()
    }

    /// Draw every triangle of `model`. The camera must already be resized
    /// to this preview's dimensions.
    pub fn render_model(&mut self, model: &Model, camera: &Camera, light_dir: Vec3) {
        let model_matrix = Self::fit_matrix(model);
        for tri in model.indices.chunks_exact(3) {
            let corners: Option<Vec<&ModelVertex>> = tri
                .iter()
                .map(|&i| model.vertices.get(usize::from(i)))
                .collect();
            if let Some(corners) = corners {
                self.render_triangle(&corners, &model_matrix, camera, light_dir);
            }
        }
    }

    fn render_triangle(
        &mut self,
        corners: &[&ModelVertex],
        model_matrix: &Mat4,
        camera: &Camera,
        light_dir: Vec3,
    ) {
        let mut screen_coords = Vec::with_capacity(3);
        for vertex in corners {
            match camera.project_to_screen(vertex.position, model_matrix) {
                Some(p) => screen_coords.push(p),
                None => return, // Triangle is clipped
            }
        }

        // Averaged vertex normal; the fit matrix is a uniform scale so
        // directions carry over unchanged
        let normal = corners
            .iter()
            .fold(Vec3::zero(), |acc, vertex| acc + vertex.normal);
        let brightness = if normal.is_zero() {
            0.0
        } else {
            normal.normalized().dot(-light_dir).max(0.0)
        };

        // Never fully blank so unlit faces still show a silhouette
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        self.rasterize_triangle(&screen_coords, LUMINOSITY_RAMP[char_index]);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32)], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box, clipped to the framebuffer
        let min_x = (v0.0.min(v1.0).min(v2.0).floor() as i32).max(0);
        let max_x = (v0.0.max(v1.0).max(v2.0).ceil() as i32).min(self.width as i32 - 1);
        let min_y = (v0.1.min(v1.1).min(v2.1).floor() as i32).max(0);
        let max_y = (v0.1.max(v1.1).max(v2.1).ceil() as i32).min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), p)
                else {
                    continue;
                };
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }

                let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;
                let idx = y as usize * self.width + x as usize;
                if depth < self.depth_buffer[idx] {
                    self.depth_buffer[idx] = depth;
                    self.char_buffer[idx] = character;
                }
            }
        }
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.char_buffer[y * self.width + x])
    }

    /// Plain rows without color
    pub fn lines(&self) -> Vec<String> {
        self.char_buffer
            .chunks(self.width.max(1))
            .map(|row| row.iter().collect())
            .collect()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for row in self.char_buffer.chunks(self.width.max(1)) {
            for &c in row {
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    _ => Color::Cyan,
                };
                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            writer.queue(Print('\n'))?;
        }
        writer.queue(ResetColor)?;
        writer.flush()
    }
}

/// Barycentric coordinates of `p` in the triangle, `None` when degenerate
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);
    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    Some((w0, w1, 1.0 - w0 - w1))
}
