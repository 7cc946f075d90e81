/// Orbit camera and projection utilities
use log::warn;

use crate::matrix::Mat4;
use crate::vector::{Vec3, Vec4};

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Looks down +Z, the viewer default
    Pinhole,
    PerspectiveRh,
    PerspectiveLh,
    Orthographic,
}

/// Camera tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    /// Vertical field of view in degrees
    pub fovy: f32,
    pub near: f32,
    pub far: f32,
    pub distance: f32,
    /// Degrees of yaw/pitch per pixel of mouse motion
    pub rotate_per_pixel: f32,
    pub shift_factor: f32,
    pub dolly_out: f32,
    pub dolly_in: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fovy: 30.0,
            near: 1.0,
            far: 40.0,
            distance: 3.0,
            rotate_per_pixel: 0.3,
            shift_factor: 2.0,
            dolly_out: 1.1,
            dolly_in: 0.9,
        }
    }
}

/// Orbit camera: yaw and pitch around the origin, then pushed back by
/// `distance` and shifted in screen space
#[derive(Debug, Clone)]
pub struct Camera {
    pub settings: CameraSettings,
    pub mode: ProjectionMode,
    distance: f32,
    yaw: f32,
    pitch: f32,
    shift_x: f32,
    shift_y: f32,
    width: u32,
    height: u32,
    projection: Mat4,
}

impl Camera {
    pub fn new(settings: CameraSettings) -> Self {
        Self {
            settings,
            mode: ProjectionMode::Pinhole,
            distance: settings.distance,
            yaw: 0.0,
            pitch: 0.0,
            shift_x: 0.0,
            shift_y: 0.0,
            width: 1,
            height: 1,
            projection: Mat4::identity(),
        }
    }

    /// Back to the initial orbit; the projection is kept
    pub fn reset(&mut self) {
        self.distance = self.settings.distance;
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.shift_x = 0.0;
        self.shift_y = 0.0;
    }

    /// Viewport size changed; rebuilds the projection
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            warn!("ignoring degenerate viewport {}x{}", width, height);
            return;
        }
        self.width = width;
        self.height = height;
        self.projection = self.projection_matrix();
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Yaw and pitch in degrees
    pub fn angles(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Create the projection matrix for the current mode and viewport
    pub fn projection_matrix(&self) -> Mat4 {
        let s = &self.settings;
        let aspect = self.aspect();
        match self.mode {
            ProjectionMode::Pinhole => Mat4::pinhole(s.fovy, aspect, s.near, s.far),
            ProjectionMode::PerspectiveRh => Mat4::perspective_rh(s.fovy, aspect, s.near, s.far),
            ProjectionMode::PerspectiveLh => Mat4::perspective_lh(s.fovy, aspect, s.near, s.far),
            ProjectionMode::Orthographic => {
                let height = self.distance;
                let width = height * aspect;
                Mat4::orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    s.near,
                    s.far,
                )
            }
        }
    }

    /// View matrix: `rotY(yaw) * rotX(pitch) * translate(shift, distance)`
    pub fn view(&self) -> Mat4 {
        Mat4::rotate_y_degrees(self.yaw)
            * Mat4::rotate_x_degrees(self.pitch)
            * Mat4::translate(self.shift_x, self.shift_y, self.distance)
    }

    /// Mouse drag in pixels; pitch stays within ±90°
    pub fn yaw_pitch(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.settings.rotate_per_pixel;
        self.pitch = (self.pitch - dy * self.settings.rotate_per_pixel).clamp(-90.0, 90.0);
    }

    /// Screen-space pan in pixels, scaled by the orbit distance
    pub fn shift(&mut self, dx: f32, dy: f32) {
        let factor = self.settings.shift_factor * self.distance;
        self.shift_x += dx / self.width as f32 * factor;
        self.shift_y -= dy / self.height as f32 * factor;
    }

    /// Wheel: positive moves away, negative moves closer
    pub fn dolly(&mut self, delta: f32) {
        if delta > 0.0 {
            self.distance *= self.settings.dolly_out;
        } else if delta < 0.0 {
            self.distance *= self.settings.dolly_in;
        }
    }

    /// Project a model-space point to pixel coordinates and clip-space w
    pub fn project_to_screen(&self, point: Vec3, model: &Mat4) -> Option<(f32, f32, f32)> {
        let mvp = *model * self.view() * self.projection;
        let clip = mvp.apply4(Vec4::from_vec3(point, 1.0));

        // Behind the camera or at its plane; dividing would mirror the point
        if clip.w <= 1e-6 {
            return None;
        }
        let ndc = clip.perspective_divide();

        if ndc.x < -1.0 || ndc.x > 1.0 || ndc.y < -1.0 || ndc.y > 1.0 {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        Some((screen_x, screen_y, clip.w))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}
