use crate::config::CameraConfig;
use cgmath::*;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Camera data as laid out in the `Globals` block of `scene.wgsl`
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug, PartialEq)]
pub struct CameraUniform {
    /// Eye position, w = 1 to keep the 16 byte alignment
    pub view_position: [f32; 4],
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    pub fn new(position: Vector3<f32>, view_proj: Matrix4<f32>) -> Self {
        Self {
            view_position: position.extend(1.0).into(),
            view_proj: view_proj.into(),
        }
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new(Vector3::zero(), Matrix4::identity())
    }
}

/// Perspective camera looking at a fixed target.
///
/// The projection matrix is cached. Changing `fov`, `aspect`, `near` or `far`
/// has no visible effect until [`PerspectiveCamera::update_projection_matrix`]
/// is called, so resize handlers must call it after setting the aspect.
#[derive(Debug, Clone, Copy)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    pub up: Vector3<f32>,
    projection: Matrix4<f32>,
    pub uniform: CameraUniform,
}

impl PerspectiveCamera {
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            position: Vector3::zero(),
            target: Vector3::zero(),
            up: Vector3::unit_y(),
            projection: Matrix4::identity(),
            uniform: CameraUniform::default(),
        };
        camera.update_projection_matrix();
        camera.update_view_proj();
        camera
    }

    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self::new(config.fov_degrees, aspect, config.near, config.far);
        camera.position = config.position;
        camera.update_view_proj();
        camera
    }

    /// Sets the aspect from a viewport size. Zero heights are ignored.
    ///
    /// Only stores the value; call `update_projection_matrix` afterwards.
    pub fn set_aspect_from_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.aspect = (width / height) as f32;
        }
    }

    /// Recomputes the cached projection from fov, aspect, near and far
    pub fn update_projection_matrix(&mut self) {
        self.projection = OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(self.fov), self.aspect, self.near, self.far);
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        self.projection
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.position),
            Point3::from_vec(self.target),
            self.up,
        )
    }

    pub fn view_projection_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view_matrix()
    }

    /// Refreshes `uniform` from the cached projection and current pose
    pub fn update_view_proj(&mut self) {
        self.uniform = CameraUniform::new(self.position, self.view_projection_matrix());
    }
}
