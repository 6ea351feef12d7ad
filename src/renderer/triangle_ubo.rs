use bytemuck;
use glam::Mat4;

// All below must match `triangle.vert.glsl`
pub const BINDING_INDEX_TRIANGLE_UBO: u32 = 0;

/// Scene spans [-2, 2] on both axes
pub const SCENE_HALF_EXTENT: f32 = 2.0;

#[derive(Copy, Clone, Debug)]
#[repr(C)]
pub struct TriangleUBO {
  pub u_projection_matrix: Mat4,
  pub u_model_matrix: Mat4,
  pub u_view_matrix: Mat4,
}

unsafe impl bytemuck::Zeroable for TriangleUBO {}
unsafe impl bytemuck::Pod for TriangleUBO {}

impl TriangleUBO {
  /// Orthographic camera over the whole scene, no view or model transform
  pub fn new() -> Self {
    let e = SCENE_HALF_EXTENT;
    Self {
      u_projection_matrix: Mat4::orthographic_rh(-e, e, -e, e, -1.0, 1.0),
      u_model_matrix: Mat4::IDENTITY,
      u_view_matrix: Mat4::IDENTITY,
    }
  }
}
