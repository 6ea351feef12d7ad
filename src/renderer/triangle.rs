use ash::vk;
use bytemuck::{Pod, Zeroable};
use glam::{vec3, Vec3};
use log::{info, trace};

use super::frame_sync::SlotWork;
use super::triangle_ubo::{TriangleUBO, BINDING_INDEX_TRIANGLE_UBO};
use crate::app_error::{AppError, VkResultExt};
use crate::config::Config;
use crate::vk_ctx::VkCtx;
use crate::vk_utils::*;

#[derive(Copy, Clone, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct TriangleVertex {
  pub position: [f32; 3],
  pub color: [f32; 3],
}

/// In scene units, `TriangleUBO` projection maps them to clip space
pub fn triangle_vertices() -> [TriangleVertex; 3] {
  let vertex = |pos: Vec3, color: Vec3| TriangleVertex {
    position: pos.to_array(),
    color: color.to_array(),
  };
  [
    vertex(vec3(1.0, 1.0, 0.0), vec3(1.0, 0.0, 0.0)),
    vertex(vec3(-1.0, 1.0, 0.0), vec3(0.0, 1.0, 0.0)),
    vertex(vec3(0.0, -1.0, 0.0), vec3(0.0, 0.0, 1.0)),
  ]
}

pub const TRIANGLE_INDICES: [u32; 3] = [0, 1, 2];

fn vertex_input_layout() -> (
  [vk::VertexInputBindingDescription; 1],
  [vk::VertexInputAttributeDescription; 2],
) {
  let binding = vk::VertexInputBindingDescription {
    binding: 0,
    stride: std::mem::size_of::<TriangleVertex>() as u32,
    input_rate: vk::VertexInputRate::VERTEX,
  };
  let attributes = [
    vk::VertexInputAttributeDescription {
      binding: 0,
      location: 0,
      format: vk::Format::R32G32B32_SFLOAT,
      offset: 0,
    },
    vk::VertexInputAttributeDescription {
      binding: 0,
      location: 1,
      format: vk::Format::R32G32B32_SFLOAT,
      offset: std::mem::size_of::<[f32; 3]>() as u32, // after 'position'
    },
  ];
  ([binding], attributes)
}

/// Single colored triangle. Owns its render pass, pipeline, framebuffers, geometry and uniforms.
/// Command buffers (one per swapchain image) are recorded once and re-recorded after resize.
pub struct TriangleScene {
  render_pass: vk::RenderPass,
  uniforms_layout: vk::DescriptorSetLayout,
  descriptor_pool: vk::DescriptorPool,
  descriptor_set: vk::DescriptorSet,
  uniform_buffer: VkBuffer,
  pipeline_layout: vk::PipelineLayout,
  pipeline: vk::Pipeline,
  framebuffers: Vec<vk::Framebuffer>,
  vertex_buffer: VkBuffer,
  index_buffer: VkBuffer,
  cmd_buffers: Vec<vk::CommandBuffer>,
  clear_color: vk::ClearValue,
}

impl TriangleScene {
  pub fn new(ctx: &VkCtx, config: &Config) -> Result<Self, AppError> {
    let device = &ctx.device.device;

    let render_pass = create_render_pass_from_attachment(
      device,
      create_present_color_attachment(0, ctx.swapchain.surface_format.format),
    )?;
    ctx.assign_debug_label(render_pass, "triangle-render-pass");

    let uniforms_layout = create_descriptor_set_layout(
      device,
      &[create_ubo_binding(
        BINDING_INDEX_TRIANGLE_UBO,
        vk::ShaderStageFlags::VERTEX,
      )],
    )?;
    let pipeline_layout = create_pipeline_layout(device, &[uniforms_layout])?;
    let (bindings, attributes) = vertex_input_layout();
    let vertex_desc = vk::PipelineVertexInputStateCreateInfo::builder()
      .vertex_binding_descriptions(&bindings)
      .vertex_attribute_descriptions(&attributes)
      .build();
    let pipeline = create_pipeline_with_defaults(
      device,
      render_pass,
      pipeline_layout,
      (config.shader_vert_path.as_path(), config.shader_frag_path.as_path()),
      &vertex_desc,
    )?;
    ctx.assign_debug_label(pipeline, "triangle-pipeline");

    let vertex_buffer = ctx.create_buffer_from_data(
      String::from("triangle-vertices"),
      bytemuck::cast_slice(&triangle_vertices()),
      vk::BufferUsageFlags::VERTEX_BUFFER,
    )?;
    let index_buffer = ctx.create_buffer_from_data(
      String::from("triangle-indices"),
      bytemuck::cast_slice(&TRIANGLE_INDICES),
      vk::BufferUsageFlags::INDEX_BUFFER,
    )?;
    info!("Triangle geometry uploaded");

    let mut uniform_buffer = Self::create_uniform_buffer(ctx)?;
    let descriptor_pool = create_ubo_descriptor_pool(device, 1, 1)?;
    let descriptor_set = allocate_descriptor_set(device, descriptor_pool, uniforms_layout)?;
    bind_ubo_to_descriptor_set(
      device,
      descriptor_set,
      BINDING_INDEX_TRIANGLE_UBO,
      &uniform_buffer,
    );
    uniform_buffer.write_mapped(&ctx.allocator, bytemuck::bytes_of(&TriangleUBO::new()))?;

    let mut scene = Self {
      render_pass,
      uniforms_layout,
      descriptor_pool,
      descriptor_set,
      uniform_buffer,
      pipeline_layout,
      pipeline,
      framebuffers: Vec::new(),
      vertex_buffer,
      index_buffer,
      cmd_buffers: Vec::new(),
      clear_color: config.clear_color(),
    };
    scene.on_swapchain_recreated(ctx)?;
    Ok(scene)
  }

  fn create_uniform_buffer(ctx: &VkCtx) -> Result<VkBuffer, AppError> {
    let buffer = VkBuffer::empty(
      String::from("triangle-ubo"),
      std::mem::size_of::<TriangleUBO>(),
      vk::BufferUsageFlags::UNIFORM_BUFFER,
      &ctx.allocator,
      VkMemoryPreference::GpuMappable,
    )?;
    ctx.assign_debug_label(buffer.buffer, &buffer.name);
    Ok(buffer)
  }

  /// Framebuffers reference swapchain image views, rebuild them and re-record all commands
  pub fn on_swapchain_recreated(&mut self, ctx: &VkCtx) -> Result<(), AppError> {
    let device = &ctx.device.device;
    unsafe { self.destroy_framebuffers(device) };

    let size = ctx.swapchain.size;
    for &image_view in &ctx.swapchain.image_views {
      let fbo = create_framebuffer(device, self.render_pass, &[image_view], &size)?;
      self.framebuffers.push(fbo);
    }

    self.cmd_buffers = ctx.command_buffers.cmd_buffers.clone();
    for (slot, &cmd_buf) in self.cmd_buffers.iter().enumerate() {
      unsafe { self.record_commands(device, cmd_buf, self.framebuffers[slot], size)? };
    }
    trace!("Recorded {} triangle command buffers", self.cmd_buffers.len());
    Ok(())
  }

  unsafe fn record_commands(
    &self,
    device: &ash::Device,
    cmd_buf: vk::CommandBuffer,
    framebuffer: vk::Framebuffer,
    size: vk::Extent2D,
  ) -> Result<(), AppError> {
    // submitted many times, so no ONE_TIME_SUBMIT
    let begin_info = vk::CommandBufferBeginInfo::builder().build();
    device
      .begin_command_buffer(cmd_buf, &begin_info)
      .check("vkBeginCommandBuffer")?;

    let clear_values = [self.clear_color];
    let render_area = size_to_rect_vk(&size);
    let render_pass_begin_info = vk::RenderPassBeginInfo::builder()
      .render_pass(self.render_pass)
      .framebuffer(framebuffer)
      .render_area(render_area)
      .clear_values(&clear_values)
      .build();
    device.cmd_begin_render_pass(cmd_buf, &render_pass_begin_info, vk::SubpassContents::INLINE);

    device.cmd_set_viewport(cmd_buf, 0, &[create_viewport(&size)]);
    device.cmd_set_scissor(cmd_buf, 0, &[render_area]);
    device.cmd_bind_pipeline(cmd_buf, vk::PipelineBindPoint::GRAPHICS, self.pipeline);
    device.cmd_bind_descriptor_sets(
      cmd_buf,
      vk::PipelineBindPoint::GRAPHICS,
      self.pipeline_layout,
      0,
      &[self.descriptor_set],
      &[],
    );
    device.cmd_bind_vertex_buffers(cmd_buf, 0, &[self.vertex_buffer.buffer], &[0]);
    device.cmd_bind_index_buffer(cmd_buf, self.index_buffer.buffer, 0, vk::IndexType::UINT32);
    device.cmd_draw_indexed(cmd_buf, TRIANGLE_INDICES.len() as u32, 1, 0, 0, 0);

    device.cmd_end_render_pass(cmd_buf);
    device
      .end_command_buffer(cmd_buf)
      .check("vkEndCommandBuffer")
  }

  unsafe fn destroy_framebuffers(&mut self, device: &ash::Device) {
    for fbo in self.framebuffers.drain(..) {
      device.destroy_framebuffer(fbo, None);
    }
  }

  pub unsafe fn destroy(&mut self, ctx: &VkCtx) {
    let device = &ctx.device.device;
    self.destroy_framebuffers(device);
    device.destroy_pipeline(self.pipeline, None);
    device.destroy_pipeline_layout(self.pipeline_layout, None);
    // also frees the descriptor set
    device.destroy_descriptor_pool(self.descriptor_pool, None);
    device.destroy_descriptor_set_layout(self.uniforms_layout, None);
    self.uniform_buffer.delete(&ctx.allocator);
    device.destroy_render_pass(self.render_pass, None);
    self.vertex_buffer.delete(&ctx.allocator);
    self.index_buffer.delete(&ctx.allocator);
  }
}

impl SlotWork for TriangleScene {
  fn command_buffer_for_slot(&self, slot: usize) -> vk::CommandBuffer {
    assert!(
      slot < self.cmd_buffers.len(),
      "Requested command buffer for slot {}, there are only {}",
      slot,
      self.cmd_buffers.len()
    );
    self.cmd_buffers[slot]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::renderer::triangle_ubo::SCENE_HALF_EXTENT;

  #[test]
  fn vertices_are_in_scene_units() {
    for v in triangle_vertices().iter() {
      assert!(v.position.iter().all(|c| c.abs() <= SCENE_HALF_EXTENT));
    }
    assert_eq!(triangle_vertices()[0].color, [1.0, 0.0, 0.0]);
    assert_eq!(triangle_vertices()[2].position, [0.0, -1.0, 0.0]);
  }

  #[test]
  fn vertex_layout_matches_struct() {
    let (bindings, attributes) = vertex_input_layout();
    assert_eq!(bindings[0].stride, 24);
    assert_eq!(attributes[1].offset, 12);
    assert_eq!(bytemuck::cast_slice::<_, u8>(&triangle_vertices()).len(), 72);
  }
}
