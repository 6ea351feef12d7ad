use log::trace;
use std::ffi::CStr;
use std::path::Path;

use ash::vk;

use crate::app_error::{AppError, VkResultExt};

// https://github.com/zeux/niagara/blob/master/src/shaders.cpp

const SHADER_ENTRY_POINT: &[u8] = b"main\0";

fn load_shader_module(device: &ash::Device, path: &Path) -> Result<vk::ShaderModule, AppError> {
  trace!("Loading shader from {}", path.to_string_lossy());

  let shader_load_err = |source| AppError::ShaderLoad {
    path: path.to_path_buf(),
    source,
  };
  let mut file = std::fs::File::open(path).map_err(shader_load_err)?;
  let spirv_code = ash::util::read_spv(&mut file).map_err(shader_load_err)?;

  let create_info = vk::ShaderModuleCreateInfo::builder()
    .code(&spirv_code)
    .build();
  unsafe { device.create_shader_module(&create_info, None) }.check("vkCreateShaderModule")
}

pub fn load_shader(
  device: &ash::Device,
  stage: vk::ShaderStageFlags,
  path: &Path,
) -> Result<(vk::ShaderModule, vk::PipelineShaderStageCreateInfo), AppError> {
  let shader_fn_name = unsafe { CStr::from_bytes_with_nul_unchecked(SHADER_ENTRY_POINT) };

  let shader_module = load_shader_module(device, path)?;

  let stage_info = vk::PipelineShaderStageCreateInfo::builder()
    .stage(stage)
    .module(shader_module)
    .name(shader_fn_name)
    .build();
  trace!("Shader {:?} loaded from {}", stage, path.to_string_lossy());

  Ok((shader_module, stage_info))
}

/// No push constants
pub fn create_pipeline_layout(
  device: &ash::Device,
  uniform_layouts: &[vk::DescriptorSetLayout],
) -> Result<vk::PipelineLayout, AppError> {
  let create_info = vk::PipelineLayoutCreateInfo::builder()
    .set_layouts(uniform_layouts)
    .build();
  unsafe { device.create_pipeline_layout(&create_info, None) }.check("vkCreatePipelineLayout")
}

/// Single color attachment, no depth, no blending. Viewport and scissor are dynamic.
pub fn create_pipeline_with_defaults(
  device: &ash::Device,
  render_pass: vk::RenderPass,
  pipeline_layout: vk::PipelineLayout,
  shader_paths: (&Path, &Path),
  vertex_desc: &vk::PipelineVertexInputStateCreateInfo,
) -> Result<vk::Pipeline, AppError> {
  let (module_vs, stage_vs) = load_shader(device, vk::ShaderStageFlags::VERTEX, shader_paths.0)?;
  let fs = load_shader(device, vk::ShaderStageFlags::FRAGMENT, shader_paths.1);
  let (module_fs, stage_fs) = match fs {
    Ok(x) => x,
    Err(e) => {
      unsafe { device.destroy_shader_module(module_vs, None) };
      return Err(e);
    }
  };

  let stages = [stage_vs, stage_fs];
  let input_assembly_state = ps_ia_triangle_list();
  let viewport_state = ps_viewport_single_dynamic();
  let rasterization_state = ps_raster_polygons(vk::CullModeFlags::NONE);
  let multisample_state = ps_multisample_disabled();
  let depth_stencil_state = ps_depth_always_stencil_always();
  let color_attachments = [ps_color_attachment_write_all()];
  let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
    .attachments(&color_attachments)
    .build();
  let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
  let dynamic_state = ps_dynamic_state(&dynamic_states);

  let create_info = vk::GraphicsPipelineCreateInfo::builder()
    .stages(&stages)
    .vertex_input_state(vertex_desc)
    .input_assembly_state(&input_assembly_state)
    .viewport_state(&viewport_state)
    .rasterization_state(&rasterization_state)
    .multisample_state(&multisample_state)
    .depth_stencil_state(&depth_stencil_state)
    .color_blend_state(&color_blend_state)
    .dynamic_state(&dynamic_state)
    .layout(pipeline_layout)
    .render_pass(render_pass)
    .build();

  let pipelines = unsafe {
    let pipelines =
      device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None);
    device.destroy_shader_module(module_vs, None);
    device.destroy_shader_module(module_fs, None);
    pipelines
  };

  match pipelines {
    Ok(ps) => Ok(ps[0]),
    Err((_, result)) => Err(AppError::vk("vkCreateGraphicsPipelines", result)),
  }
}

// Presets for `vk::GraphicsPipelineCreateInfo`.

/// PipelineInputAssembly-TRIANGLE_LIST
pub fn ps_ia_triangle_list() -> vk::PipelineInputAssemblyStateCreateInfo {
  vk::PipelineInputAssemblyStateCreateInfo::builder()
    .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
    .build()
}

/// Does not specify dimensions during pipeline create, requires PipelineDynamicStateCreateInfo with
/// - vk::DynamicState::VIEWPORT
/// - vk::DynamicState::SCISSOR
pub fn ps_viewport_single_dynamic() -> vk::PipelineViewportStateCreateInfo {
  vk::PipelineViewportStateCreateInfo {
    viewport_count: 1,
    scissor_count: 1,
    ..Default::default()
  }
}

pub fn ps_raster_polygons(
  cull_mode: vk::CullModeFlags,
) -> vk::PipelineRasterizationStateCreateInfo {
  vk::PipelineRasterizationStateCreateInfo::builder()
    .depth_clamp_enable(false)
    .polygon_mode(vk::PolygonMode::FILL)
    .cull_mode(cull_mode)
    .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
    .line_width(1.0) // validation layers: has to be 1.0 if not dynamic
    .build()
}

/// - Depth: test SKIP, write OFF
/// - Stencil: test SKIP
pub fn ps_depth_always_stencil_always() -> vk::PipelineDepthStencilStateCreateInfo {
  vk::PipelineDepthStencilStateCreateInfo::builder()
    .depth_test_enable(false)
    .depth_write_enable(false)
    .depth_compare_op(vk::CompareOp::ALWAYS)
    .depth_bounds_test_enable(false)
    .stencil_test_enable(false)
    .build()
}

pub fn ps_multisample_disabled() -> vk::PipelineMultisampleStateCreateInfo {
  vk::PipelineMultisampleStateCreateInfo::builder()
    .rasterization_samples(vk::SampleCountFlags::TYPE_1)
    .sample_shading_enable(false)
    .build()
}

/// Write all channels, disable blending
pub fn ps_color_attachment_write_all() -> vk::PipelineColorBlendAttachmentState {
  vk::PipelineColorBlendAttachmentState::builder()
    .color_write_mask(vk::ColorComponentFlags::RGBA)
    .blend_enable(false)
    .src_color_blend_factor(vk::BlendFactor::ONE) // shader output
    .dst_color_blend_factor(vk::BlendFactor::ZERO) // existing value on destination attachment
    .src_alpha_blend_factor(vk::BlendFactor::ONE)
    .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
    .build()
}

/// List of things that will be provided as separate command before draw.
/// Keep `states` alive till the pipeline is created.
pub fn ps_dynamic_state(states: &[vk::DynamicState]) -> vk::PipelineDynamicStateCreateInfo {
  vk::PipelineDynamicStateCreateInfo::builder()
    .dynamic_states(states)
    .build()
}
