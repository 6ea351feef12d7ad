use ash::vk;

use crate::app_error::{AppError, VkResultExt};

/// Raw Vulkan objects used to create vk::RenderPass
pub type AttachmentDefinition = (vk::AttachmentDescription, vk::AttachmentReference);

/// Swapchain image as color attachment: cleared on load, stored, left ready to present.
pub fn create_present_color_attachment(
  attachment_idx: u32,
  image_format: vk::Format,
) -> AttachmentDefinition {
  let attachment = vk::AttachmentDescription::builder()
    .format(image_format)
    .samples(vk::SampleCountFlags::TYPE_1) // single sampled
    .load_op(vk::AttachmentLoadOp::CLEAR)
    .store_op(vk::AttachmentStoreOp::STORE)
    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
    .initial_layout(vk::ImageLayout::UNDEFINED) // previous content is cleared anyway
    .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
    .build();

  let attachment_reference = vk::AttachmentReference {
    attachment: attachment_idx,
    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
  };

  (attachment, attachment_reference)
}

pub fn create_render_pass_from_attachment(
  device: &ash::Device,
  color: AttachmentDefinition,
) -> Result<vk::RenderPass, AppError> {
  let (attachment_desc, attachment_ref) = color;
  let attachment_descs = [attachment_desc];
  let color_refs = [attachment_ref];

  let subpasses = [vk::SubpassDescription::builder()
    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
    .color_attachments(&color_refs)
    .build()];

  // wait for presentation engine to release the image (acquire semaphore
  // is waited on at COLOR_ATTACHMENT_OUTPUT) before we write to it
  let dependencies = [vk::SubpassDependency::builder()
    .src_subpass(vk::SUBPASS_EXTERNAL)
    .dst_subpass(0)
    .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .src_access_mask(vk::AccessFlags::empty())
    .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
    .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
    .build()];

  let create_info = vk::RenderPassCreateInfo::builder()
    .attachments(&attachment_descs)
    .subpasses(&subpasses)
    .dependencies(&dependencies)
    .build();

  unsafe { device.create_render_pass(&create_info, None) }.check("vkCreateRenderPass")
}
