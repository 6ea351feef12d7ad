use ash::extensions::khr::Swapchain;
use ash::vk;

pub struct VkCtxSwapchain {
  pub swapchain_loader: Swapchain,
  pub swapchain: vk::SwapchainKHR,
  pub size: vk::Extent2D,
  pub surface_format: vk::SurfaceFormatKHR,
  pub present_mode: vk::PresentModeKHR,

  // All fields below will be capabilites.min_images + 1
  pub image_views: Vec<vk::ImageView>,
  pub images: Vec<vk::Image>,
}

impl VkCtxSwapchain {
  pub fn image_count(&self) -> usize {
    self.images.len()
  }

  pub fn image(&self, slot: usize) -> vk::Image {
    assert!(
      slot < self.images.len(),
      "Requested swapchain image {}, there are only {}",
      slot,
      self.images.len()
    );
    self.images[slot]
  }

  pub unsafe fn destroy_image_views(&mut self, device: &ash::Device) {
    for &image_view in &self.image_views {
      device.destroy_image_view(image_view, None);
    }
    self.image_views.clear();
  }

  /// Will also destroy images. From validation layers:
  /// VK_OBJECT_TYPE_IMAGE; is a presentable image and it is controlled by the implementation and is destroyed with vkDestroySwapchainKHR.
  pub unsafe fn destroy(&mut self, device: &ash::Device) {
    self.destroy_image_views(device);
    self
      .swapchain_loader
      .destroy_swapchain(self.swapchain, None);
    self.images.clear();
  }
}
