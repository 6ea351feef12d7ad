use anyhow::Context;
use ash::vk;
use log::{error, info, warn};
use winit::{
  dpi::LogicalSize,
  event::Event,
  event_loop::{ControlFlow, EventLoop},
  window::{Window, WindowBuilder},
};

use rs_vk_screenshot::{
  app_error::AppError,
  app_input::AppInput,
  app_timer::AppTimer,
  config::Config,
  renderer::{RenderLoop, ScreenshotCapturer, ScreenshotRequest, TickOutcome, TriangleScene},
  vk_ctx::{vk_ctx_initialize, VkCtx},
};

// glslangValidator -V assets/shaders/triangle.vert.glsl -o assets/shaders-compiled/triangle.vert.spv
// glslangValidator -V assets/shaders/triangle.frag.glsl -o assets/shaders-compiled/triangle.frag.spv

fn window_extent(window: &Window) -> vk::Extent2D {
  let size = window.inner_size();
  vk::Extent2D {
    width: size.width,
    height: size.height,
  }
}

fn recreate_swapchain(
  vk_app: &mut VkCtx,
  scene: &mut TriangleScene,
  render_loop: &mut RenderLoop,
  window: &Window,
) -> Result<(), AppError> {
  vk_app.recreate_swapchain(window_extent(window))?;
  scene.on_swapchain_recreated(vk_app)?;
  render_loop.reset_synchronizer(vk_app.synchronize.sync_objects());
  Ok(())
}

fn main() -> anyhow::Result<()> {
  let config = Config::new();
  simple_logger::SimpleLogger::new()
    .init()
    .context("Failed to init logger")?;
  log::set_max_level(config.log_level);
  info!("-- Start --");

  // init window
  let event_loop = EventLoop::new();
  let window = WindowBuilder::new()
    .with_title(&config.window_title)
    .with_resizable(config.resizable)
    .with_inner_size(LogicalSize::new(config.window_width, config.window_height))
    .build(&event_loop)
    .context("Failed to create window")?;

  // init renderer
  let mut vk_app = vk_ctx_initialize(&window, &config).context("Failed to initialize Vulkan")?;
  let mut scene = TriangleScene::new(&vk_app, &config).context("Failed to create scene")?;
  info!("Render init went OK!");

  let screenshot_request = ScreenshotRequest::default();
  let mut input = AppInput::new(screenshot_request.clone());
  let mut render_loop = RenderLoop::new(vk_app.synchronize.sync_objects(), screenshot_request);
  let mut timer = AppTimer::new(config.fps_title_refresh_secs);

  // start event loop
  info!("Starting event loop. Press 'P' to take a screenshot");
  event_loop.run(move |event, _, control_flow| {
    *control_flow = ControlFlow::Poll;
    input.handle_event(&event);

    match event {
      Event::MainEventsCleared => {
        if input.close_requested {
          *control_flow = ControlFlow::Exit;
          return;
        }

        let frame_result = (|| -> Result<(), AppError> {
          if input.take_resized() && !input.is_minimized {
            recreate_swapchain(&mut vk_app, &mut scene, &mut render_loop, &window)?;
          }
          render_loop.set_prepared(!input.is_minimized);

          let mut capturer = ScreenshotCapturer::new(&vk_app, config.screenshot_path.clone());
          let outcome = render_loop.tick(&vk_app, &scene, &mut capturer)?;
          match outcome {
            TickOutcome::SurfaceOutOfDate => {
              recreate_swapchain(&mut vk_app, &mut scene, &mut render_loop, &window)?;
            }
            TickOutcome::Presented { .. } => {
              if let Some(fps) = timer.mark_frame() {
                window.set_title(&format!("{} - {:.0} fps", config.window_title, fps));
              }
            }
            TickOutcome::Skipped => (),
          }
          Ok(())
        })();

        if let Err(e) = frame_result {
          error!("Fatal error in render loop: {}", e);
          *control_flow = ControlFlow::ExitWithCode(1);
        }
      }

      // before destroy
      Event::LoopDestroyed => {
        info!("EventLoop is shutting down");
        if let Some(fps) = timer.last_fps() {
          info!("Last measured FPS: {:.1}", fps);
        }
        unsafe {
          if let Err(e) = vk_app.device.device.device_wait_idle() {
            warn!("vkDeviceWaitIdle failed: {:?}", e);
          }
          scene.destroy(&vk_app);
          vk_app.destroy();
        }
      }

      // default
      _ => (),
    }
  });
}
