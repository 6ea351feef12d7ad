use log::info;
use winit::event::{ElementState, Event, VirtualKeyCode, WindowEvent};

use crate::renderer::ScreenshotRequest;

/// Keyboard:
/// * `P` - save screenshot of next presented frame
/// * `Escape` - quit
pub struct AppInput {
  pub close_requested: bool,
  pub is_minimized: bool,
  /// window size changed since last `take_resized()`
  resized: bool,
  screenshot_request: ScreenshotRequest,
}

impl AppInput {
  pub fn new(screenshot_request: ScreenshotRequest) -> Self {
    Self {
      close_requested: false,
      is_minimized: false,
      resized: false,
      screenshot_request,
    }
  }

  pub fn take_resized(&mut self) -> bool {
    std::mem::replace(&mut self.resized, false)
  }

  pub fn handle_event<T>(&mut self, event: &Event<T>) {
    if let Event::WindowEvent { event, .. } = &event {
      self.handle_window_event(event);
    }
  }

  fn handle_window_event(&mut self, event: &WindowEvent) {
    match event {
      // on clicked 'x'
      WindowEvent::CloseRequested => {
        self.close_requested = true;
      }
      // keyboard
      WindowEvent::KeyboardInput { input, .. } => match (input.state, input.virtual_keycode) {
        (_, Some(VirtualKeyCode::Escape)) => {
          self.close_requested = true;
        }
        (ElementState::Pressed, Some(VirtualKeyCode::P)) => {
          info!("Screenshot requested");
          self.screenshot_request.request();
        }
        _ => {}
      },
      WindowEvent::Resized(next_size) => {
        self.is_minimized = next_size.width == 0 || next_size.height == 0;
        self.resized = true;
        info!(
          "Window resized. New size: {:?}, minimized: {}",
          next_size, self.is_minimized
        );
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use winit::dpi::PhysicalSize;

  #[allow(deprecated)]
  fn key(state: ElementState, key: VirtualKeyCode) -> WindowEvent<'static> {
    WindowEvent::KeyboardInput {
      device_id: unsafe { winit::event::DeviceId::dummy() },
      input: winit::event::KeyboardInput {
        scancode: 0,
        state,
        virtual_keycode: Some(key),
        modifiers: Default::default(),
      },
      is_synthetic: false,
    }
  }

  #[test]
  fn p_key_requests_screenshot_once() {
    let request = ScreenshotRequest::default();
    let mut input = AppInput::new(request.clone());

    input.handle_window_event(&key(ElementState::Pressed, VirtualKeyCode::P));
    input.handle_window_event(&key(ElementState::Released, VirtualKeyCode::P));

    assert!(request.take());
    assert!(!request.take());
  }

  #[test]
  fn escape_closes() {
    let mut input = AppInput::new(ScreenshotRequest::default());
    input.handle_window_event(&key(ElementState::Pressed, VirtualKeyCode::Escape));
    assert!(input.close_requested);
  }

  #[test]
  fn zero_size_is_minimized() {
    let mut input = AppInput::new(ScreenshotRequest::default());
    input.handle_window_event(&WindowEvent::Resized(PhysicalSize::new(0, 0)));
    assert!(input.is_minimized);
    assert!(input.take_resized());
    assert!(!input.take_resized());

    input.handle_window_event(&WindowEvent::Resized(PhysicalSize::new(800, 600)));
    assert!(!input.is_minimized);
  }
}
