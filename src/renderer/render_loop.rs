use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{error, info};

use super::frame_sync::{FrameBackend, FrameSyncObjects, FrameSynchronizer, SlotWork};
use crate::app_error::{AppError, CaptureError};

/// Pending screenshot. Set from input handling, consumed by the render loop.
/// Requests made while one is pending collapse into one capture.
#[derive(Clone, Default)]
pub struct ScreenshotRequest(Arc<AtomicBool>);

impl ScreenshotRequest {
  pub fn request(&self) {
    self.0.store(true, Ordering::SeqCst);
  }

  pub fn is_pending(&self) -> bool {
    self.0.load(Ordering::SeqCst)
  }

  /// Returns `true` at most once per request
  pub fn take(&self) -> bool {
    self.0.swap(false, Ordering::SeqCst)
  }
}

/// Reads back the swapchain image of `slot` once the slot's work finished.
pub trait FrameCapture {
  fn capture_slot(&mut self, slot: usize) -> Result<(), CaptureError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
  /// Renderer not ready (e.g. window minimized). Nothing happened.
  Skipped,
  Presented {
    slot: usize,
    captured: bool,
  },
  /// Swapchain has to be recreated, nothing was submitted.
  SurfaceOutOfDate,
}

pub struct RenderLoop {
  synchronizer: FrameSynchronizer,
  screenshot_request: ScreenshotRequest,
  prepared: bool,
}

impl RenderLoop {
  pub fn new(sync_objects: FrameSyncObjects, screenshot_request: ScreenshotRequest) -> Self {
    Self {
      synchronizer: FrameSynchronizer::new(sync_objects),
      screenshot_request,
      prepared: true,
    }
  }

  pub fn screenshot_request(&self) -> &ScreenshotRequest {
    &self.screenshot_request
  }

  pub fn is_prepared(&self) -> bool {
    self.prepared
  }

  pub fn set_prepared(&mut self, prepared: bool) {
    self.prepared = prepared;
  }

  /// Use after swapchain was recreated. Pending screenshot request survives.
  pub fn reset_synchronizer(&mut self, sync_objects: FrameSyncObjects) {
    self.synchronizer = FrameSynchronizer::new(sync_objects);
  }

  /// One frame: acquire, wait for slot, submit, optionally capture, present.
  pub fn tick(
    &mut self,
    backend: &impl FrameBackend,
    work: &impl SlotWork,
    capture: &mut impl FrameCapture,
  ) -> Result<TickOutcome, AppError> {
    if !self.prepared {
      return Ok(TickOutcome::Skipped);
    }

    let slot = match self.synchronizer.acquire(backend)? {
      Some(slot) => slot,
      None => return Ok(TickOutcome::SurfaceOutOfDate),
    };
    self.synchronizer.wait_for_slot(backend)?;
    self.synchronizer.submit(backend, work)?;

    let captured = if self.screenshot_request.take() {
      self.synchronizer.wait_for_submitted_slot(backend)?;
      match capture.capture_slot(slot) {
        Ok(_) => {
          info!("Screenshot of swapchain image {} saved", slot);
          true
        }
        Err(CaptureError::Io { path, source }) => {
          error!("Could not write screenshot to '{}': {}", path.display(), source);
          false
        }
        Err(CaptureError::Gpu(e)) => return Err(e),
      }
    } else {
      false
    };

    self.synchronizer.present(backend)?;
    Ok(TickOutcome::Presented { slot, captured })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::renderer::frame_sync::AcquireOutcome;
  use crate::renderer::test_utils::*;
  use ash::vk;

  fn new_loop(backend: &FakeBackend) -> RenderLoop {
    RenderLoop::new(backend.sync_objects(), ScreenshotRequest::default())
  }

  #[test]
  fn request_is_consumed_once() {
    let request = ScreenshotRequest::default();
    assert!(!request.take());
    request.request();
    request.request();
    assert!(request.is_pending());
    assert!(request.take());
    assert!(!request.take());
  }

  #[test]
  fn screenshot_taken_exactly_once_for_requesting_tick() {
    let backend = FakeBackend::new(3);
    let mut capture = FakeCapture::new();
    let mut render_loop = new_loop(&backend);

    render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    render_loop.screenshot_request().request();
    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    assert_eq!(
      outcome,
      TickOutcome::Presented {
        slot: 1,
        captured: true
      }
    );
    assert!(!render_loop.screenshot_request().is_pending());

    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    assert_eq!(
      outcome,
      TickOutcome::Presented {
        slot: 2,
        captured: false
      }
    );
    assert_eq!(capture.captured_slots, vec![1]);
  }

  #[test]
  fn capture_waits_for_fence_after_submit_and_before_present() {
    let backend = FakeBackend::new(2);
    let mut capture = FakeCapture::new();
    let mut render_loop = new_loop(&backend);
    render_loop.screenshot_request().request();

    render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();

    let calls = backend.calls();
    let fence = backend.fence(0);
    assert!(matches!(calls[3], Call::Submit(_)));
    assert_eq!(calls[4], Call::Wait(fence));
    assert!(matches!(calls[5], Call::Present { slot: 0, .. }));
    assert_eq!(calls.len(), 6);
  }

  #[test]
  fn not_prepared_tick_does_nothing() {
    let backend = FakeBackend::new(2);
    let mut capture = FakeCapture::new();
    let mut render_loop = new_loop(&backend);
    render_loop.set_prepared(false);
    render_loop.screenshot_request().request();

    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();

    assert_eq!(outcome, TickOutcome::Skipped);
    assert!(backend.calls().is_empty());
    assert!(capture.captured_slots.is_empty());
    assert!(render_loop.screenshot_request().is_pending());
  }

  #[test]
  fn out_of_date_keeps_screenshot_request_for_next_frame() {
    let backend = FakeBackend::new(2);
    backend.push_acquire(AcquireOutcome::OutOfDate);
    let mut capture = FakeCapture::new();
    let mut render_loop = new_loop(&backend);
    render_loop.screenshot_request().request();

    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    assert_eq!(outcome, TickOutcome::SurfaceOutOfDate);
    assert!(render_loop.screenshot_request().is_pending());

    render_loop.reset_synchronizer(backend.sync_objects());
    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    assert!(matches!(
      outcome,
      TickOutcome::Presented { captured: true, .. }
    ));
  }

  #[test]
  fn io_failure_does_not_stop_the_loop() {
    let backend = FakeBackend::new(2);
    let mut capture = FakeCapture::new();
    capture.result = FakeCaptureResult::IoError;
    let mut render_loop = new_loop(&backend);
    render_loop.screenshot_request().request();

    let outcome = render_loop.tick(&backend, &FakeWork, &mut capture).unwrap();
    assert_eq!(
      outcome,
      TickOutcome::Presented {
        slot: 0,
        captured: false
      }
    );
    // still presented
    assert!(matches!(backend.calls().last(), Some(Call::Present { .. })));
    assert!(render_loop.tick(&backend, &FakeWork, &mut capture).is_ok());
  }

  #[test]
  fn gpu_failure_during_capture_is_fatal() {
    let backend = FakeBackend::new(2);
    let mut capture = FakeCapture::new();
    capture.result = FakeCaptureResult::GpuError;
    let mut render_loop = new_loop(&backend);
    render_loop.screenshot_request().request();

    let err = render_loop
      .tick(&backend, &FakeWork, &mut capture)
      .unwrap_err();
    assert!(matches!(
      err,
      AppError::Vk {
        result: vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
        ..
      }
    ));
  }

  #[test]
  fn present_out_of_date_is_fatal() {
    let backend = FakeBackend::new(2);
    backend.fail_present_with(vk::Result::ERROR_OUT_OF_DATE_KHR);
    let mut capture = FakeCapture::new();
    let mut render_loop = new_loop(&backend);

    assert!(render_loop.tick(&backend, &FakeWork, &mut capture).is_err());
  }
}
