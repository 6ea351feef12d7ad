use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use ash::vk::{self, Handle};

use super::frame_sync::*;
use super::render_loop::FrameCapture;
use crate::app_error::{AppError, CaptureError};

pub fn fake_cmd_buf(slot: usize) -> vk::CommandBuffer {
  vk::CommandBuffer::from_raw(1000 + slot as u64)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  Acquire,
  Wait(vk::Fence),
  Reset(vk::Fence),
  Submit(SlotSubmission),
  Present { slot: usize, wait: vk::Semaphore },
}

/// Records every call. Acquire cycles through slots unless told otherwise.
pub struct FakeBackend {
  pub image_acquired: vk::Semaphore,
  pub render_complete: vk::Semaphore,
  fences: Vec<vk::Fence>,
  calls: RefCell<Vec<Call>>,
  acquire_queue: RefCell<VecDeque<Result<AcquireOutcome, vk::Result>>>,
  next_slot: Cell<usize>,
  present_error: Cell<Option<vk::Result>>,
}

impl FakeBackend {
  pub fn new(slot_count: usize) -> Self {
    Self {
      image_acquired: vk::Semaphore::from_raw(1),
      render_complete: vk::Semaphore::from_raw(2),
      fences: (0..slot_count)
        .map(|i| vk::Fence::from_raw(100 + i as u64))
        .collect(),
      calls: RefCell::new(Vec::new()),
      acquire_queue: RefCell::new(VecDeque::new()),
      next_slot: Cell::new(0),
      present_error: Cell::new(None),
    }
  }

  pub fn sync_objects(&self) -> FrameSyncObjects {
    FrameSyncObjects {
      image_acquired: self.image_acquired,
      render_complete: self.render_complete,
      slot_fences: self.fences.clone(),
    }
  }

  pub fn fence(&self, slot: usize) -> vk::Fence {
    self.fences[slot]
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.borrow().clone()
  }

  pub fn clear_calls(&self) {
    self.calls.borrow_mut().clear();
  }

  pub fn push_acquire(&self, outcome: AcquireOutcome) {
    self.acquire_queue.borrow_mut().push_back(Ok(outcome));
  }

  pub fn fail_acquire_with(&self, result: vk::Result) {
    self.acquire_queue.borrow_mut().push_back(Err(result));
  }

  pub fn fail_present_with(&self, result: vk::Result) {
    self.present_error.set(Some(result));
  }

  fn record(&self, call: Call) {
    self.calls.borrow_mut().push(call);
  }
}

impl FrameBackend for FakeBackend {
  fn acquire_next_image(&self, _signal: vk::Semaphore) -> Result<AcquireOutcome, AppError> {
    self.record(Call::Acquire);
    if let Some(queued) = self.acquire_queue.borrow_mut().pop_front() {
      return queued.map_err(|e| AppError::vk("vkAcquireNextImageKHR", e));
    }

    let slot = self.next_slot.get();
    self.next_slot.set((slot + 1) % self.fences.len());
    Ok(AcquireOutcome::Acquired {
      slot,
      suboptimal: false,
    })
  }

  fn wait_for_fence(&self, fence: vk::Fence) -> Result<(), AppError> {
    self.record(Call::Wait(fence));
    Ok(())
  }

  fn reset_fence(&self, fence: vk::Fence) -> Result<(), AppError> {
    self.record(Call::Reset(fence));
    Ok(())
  }

  fn submit(&self, submission: &SlotSubmission) -> Result<(), AppError> {
    self.record(Call::Submit(*submission));
    Ok(())
  }

  fn present(&self, slot: usize, wait: vk::Semaphore) -> Result<PresentOutcome, AppError> {
    self.record(Call::Present { slot, wait });
    match self.present_error.get() {
      Some(e) => Err(AppError::vk("vkQueuePresentKHR", e)),
      None => Ok(PresentOutcome::Presented),
    }
  }
}

pub struct FakeWork;

impl SlotWork for FakeWork {
  fn command_buffer_for_slot(&self, slot: usize) -> vk::CommandBuffer {
    fake_cmd_buf(slot)
  }
}

pub enum FakeCaptureResult {
  Ok,
  IoError,
  GpuError,
}

pub struct FakeCapture {
  pub captured_slots: Vec<usize>,
  pub result: FakeCaptureResult,
}

impl FakeCapture {
  pub fn new() -> Self {
    Self {
      captured_slots: Vec::new(),
      result: FakeCaptureResult::Ok,
    }
  }
}

impl FrameCapture for FakeCapture {
  fn capture_slot(&mut self, slot: usize) -> Result<(), CaptureError> {
    self.captured_slots.push(slot);
    match self.result {
      FakeCaptureResult::Ok => Ok(()),
      FakeCaptureResult::IoError => Err(CaptureError::Io {
        path: "screenshot.ppm".into(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
      }),
      FakeCaptureResult::GpuError => Err(CaptureError::Gpu(AppError::vk(
        "vkAllocateMemory",
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
      ))),
    }
  }
}
