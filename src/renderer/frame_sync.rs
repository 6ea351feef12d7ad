use ash::vk;
use log::{debug, trace};

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
  Acquired { slot: usize, suboptimal: bool },
  /// Swapchain no longer matches the surface. Has to be recreated.
  OutOfDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
  Presented,
  Suboptimal,
}

/// Everything needed for `vkQueueSubmit` of a single slot's work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotSubmission {
  pub command_buffer: vk::CommandBuffer,
  pub wait_semaphore: vk::Semaphore,
  pub wait_stage: vk::PipelineStageFlags,
  pub signal_semaphore: vk::Semaphore,
  pub fence: vk::Fence,
}

/// Swapchain + queue operations the frame loop is built from.
pub trait FrameBackend {
  fn acquire_next_image(&self, signal: vk::Semaphore) -> Result<AcquireOutcome, AppError>;
  fn wait_for_fence(&self, fence: vk::Fence) -> Result<(), AppError>;
  fn reset_fence(&self, fence: vk::Fence) -> Result<(), AppError>;
  fn submit(&self, submission: &SlotSubmission) -> Result<(), AppError>;
  fn present(&self, slot: usize, wait: vk::Semaphore) -> Result<PresentOutcome, AppError>;
}

/// Prerecorded GPU work, one command buffer per swapchain image.
pub trait SlotWork {
  fn command_buffer_for_slot(&self, slot: usize) -> vk::CommandBuffer;
}

/// Handles only. Owned (created/destroyed) by `VkCtxSynchronize`.
#[derive(Debug, Clone)]
pub struct FrameSyncObjects {
  /// signaled by acquire, waited by submit
  pub image_acquired: vk::Semaphore,
  /// signaled by submit, waited by present
  pub render_complete: vk::Semaphore,
  /// one per swapchain image, created signaled
  pub slot_fences: Vec<vk::Fence>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
  Idle,
  Acquiring,
  WaitingForSlotFence { slot: usize },
  ReadyToSubmit { slot: usize },
  Submitted { slot: usize },
  Presenting { slot: usize },
}

/// acquire -> wait for slot fence -> reset it -> submit -> present.
///
/// Each step checks that previous one happened, so the work for a slot is never
/// resubmitted before its last submission retired.
pub struct FrameSynchronizer {
  sync_objects: FrameSyncObjects,
  state: FrameState,
}

impl FrameSynchronizer {
  pub fn new(sync_objects: FrameSyncObjects) -> Self {
    assert!(
      !sync_objects.slot_fences.is_empty(),
      "FrameSynchronizer requires at least 1 slot fence"
    );
    Self {
      sync_objects,
      state: FrameState::Idle,
    }
  }

  pub fn state(&self) -> FrameState {
    self.state
  }

  pub fn slot_count(&self) -> usize {
    self.sync_objects.slot_fences.len()
  }

  pub fn slot_fence(&self, slot: usize) -> vk::Fence {
    let fences = &self.sync_objects.slot_fences;
    assert!(
      slot < fences.len(),
      "Requested fence for slot {}, there are only {}",
      slot,
      fences.len()
    );
    fences[slot]
  }

  /// Returns `None` if the swapchain is out of date. Nothing is submitted in that case.
  pub fn acquire(&mut self, backend: &impl FrameBackend) -> Result<Option<usize>, AppError> {
    assert_eq!(
      self.state,
      FrameState::Idle,
      "acquire() called before previous frame was presented"
    );
    self.state = FrameState::Acquiring;

    match backend.acquire_next_image(self.sync_objects.image_acquired)? {
      AcquireOutcome::Acquired { slot, suboptimal } => {
        if suboptimal {
          debug!("Acquired suboptimal swapchain image {}", slot);
        }
        assert!(
          slot < self.slot_count(),
          "Acquired swapchain image {}, but there are only {} slot fences",
          slot,
          self.slot_count()
        );
        self.state = FrameState::WaitingForSlotFence { slot };
        Ok(Some(slot))
      }
      AcquireOutcome::OutOfDate => {
        debug!("Swapchain out of date on acquire");
        self.state = FrameState::Idle;
        Ok(None)
      }
    }
  }

  /// Block until previous submission for the acquired slot retired, then unsignal its fence.
  pub fn wait_for_slot(&mut self, backend: &impl FrameBackend) -> Result<(), AppError> {
    let slot = match self.state {
      FrameState::WaitingForSlotFence { slot } => slot,
      state => panic!("wait_for_slot() called in state {:?}", state),
    };

    let fence = self.slot_fence(slot);
    backend.wait_for_fence(fence)?;
    backend.reset_fence(fence)?;
    trace!("Slot {} fence waited and reset", slot);

    self.state = FrameState::ReadyToSubmit { slot };
    Ok(())
  }

  pub fn submit(&mut self, backend: &impl FrameBackend, work: &impl SlotWork) -> Result<(), AppError> {
    let slot = match self.state {
      FrameState::ReadyToSubmit { slot } => slot,
      state => panic!("submit() called in state {:?}", state),
    };

    let submission = SlotSubmission {
      command_buffer: work.command_buffer_for_slot(slot),
      wait_semaphore: self.sync_objects.image_acquired,
      wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
      signal_semaphore: self.sync_objects.render_complete,
      fence: self.slot_fence(slot),
    };
    backend.submit(&submission)?;

    self.state = FrameState::Submitted { slot };
    Ok(())
  }

  /// Block until the work submitted this frame finished. Fence stays signaled,
  /// so the next `wait_for_slot` on this slot returns immediately.
  pub fn wait_for_submitted_slot(&self, backend: &impl FrameBackend) -> Result<usize, AppError> {
    let slot = match self.state {
      FrameState::Submitted { slot } => slot,
      state => panic!("wait_for_submitted_slot() called in state {:?}", state),
    };
    backend.wait_for_fence(self.slot_fence(slot))?;
    Ok(slot)
  }

  pub fn present(&mut self, backend: &impl FrameBackend) -> Result<PresentOutcome, AppError> {
    let slot = match self.state {
      FrameState::Submitted { slot } => slot,
      state => panic!("present() called in state {:?}", state),
    };
    self.state = FrameState::Presenting { slot };

    let outcome = backend.present(slot, self.sync_objects.render_complete)?;
    if outcome == PresentOutcome::Suboptimal {
      debug!("Presented suboptimal swapchain image {}", slot);
    }

    self.state = FrameState::Idle;
    Ok(outcome)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::renderer::test_utils::*;

  #[test]
  fn full_frame_waits_then_resets_then_submits_then_presents() {
    let backend = FakeBackend::new(3);
    let work = FakeWork;
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    let slot = sync.acquire(&backend).unwrap().unwrap();
    sync.wait_for_slot(&backend).unwrap();
    sync.submit(&backend, &work).unwrap();
    sync.present(&backend).unwrap();

    let fence = backend.fence(slot);
    assert_eq!(
      backend.calls(),
      vec![
        Call::Acquire,
        Call::Wait(fence),
        Call::Reset(fence),
        Call::Submit(SlotSubmission {
          command_buffer: fake_cmd_buf(slot),
          wait_semaphore: backend.image_acquired,
          wait_stage: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
          signal_semaphore: backend.render_complete,
          fence,
        }),
        Call::Present {
          slot,
          wait: backend.render_complete
        },
      ]
    );
    assert_eq!(sync.state(), FrameState::Idle);
  }

  #[test]
  fn every_submit_is_preceded_by_wait_and_reset_of_same_fence() {
    let backend = FakeBackend::new(2);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    for _ in 0..5 {
      sync.acquire(&backend).unwrap();
      sync.wait_for_slot(&backend).unwrap();
      sync.submit(&backend, &FakeWork).unwrap();
      sync.present(&backend).unwrap();
    }

    let calls = backend.calls();
    let submits: Vec<usize> = calls
      .iter()
      .enumerate()
      .filter(|(_, c)| matches!(c, Call::Submit(_)))
      .map(|(i, _)| i)
      .collect();
    assert_eq!(submits.len(), 5);
    for idx in submits {
      let fence = match &calls[idx] {
        Call::Submit(s) => s.fence,
        _ => unreachable!(),
      };
      assert_eq!(calls[idx - 2], Call::Wait(fence));
      assert_eq!(calls[idx - 1], Call::Reset(fence));
    }
  }

  #[test]
  fn out_of_date_acquire_submits_nothing() {
    let backend = FakeBackend::new(2);
    backend.push_acquire(AcquireOutcome::OutOfDate);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    assert_eq!(sync.acquire(&backend).unwrap(), None);
    assert_eq!(sync.state(), FrameState::Idle);
    assert_eq!(backend.calls(), vec![Call::Acquire]);
  }

  #[test]
  fn suboptimal_acquire_is_accepted() {
    let backend = FakeBackend::new(2);
    backend.push_acquire(AcquireOutcome::Acquired {
      slot: 1,
      suboptimal: true,
    });
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    assert_eq!(sync.acquire(&backend).unwrap(), Some(1));
    assert_eq!(sync.state(), FrameState::WaitingForSlotFence { slot: 1 });
  }

  #[test]
  fn wait_for_submitted_slot_does_not_reset() {
    let backend = FakeBackend::new(2);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    let slot = sync.acquire(&backend).unwrap().unwrap();
    sync.wait_for_slot(&backend).unwrap();
    sync.submit(&backend, &FakeWork).unwrap();
    backend.clear_calls();

    assert_eq!(sync.wait_for_submitted_slot(&backend).unwrap(), slot);
    assert_eq!(backend.calls(), vec![Call::Wait(backend.fence(slot))]);
  }

  #[test]
  fn acquire_error_is_propagated() {
    let backend = FakeBackend::new(2);
    backend.fail_acquire_with(vk::Result::ERROR_SURFACE_LOST_KHR);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());

    let err = sync.acquire(&backend).unwrap_err();
    assert!(matches!(
      err,
      AppError::Vk {
        result: vk::Result::ERROR_SURFACE_LOST_KHR,
        ..
      }
    ));
  }

  #[test]
  #[should_panic(expected = "submit() called in state")]
  fn submit_without_fence_wait_panics() {
    let backend = FakeBackend::new(2);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());
    sync.acquire(&backend).unwrap();
    sync.submit(&backend, &FakeWork).unwrap();
  }

  #[test]
  #[should_panic(expected = "Acquired swapchain image 5, but there are only 2 slot fences")]
  fn acquired_slot_without_fence_panics() {
    let backend = FakeBackend::new(2);
    backend.push_acquire(AcquireOutcome::Acquired {
      slot: 5,
      suboptimal: false,
    });
    let mut sync = FrameSynchronizer::new(backend.sync_objects());
    let _ = sync.acquire(&backend);
  }

  #[test]
  #[should_panic(expected = "acquire() called before previous frame was presented")]
  fn double_acquire_panics() {
    let backend = FakeBackend::new(2);
    let mut sync = FrameSynchronizer::new(backend.sync_objects());
    sync.acquire(&backend).unwrap();
    sync.acquire(&backend).unwrap();
  }
}
