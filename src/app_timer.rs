use std::time::{Duration, Instant};

/// Counts presented frames and reports average FPS once per refresh interval.
/// Used to keep the window title up to date.
pub struct AppTimer {
  refresh_interval: Duration,
  interval_start: Instant,
  frames_in_interval: u32,
  last_fps: Option<f32>,
}

impl AppTimer {
  pub fn new(refresh_interval_secs: f32) -> Self {
    Self::starting_at(refresh_interval_secs, Instant::now())
  }

  fn starting_at(refresh_interval_secs: f32, now: Instant) -> Self {
    Self {
      refresh_interval: Duration::from_secs_f32(refresh_interval_secs.max(0.001)),
      interval_start: now,
      frames_in_interval: 0,
      last_fps: None,
    }
  }

  /// @return new FPS value if refresh interval elapsed
  pub fn mark_frame(&mut self) -> Option<f32> {
    self.mark_frame_at(Instant::now())
  }

  fn mark_frame_at(&mut self, now: Instant) -> Option<f32> {
    self.frames_in_interval += 1;

    let elapsed = now.saturating_duration_since(self.interval_start);
    if elapsed < self.refresh_interval {
      return None;
    }

    let fps = self.frames_in_interval as f32 / elapsed.as_secs_f32();
    self.interval_start = now;
    self.frames_in_interval = 0;
    self.last_fps = Some(fps);
    self.last_fps
  }

  pub fn last_fps(&self) -> Option<f32> {
    self.last_fps
  }
}
