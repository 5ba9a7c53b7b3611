use crate::emulator::executor::{Executor, LifecycleState};
use crate::emulator::framebuffer::Framebuffer;
use log::trace;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Something that can show an RGBA8 image, e.g. a window texture.
pub trait Surface {
    fn present(&mut self, width: u32, height: u32, rgba: &[u8]);
}

/// What the display side needs from the engine: whether it is running and
/// the latest frame. Neither call may block on a step.
pub trait FrameSource {
    fn lifecycle(&self) -> LifecycleState;
    fn snapshot_framebuffer(&self) -> Arc<Framebuffer>;
}

impl FrameSource for Executor {
    fn lifecycle(&self) -> LifecycleState {
        Executor::lifecycle(self)
    }

    fn snapshot_framebuffer(&self) -> Arc<Framebuffer> {
        Executor::snapshot_framebuffer(self)
    }
}

/// Periodic presenter driven by the UI loop. It keeps its own schedule and
/// is polled with the current time; when due it copies the latest frame to
/// the surface, but only while the engine is running.
#[derive(Debug)]
pub struct DisplaySync {
    interval: Duration,
    next_due: Instant,
    last_presented: Option<u64>,
    presented: u64,
}

impl DisplaySync {
    pub fn new(interval: Duration, now: Instant) -> DisplaySync {
        DisplaySync {
            interval,
            next_due: now,
            last_presented: None,
            presented: 0,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_due
    }

    pub fn time_until_due(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }

    /// Number of frames handed to the surface so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Runs `tick` if the refresh is due. Returns whether a frame was
    /// presented.
    pub fn poll<S, T>(&mut self, now: Instant, source: &S, surface: &mut T) -> bool
    where
        S: FrameSource + ?Sized,
        T: Surface + ?Sized,
    {
        if !self.is_due(now) {
            return false;
        }
        self.tick(now, source, surface)
    }

    /// One refresh. Always schedules the next one, whatever the engine
    /// state. A frame that was already presented is not converted again.
    pub fn tick<S, T>(&mut self, now: Instant, source: &S, surface: &mut T) -> bool
    where
        S: FrameSource + ?Sized,
        T: Surface + ?Sized,
    {
        self.next_due = now + self.interval;
        if source.lifecycle() != LifecycleState::Running {
            return false;
        }
        let frame = source.snapshot_framebuffer();
        if self.last_presented == Some(frame.frame_number()) {
            return false;
        }
        let rgba = frame.to_rgba();
        surface.present(frame.width(), frame.height(), &rgba);
        self.last_presented = Some(frame.frame_number());
        self.presented += 1;
        trace!("Presented frame {}", frame.frame_number());
        true
    }
}
