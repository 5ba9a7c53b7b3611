use crate::config::Config;
use crate::emulator::engine::StepEngine;
use crate::emulator::executor::{EngineEvent, Executor, LifecycleState};
use crate::rom::RomImage;
use log::{info, warn};
use std::path::Path;
use std::time::Duration;

pub const READY: &str = "corn64 ready";
pub const NO_ROM: &str = "No ROM loaded";
pub const RUNNING: &str = "Running...";
pub const STOPPED: &str = "Stopped";

/// The operations a front-end offers the user, on top of an `Executor`.
/// Failures end up in the status line and the log, never as errors.
pub struct Session {
    executor: Executor,
    status: String,
}

impl Session {
    pub fn new(executor: Executor) -> Session {
        Session {
            executor,
            status: READY.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Session {
        let engine = StepEngine::with_test_pattern(config);
        Session::new(Executor::new(
            engine,
            config.tick_interval(),
            config.shutdown_timeout(),
        ))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    pub fn load_file(&mut self, path: &Path) -> bool {
        match RomImage::read(path) {
            Ok(rom) => self.load_rom(&rom),
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                self.status = format!("Failed to load ROM: {}", e);
                false
            }
        }
    }

    pub fn load_rom(&mut self, rom: &RomImage) -> bool {
        match self.executor.load_image(&rom.bytes) {
            Ok(()) => {
                self.status = format!("Loaded: {} ({} bytes)", rom.name, rom.len());
                true
            }
            Err(e) => {
                warn!("Could not load {}: {}", rom.name, e);
                self.status = format!("Failed to load ROM: {}", e);
                false
            }
        }
    }

    pub fn start(&mut self) {
        if !self.executor.is_loaded() {
            info!("Start requested without a ROM");
            self.status = NO_ROM.to_string();
            return;
        }
        if self.executor.start() {
            self.status = RUNNING.to_string();
        }
    }

    pub fn stop(&mut self) {
        if self.executor.lifecycle() == LifecycleState::Running {
            self.executor.stop();
            self.status = STOPPED.to_string();
        }
    }

    /// Folds pending worker events into the status line.
    pub fn poll_events(&mut self) {
        for event in self.executor.drain_events() {
            if let EngineEvent::Faulted(reason) = event {
                self.status = format!("Emulation halted: {}", reason);
            }
        }
    }

    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        self.executor.shutdown(timeout)
    }
}
