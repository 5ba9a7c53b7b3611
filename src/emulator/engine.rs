use super::basics::Address;
use super::execution::{ExecutionUnit, FrameRequest, StepError, TestPattern};
use super::framebuffer::{FrameSlot, Framebuffer};
use super::machine::{LoadError, MachineState};
use crate::config::Config;
use log::{debug, info};
use std::sync::Arc;

/// Holds the emulated machine together with the unit that interprets it and
/// the slot the rendered frames are published to. Stepping is synchronous;
/// see `Executor` for running it on a worker thread.
pub struct StepEngine {
    machine: MachineState,
    unit: Box<dyn ExecutionUnit>,
    frames: Arc<FrameSlot>,
    width: u32,
    height: u32,
    steps: u64,
    loaded: bool,
}

impl StepEngine {
    pub fn new(config: &Config, unit: Box<dyn ExecutionUnit>) -> StepEngine {
        let blank = Framebuffer::new(config.width, config.height, Default::default());
        StepEngine {
            machine: MachineState::new(config.memory_size, config.load_offset, config.reset_pc),
            unit,
            frames: Arc::new(FrameSlot::new(blank)),
            width: config.width,
            height: config.height,
            steps: 0,
            loaded: false,
        }
    }

    /// An engine running the built-in test pattern.
    pub fn with_test_pattern(config: &Config) -> StepEngine {
        StepEngine::new(config, Box::new(TestPattern))
    }

    pub fn load_image(&mut self, image: &[u8]) -> Result<(), LoadError> {
        self.machine.load_image(image)?;
        self.loaded = true;
        info!(
            "Loaded image: {} bytes at {:#x}",
            image.len(),
            self.machine.load_offset()
        );
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Runs the execution unit once, publishes the frame it produced and
    /// moves the program counter to the next instruction word. On error
    /// neither the frame nor the program counter change.
    pub fn step(&mut self) -> Result<(), StepError> {
        let request = FrameRequest {
            width: self.width,
            height: self.height,
            frame_number: self.steps + 1,
        };
        let frame = self.unit.execute(&mut self.machine, request)?;
        debug_assert_eq!(frame.pixels().len(), (self.width * self.height) as usize);
        self.frames.publish(frame);
        self.machine.program_counter.incr();
        self.steps += 1;
        debug!(
            "{} step {} done, pc={:#010x}",
            self.unit.name(),
            self.steps,
            self.machine.program_counter().0
        );
        Ok(())
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn program_counter(&self) -> Address {
        self.machine.program_counter()
    }

    pub fn machine(&self) -> &MachineState {
        &self.machine
    }

    /// The slot frames are published to. Readers may hold on to it and
    /// snapshot from any thread.
    pub fn frames(&self) -> Arc<FrameSlot> {
        self.frames.clone()
    }

    pub fn snapshot_framebuffer(&self) -> Arc<Framebuffer> {
        self.frames.snapshot()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::emulator::execution::{BACKGROUND, FOREGROUND};

    struct Faulty;

    impl ExecutionUnit for Faulty {
        fn execute(
            &mut self,
            state: &mut MachineState,
            _request: FrameRequest,
        ) -> Result<Framebuffer, StepError> {
            Err(StepError::Fault {
                pc: state.program_counter().0,
                reason: String::from("illegal instruction"),
            })
        }

        fn name(&self) -> &'static str {
            "faulty"
        }
    }

    #[test]
    fn test_engine_new() {
        let engine = StepEngine::with_test_pattern(&Config::default());
        assert!(!engine.is_loaded());
        assert_eq!(engine.steps(), 0);
        assert_eq!(engine.program_counter(), Address(0x8030_0000));
        let fb = engine.snapshot_framebuffer();
        assert_eq!(fb.frame_number(), 0);
        assert_eq!(fb.pixels().len(), 320 * 240);
    }

    #[test]
    fn test_load_sets_flag() {
        let mut engine = StepEngine::with_test_pattern(&Config::default());
        engine.load_image(&[0x80, 0x37, 0x12, 0x40]).unwrap();
        assert!(engine.is_loaded());
        assert_eq!(
            engine.machine().read_memory(0x10_0000..0x10_0004),
            Some(vec![0x80, 0x37, 0x12, 0x40])
        );
    }

    #[test]
    fn test_failed_load_keeps_flag_clear() {
        let mut engine = StepEngine::with_test_pattern(&Config::default());
        assert!(engine.load_image(&vec![0; 0x70_0001]).is_err());
        assert!(!engine.is_loaded());
    }

    #[test]
    fn test_step_advances_pc() {
        let mut engine = StepEngine::with_test_pattern(&Config::default());
        for _ in 0..10 {
            engine.step().unwrap();
        }
        assert_eq!(engine.program_counter(), Address(0x8030_0000 + 40));
        assert_eq!(engine.steps(), 10);
        assert_eq!(engine.snapshot_framebuffer().frame_number(), 10);
    }

    #[test]
    fn test_step_renders_pattern() {
        let mut engine = StepEngine::with_test_pattern(&Config::default());
        engine.step().unwrap();
        let fb = engine.snapshot_framebuffer();
        assert_eq!(fb.get(150, 100), Some(FOREGROUND));
        assert_eq!(fb.get(0, 0), Some(BACKGROUND));
        assert!(fb
            .pixels()
            .iter()
            .all(|p| *p == FOREGROUND || *p == BACKGROUND));
    }

    #[test]
    fn test_step_error_leaves_state() {
        let mut engine = StepEngine::new(&Config::default(), Box::new(Faulty));
        let err = engine.step().unwrap_err();
        assert_eq!(
            err,
            StepError::Fault {
                pc: 0x8030_0000,
                reason: String::from("illegal instruction"),
            }
        );
        assert_eq!(engine.program_counter(), Address(0x8030_0000));
        assert_eq!(engine.snapshot_framebuffer().frame_number(), 0);
    }

    #[test]
    fn test_pc_wraps() {
        let config = Config {
            reset_pc: u32::MAX - 3,
            ..Config::default()
        };
        let mut engine = StepEngine::with_test_pattern(&config);
        engine.step().unwrap();
        assert_eq!(engine.program_counter(), Address(0));
    }
}
