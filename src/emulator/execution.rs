use super::basics::Rgb;
use super::framebuffer::Framebuffer;
use super::machine::MachineState;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StepError {
    #[error("fault at pc {pc:#010x}: {reason}")]
    Fault { pc: u32, reason: String },
}

/// Geometry and sequence number of the frame a step has to produce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRequest {
    pub width: u32,
    pub height: u32,
    pub frame_number: u64,
}

/// The part of a step that interprets machine state: fetch, decode, execute
/// and render. The engine advances the program counter after a successful
/// call; everything else is up to the unit.
pub trait ExecutionUnit: Send {
    fn execute(
        &mut self,
        state: &mut MachineState,
        request: FrameRequest,
    ) -> Result<Framebuffer, StepError>;

    fn name(&self) -> &'static str;
}

pub const FOREGROUND: Rgb = Rgb::new(255, 0, 0);
pub const BACKGROUND: Rgb = Rgb::new(0, 0, 255);

/// Stand-in for a CPU core. Does not look at memory at all; every frame
/// shows a red rectangle on a blue background.
#[derive(Debug, Default)]
pub struct TestPattern;

impl TestPattern {
    pub fn shade(x: u32, y: u32) -> Rgb {
        if 120 < x && x < 200 && 80 < y && y < 160 {
            FOREGROUND
        } else {
            BACKGROUND
        }
    }
}

impl ExecutionUnit for TestPattern {
    fn execute(
        &mut self,
        _state: &mut MachineState,
        request: FrameRequest,
    ) -> Result<Framebuffer, StepError> {
        Ok(Framebuffer::from_fn(
            request.width,
            request.height,
            request.frame_number,
            TestPattern::shade,
        ))
    }

    fn name(&self) -> &'static str {
        "test-pattern"
    }
}
