use super::basics::Rgb;
use std::sync::{Arc, Mutex};

/// A complete rendered picture, stored row-major. Once handed to a
/// `FrameSlot` a framebuffer is never mutated again.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    frame_number: u64,
    pixels: Vec<Rgb>,
}

impl Framebuffer {
    /// Creates a framebuffer filled with a single colour.
    pub fn new(width: u32, height: u32, fill: Rgb) -> Framebuffer {
        Framebuffer {
            width,
            height,
            frame_number: 0,
            pixels: vec![fill; width as usize * height as usize],
        }
    }

    /// Builds a framebuffer by evaluating `shade` for every pixel.
    pub fn from_fn<F>(width: u32, height: u32, frame_number: u64, mut shade: F) -> Framebuffer
    where
        F: FnMut(u32, u32) -> Rgb,
    {
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                pixels.push(shade(x, y));
            }
        }
        Framebuffer {
            width,
            height,
            frame_number,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of the step that produced this frame; 0 for the blank frame.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Converts to tightly packed RGBA8, the layout textures expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() * 4);
        for pixel in &self.pixels {
            rgba.extend_from_slice(&[pixel.r, pixel.g, pixel.b, 0xFF]);
        }
        rgba
    }
}

/// Single-writer handoff point for frames. The writer publishes whole frames
/// by swapping the shared handle; readers clone the handle and keep a frame
/// that can no longer change underneath them.
#[derive(Debug)]
pub struct FrameSlot {
    current: Mutex<Arc<Framebuffer>>,
}

impl FrameSlot {
    pub fn new(initial: Framebuffer) -> FrameSlot {
        FrameSlot {
            current: Mutex::new(Arc::new(initial)),
        }
    }

    pub fn publish(&self, frame: Framebuffer) {
        let frame = Arc::new(frame);
        let previous = {
            let mut guard = self.current.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::replace(&mut *guard, frame)
        };
        // the old frame may be freed here, outside the lock
        drop(previous);
    }

    pub fn snapshot(&self) -> Arc<Framebuffer> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const BLUE: Rgb = Rgb::new(0, 0, 255);

    #[test]
    fn test_new_framebuffer() {
        let fb = Framebuffer::new(4, 3, BLUE);
        assert_eq!(fb.pixels().len(), 12);
        assert_eq!(fb.frame_number(), 0);
        assert!(fb.pixels().iter().all(|p| *p == BLUE));
    }

    #[test]
    fn test_from_fn_is_row_major() {
        let fb = Framebuffer::from_fn(3, 2, 7, |x, y| Rgb::new(x as u8, y as u8, 0));
        assert_eq!(fb.frame_number(), 7);
        assert_eq!(fb.pixels()[1], Rgb::new(1, 0, 0));
        assert_eq!(fb.pixels()[3], Rgb::new(0, 1, 0));
        assert_eq!(fb.get(2, 1), Some(Rgb::new(2, 1, 0)));
        assert_eq!(fb.get(3, 0), None);
        assert_eq!(fb.get(0, 2), None);
    }

    #[test]
    fn test_to_rgba() {
        let fb = Framebuffer::from_fn(2, 1, 1, |x, _| if x == 0 { RED } else { BLUE });
        assert_eq!(fb.to_rgba(), vec![255, 0, 0, 255, 0, 0, 255, 255]);
    }

    #[test]
    fn test_slot_publish_replaces_frame() {
        let slot = FrameSlot::new(Framebuffer::new(2, 2, BLUE));
        let before = slot.snapshot();
        slot.publish(Framebuffer::from_fn(2, 2, 1, |_, _| RED));
        let after = slot.snapshot();
        // snapshots taken earlier stay intact
        assert!(before.pixels().iter().all(|p| *p == BLUE));
        assert!(after.pixels().iter().all(|p| *p == RED));
        assert_eq!(after.frame_number(), 1);
    }
}
