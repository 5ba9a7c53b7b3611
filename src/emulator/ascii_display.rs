use super::execution::BACKGROUND;
use super::framebuffer::Framebuffer;

/// Renders a frame as text, one character per `cell`×`cell` block. A block
/// is drawn as `@` if its top-left pixel differs from the background colour.
pub fn render_frame(frame: &Framebuffer, cell: u32) -> String {
    let cell = cell.max(1);
    let mut out = String::new();
    for y in (0..frame.height()).step_by(cell as usize) {
        for x in (0..frame.width()).step_by(cell as usize) {
            match frame.get(x, y) {
                Some(pixel) if pixel != BACKGROUND => out.push('@'),
                _ => out.push(' '),
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::emulator::execution::TestPattern;

    #[test]
    fn test_render_blank() {
        let frame = Framebuffer::new(4, 2, BACKGROUND);
        assert_eq!(render_frame(&frame, 1), "    \n    \n");
    }

    #[test]
    fn test_render_pattern() {
        let frame = Framebuffer::from_fn(320, 240, 1, TestPattern::shade);
        let text = render_frame(&frame, 40);
        // 8 columns, 6 rows; only the block starting at (160, 120) is inside
        assert_eq!(
            text,
            "        \n        \n        \n    @   \n        \n        \n"
        );
    }
}
