use super::timing::LINE_PIXELS;

/// Receives one call per scanline from the video engine.
pub trait VideoSink {
    /// `pixels` holds `pixel_count` 6-bit colour values, or `None` for sync
    /// lines and lines in skipped frames.
    fn render_line(&mut self, burst_phase: u8, pixel_count: usize, pixels: Option<&[u8]>);

    /// Called after the last line of every field.
    fn end_frame(&mut self) {}
}

/// Video RAM as seen by the display fetch.
pub trait VideoMemory {
    fn fetch(&self, addr: u32) -> u8;
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl VideoSink for NullSink {
    fn render_line(&mut self, _burst_phase: u8, _pixel_count: usize, _pixels: Option<&[u8]>) {}
}

/// Collects a field of colour indices.
///
/// Lines without pixel data leave the previous contents in place so a
/// skipped frame keeps showing the last rendered one.
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    line: usize,
    /// Lines received in the current field, rendered or not.
    pub lines_seen: usize,
    /// Lines that carried pixel data in the current field.
    pub lines_rendered: usize,
    /// Totals from the last completed field.
    pub last_field_lines: usize,
    pub last_field_rendered: usize,
    pub frames: u64,
}

impl FrameBuffer {
    pub fn new(height: usize) -> Self {
        Self {
            width: LINE_PIXELS,
            height,
            pixels: vec![0; LINE_PIXELS * height],
            line: 0,
            lines_seen: 0,
            lines_rendered: 0,
            last_field_lines: 0,
            last_field_rendered: 0,
            frames: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Colour indices, `width` per row.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn row(&self, y: usize) -> &[u8] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    /// Expand to packed RGB24.
    pub fn to_rgb(&self, out: &mut [u8]) {
        for (dst, &c) in out.chunks_exact_mut(3).zip(self.pixels.iter()) {
            dst.copy_from_slice(&rgb(c));
        }
    }
}

impl VideoSink for FrameBuffer {
    fn render_line(&mut self, _burst_phase: u8, pixel_count: usize, pixels: Option<&[u8]>) {
        if let Some(src) = pixels {
            if self.line < self.height {
                let n = pixel_count.min(self.width).min(src.len());
                let start = self.line * self.width;
                self.pixels[start..start + n].copy_from_slice(&src[..n]);
            }
            self.lines_rendered += 1;
        }
        self.line += 1;
        self.lines_seen += 1;
    }

    fn end_frame(&mut self) {
        self.last_field_lines = self.lines_seen;
        self.last_field_rendered = self.lines_rendered;
        self.lines_seen = 0;
        self.lines_rendered = 0;
        self.line = 0;
        self.frames += 1;
    }
}

/// RGB monitor colour for a 6-bit value laid out R1 G1 B1 R0 G0 B0.
pub fn rgb(colour: u8) -> [u8; 3] {
    let level = |hi: u8, lo: u8| ((colour >> hi) & 1) * 2 + ((colour >> lo) & 1);
    let scale = |l: u8| l * 85;
    [scale(level(5, 2)), scale(level(4, 1)), scale(level(3, 0))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb_levels() {
        assert_eq!(rgb(0x00), [0, 0, 0]);
        assert_eq!(rgb(0x3F), [255, 255, 255]);
        assert_eq!(rgb(0x24), [255, 0, 0]);
        assert_eq!(rgb(0x04), [85, 0, 0]);
        assert_eq!(rgb(0x12), [0, 255, 0]);
    }

    #[test]
    fn frame_buffer_keeps_old_pixels_for_empty_lines() {
        let mut fb = FrameBuffer::new(2);
        let line = vec![7u8; LINE_PIXELS];
        fb.render_line(0, LINE_PIXELS, Some(&line));
        fb.render_line(0, LINE_PIXELS, None);
        fb.end_frame();
        assert_eq!(fb.last_field_lines, 2);
        assert_eq!(fb.last_field_rendered, 1);
        fb.render_line(0, LINE_PIXELS, None);
        assert_eq!(fb.row(0)[10], 7);
    }
}
