//! Headless capture: PNG screenshots.

use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::Path;

use coco_core::core::machine::Machine;

/// Encode `width * height` RGB24 pixels as a PNG.
pub fn write_png<W: Write>(out: W, width: u32, height: u32, rgb: &[u8]) -> Result<(), png::EncodingError> {
    let mut encoder = png::Encoder::new(out, width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgb)?;
    writer.finish()
}

/// Save the machine's last completed frame as a PNG file.
pub fn save_screenshot(machine: &dyn Machine, path: &Path) -> Result<(), Box<dyn Error>> {
    let (width, height) = machine.display_size();
    let mut rgb = vec![0u8; (width * height * 3) as usize];
    machine.render_frame(&mut rgb);

    let file = fs::File::create(path)?;
    write_png(std::io::BufWriter::new(file), width, height, &rgb)?;
    log::info!("saved {width}x{height} screenshot to {}", path.display());
    Ok(())
}
