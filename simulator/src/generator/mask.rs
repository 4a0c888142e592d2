use anyhow::Context;
use image::{ImageFormat, Rgb, RgbImage};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::io::Cursor;

const BACKGROUND: Rgb<u8> = Rgb([59, 76, 192]);
const ANOMALY: Rgb<u8> = Rgb([180, 4, 38]);

/// Row-major anomaly mask with `anomalies` seeded random hits. Hits may
/// coincide, so the number of marked pixels can be lower.
pub fn build_anomaly_mask(
    rows: u32,
    cols: u32,
    anomalies: usize,
    seed: u64,
) -> anyhow::Result<Vec<bool>> {
    let pixel_count = (rows as usize)
        .checked_mul(cols as usize)
        .context("overflow computing mask size")?;
    let mut mask = vec![false; pixel_count];
    if pixel_count == 0 {
        return Ok(mask);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..anomalies {
        let row = rng.gen_range(0..rows) as usize;
        let col = rng.gen_range(0..cols) as usize;
        mask[row * cols as usize + col] = true;
    }
    Ok(mask)
}

/// Encodes the mask as a PNG heat map.
pub fn render_mask_png(mask: &[bool], rows: u32, cols: u32) -> anyhow::Result<Vec<u8>> {
    anyhow::ensure!(
        mask.len() == rows as usize * cols as usize,
        "mask holds {} pixels, expected {}x{}",
        mask.len(),
        rows,
        cols
    );
    let image = RgbImage::from_fn(cols, rows, |x, y| {
        if mask[y as usize * cols as usize + x as usize] {
            ANOMALY
        } else {
            BACKGROUND
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("encoding visualization")?;
    Ok(buffer.into_inner())
}
