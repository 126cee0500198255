//! Approximate Gaussian blur over premultiplied RGBA pixmaps.
//!
//! A Gaussian is approximated by repeated box blurs, each run separably along
//! rows then columns with a sliding window sum. The per-pass half-widths sum
//! to the requested radius, so the blurred edge never spreads further than
//! `radius` pixels. Pixels outside the buffer count as transparent; callers
//! pad the buffer by at least `radius` on each side (see [`pad`]).

use tiny_skia::Pixmap;

use super::defaults::BLUR_PASSES;
use super::{new_pixmap, padded_size};
use crate::errors::RenderError;

const CHANNELS: usize = 4;

/// Split `radius` into box half-widths, one per pass, summing to the rounded radius.
///
/// Zero, negative and NaN radii produce no passes.
pub fn box_passes(radius: f32) -> [usize; BLUR_PASSES] {
    let mut passes = [0; BLUR_PASSES];
    if radius.is_nan() || radius <= 0.0 {
        return passes;
    }
    let total = radius.round() as usize;
    let (base, rem) = (total / BLUR_PASSES, total % BLUR_PASSES);
    for (i, pass) in passes.iter_mut().enumerate() {
        *pass = base + usize::from(i < rem);
    }
    passes
}

/// Blurred copy of `source`. A radius that rounds to 0 returns an identical copy.
pub fn blur(source: &Pixmap, radius: f32) -> Pixmap {
    let mut out = source.clone();
    blur_in_place(&mut out, radius);
    out
}

pub fn blur_in_place(pixmap: &mut Pixmap, radius: f32) {
    let passes = box_passes(radius);
    if passes.iter().all(|&half| half == 0) {
        return;
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let data = pixmap.data_mut();
    let mut scratch = vec![0u8; data.len()];

    for &half in passes.iter().filter(|&&half| half > 0) {
        // Rows into scratch, then columns back into the pixmap
        box_pass(data, &mut scratch, width, height, CHANNELS, width * CHANNELS, half);
        box_pass(&scratch, data, height, width, width * CHANNELS, CHANNELS, half);
    }
}

/// One box pass over `lines` lines of `len` pixels.
///
/// `step` is the byte distance between neighbouring pixels in a line and
/// `line_step` the byte distance between the starts of consecutive lines.
fn box_pass(
    src: &[u8],
    dst: &mut [u8],
    len: usize,
    lines: usize,
    step: usize,
    line_step: usize,
    half: usize,
) {
    if len == 0 {
        return;
    }
    let window = (2 * half + 1) as u32;
    let round = window / 2;

    for line in 0..lines {
        let base = line * line_step;
        for channel in 0..CHANNELS {
            let at = |i: usize| base + i * step + channel;

            let mut sum: u32 = (0..=half.min(len - 1)).map(|i| src[at(i)] as u32).sum();
            for i in 0..len {
                dst[at(i)] = ((sum + round) / window) as u8;
                let entering = i + half + 1;
                if entering < len {
                    sum += src[at(entering)] as u32;
                }
                if i >= half {
                    sum -= src[at(i - half)] as u32;
                }
            }
        }
    }
}

/// Copy of `source` with `amount` transparent pixels added on every side.
pub fn pad(source: &Pixmap, amount: u32) -> Result<Pixmap, RenderError> {
    let (w, h) = (source.width(), source.height());
    let (width, height) = padded_size(w, h, amount)?;
    let mut out = new_pixmap(width, height)?;

    let src_stride = w as usize * CHANNELS;
    let dst_stride = out.width() as usize * CHANNELS;
    let left = amount as usize * CHANNELS;
    let src = source.data();
    let dst = out.data_mut();
    for row in 0..h as usize {
        let from = row * src_stride;
        let to = (row + amount as usize) * dst_stride + left;
        dst[to..to + src_stride].copy_from_slice(&src[from..from + src_stride]);
    }
    Ok(out)
}
