use crate::foundation::error::{RevealError, RevealResult};

/// Separable Gaussian blur over premultiplied RGBA8 with a q16 fixed-point kernel.
///
/// Edges clamp. `radius == 0` returns the input unchanged.
pub(crate) fn gaussian_blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
) -> RevealResult<Vec<u8>> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| RevealError::validation("blur buffer size overflow"))?;
    if src.len() != expected {
        return Err(RevealError::validation(
            "blur input must be width * height * 4 bytes",
        ));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }

    // CSS-like: the visible spread is about twice sigma.
    let sigma = (radius as f64 / 2.0).max(0.5);
    let kernel = kernel_q16(radius, sigma);
    let mut tmp = vec![0u8; expected];
    let mut out = vec![0u8; expected];
    convolve(src, &mut tmp, width, height, &kernel, Axis::X);
    convolve(&tmp, &mut out, width, height, &kernel, Axis::Y);
    Ok(out)
}

/// Blur radius in device pixels for a virtual-pixel radius at `scale`.
pub(crate) fn device_radius(virtual_px: f64, scale: f64) -> u32 {
    let r = (virtual_px * scale).round();
    if r.is_finite() && r > 0.0 {
        (r as u32).min(256)
    } else {
        0
    }
}

fn kernel_q16(radius: u32, sigma: f64) -> Vec<u32> {
    let r = radius as i64;
    let denom = 2.0 * sigma * sigma;
    let weights: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();

    let mut q: Vec<u32> = weights
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    // Fold rounding drift into the center tap so the kernel sums to exactly 1.0.
    let total: i64 = q.iter().map(|&v| i64::from(v)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + 65536 - total).clamp(0, 65536) as u32;
    q
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

fn convolve(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::X => ((x + d).clamp(0, w - 1), y),
                    Axis::Y => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out + c] = ((a + 32768) >> 16).min(255) as u8;
            }
        }
    }
}
