use crate::foundation::error::{RevealError, RevealResult};

/// Source-over of premultiplied `src` onto premultiplied `dst`, both RGBA8.
pub(crate) fn over_px(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round()) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..3 {
        out[i] = mul_div255(u16::from(src[i]), op).saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));
    out
}

pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> RevealResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(RevealError::capture("layer size mismatch while compositing"));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over_px([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Fill a buffer with one premultiplied color.
pub(crate) fn fill(dst: &mut [u8], premul: [u8; 4]) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&premul);
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u8
}
