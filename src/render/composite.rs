use rayon::prelude::*;

use crate::foundation::error::{EneftyError, EneftyResult};
use crate::foundation::math::{add_sat_u8, mul_div255_u8};

pub(crate) type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for one premultiplied pixel.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = add_sat_u8(src[i], mul_div255_u8(u16::from(dst[i]), inv));
    }
    out
}

/// Composite `src` over `dst` row by row. Both buffers are premultiplied RGBA8 of equal size.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], row_bytes: usize) -> EneftyResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) || row_bytes == 0 {
        return Err(EneftyError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    dst.par_chunks_mut(row_bytes)
        .zip(src.par_chunks(row_bytes))
        .for_each(|(drow, srow)| {
            for (d, s) in drow.chunks_exact_mut(4).zip(srow.chunks_exact(4)) {
                let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
                d.copy_from_slice(&out);
            }
        });
    Ok(())
}

/// Fill a buffer with one straight-alpha color, premultiplying it first.
pub(crate) fn fill_straight(dst: &mut [u8], rgba: [u8; 4]) {
    let a = u16::from(rgba[3]);
    let px = [
        mul_div255_u8(u16::from(rgba[0]), a),
        mul_div255_u8(u16::from(rgba[1]), a),
        mul_div255_u8(u16::from(rgba[2]), a),
        rgba[3],
    ];
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
