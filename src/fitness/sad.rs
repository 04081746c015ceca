/// raw pixel distances between two RGBA buffers (all 4 channels, alpha included).
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

/// PSADBW kernel: 16 bytes per step, two u64 partial sums per register.
/// SSE2 is part of the x86_64 baseline so no runtime detection is needed.
#[cfg(target_arch = "x86_64")]
#[inline]
unsafe fn sad_simd_chunk(target: &[u8], current: &[u8]) -> u64 {
    debug_assert!(target.len() == current.len());
    debug_assert!(target.len() % 16 == 0);

    let mut sum = _mm_setzero_si128();
    for i in 0..target.len() / 16 {
        let offset = i * 16;
        let t_bytes = _mm_loadu_si128(target.as_ptr().add(offset) as *const __m128i);
        let c_bytes = _mm_loadu_si128(current.as_ptr().add(offset) as *const __m128i);
        sum = _mm_add_epi64(sum, _mm_sad_epu8(t_bytes, c_bytes));
    }

    // fold the two 64-bit lanes
    let low = _mm_cvtsi128_si64(sum) as u64;
    let high = _mm_cvtsi128_si64(_mm_unpackhi_epi64(sum, sum)) as u64;
    low + high
}

#[inline]
fn sad_scalar(target: &[u8], current: &[u8]) -> u64 {
    target
        .iter()
        .zip(current)
        .map(|(&t, &c)| t.abs_diff(c) as u64)
        .sum()
}

/// sum of absolute differences over every byte
#[inline]
pub fn sad_rgba(target_rgba: &[u8], current_rgba: &[u8]) -> u64 {
    profiling::scope!("sad_rgba");
    debug_assert_eq!(target_rgba.len(), current_rgba.len());
    debug_assert_eq!(target_rgba.len() % 4, 0);

    #[cfg(target_arch = "x86_64")]
    {
        let simd_len = (target_rgba.len() / 16) * 16;
        // safety: both slices are at least simd_len long and simd_len is a multiple of 16
        let simd_sum = unsafe { sad_simd_chunk(&target_rgba[..simd_len], &current_rgba[..simd_len]) };
        // remainder is < 16 bytes (0-3 pixels)
        simd_sum + sad_scalar(&target_rgba[simd_len..], &current_rgba[simd_len..])
    }

    #[cfg(not(target_arch = "x86_64"))]
    {
        sad_scalar(target_rgba, current_rgba)
    }
}

/// sum of squared differences over every byte. scalar loop, the compiler auto-vectorizes it
#[inline]
pub fn ssd_rgba(target_rgba: &[u8], current_rgba: &[u8]) -> u64 {
    profiling::scope!("ssd_rgba");
    debug_assert_eq!(target_rgba.len(), current_rgba.len());

    target_rgba
        .iter()
        .zip(current_rgba)
        .map(|(&t, &c)| {
            let d = t.abs_diff(c) as u32;
            (d * d) as u64
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_buffers_are_zero() {
        let buf: Vec<u8> = (0..=255).cycle().take(4 * 37).collect();
        assert_eq!(sad_rgba(&buf, &buf), 0);
        assert_eq!(ssd_rgba(&buf, &buf), 0);
    }

    #[test]
    fn test_simd_matches_scalar_with_remainder() {
        // 37 pixels: 9 SIMD blocks plus a 1-pixel tail
        let a: Vec<u8> = (0..4 * 37).map(|i| (i * 7 % 256) as u8).collect();
        let b: Vec<u8> = (0..4 * 37).map(|i| (i * 13 % 256) as u8).collect();
        assert_eq!(sad_rgba(&a, &b), sad_scalar(&a, &b));
    }

    #[test]
    fn test_known_distances() {
        let white = [255u8; 8];
        let black = [0u8, 0, 0, 255, 0, 0, 0, 255];
        assert_eq!(sad_rgba(&white, &black), 6 * 255);
        assert_eq!(ssd_rgba(&white, &black), 6 * 255 * 255);
    }
}
