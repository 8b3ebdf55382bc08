use crate::image::Image;
use crate::pal::{color_diff, rgb_of, RGB, RGBA};
use crate::rayoff::*;

/// Pixels handed to one task when rewriting
const CHUNK_SIZE: usize = 1 << 16;

/// Where a pixel goes when `a` and `b` trade places.
///
/// Closeness to `a` is checked first, so a pixel within the threshold of both becomes `b`.
#[inline(always)]
fn swap_target(px: RGB, a: RGB, b: RGB, threshold_squared: f64) -> Option<RGB> {
    if f64::from(color_diff(px, a)) <= threshold_squared {
        Some(b)
    } else if f64::from(color_diff(px, b)) <= threshold_squared {
        Some(a)
    } else {
        None
    }
}

/// Recolors, in place, every pixel within `threshold` (RGB distance) of `a` to `b`, and vice versa.
///
/// Alpha is kept as-is. Returns the number of rewritten pixels.
#[inline(never)]
pub(crate) fn swap_colors(image: &mut Image, a: RGB, b: RGB, threshold: f32) -> usize {
    let threshold_squared = f64::from(threshold) * f64::from(threshold);
    image.pixels.par_chunks_mut(CHUNK_SIZE).map(|chunk| {
        let mut rewritten = 0;
        for px in chunk.iter_mut() {
            if let Some(to) = swap_target(rgb_of(*px), a, b, threshold_squared) {
                *px = RGBA::new(to.r, to.g, to.b, px.a);
                rewritten += 1;
            }
        }
        rewritten
    })
    .sum::<usize>()
}

#[cfg(test)]
use crate::Attributes;

#[test]
fn exact_colors_trade_places() {
    let a = RGB::new(10, 10, 10);
    let b = RGB::new(200, 200, 200);
    let other = RGBA::new(100, 20, 250, 255);
    let attr = Attributes::new();
    let pixels = vec![
        RGBA::new(10, 10, 10, 255),
        RGBA::new(200, 200, 200, 7),
        other,
        RGBA::new(10, 10, 10, 0),
    ];
    let mut img = attr.new_image(pixels, 2, 2).unwrap();
    assert_eq!(3, swap_colors(&mut img, a, b, 30.));
    assert_eq!(&[
        RGBA::new(200, 200, 200, 255),
        RGBA::new(10, 10, 10, 7),
        other,
        RGBA::new(200, 200, 200, 0),
    ], img.pixels());
}

#[test]
fn threshold_is_inclusive() {
    let a = RGB::new(100, 100, 100);
    let b = RGB::new(0, 0, 0);
    // 3-4-0 triangle, exactly 5 away from a
    let near = RGB::new(103, 104, 100);
    assert_eq!(Some(b), swap_target(near, a, b, 25.));
    assert_eq!(None, swap_target(near, a, b, 24.9));
    assert_eq!(None, swap_target(RGB::new(50, 50, 50), a, b, 30. * 30.));
}

#[test]
fn closer_to_a_is_checked_first() {
    let a = RGB::new(100, 0, 0);
    let b = RGB::new(120, 0, 0);
    // within threshold of both, and actually closer to b
    let px = RGB::new(115, 0, 0);
    assert_eq!(Some(b), swap_target(px, a, b, 30. * 30.));
    assert_eq!(Some(a), swap_target(RGB::new(145, 0, 0), a, b, 30. * 30.));
}

#[test]
fn far_pixels_are_untouched() {
    let attr = Attributes::new();
    let pixels: Vec<_> = (0..=255u8).map(|i| RGBA::new(i, 255 - i, i / 2, i)).collect();
    let mut img = attr.new_image(pixels.clone(), 16, 16).unwrap();
    let a = RGB::new(0, 0, 200);
    let b = RGB::new(255, 255, 0);
    assert_eq!(0, swap_colors(&mut img, a, b, 30.));
    assert_eq!(&pixels[..], img.pixels());
}
