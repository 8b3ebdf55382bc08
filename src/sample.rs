use crate::error::Error;
use crate::image::Image;
use crate::pal::{rgb_of, RGB};

/// Takes every `stride`-th pixel in row-major order, keeping only those with alpha above `alpha_cutoff`.
///
/// The result is empty if nothing passes the alpha test. It's up to the caller to treat that as a failure.
pub(crate) fn sample_pixels(image: &Image, alpha_cutoff: u8, stride: usize) -> Result<Vec<RGB>, Error> {
    let stride = stride.max(1);
    let mut samples = Vec::new();
    samples.try_reserve_exact((image.pixels.len() + stride - 1) / stride)?;
    samples.extend(image.pixels.iter().step_by(stride)
        .filter(|px| px.a > alpha_cutoff)
        .map(|&px| rgb_of(px)));
    Ok(samples)
}

#[cfg(test)]
use crate::{pal::RGBA, Attributes};

#[test]
fn stride_and_alpha() {
    let attr = Attributes::new();
    let pixels: Vec<_> = (0..20u8).map(|i| RGBA::new(i, i, i, if i % 3 == 0 { 128 } else { 255 })).collect();
    let img = attr.new_image(pixels, 5, 4).unwrap();

    let all = sample_pixels(&img, 128, 1).unwrap();
    assert_eq!(20 - 7, all.len());
    assert!(all.iter().all(|c| c.r % 3 != 0));

    // 0, 4, 8, 12, 16 minus the translucent 0 and 12
    let every4th = sample_pixels(&img, 128, 4).unwrap();
    assert_eq!(vec![RGB::new(4, 4, 4), RGB::new(8, 8, 8), RGB::new(16, 16, 16)], every4th);

    // cutoff is exclusive
    assert_eq!(20, sample_pixels(&img, 127, 1).unwrap().len());
    assert_eq!(sample_pixels(&img, 128, 0).unwrap(), all);
}

#[test]
fn transparent_is_empty() {
    let attr = Attributes::new();
    let img = attr.new_image(vec![RGBA::new(200, 10, 10, 0); 64], 8, 8).unwrap();
    assert!(sample_pixels(&img, 128, 1).unwrap().is_empty());
}
