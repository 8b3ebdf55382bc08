use crate::attr::Attributes;
use crate::error::*;
use crate::pal::RGBA;

/// Full-resolution RGBA pixels, row-major, with their dimensions.
///
/// Decoding and encoding image files is outside the scope of this library.
#[derive(Clone)]
pub struct Image {
    pub(crate) pixels: Vec<RGBA>,
    width: usize,
    height: usize,
}

impl Image {
    /// Describe dimensions of a `Vec` of RGBA pixels.
    ///
    /// The buffer must be exactly `width` × `height` pixels.
    pub fn new<VecRGBA>(attr: &Attributes, pixels: VecRGBA, width: usize, height: usize) -> Result<Self, Error> where VecRGBA: Into<Vec<RGBA>> {
        if !Self::check_image_size(width, height) {
            attr.verbose_print(format!("  error: invalid image size {width}×{height}"));
            return Err(ValueOutOfRange);
        }
        let pixels = pixels.into();
        if pixels.len() != width * height {
            attr.verbose_print(format!("Buffer length is {} pixels, which doesn't match {}×{} RGBA pixels", pixels.len(), width, height));
            return Err(BufferTooSmall);
        }
        Ok(Self { pixels, width, height })
    }

    /// Copies interleaved R,G,B,A bytes (e.g. canvas `ImageData`) into a new image.
    pub fn from_bytes(attr: &Attributes, bytes: &[u8], width: usize, height: usize) -> Result<Self, Error> {
        if !Self::check_image_size(width, height) {
            attr.verbose_print(format!("  error: invalid image size {width}×{height}"));
            return Err(ValueOutOfRange);
        }
        if bytes.len() != width * height * 4 {
            attr.verbose_print(format!("Buffer length is {} bytes, which doesn't match {}×{}×4 RGBA bytes", bytes.len(), width, height));
            return Err(BufferTooSmall);
        }
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(width * height)?;
        pixels.extend(bytes.chunks_exact(4).map(|px| RGBA::new(px[0], px[1], px[2], px[3])));
        Ok(Self { pixels, width, height })
    }

    fn check_image_size(width: usize, height: usize) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        width.max(height) <= i32::MAX as usize && width.checked_mul(height).and_then(|px| px.checked_mul(4)).is_some()
    }

    /// Width of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the image in pixels
    #[must_use]
    #[inline(always)]
    pub fn height(&self) -> usize {
        self.height
    }

    /// All pixels, row by row
    #[must_use]
    #[inline(always)]
    pub fn pixels(&self) -> &[RGBA] {
        &self.pixels
    }

    /// Releases the pixel buffer
    #[must_use]
    #[inline]
    pub fn into_pixels(self) -> Vec<RGBA> {
        self.pixels
    }

    /// Interleaved R,G,B,A bytes, e.g. for an encoder or a canvas
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|px| [px.r, px.g, px.b, px.a]).collect()
    }

    /// Size of the image scaled down so that the longest side is at most `max_dimension`,
    /// keeping the aspect ratio. Images that are small enough keep their size.
    #[must_use]
    pub(crate) fn downsampled_size(&self, max_dimension: usize) -> (usize, usize) {
        let (width, height) = (self.width, self.height);
        let max_dimension = max_dimension.max(1);
        if width > height {
            if width > max_dimension {
                return (max_dimension, (height * max_dimension / width).max(1));
            }
        } else if height > max_dimension {
            return ((width * max_dimension / height).max(1), max_dimension);
        }
        (width, height)
    }

    /// Nearest-neighbor copy with the longest side capped at `max_dimension`.
    ///
    /// It's only used to find clustering tendencies, so no filtering is needed.
    pub(crate) fn downsampled(&self, max_dimension: usize) -> Result<Self, Error> {
        let (out_w, out_h) = self.downsampled_size(max_dimension);
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(out_w * out_h)?;
        for y in 0..out_h {
            let row = &self.pixels[(y * self.height / out_h) * self.width..][..self.width];
            pixels.extend((0..out_w).map(|x| row[x * self.width / out_w]));
        }
        Ok(Self { pixels, width: out_w, height: out_h })
    }
}

#[test]
fn takes_rgba() {
    let attr = Attributes::new();
    let img = vec![RGBA::new(0, 0, 0, 0); 8];

    attr.new_image(&img[..1], 1, 1).unwrap();
    attr.new_image(&img[..], 4, 2).unwrap();
    attr.new_image(&img[..], 8, 1).unwrap();
    assert_eq!(BufferTooSmall, attr.new_image(&img[..], 9, 1).err().unwrap());
    assert_eq!(BufferTooSmall, attr.new_image(&img[..], 4, 3).err().unwrap());
    assert_eq!(ValueOutOfRange, attr.new_image(Vec::<RGBA>::new(), 0, 0).err().unwrap());
}

#[test]
fn takes_bytes() {
    let attr = Attributes::new();
    let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
    let img = attr.new_image_bytes(&bytes, 2, 1).unwrap();
    assert_eq!(&[RGBA::new(1, 2, 3, 4), RGBA::new(5, 6, 7, 8)], img.pixels());
    assert_eq!(&bytes[..], &img.to_bytes()[..]);
    assert!(attr.new_image_bytes(&bytes[..7], 2, 1).is_err());
    assert!(attr.new_image_bytes(&bytes, 1, 1).is_err());
}

#[test]
fn downsample_keeps_aspect() {
    let attr = Attributes::new();
    let img = attr.new_image(vec![RGBA::new(1, 2, 3, 255); 400 * 100], 400, 100).unwrap();
    assert_eq!((200, 50), img.downsampled_size(200));
    let small = img.downsampled(200).unwrap();
    assert_eq!((200, 50), (small.width(), small.height()));
    assert_eq!(200 * 50, small.pixels().len());

    let tall = attr.new_image(vec![RGBA::new(1, 2, 3, 255); 30 * 900], 30, 900).unwrap();
    assert_eq!((6, 200), tall.downsampled_size(200));

    let square = attr.new_image(vec![RGBA::new(1, 2, 3, 255); 300 * 300], 300, 300).unwrap();
    assert_eq!((200, 200), square.downsampled_size(200));

    let sliver = attr.new_image(vec![RGBA::new(1, 2, 3, 255); 1000], 1000, 1).unwrap();
    assert_eq!((200, 1), sliver.downsampled_size(200));

    // already small enough
    assert_eq!((30, 900), tall.downsampled_size(1000));
}

#[test]
fn downsample_picks_nearest() {
    let attr = Attributes::new();
    // left half black, right half white
    let pixels: Vec<_> = (0..4 * 4).map(|i| if i % 4 < 2 { RGBA::new(0, 0, 0, 255) } else { RGBA::new(255, 255, 255, 255) }).collect();
    let img = attr.new_image(pixels, 4, 4).unwrap();
    let small = img.downsampled(2).unwrap();
    assert_eq!((2, 2), (small.width(), small.height()));
    assert_eq!(&[RGBA::new(0, 0, 0, 255), RGBA::new(255, 255, 255, 255)], &small.pixels()[..2]);
    assert_eq!(small.pixels()[..2], small.pixels()[2..]);
}
