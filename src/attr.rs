use crate::error::Error;
use crate::image::Image;
use crate::pal::{PalLen, MAX_COLORS, RGBA};
use crate::session::Session;
use std::sync::Arc;

/// Starting point and settings for palette extraction and swapping
#[derive(Clone)]
pub struct Attributes {
    pub(crate) palette_size: PalLen,
    pub(crate) alpha_cutoff: u8,
    pub(crate) quantize_max_dimension: u32,
    pub(crate) quantize_sample_stride: usize,
    pub(crate) classify_sample_stride: usize,
    pub(crate) fallback_sample_stride: usize,
    pub(crate) swap_threshold: f32,
    pub(crate) random_seed: Option<u64>,

    progress_callback: Option<Arc<dyn Fn(f32) -> ControlFlow + Send + Sync>>,
    log_callback: Option<Arc<dyn Fn(&Attributes, &str) + Send + Sync>>,
    log_flush_callback: Option<Arc<dyn Fn(&Attributes) + Send + Sync>>,
}

impl Attributes {
    /// New handle for library configuration
    ///
    /// See also [`Attributes::new_session()`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            palette_size: 5,
            alpha_cutoff: 128,
            quantize_max_dimension: 200,
            quantize_sample_stride: 4,
            classify_sample_stride: 10,
            fallback_sample_stride: 100,
            swap_threshold: 30.,
            random_seed: None,
            progress_callback: None,
            log_callback: None,
            log_flush_callback: None,
        }
    }

    /// Make an image from RGBA pixels.
    ///
    /// The `pixels` argument can be `Vec<RGBA>`, or `Box<[RGBA]>` or `&[RGBA]`.
    #[inline]
    pub fn new_image<VecRGBA>(&self, pixels: VecRGBA, width: usize, height: usize) -> Result<Image, Error> where VecRGBA: Into<Vec<RGBA>> {
        Image::new(self, pixels, width, height)
    }

    /// Make an image from interleaved R,G,B,A bytes, `width * height * 4` long
    #[inline]
    pub fn new_image_bytes(&self, bytes: &[u8], width: usize, height: usize) -> Result<Image, Error> {
        Image::from_bytes(self, bytes, width, height)
    }

    /// Empty session that will use a copy of these settings
    #[inline]
    #[must_use]
    pub fn new_session(&self) -> Session {
        Session::new(self.clone())
    }

    /// Number of dominant colors to extract (K). 1-256.
    ///
    /// The default is 5. It only affects images loaded after the change.
    #[inline]
    pub fn set_palette_size(&mut self, colors: u32) -> Result<(), Error> {
        if !(1..=MAX_COLORS as u32).contains(&colors) {
            return Err(Error::ValueOutOfRange);
        }
        self.palette_size = colors as PalLen;
        Ok(())
    }

    /// Pixels with alpha less or equal to this are ignored when sampling. Default 128.
    #[inline]
    pub fn set_alpha_cutoff(&mut self, cutoff: u8) {
        self.alpha_cutoff = cutoff;
    }

    /// Longest side of the downscaled copy used for finding the palette. Default 200.
    #[inline]
    pub fn set_quantize_max_dimension(&mut self, pixels: u32) -> Result<(), Error> {
        if pixels == 0 {
            return Err(Error::ValueOutOfRange);
        }
        self.quantize_max_dimension = pixels;
        Ok(())
    }

    /// Use every n-th pixel of the downscaled copy for finding the palette. Default 4.
    #[inline]
    pub fn set_quantize_sample_stride(&mut self, stride: usize) -> Result<(), Error> {
        self.quantize_sample_stride = check_stride(stride)?;
        Ok(())
    }

    /// Use every n-th pixel of the full image for measuring color coverage. Default 10.
    #[inline]
    pub fn set_classify_sample_stride(&mut self, stride: usize) -> Result<(), Error> {
        self.classify_sample_stride = check_stride(stride)?;
        Ok(())
    }

    /// When the image has fewer distinct colors than the palette size,
    /// the missing entries are picked at random from every n-th sampled pixel. Default 100.
    #[inline]
    pub fn set_fallback_sample_stride(&mut self, stride: usize) -> Result<(), Error> {
        self.fallback_sample_stride = check_stride(stride)?;
        Ok(())
    }

    /// Max RGB distance (0-442) for a pixel to count as one of the swapped colors. Default 30.
    #[inline]
    pub fn set_swap_threshold(&mut self, threshold: f32) -> Result<(), Error> {
        if !threshold.is_finite() || threshold < 0. {
            return Err(Error::ValueOutOfRange);
        }
        self.swap_threshold = threshold;
        Ok(())
    }

    /// Makes random palette fill-ins reproducible. `None` (the default) seeds from OS entropy.
    #[inline(always)]
    pub fn set_random_seed(&mut self, seed: Option<u64>) {
        self.random_seed = seed;
    }

    #[inline(always)]
    #[must_use]
    pub fn palette_size(&self) -> u32 {
        self.palette_size.into()
    }

    #[inline(always)]
    #[must_use]
    pub fn alpha_cutoff(&self) -> u8 {
        self.alpha_cutoff
    }

    #[inline(always)]
    #[must_use]
    pub fn quantize_max_dimension(&self) -> u32 {
        self.quantize_max_dimension
    }

    #[inline(always)]
    #[must_use]
    pub fn quantize_sample_stride(&self) -> usize {
        self.quantize_sample_stride
    }

    #[inline(always)]
    #[must_use]
    pub fn classify_sample_stride(&self) -> usize {
        self.classify_sample_stride
    }

    #[inline(always)]
    #[must_use]
    pub fn fallback_sample_stride(&self) -> usize {
        self.fallback_sample_stride
    }

    #[inline(always)]
    #[must_use]
    pub fn swap_threshold(&self) -> f32 {
        self.swap_threshold
    }

    #[inline(always)]
    #[must_use]
    pub fn random_seed(&self) -> Option<u64> {
        self.random_seed
    }

    /// Set callback function to be called every time the library wants to print a message.
    ///
    /// To share data with the callback, use `Arc` or `Atomic*` types and `move ||` closures.
    #[inline]
    pub fn set_log_callback<F: Fn(&Attributes, &str) + Send + Sync + 'static>(&mut self, callback: F) {
        self.verbose_printf_flush();
        self.log_callback = Some(Arc::new(callback));
    }

    /// Callback for flushing output (if you buffer messages, that's the time to flush those buffers)
    #[inline]
    pub fn set_log_flush_callback<F: Fn(&Attributes) + Send + Sync + 'static>(&mut self, callback: F) {
        self.verbose_printf_flush();
        self.log_flush_callback = Some(Arc::new(callback));
    }

    /// Set callback function to be called every time the library makes a progress.
    /// It can be used to cancel a stale load or swap early; nothing is committed to the session then.
    ///
    /// To share data with the callback, use `Arc` or `Atomic*` types and `move ||` closures.
    #[inline]
    pub fn set_progress_callback<F: Fn(f32) -> ControlFlow + Send + Sync + 'static>(&mut self, callback: F) {
        self.progress_callback = Some(Arc::new(callback));
    }

    // true == abort
    #[inline]
    #[must_use]
    pub(crate) fn progress(self: &Attributes, percent: f32) -> bool {
        if let Some(f) = &self.progress_callback {
            f(percent) == ControlFlow::Break
        } else {
            false
        }
    }

    #[inline(always)]
    pub(crate) fn verbose_print(self: &Attributes, msg: impl AsRef<str>) {
        fn _print(a: &Attributes, msg: &str) {
            if let Some(f) = &a.log_callback {
                f(a, msg);
            }
        }
        _print(self, msg.as_ref());
    }

    #[inline]
    pub(crate) fn verbose_printf_flush(self: &Attributes) {
        if let Some(f) = &self.log_flush_callback {
            f(self);
        }
    }
}

fn check_stride(stride: usize) -> Result<usize, Error> {
    if stride == 0 {
        return Err(Error::ValueOutOfRange);
    }
    Ok(stride)
}

impl Drop for Attributes {
    fn drop(&mut self) {
        self.verbose_printf_flush();
    }
}

impl Default for Attributes {
    #[inline(always)]
    fn default() -> Attributes {
        Attributes::new()
    }
}

/// Result of callback in [`Attributes::set_progress_callback`]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlFlow {
    /// Continue processing as normal
    Continue = 1,
    /// Abort processing and fail
    Break = 0,
}

#[test]
fn getset() {
    let mut a = Attributes::new();
    assert_eq!(5, a.palette_size());
    assert_eq!(128, a.alpha_cutoff());
    assert_eq!(200, a.quantize_max_dimension());
    assert_eq!(4, a.quantize_sample_stride());
    assert_eq!(10, a.classify_sample_stride());
    assert_eq!(100, a.fallback_sample_stride());
    assert_eq!(30., a.swap_threshold());
    assert_eq!(None, a.random_seed());

    a.set_palette_size(8).unwrap();
    assert_eq!(8, a.palette_size());
    assert!(a.set_palette_size(0).is_err());
    assert!(a.set_palette_size(257).is_err());
    a.set_palette_size(1).unwrap();
    a.set_palette_size(256).unwrap();

    assert!(a.set_quantize_max_dimension(0).is_err());
    assert!(a.set_quantize_sample_stride(0).is_err());
    assert!(a.set_classify_sample_stride(0).is_err());
    assert!(a.set_fallback_sample_stride(0).is_err());
    a.set_classify_sample_stride(1).unwrap();
    assert_eq!(1, a.classify_sample_stride());

    assert!(a.set_swap_threshold(-1.).is_err());
    assert!(a.set_swap_threshold(f32::NAN).is_err());
    a.set_swap_threshold(0.).unwrap();

    a.set_random_seed(Some(7));
    assert_eq!(Some(7), a.random_seed());
}

#[test]
fn callbacks() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let logged = Arc::new(AtomicUsize::new(0));
    let flushed = Arc::new(AtomicUsize::new(0));
    {
        let mut a = Attributes::new();
        let l = logged.clone();
        a.set_log_callback(move |_, msg| {
            assert!(!msg.is_empty());
            l.fetch_add(1, Ordering::SeqCst);
        });
        let f = flushed.clone();
        a.set_log_flush_callback(move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });
        a.verbose_print("  hello");
        assert!(!a.progress(10.));
        a.set_progress_callback(|p| if p > 50. { ControlFlow::Break } else { ControlFlow::Continue });
        assert!(!a.progress(10.));
        assert!(a.progress(60.));
    }
    assert_eq!(1, logged.load(Ordering::SeqCst));
    assert!(flushed.load(Ordering::SeqCst) >= 1);
}
