use crate::attr::Attributes;
use crate::error::*;
use crate::image::Image;
use crate::mediancut::mediancut;
use crate::nearest::classify;
use crate::pal::{PalIndex, Palette, SelectionState};
use crate::remap::swap_colors;
use crate::sample::sample_pixels;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Image and the palette extracted from it. They're always replaced together.
struct Loaded {
    image: Image,
    palette: Palette,
}

/// One image being edited: its pixels, dominant colors, and the current selection.
///
/// Create with [`Attributes::new_session()`]. Every operation takes `&mut self`,
/// so a swap can't run while another load or swap is in progress.
pub struct Session {
    attr: Attributes,
    loaded: Option<Loaded>,
}

impl Session {
    #[inline]
    #[must_use]
    pub fn new(attr: Attributes) -> Self {
        Self { attr, loaded: None }
    }

    /// Extracts the palette of `image` and makes it the current image.
    ///
    /// Replaces the previous image, palette and selection, but only if everything succeeded.
    /// The number of colors is fixed by [`Attributes::set_palette_size`] at this point.
    pub fn load(&mut self, image: Image) -> Result<&Palette, Error> {
        let attr = &self.attr;
        if attr.progress(0.) {
            return Err(Aborted);
        }

        let max_dimension = attr.quantize_max_dimension as usize;
        let (small_width, small_height) = image.downsampled_size(max_dimension);
        attr.verbose_print(format!("  finding palette of {}x{} image using {small_width}x{small_height} copy", image.width(), image.height()));
        let mut samples = {
            let small = image.downsampled(max_dimension)?;
            sample_pixels(&small, attr.alpha_cutoff, attr.quantize_sample_stride)?
        };
        if samples.is_empty() {
            attr.verbose_print("  error: no opaque pixels to take colors from");
            return Err(EmptyPixelSet);
        }
        attr.verbose_print(format!("  sampled {} pixels for quantization", samples.len()));
        if attr.progress(30.) {
            return Err(Aborted);
        }

        let mut rng = match attr.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let colors = mediancut(attr, &mut samples, attr.palette_size.into(), attr.fallback_sample_stride, &mut rng);
        drop(samples);
        if colors.is_empty() {
            return Err(EmptyPixelSet);
        }
        attr.verbose_print(format!("  made {}-color palette", colors.len()));
        if attr.progress(70.) {
            return Err(Aborted);
        }

        let mut palette = Palette::new(&colors);
        classify_image(attr, &image, &mut palette)?;
        if attr.progress(100.) {
            return Err(Aborted);
        }

        Ok(&self.loaded.insert(Loaded { image, palette }).palette)
    }

    /// Flips whether palette entry `idx` is selected. At most two entries are selected at a time;
    /// picking a third one does nothing.
    pub fn toggle_selection(&mut self, idx: usize) -> Result<SelectionState, Error> {
        let loaded = self.loaded.as_mut().ok_or(MissingBuffer)?;
        if idx >= loaded.palette.len() {
            return Err(ValueOutOfRange);
        }
        Ok(loaded.palette.selection.toggle(idx as PalIndex))
    }

    /// Exchanges the two selected colors in the image.
    ///
    /// Every pixel close to the first color becomes the second, and vice versa.
    /// The palette entries trade places too, and the selection is cleared.
    /// Coverage is recomputed when the returned guard is consumed or dropped.
    ///
    /// Nothing is changed if there's no image, or the selection isn't two distinct colors.
    pub fn swap(&mut self) -> Result<Swapped<'_>, Error> {
        let attr = &self.attr;
        let Some(loaded) = self.loaded.as_mut() else {
            attr.verbose_print("  warning: swap needs an image to be loaded first");
            return Err(MissingBuffer);
        };
        let Some((a, b)) = loaded.palette.selection.pair() else {
            attr.verbose_print("  warning: swap needs exactly two selected colors");
            return Err(InvalidSelection);
        };
        if attr.progress(0.) {
            return Err(Aborted);
        }

        let (a, b) = (usize::from(a), usize::from(b));
        let colors = loaded.palette.colors();
        let (color_a, color_b) = (colors[a], colors[b]);
        let rewritten = swap_colors(&mut loaded.image, color_a, color_b, attr.swap_threshold);
        attr.verbose_print(format!("  swapped #{:02x}{:02x}{:02x} and #{:02x}{:02x}{:02x} in {rewritten} pixels",
            color_a.r, color_a.g, color_a.b, color_b.r, color_b.g, color_b.b));

        loaded.palette.swap(a, b);
        loaded.palette.selection.clear();
        Ok(Swapped {
            attr,
            loaded: Some(loaded),
            rewritten,
        })
    }

    /// Recomputes color coverage of the current image
    pub fn reclassify(&mut self) -> Result<&Palette, Error> {
        let loaded = self.loaded.as_mut().ok_or(MissingBuffer)?;
        classify_image(&self.attr, &loaded.image, &mut loaded.palette)?;
        Ok(&loaded.palette)
    }

    #[inline]
    #[must_use]
    pub fn palette(&self) -> Option<&Palette> {
        self.loaded.as_ref().map(|l| &l.palette)
    }

    /// Current pixels, including any swaps made so far
    #[inline]
    #[must_use]
    pub fn image(&self) -> Option<&Image> {
        self.loaded.as_ref().map(|l| &l.image)
    }

    /// Ends the session, giving back the edited image
    #[inline]
    #[must_use]
    pub fn into_image(self) -> Option<Image> {
        self.loaded.map(|l| l.image)
    }

    #[must_use]
    pub fn selection_state(&self) -> SelectionState {
        self.palette().map_or(SelectionState::None, |p| p.selection().state())
    }

    #[inline(always)]
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attr
    }
}

/// Measures coverage on every n-th full-resolution pixel and stores it in the palette
fn classify_image(attr: &Attributes, image: &Image, palette: &mut Palette) -> Result<(), Error> {
    let samples = sample_pixels(image, attr.alpha_cutoff, attr.classify_sample_stride)?;
    let percentages = classify(&samples, palette.colors())?;
    palette.set_percentages(&percentages);
    Ok(())
}

/// A swap that has rewritten the pixels, but whose percentages haven't been remeasured yet.
///
/// Call [`Swapped::reclassify()`] to get the up-to-date palette. If the guard is dropped instead,
/// the percentages are recomputed anyway, and a failure is only logged.
#[must_use = "palette percentages are stale until reclassify() is called"]
pub struct Swapped<'session> {
    attr: &'session Attributes,
    // None once reclassified
    loaded: Option<&'session mut Loaded>,
    rewritten: usize,
}

impl<'session> Swapped<'session> {
    /// Palette with the swapped entries, and their percentages exchanged as-is
    #[must_use]
    pub fn provisional(&self) -> &Palette {
        &self.loaded.as_ref().expect("swap guard used after reclassification").palette
    }

    /// How many pixels were recolored
    #[inline(always)]
    #[must_use]
    pub fn pixels_changed(&self) -> usize {
        self.rewritten
    }

    /// Remeasures coverage of the swapped image
    pub fn reclassify(mut self) -> Result<&'session Palette, Error> {
        let loaded = self.loaded.take().ok_or(InternalError)?;
        classify_image(self.attr, &loaded.image, &mut loaded.palette)?;
        Ok(&loaded.palette)
    }
}

impl Drop for Swapped<'_> {
    fn drop(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            if let Err(err) = classify_image(self.attr, &loaded.image, &mut loaded.palette) {
                self.attr.verbose_print(format!("  error: can't update percentages after swap: {err}"));
            }
        }
    }
}

#[cfg(test)]
use crate::pal::{RGB, RGBA};

#[cfg(test)]
const DARK: RGBA = RGBA::new(10, 10, 10, 255);
#[cfg(test)]
const LIGHT: RGBA = RGBA::new(200, 200, 200, 255);

#[cfg(test)]
fn two_tone_session() -> (Session, Image) {
    let mut attr = Attributes::new();
    attr.set_palette_size(2).unwrap();
    attr.set_quantize_sample_stride(1).unwrap();
    attr.set_random_seed(Some(1));
    let pixels: Vec<_> = (0..100).map(|i| if i < 50 { DARK } else { LIGHT }).collect();
    let img = attr.new_image(pixels, 10, 10).unwrap();
    (attr.new_session(), img)
}

#[test]
fn load_two_tone() {
    let (mut s, img) = two_tone_session();
    assert!(s.palette().is_none());
    let pal = s.load(img).unwrap();
    assert_eq!(&[RGB::new(10, 10, 10), RGB::new(200, 200, 200)], pal.colors());
    assert_eq!(&[50., 50.], pal.percentages());
    assert_eq!(SelectionState::None, s.selection_state());
}

#[test]
fn swap_two_tone() {
    let (mut s, img) = two_tone_session();
    s.load(img).unwrap();
    assert_eq!(SelectionState::One, s.toggle_selection(0).unwrap());
    assert_eq!(SelectionState::Two, s.toggle_selection(1).unwrap());

    let swapped = s.swap().unwrap();
    assert_eq!(100, swapped.pixels_changed());
    assert_eq!(&[RGB::new(200, 200, 200), RGB::new(10, 10, 10)], swapped.provisional().colors());
    let pal = swapped.reclassify().unwrap();
    assert_eq!(2, pal.len());
    assert_eq!(&[50., 50.], pal.percentages());
    assert_eq!(SelectionState::None, s.selection_state());

    let pixels = s.image().unwrap().pixels();
    assert!(pixels[..50].iter().all(|&px| px == LIGHT));
    assert!(pixels[50..].iter().all(|&px| px == DARK));
}

#[test]
fn dropped_guard_still_reclassifies() {
    let mut attr = Attributes::new();
    attr.set_palette_size(2).unwrap();
    attr.set_quantize_sample_stride(1).unwrap();
    attr.set_classify_sample_stride(1).unwrap();
    attr.set_swap_threshold(5.).unwrap();
    // the dark half averages to (10,10,10), but no pixel is within 5 of it
    let pixels: Vec<_> = (0..100).map(|i| match i {
        0..=24 => RGBA::new(0, 0, 0, 255),
        25..=49 => RGBA::new(20, 20, 20, 255),
        _ => LIGHT,
    }).collect();
    let mut s = attr.new_session();
    s.load(attr.new_image(pixels, 10, 10).unwrap()).unwrap();
    assert_eq!(&[RGB::new(10, 10, 10), RGB::new(200, 200, 200)], s.palette().unwrap().colors());
    assert_eq!(&[50., 50.], s.palette().unwrap().percentages());

    s.toggle_selection(0).unwrap();
    s.toggle_selection(1).unwrap();
    let swapped = s.swap().unwrap();
    assert_eq!(50, swapped.pixels_changed());
    assert_eq!(&[50., 50.], swapped.provisional().percentages());
    drop(swapped);

    let pal = s.palette().unwrap();
    assert_eq!(&[RGB::new(200, 200, 200), RGB::new(10, 10, 10)], pal.colors());
    assert_eq!(&[0., 100.], pal.percentages());
    assert_eq!(50, s.image().unwrap().pixels().iter().filter(|&&px| px == DARK).count());
}

#[test]
fn swap_needs_image_and_pair() {
    let (mut s, img) = two_tone_session();
    assert_eq!(Err(MissingBuffer), s.swap().map(|_| ()));
    assert_eq!(Err(MissingBuffer), s.toggle_selection(0));
    assert_eq!(Err(MissingBuffer), s.reclassify().map(|_| ()));

    s.load(img).unwrap();
    let before = s.image().unwrap().pixels().to_vec();
    assert_eq!(Err(InvalidSelection), s.swap().map(|_| ()));
    s.toggle_selection(1).unwrap();
    assert_eq!(Err(InvalidSelection), s.swap().map(|_| ()));
    assert_eq!(Err(ValueOutOfRange), s.toggle_selection(2));
    assert_eq!(SelectionState::One, s.selection_state());
    assert_eq!(&before[..], s.image().unwrap().pixels());
    assert_eq!(&[RGB::new(10, 10, 10), RGB::new(200, 200, 200)], s.palette().unwrap().colors());
}

#[test]
fn failed_load_keeps_previous() {
    let (mut s, img) = two_tone_session();
    s.load(img).unwrap();
    let transparent = s.attributes().new_image(vec![RGBA::new(1, 2, 3, 0); 16], 4, 4).unwrap();
    assert_eq!(Err(EmptyPixelSet), s.load(transparent).map(|_| ()));
    assert_eq!(2, s.palette().unwrap().len());
    assert_eq!(10, s.image().unwrap().width());
}

#[test]
fn abort_commits_nothing() {
    let mut attr = Attributes::new();
    attr.set_progress_callback(|percent| if percent > 50. { crate::ControlFlow::Break } else { crate::ControlFlow::Continue });
    let img = attr.new_image(vec![DARK; 16], 4, 4).unwrap();
    let mut s = attr.new_session();
    assert_eq!(Err(Aborted), s.load(img).map(|_| ()));
    assert!(s.palette().is_none());
    assert!(s.into_image().is_none());
}

#[test]
fn reload_replaces_everything() {
    let (mut s, img) = two_tone_session();
    s.load(img.clone()).unwrap();
    s.toggle_selection(0).unwrap();
    let pal = s.load(img).unwrap();
    assert_eq!(SelectionState::None, pal.selection().state());
    assert_eq!(2, s.reclassify().unwrap().len());
}
