//! Finds the dominant colors of an RGBA image and swaps pairs of them in place.
//!
//! Load an image into a [`Session`] to get a small palette made by median cut,
//! with the share of the image each color covers. Select two palette entries and
//! [`Session::swap()`] them: every pixel close to one color is recolored to the other.
//!
//! ```rust,ignore
//! let mut attr = paletteswap::new();
//! attr.set_palette_size(5)?;
//! let img = attr.new_image_bytes(&rgba_bytes, width, height)?;
//! let mut session = attr.new_session();
//! for entry in session.load(img)?.entries() {
//!     println!("{entry}");
//! }
//! session.toggle_selection(0)?;
//! session.toggle_selection(3)?;
//! let palette = session.swap()?.reclassify()?;
//! ```
#![allow(clippy::bool_to_int_with_if)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod attr;
mod error;
mod image;
mod mediancut;
mod nearest;
mod pal;
mod remap;
mod sample;
mod session;

#[cfg(not(feature = "threads"))]
mod rayoff;

#[cfg(feature = "threads")]
mod rayoff {
    pub(crate) use rayon::prelude::{ParallelIterator, ParallelSlice, ParallelSliceMut};
    pub(crate) use thread_local::ThreadLocal;
}

pub use attr::{Attributes, ControlFlow};
pub use error::Error;
pub use image::Image;
pub use nearest::nearest;
pub use pal::{color_diff, PalIndex, Palette, PaletteEntry, Selection, SelectionState, RGB, RGBA};
pub use session::{Session, Swapped};

/// Start here: creates new handle for library configuration
///
/// See [`Attributes`]
#[inline(always)]
#[must_use]
pub fn new() -> Attributes {
    Attributes::new()
}

#[test]
fn swap_twice_restores_image() {
    let mut attr = new();
    attr.set_palette_size(4).unwrap();
    attr.set_quantize_sample_stride(1).unwrap();
    attr.set_random_seed(Some(0));

    let red = RGBA::new(255, 0, 0, 255);
    let green = RGBA::new(0, 255, 0, 255);
    let blue = RGBA::new(0, 0, 255, 255);
    let white = RGBA::new(255, 255, 255, 255);
    let pixels: Vec<_> = (0..64usize).map(|i| [red, green, blue, white][i % 4]).collect();
    let img = attr.new_image(&pixels[..], 8, 8).unwrap();

    let mut s = attr.new_session();
    let pal = s.load(img).unwrap();
    // split on R first, then on B twice
    let rgb = |c: RGBA| RGB::new(c.r, c.g, c.b);
    assert_eq!(&[rgb(green), rgb(blue), rgb(red), rgb(white)], pal.colors());
    let sum: f64 = pal.percentages().iter().sum();
    assert!((99.99..=100.01).contains(&sum));

    s.toggle_selection(0).unwrap();
    s.toggle_selection(1).unwrap();
    s.swap().unwrap().reclassify().unwrap();
    assert_eq!(blue, s.image().unwrap().pixels()[1]);
    assert_eq!(green, s.image().unwrap().pixels()[2]);

    s.toggle_selection(0).unwrap();
    s.toggle_selection(1).unwrap();
    s.swap().unwrap().reclassify().unwrap();
    assert_eq!(&pixels[..], s.image().unwrap().pixels());
    assert_eq!(&[rgb(green), rgb(blue)], &s.palette().unwrap().colors()[..2]);
}

#[test]
fn palette_size_is_kept_for_flat_image() {
    let mut attr = new();
    attr.set_palette_size(7).unwrap();
    attr.set_random_seed(Some(99));
    let img = attr.new_image(vec![RGBA::new(30, 60, 90, 255); 20 * 10], 20, 10).unwrap();

    let mut s = attr.new_session();
    let pal = s.load(img).unwrap();
    assert_eq!(7, pal.len());
    assert!(pal.colors().iter().all(|&c| c == RGB::new(30, 60, 90)));
    // ties go to the first entry
    assert_eq!(100., pal.percentages()[0]);
    assert!(pal.percentages()[1..].iter().all(|&p| p == 0.));
}

#[test]
fn logs_through_callback() {
    use std::sync::{Arc, Mutex};
    let messages = Arc::new(Mutex::new(Vec::new()));
    let mut attr = new();
    let m = messages.clone();
    attr.set_log_callback(move |_, msg| m.lock().unwrap().push(msg.to_string()));

    let mut s = attr.new_session();
    assert_eq!(Err(Error::MissingBuffer), s.swap().map(|_| ()));
    s.load(attr.new_image(vec![RGBA::new(1, 1, 1, 255); 4], 2, 2).unwrap()).unwrap();
    assert!(messages.lock().unwrap().len() >= 2);
}
