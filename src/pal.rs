use arrayvec::ArrayVec;
use std::fmt;

/// 8-bit RGB in sRGB. Palette colors and sampled pixels use this.
pub type RGB = rgb::RGB8;

/// 8-bit RGBA in sRGB. This is the pixel format of [`Image`](crate::Image).
pub type RGBA = rgb::RGBA8;

pub type PalIndex = u8;
pub type PalLen = u16;

/// Palettes are stored inline, so this is also the upper limit for the palette size
pub(crate) const MAX_COLORS: usize = 256;

/// Squared Euclidean distance in 0-255 RGB space.
///
/// Only ever compared with other squared distances (or a squared threshold), so the root is never taken.
#[inline(always)]
#[must_use]
pub fn color_diff(a: RGB, b: RGB) -> u32 {
    let r = i32::from(a.r) - i32::from(b.r);
    let g = i32::from(a.g) - i32::from(b.g);
    let b = i32::from(a.b) - i32::from(b.b);
    (r * r + g * g + b * b) as u32
}

#[inline(always)]
pub(crate) fn rgb_of(px: RGBA) -> RGB {
    RGB::new(px.r, px.g, px.b)
}

/// One dominant color and the share of the image closest to it
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PaletteEntry {
    /// The color
    pub color: RGB,
    /// 0-100, how much of the (sampled) image is closest to this color
    pub percentage: f64,
}

impl PaletteEntry {
    /// `#rrggbb`
    #[must_use]
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.color.r, self.color.g, self.color.b)
    }

    /// Whether dark text reads better on top of this color than light text
    #[must_use]
    pub fn is_light(&self) -> bool {
        let brightness = (u32::from(self.color.r) * 299 + u32::from(self.color.g) * 587 + u32::from(self.color.b) * 114) as f64 / 1000.;
        brightness > 128.
    }
}

impl fmt::Display for PaletteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RGB({}, {}, {}) - {} {:.1}%", self.color.r, self.color.g, self.color.b, self.hex(), self.percentage)
    }
}

/// How many palette entries are picked for swapping
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SelectionState {
    /// Nothing selected
    None,
    /// "Color 1" picked
    One,
    /// "Color 1" and "Color 2" picked, swap is possible
    Two,
}

/// Up to two distinct palette indices, in the order they were picked
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Selection {
    picked: ArrayVec<PalIndex, 2>,
}

impl Selection {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Picks an unselected index, or un-picks a selected one.
    ///
    /// A third pick is ignored until one of the two is un-picked.
    pub fn toggle(&mut self, idx: PalIndex) -> SelectionState {
        if let Some(pos) = self.picked.iter().position(|&i| i == idx) {
            self.picked.remove(pos);
        } else {
            // full == ignored
            let _ = self.picked.try_push(idx);
        }
        self.state()
    }

    #[must_use]
    pub fn state(&self) -> SelectionState {
        match self.picked.len() {
            0 => SelectionState::None,
            1 => SelectionState::One,
            _ => SelectionState::Two,
        }
    }

    /// Selected indices, first picked first
    #[inline(always)]
    #[must_use]
    pub fn as_slice(&self) -> &[PalIndex] {
        &self.picked
    }

    /// "Color 1"
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<PalIndex> {
        self.picked.first().copied()
    }

    /// "Color 2"
    #[inline]
    #[must_use]
    pub fn second(&self) -> Option<PalIndex> {
        self.picked.get(1).copied()
    }

    /// Both indices, only if there are two different ones
    #[must_use]
    pub fn pair(&self) -> Option<(PalIndex, PalIndex)> {
        match self.picked[..] {
            [a, b] if a != b => Some((a, b)),
            _ => None,
        }
    }

    #[inline]
    pub fn clear(&mut self) {
        self.picked.clear();
    }
}

/// Dominant colors of the image, their coverage, and which of them are selected for swapping
#[derive(Debug, Clone)]
pub struct Palette {
    colors: ArrayVec<RGB, MAX_COLORS>,
    percentages: ArrayVec<f64, MAX_COLORS>,
    pub(crate) selection: Selection,
}

impl Palette {
    /// Percentages start at 0 until the image is classified
    pub(crate) fn new(colors: &[RGB]) -> Self {
        debug_assert!(colors.len() <= MAX_COLORS);
        let colors: ArrayVec<_, MAX_COLORS> = colors.iter().copied().take(MAX_COLORS).collect();
        let percentages = colors.iter().map(|_| 0.).collect();
        Self {
            colors,
            percentages,
            selection: Selection::new(),
        }
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        debug_assert_eq!(self.colors.len(), self.percentages.len());
        self.colors.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colors in the order median cut created them
    #[inline(always)]
    #[must_use]
    pub fn colors(&self) -> &[RGB] {
        &self.colors
    }

    /// Aligned with [`colors()`][Self::colors]
    #[inline(always)]
    #[must_use]
    pub fn percentages(&self) -> &[f64] {
        &self.percentages
    }

    #[must_use]
    pub fn entry(&self, idx: usize) -> Option<PaletteEntry> {
        Some(PaletteEntry {
            color: *self.colors.get(idx)?,
            percentage: *self.percentages.get(idx)?,
        })
    }

    pub fn entries(&self) -> impl Iterator<Item = PaletteEntry> + '_ {
        self.colors.iter().zip(&self.percentages).map(|(&color, &percentage)| PaletteEntry { color, percentage })
    }

    #[inline(always)]
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub(crate) fn set_percentages(&mut self, percentages: &[f64]) {
        debug_assert_eq!(percentages.len(), self.len());
        self.percentages.iter_mut().zip(percentages).for_each(|(dst, &src)| *dst = src);
    }

    /// Exchanges both the colors and the percentages
    #[cfg_attr(debug_assertions, track_caller)]
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.colors.swap(a, b);
        self.percentages.swap(a, b);
    }
}

#[test]
fn diff_test() {
    let a = RGB::new(10, 10, 10);
    let b = RGB::new(13, 14, 10);
    assert_eq!(0, color_diff(a, a));
    assert_eq!(25, color_diff(a, b));
    assert_eq!(color_diff(a, b), color_diff(b, a));
    assert_eq!(3 * 255 * 255, color_diff(RGB::new(0, 0, 0), RGB::new(255, 255, 255)));
}

#[test]
fn entry_test() {
    let e = PaletteEntry { color: RGB::new(255, 128, 0), percentage: 12.345 };
    assert_eq!("#ff8000", e.hex());
    assert!(e.is_light());
    assert_eq!("RGB(255, 128, 0) - #ff8000 12.3%", e.to_string());

    let dark = PaletteEntry { color: RGB::new(10, 10, 10), percentage: 0. };
    assert!(!dark.is_light());
    assert_eq!("#0a0a0a", dark.hex());
}

#[test]
fn selection_test() {
    let mut s = Selection::new();
    assert_eq!(SelectionState::None, s.state());
    assert_eq!(SelectionState::One, s.toggle(3));
    assert_eq!(SelectionState::Two, s.toggle(1));
    assert_eq!((Some(3), Some(1)), (s.first(), s.second()));
    assert_eq!(Some((3, 1)), s.pair());

    // third pick is ignored
    assert_eq!(SelectionState::Two, s.toggle(4));
    assert_eq!(&[3, 1], s.as_slice());

    // un-picking "Color 1" makes "Color 2" the first
    assert_eq!(SelectionState::One, s.toggle(3));
    assert_eq!(&[1], s.as_slice());
    assert_eq!(None, s.pair());
    assert_eq!(SelectionState::Two, s.toggle(4));
    assert_eq!(&[1, 4], s.as_slice());

    s.clear();
    assert_eq!(SelectionState::None, s.state());
    assert_eq!(None, s.first());
}

#[test]
fn pal_test() {
    let mut p = Palette::new(&[RGB::new(1, 2, 3), RGB::new(4, 5, 6), RGB::new(7, 8, 9)]);
    assert_eq!(3, p.len());
    assert!(p.percentages().iter().all(|&x| x == 0.));
    p.set_percentages(&[50., 30., 20.]);
    p.swap(0, 2);
    assert_eq!(&[RGB::new(7, 8, 9), RGB::new(4, 5, 6), RGB::new(1, 2, 3)], p.colors());
    assert_eq!(&[20., 30., 50.], p.percentages());
    assert_eq!(Some(PaletteEntry { color: RGB::new(4, 5, 6), percentage: 30. }), p.entry(1));
    assert_eq!(None, p.entry(3));
    assert_eq!(3, p.entries().count());
}
