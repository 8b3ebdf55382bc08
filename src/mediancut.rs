use crate::attr::Attributes;
use crate::pal::RGB;
use rand::Rng;
use std::collections::VecDeque;

struct MedianCutter<'samples> {
    /// FIFO, so the output palette is in bucket-creation order
    boxes: VecDeque<MBox<'samples>>,
    target_colors: usize,
}

struct MBox<'samples> {
    /// Sampled pixels that fell into this bucket
    pub colors: &'samples mut [RGB],
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Channel {
    R,
    G,
    B,
}

impl Channel {
    #[inline(always)]
    fn value(self, px: &RGB) -> u8 {
        match self {
            Self::R => px.r,
            Self::G => px.g,
            Self::B => px.b,
        }
    }
}

impl<'samples> MBox<'samples> {
    pub fn new(colors: &'samples mut [RGB]) -> Self {
        Self { colors }
    }

    /// Channel with the widest min-max range.
    ///
    /// Ties prefer R, then G, then B. G has to beat both others, B only has to beat R.
    fn split_channel(&self) -> Channel {
        let mut min = RGB::new(255, 255, 255);
        let mut max = RGB::new(0, 0, 0);
        for px in self.colors.iter() {
            min.r = min.r.min(px.r);
            min.g = min.g.min(px.g);
            min.b = min.b.min(px.b);
            max.r = max.r.max(px.r);
            max.g = max.g.max(px.g);
            max.b = max.b.max(px.b);
        }
        let r_range = max.r.saturating_sub(min.r);
        let g_range = max.g.saturating_sub(min.g);
        let b_range = max.b.saturating_sub(min.b);

        if g_range > r_range && g_range > b_range {
            Channel::G
        } else if b_range > r_range {
            Channel::B
        } else {
            Channel::R
        }
    }

    /// Sorts (stable) along the widest channel and cuts at `len / 2`. Either half may be empty.
    #[inline]
    pub fn split(self) -> [Self; 2] {
        let chan = self.split_channel();
        let colors = self.colors;
        colors.sort_by_key(move |px| chan.value(px));
        let break_at = colors.len() / 2;
        let (left, right) = colors.split_at_mut(break_at);
        [MBox::new(left), MBox::new(right)]
    }

    /// Per-channel mean, rounded half up
    fn average_color(&self) -> Option<RGB> {
        if self.colors.is_empty() {
            return None;
        }
        let len = self.colors.len() as u64;
        let (r, g, b) = self.colors.iter().fold((0u64, 0u64, 0u64), |(r, g, b), px| {
            (r + u64::from(px.r), g + u64::from(px.g), b + u64::from(px.b))
        });
        let avg = move |sum: u64| ((sum * 2 + len) / (len * 2)) as u8;
        Some(RGB::new(avg(r), avg(g), avg(b)))
    }
}

impl<'samples> MedianCutter<'samples> {
    pub fn new(samples: &'samples mut [RGB], target_colors: usize) -> Self {
        let mut boxes = VecDeque::with_capacity(target_colors + 1);
        boxes.push_back(MBox::new(samples));
        Self { boxes, target_colors }
    }

    fn cut(mut self) -> Vec<RGB> {
        // A 1-pixel box splits into an empty box and itself, so when only those are left
        // the queue can cycle without ever reaching target_colors.
        let max_idle_rounds = self.target_colors * 4;
        let mut idle_rounds = 0;
        while self.boxes.len() < self.target_colors && idle_rounds <= max_idle_rounds {
            let Some(mb) = self.boxes.pop_front() else { break };
            if mb.colors.len() < 2 {
                idle_rounds += 1;
            } else {
                idle_rounds = 0;
            }
            if mb.colors.is_empty() {
                continue;
            }
            self.boxes.extend(mb.split());
        }
        self.into_palette()
    }

    fn into_palette(self) -> Vec<RGB> {
        self.boxes.iter().filter_map(MBox::average_color).collect()
    }
}

/// Picks up to `target_colors` representative colors, in bucket-creation order.
///
/// Reorders `samples`. If there are fewer non-empty buckets than `target_colors` (e.g. the image has only a few distinct colors),
/// the rest is filled with random picks from every `fallback_stride`-th sample, taken in the original order. The picks are not deduplicated.
///
/// Returns an empty `Vec` if there are no samples.
#[inline(never)]
pub(crate) fn mediancut(attr: &Attributes, samples: &mut [RGB], target_colors: usize, fallback_stride: usize, rng: &mut impl Rng) -> Vec<RGB> {
    if samples.is_empty() || target_colors == 0 {
        return Vec::new();
    }
    let fallback: Vec<RGB> = samples.iter().step_by(fallback_stride.max(1)).copied().collect();

    let mut palette = MedianCutter::new(samples, target_colors).cut();
    debug_assert!(palette.len() <= target_colors);
    if palette.len() < target_colors {
        attr.verbose_print(format!("  only {} distinct buckets for {} colors, filling in from samples", palette.len(), target_colors));
    }

    while palette.len() < target_colors && !fallback.is_empty() {
        palette.push(fallback[rng.gen_range(0..fallback.len())]);
    }
    palette
}

/// Median cut alone, without the random fill-in
#[cfg(test)]
fn mediancut_no_fill(samples: &mut [RGB], target_colors: usize) -> Vec<RGB> {
    MedianCutter::new(samples, target_colors).cut()
}

#[cfg(test)]
use rand::{rngs::StdRng, SeedableRng};

#[test]
fn two_flat_colors() {
    let mut samples: Vec<_> = (0..100).map(|i| if i < 50 { RGB::new(10, 10, 10) } else { RGB::new(200, 200, 200) }).collect();
    let pal = mediancut(&Attributes::new(), &mut samples, 2, 100, &mut StdRng::seed_from_u64(0));
    assert_eq!(vec![RGB::new(10, 10, 10), RGB::new(200, 200, 200)], pal);
}

#[test]
fn exact_k_with_enough_distinct_colors() {
    let mut rng = StdRng::seed_from_u64(1);
    for k in 1..=12 {
        let mut samples: Vec<_> = (0..500u32).map(|i| RGB::new((i * 7 % 256) as u8, (i * 13 % 256) as u8, (i * 31 % 256) as u8)).collect();
        assert_eq!(k, mediancut(&Attributes::new(), &mut samples, k, 100, &mut rng).len());
    }
}

#[test]
fn at_most_k() {
    let mut samples = vec![RGB::new(1, 2, 3)];
    assert_eq!(vec![RGB::new(1, 2, 3)], mediancut_no_fill(&mut samples, 5));
    assert!(mediancut(&Attributes::new(), &mut [], 5, 100, &mut StdRng::seed_from_u64(0)).is_empty());
    assert!(mediancut(&Attributes::new(), &mut samples, 0, 100, &mut StdRng::seed_from_u64(0)).is_empty());
}

#[test]
fn rounded_bucket_means() {
    // widest range is R, so R is sorted and split at 2
    let mut samples = vec![
        RGB::new(100, 1, 0),
        RGB::new(0, 2, 0),
        RGB::new(101, 2, 1),
        RGB::new(1, 2, 0),
    ];
    let pal = mediancut_no_fill(&mut samples, 2);
    // (0+1)/2 = 0.5 rounds up, (1+2)/2 rounds up
    assert_eq!(vec![RGB::new(1, 2, 0), RGB::new(101, 2, 1)], pal);
}

#[test]
fn split_axis_tie_break() {
    let mb = |c: &mut [RGB]| MBox::new(c).split_channel();
    // all equal: R
    assert_eq!(Channel::R, mb(&mut [RGB::new(0, 0, 0), RGB::new(10, 10, 10)]));
    // G ties with B: G must beat both, B beats R
    assert_eq!(Channel::B, mb(&mut [RGB::new(0, 0, 0), RGB::new(5, 10, 10)]));
    // G ties with R: R wins
    assert_eq!(Channel::R, mb(&mut [RGB::new(0, 0, 0), RGB::new(10, 10, 5)]));
    assert_eq!(Channel::G, mb(&mut [RGB::new(0, 0, 0), RGB::new(5, 10, 5)]));
    assert_eq!(Channel::B, mb(&mut [RGB::new(0, 0, 0), RGB::new(5, 5, 10)]));
}

#[test]
fn fifo_bucket_order() {
    // 4 blues along B, K = 3: first split on B gives [low, high],
    // then the low half is split again and goes to the back of the queue
    let mut samples = vec![
        RGB::new(0, 0, 40),
        RGB::new(0, 0, 0),
        RGB::new(0, 0, 120),
        RGB::new(0, 0, 80),
    ];
    let pal = mediancut_no_fill(&mut samples, 3);
    assert_eq!(vec![RGB::new(0, 0, 100), RGB::new(0, 0, 0), RGB::new(0, 0, 40)], pal);
}

#[test]
fn stable_sort_keeps_scan_order() {
    let mut samples = vec![
        RGB::new(9, 0, 1),
        RGB::new(9, 0, 2),
        RGB::new(0, 0, 3),
        RGB::new(9, 0, 4),
    ];
    let b = MBox::new(&mut samples);
    assert_eq!(Channel::R, b.split_channel());
    let [left, right] = b.split();
    assert_eq!(&[RGB::new(0, 0, 3), RGB::new(9, 0, 1)], left.colors);
    assert_eq!(&[RGB::new(9, 0, 2), RGB::new(9, 0, 4)], right.colors);
}

#[test]
fn fallback_fill_is_reproducible() {
    let black = RGB::new(0, 0, 0);
    let red = RGB::new(255, 0, 0);
    let make = || vec![black, red, black];

    // three samples can't make 5 non-empty buckets
    assert_eq!(vec![red, black, black], mediancut_no_fill(&mut make(), 5));

    // every 100th sample of the original order is only the first one
    let pal = mediancut(&Attributes::new(), &mut make(), 5, 100, &mut StdRng::seed_from_u64(42));
    assert_eq!(vec![red, black, black, black, black], pal);

    let a = mediancut(&Attributes::new(), &mut make(), 5, 1, &mut StdRng::seed_from_u64(42));
    let b = mediancut(&Attributes::new(), &mut make(), 5, 1, &mut StdRng::seed_from_u64(42));
    assert_eq!(5, a.len());
    assert_eq!(a, b);
    assert!(a.iter().all(|&c| c == black || c == red));
}

#[test]
fn single_pixel_terminates() {
    let mut samples = vec![RGB::new(1, 2, 3)];
    assert_eq!(vec![RGB::new(1, 2, 3)], mediancut_no_fill(&mut samples, 256));
    let pal = mediancut(&Attributes::new(), &mut samples, 256, 100, &mut StdRng::seed_from_u64(0));
    assert_eq!(256, pal.len());
    assert!(pal.iter().all(|&c| c == RGB::new(1, 2, 3)));
}
