use crate::error::*;
use crate::pal::{color_diff, PalIndex, RGB};
use crate::rayoff::*;
use std::cell::RefCell;

/// Samples counted per task. Large enough that the per-thread bookkeeping doesn't matter.
const CHUNK_SIZE: usize = 4096;

/// Index of the palette color closest to `px`, and its squared distance.
///
/// Linear scan; equally close colors resolve to the lowest index.
#[inline]
#[must_use]
pub fn nearest(px: RGB, colors: &[RGB]) -> (PalIndex, u32) {
    let mut best_idx = 0;
    let mut best_diff = u32::MAX;
    for (idx, &color) in colors.iter().enumerate() {
        let diff = color_diff(px, color);
        if diff < best_diff {
            best_diff = diff;
            best_idx = idx;
        }
    }
    (best_idx as PalIndex, best_diff)
}

/// Share (0-100) of the samples closest to each palette color, aligned with `colors`.
///
/// Pure function of its inputs, so calling it again on the same pixels gives the same numbers.
#[inline(never)]
pub(crate) fn classify(samples: &[RGB], colors: &[RGB]) -> Result<Vec<f64>, Error> {
    if colors.is_empty() || colors.len() > PalIndex::MAX as usize + 1 {
        return Err(ValueOutOfRange);
    }
    if samples.is_empty() {
        return Err(EmptyPixelSet);
    }

    let tls = ThreadLocal::new();
    samples.par_chunks(CHUNK_SIZE).for_each(|chunk| {
        let mut counts = tls.get_or(|| RefCell::new(vec![0usize; colors.len()])).borrow_mut();
        let mut last_match = None;
        for &px in chunk {
            // runs of identical pixels are common in flat artwork
            let matched = match last_match {
                Some((prev_px, prev_idx)) if prev_px == px => prev_idx,
                _ => nearest(px, colors).0,
            };
            last_match = Some((px, matched));
            counts[matched as usize] += 1;
        }
    });

    let counts = tls.into_iter()
        .map(RefCell::into_inner)
        .reduce(|mut total, counts| {
            total.iter_mut().zip(counts).for_each(|(t, c)| *t += c);
            total
        })
        .ok_or(InternalError)?;
    debug_assert_eq!(samples.len(), counts.iter().sum::<usize>());

    let total = samples.len() as f64;
    Ok(counts.into_iter().map(|count| 100. * count as f64 / total).collect())
}

#[test]
fn lowest_index_wins_ties() {
    let colors = [
        RGB::new(0, 0, 0),
        RGB::new(255, 255, 255),
        RGB::new(100, 0, 0),
        RGB::new(0, 255, 0),
        RGB::new(0, 0, 255),
        RGB::new(120, 0, 0),
    ];
    // (110,0,0) is exactly 10 away from both 2 and 5
    assert_eq!((2, 100), nearest(RGB::new(110, 0, 0), &colors));
    assert_eq!((5, 0), nearest(RGB::new(120, 0, 0), &colors));
    assert_eq!((0, 0), nearest(RGB::new(0, 0, 0), &colors[..1]));
    assert_eq!((0, 3 * 255 * 255), nearest(RGB::new(255, 255, 255), &colors[..1]));
}

#[test]
fn percentages_sum_to_100() {
    let colors = [RGB::new(0, 0, 0), RGB::new(128, 128, 128), RGB::new(255, 255, 255)];
    let samples: Vec<_> = (0..7777u32).map(|i| RGB::new((i % 256) as u8, (i * 3 % 256) as u8, (i * 7 % 256) as u8)).collect();
    let pct = classify(&samples, &colors).unwrap();
    assert_eq!(3, pct.len());
    let sum: f64 = pct.iter().sum();
    assert!((99.99..=100.01).contains(&sum), "{sum}");
    assert!(pct.iter().all(|&p| p >= 0. && p <= 100.));

    // same input, same output
    assert_eq!(pct, classify(&samples, &colors).unwrap());
}

#[test]
fn exact_shares() {
    let colors = [RGB::new(10, 10, 10), RGB::new(200, 200, 200), RGB::new(0, 0, 255)];
    let mut samples = vec![RGB::new(12, 9, 10); 30];
    samples.extend(vec![RGB::new(190, 200, 210); 10]);
    assert_eq!(vec![75., 25., 0.], classify(&samples, &colors).unwrap());
}

#[test]
fn empty_inputs() {
    assert_eq!(Err(EmptyPixelSet), classify(&[], &[RGB::new(1, 1, 1)]));
    assert_eq!(Err(ValueOutOfRange), classify(&[RGB::new(1, 1, 1)], &[]));
}
