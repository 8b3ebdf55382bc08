use paletteswap::*;

fn stripes(width: usize, height: usize, colors: &[RGBA]) -> Vec<RGBA> {
    (0..width * height).map(|i| colors[(i % width) * colors.len() / width]).collect()
}

#[test]
fn swap_survives_png_roundtrip() {
    let navy = RGBA::new(20, 30, 110, 255);
    let sand = RGBA::new(230, 210, 160, 255);
    let pixels = stripes(64, 48, &[navy, sand]);

    let png = lodepng::encode32(&pixels, 64, 48).unwrap();
    let decoded = lodepng::decode32(&png).unwrap();

    let mut attr = new();
    attr.set_palette_size(2).unwrap();
    attr.set_random_seed(Some(5));
    let img = attr.new_image(decoded.buffer, decoded.width, decoded.height).unwrap();

    let mut session = attr.new_session();
    let palette = session.load(img).unwrap();
    assert_eq!(2, palette.len());
    let entries: Vec<_> = palette.entries().collect();
    assert_eq!("#141e6e", entries[0].hex());
    assert!(!entries[0].is_light());
    assert!(entries[1].is_light());

    session.toggle_selection(1).unwrap();
    assert_eq!(SelectionState::Two, session.toggle_selection(0).unwrap());
    let swapped = session.swap().unwrap();
    assert_eq!(64 * 48, swapped.pixels_changed());
    let palette = swapped.reclassify().unwrap();
    assert_eq!(RGB::new(230, 210, 160), palette.colors()[0]);

    let out = session.into_image().unwrap();
    let png = lodepng::encode32(out.pixels(), out.width(), out.height()).unwrap();
    let back = lodepng::decode32(&png).unwrap();
    assert_eq!(stripes(64, 48, &[sand, navy]), back.buffer);
}

#[test]
fn percentages_follow_coverage() {
    let colors = [
        RGBA::new(250, 250, 250, 255),
        RGBA::new(250, 250, 250, 255),
        RGBA::new(250, 250, 250, 255),
        RGBA::new(5, 5, 5, 255),
    ];
    let mut attr = new();
    attr.set_palette_size(2).unwrap();
    attr.set_quantize_sample_stride(1).unwrap();
    attr.set_classify_sample_stride(1).unwrap();
    let img = attr.new_image(stripes(40, 40, &colors), 40, 40).unwrap();

    let mut session = attr.new_session();
    let palette = session.load(img).unwrap();
    // the dark quarter and a quarter of the light pixels average to mid-gray
    assert_eq!(&[RGB::new(128, 128, 128), RGB::new(250, 250, 250)], palette.colors());
    let pct = palette.percentages().to_vec();
    assert_eq!(vec![25., 75.], pct);
    assert_eq!(&pct[..], session.reclassify().unwrap().percentages());
}

#[test]
fn transparent_pixels_are_ignored_but_swapped() {
    let mut attr = new();
    attr.set_palette_size(2).unwrap();
    attr.set_quantize_sample_stride(1).unwrap();
    attr.set_classify_sample_stride(1).unwrap();
    let red = RGBA::new(200, 0, 0, 255);
    let ghost_green = RGBA::new(0, 200, 0, 0);
    let blue = RGBA::new(0, 0, 200, 255);
    let img = attr.new_image(stripes(30, 10, &[red, ghost_green, blue]), 30, 10).unwrap();

    let mut session = attr.new_session();
    let palette = session.load(img).unwrap();
    // blue sorts first on R
    assert_eq!(&[RGB::new(0, 0, 200), RGB::new(200, 0, 0)], palette.colors());
    assert_eq!(&[50., 50.], palette.percentages());

    session.toggle_selection(0).unwrap();
    session.toggle_selection(1).unwrap();
    drop(session.swap().unwrap());
    let pixels = session.image().unwrap().pixels();
    assert_eq!(RGBA::new(0, 0, 200, 255), pixels[0]);
    assert_eq!(ghost_green, pixels[10]);
    assert_eq!(RGBA::new(200, 0, 0, 255), pixels[20]);
}

#[test]
fn large_image_is_downsampled_for_quantization() {
    let mut attr = new();
    attr.set_palette_size(3).unwrap();
    attr.set_quantize_max_dimension(50).unwrap();
    attr.set_random_seed(Some(3));
    let width = 1000;
    let height = 300;
    let pixels: Vec<_> = (0..width * height).map(|i| {
        let x = i % width;
        RGBA::new((x * 255 / width) as u8, 128, 64, 255)
    }).collect();
    let img = attr.new_image(pixels, width, height).unwrap();

    let mut session = attr.new_session();
    let palette = session.load(img).unwrap();
    assert_eq!(3, palette.len());
    let sum: f64 = palette.percentages().iter().sum();
    assert!((99.99..=100.01).contains(&sum), "{sum}");
    assert_eq!(width, session.image().unwrap().width());
}

#[test]
fn bytes_api() {
    let attr = new();
    assert_eq!(Err(Error::BufferTooSmall), attr.new_image_bytes(&[0; 15], 2, 2).map(|_| ()));
    assert_eq!(Err(Error::ValueOutOfRange), attr.new_image_bytes(&[], 0, 2).map(|_| ()));
    let bytes: Vec<u8> = (0..16).collect();
    let img = attr.new_image_bytes(&bytes, 2, 2).unwrap();
    assert_eq!(RGBA::new(4, 5, 6, 7), img.pixels()[1]);
    assert_eq!(bytes, img.to_bytes());
}

#[test]
fn nearest_is_public() {
    let colors = [RGB::new(0, 0, 0), RGB::new(255, 255, 255)];
    assert_eq!((1, 3), nearest(RGB::new(254, 254, 254), &colors));
    assert_eq!(3, color_diff(RGB::new(254, 254, 254), RGB::new(255, 255, 255)));
}
