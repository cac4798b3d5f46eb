//! Mipmap chain construction

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use tracing::trace;

use super::{TextureError, TextureResult};

/// Number of levels down to a 1-pixel short side: `floor(log2(min(w, h))) + 1`
pub fn mipmap_count(width: u32, height: u32) -> u32 {
    let short = width.min(height);
    if short == 0 {
        0
    } else {
        u32::BITS - short.leading_zeros()
    }
}

/// Flip `image` vertically, then halve it level after level.
///
/// Level 0 is the flipped source; every following level is the previous one
/// resized to half its size (rounded down) with `filter`.
pub fn build_chain(image: &DynamicImage, filter: FilterType) -> TextureResult<Vec<DynamicImage>> {
    let (width, height) = image.dimensions();
    let count = mipmap_count(width, height);
    if count == 0 {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    let mut levels = Vec::with_capacity(count as usize);
    let mut level = image.flipv();
    for _ in 1..count {
        let (w, h) = level.dimensions();
        trace!(width = w / 2, height = h / 2, "Downsampling");
        let next = level.resize_exact(w / 2, h / 2, filter);
        levels.push(level);
        level = next;
    }
    levels.push(level);

    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use proptest::prelude::*;

    #[test]
    fn test_mipmap_count() {
        assert_eq!(mipmap_count(256, 256), 9);
        assert_eq!(mipmap_count(256, 64), 7);
        assert_eq!(mipmap_count(100, 300), 7);
        assert_eq!(mipmap_count(1, 1), 1);
        assert_eq!(mipmap_count(0, 16), 0);
    }

    #[test]
    fn test_base_level_is_flipped() {
        let mut img = RgbImage::new(4, 4);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let chain = build_chain(&DynamicImage::ImageRgb8(img), FilterType::Lanczos3).unwrap();

        let base = chain[0].to_rgb8();
        assert_eq!(*base.get_pixel(0, 3), Rgb([255, 0, 0]));
        assert_eq!(*base.get_pixel(0, 0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_empty_image_rejected() {
        let img = DynamicImage::new_rgb8(0, 8);
        assert!(matches!(
            build_chain(&img, FilterType::Nearest),
            Err(TextureError::InvalidDimensions { width: 0, height: 8 })
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_levels_halve_down_to_one(width in 1u32..80, height in 1u32..80) {
            let chain = build_chain(&DynamicImage::new_rgba8(width, height), FilterType::Nearest).unwrap();

            prop_assert_eq!(chain.len() as u32, mipmap_count(width, height));
            prop_assert_eq!(chain[0].dimensions(), (width, height));
            for pair in chain.windows(2) {
                let (w, h) = pair[0].dimensions();
                prop_assert_eq!(pair[1].dimensions(), (w / 2, h / 2));
            }
            let (w, h) = chain[chain.len() - 1].dimensions();
            prop_assert_eq!(w.min(h), 1);
        }
    }
}
