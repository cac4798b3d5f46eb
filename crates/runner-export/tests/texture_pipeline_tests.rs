//! Integration tests for the texture pipeline
//!
//! A fake in-process encoder stands in for `etc1tool`; it stamps every payload
//! with the level's width so the order can be checked after reading back.

use std::path::Path;

use image::{DynamicImage, GenericImageView, RgbImage, RgbaImage};
use runner_export::textures::{etc1_size, Etc1Encoder, TextureError, TextureResult};
use runner_export::{TextureConvertOptions, TextureConverter};
use runner_format::texture::FLAG_ETC1;
use runner_format::{Parser, TextureParser};

struct StampEncoder;

impl Etc1Encoder for StampEncoder {
    fn encode(&self, level: &DynamicImage) -> TextureResult<Vec<u8>> {
        let (width, height) = level.dimensions();
        Ok(vec![(width % 251) as u8; etc1_size(width, height)])
    }
}

struct FailOnLevel(u32);

impl Etc1Encoder for FailOnLevel {
    fn encode(&self, level: &DynamicImage) -> TextureResult<Vec<u8>> {
        if level.width() == self.0 {
            return Err(TextureError::Encoder("exit status 1".to_string()));
        }
        Ok(vec![0; etc1_size(level.width(), level.height())])
    }
}

fn converter(encoder: impl Etc1Encoder + 'static) -> TextureConverter {
    TextureConverter::with_options(TextureConvertOptions::default(), encoder)
}

fn write_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, y| image::Rgba([x as u8, y as u8, 0, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn test_256_square_gives_nine_levels() {
    let bytes = converter(StampEncoder).pack(&DynamicImage::new_rgb8(256, 256)).unwrap();

    assert_eq!(&bytes[..8], b"RNNRTXTR");
    let texture = TextureParser::new().parse_bytes(&bytes).unwrap();
    assert_eq!(texture.flags, FLAG_ETC1);
    assert_eq!(texture.bytes_per_pixel, 3);

    let sizes: Vec<u32> = texture.mipmaps.iter().map(|m| m.width).collect();
    assert_eq!(sizes, vec![256, 128, 64, 32, 16, 8, 4, 2, 1]);
    for mip in &texture.mipmaps {
        assert_eq!(mip.width, mip.height);
        assert_eq!(mip.data.len(), etc1_size(mip.width, mip.height));
        assert!(mip.data.iter().all(|&b| b == (mip.width % 251) as u8));
    }
}

#[test]
fn test_records_precede_payloads_in_level_order() {
    let bytes = converter(StampEncoder).pack(&DynamicImage::new_rgb8(8, 8)).unwrap();
    let data = &bytes[20..];

    // texture record then 4 mipmap records
    let offsets: Vec<u32> = (0..4)
        .map(|i| {
            let at = 16 + i * 16 + 12;
            u32::from_le_bytes(data[at..at + 4].try_into().unwrap())
        })
        .collect();
    let first_payload = 16 + 4 * 16;
    assert_eq!(offsets[0], first_payload);
    assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(*offsets.last().unwrap() as usize + 8, data.len());
}

#[test]
fn test_encoder_failure_aborts_whole_texture() {
    let err = converter(FailOnLevel(16)).pack(&DynamicImage::new_rgb8(64, 64)).unwrap_err();
    assert!(matches!(err, TextureError::Encoder(_)));
    assert!(err.to_string().contains("16x16"));
}

#[test]
fn test_convert_file_writes_sibling_texture() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("grass.png");
    write_png(&input, 32, 16);

    let output = converter(StampEncoder).convert_file(&input).unwrap();

    assert_eq!(output, dir.path().join("grass.texture"));
    let texture = TextureParser::new().parse_file(&output).unwrap();
    assert_eq!(texture.bytes_per_pixel, 4);
    assert_eq!(texture.mipmaps.len(), 5);
    assert_eq!((texture.mipmaps[4].width, texture.mipmaps[4].height), (2, 1));
}

#[test]
fn test_batch_stops_at_first_failure() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("a.png");
    let missing = dir.path().join("b.png");
    let never = dir.path().join("c.png");
    write_png(&good, 4, 4);
    RgbImage::new(4, 4).save(&never).unwrap();

    let result = converter(StampEncoder).convert_batch(&[&good, &missing, &never]);

    assert!(result.is_err());
    assert!(dir.path().join("a.texture").exists());
    assert!(!dir.path().join("c.texture").exists());
}
