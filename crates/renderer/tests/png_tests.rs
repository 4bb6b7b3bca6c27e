//! Tests for PNG encoding functionality.
//!
//! Tests the indexed PNG and RGBA PNG encoders, including:
//! - PNG format selection (auto mode)
//! - Transparency through the tRNS chunk
//! - Decoding the output with the `image` crate

use renderer::png::{create_png, create_png_auto, create_png_indexed, write_png};
use std::collections::HashSet;
use test_utils::temp_output_dir;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

// ============================================================================
// Helper functions
// ============================================================================

/// Pack RGBA bytes into a u32 for color counting
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Classified smoke colors, background first
fn smoke_palette() -> [(u8, u8, u8); 6] {
    [
        (0, 0, 0),
        (0, 228, 0),
        (255, 255, 0),
        (255, 126, 0),
        (255, 0, 0),
        (143, 63, 151),
    ]
}

/// Banded pixel data like a classified plume
fn generate_plume_pixels(width: usize, height: usize) -> Vec<u8> {
    let palette = smoke_palette();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let max_r = (cx * cx + cy * cy).sqrt();
    let mut pixels = Vec::with_capacity(width * height * 4);

    for y in 0..height {
        for x in 0..width {
            let r = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            let idx = ((1.0 - r / max_r) * 5.99) as usize;
            let (r, g, b) = palette[idx.min(5)];
            pixels.extend_from_slice(&[r, g, b, 255]);
        }
    }
    pixels
}

/// Count unique colors in pixel data
fn count_unique_colors(pixels: &[u8]) -> usize {
    let mut unique: HashSet<u32> = HashSet::new();
    for chunk in pixels.chunks_exact(4) {
        unique.insert(pack_color(chunk[0], chunk[1], chunk[2], chunk[3]));
    }
    unique.len()
}

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("decodable PNG")
        .to_rgba8()
}

// ============================================================================
// Basic PNG creation tests
// ============================================================================

#[test]
fn test_create_png_simple() {
    // Simple 2x2 image with 2 colors
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 255, 0, 255, // green
        255, 0, 0, 255, // red
    ];

    let png = create_png_auto(&pixels, 2, 2).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);

    let img = decode(&png);
    assert_eq!(img.dimensions(), (2, 2));
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(1, 0).0, [0, 255, 0, 255]);
}

#[test]
fn test_create_png_rgba_roundtrip_pixels() {
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 0, 255, 255, // blue
        255, 255, 0, 255, // yellow
    ];

    let png = create_png(&pixels, 2, 2).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    assert_eq!(decode(&png).into_raw(), pixels.to_vec());
}

#[test]
fn test_indexed_transparency() {
    let palette = [(10, 20, 30, 255), (0, 0, 0, 0)];
    let indices = [0, 1, 1, 0];

    let png = create_png_indexed(2, 2, &palette, &indices).unwrap();
    let img = decode(&png);
    assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
    assert_eq!(img.get_pixel(1, 0).0[3], 0);
    assert_eq!(img.get_pixel(0, 1).0[3], 0);
}

#[test]
fn test_indexed_rejects_bad_sizes() {
    let palette = [(0, 0, 0, 255)];
    assert!(create_png_indexed(2, 2, &palette, &[0, 0, 0]).is_err());
    assert!(create_png_indexed(1, 1, &[], &[0]).is_err());
    assert!(create_png(&[0, 0, 0], 1, 1).is_err());
}

// ============================================================================
// Format selection tests
// ============================================================================

#[test]
fn test_create_png_rgba_fallback_many_colors() {
    // Create image with >256 unique colors
    let mut pixels = Vec::with_capacity(300 * 4);
    for i in 0..300 {
        pixels.push((i % 256) as u8);
        pixels.push(((i / 2) % 256) as u8);
        pixels.push(((i / 3) % 256) as u8);
        pixels.push(255);
    }

    let png = create_png_auto(&pixels, 300, 1).unwrap();
    assert_eq!(decode(&png).into_raw(), pixels);
}

#[test]
fn test_indexed_smaller_for_classified_data() {
    let pixels = generate_plume_pixels(256, 256);
    assert!(count_unique_colors(&pixels) <= 6);

    let indexed = create_png_auto(&pixels, 256, 256).unwrap();
    let rgba = create_png(&pixels, 256, 256).unwrap();

    assert!(
        indexed.len() < rgba.len(),
        "Indexed PNG ({} bytes) should be smaller than RGBA ({} bytes)",
        indexed.len(),
        rgba.len()
    );
    assert_eq!(decode(&indexed).into_raw(), pixels);
}

// ============================================================================
// Edge case tests
// ============================================================================

#[test]
fn test_single_pixel() {
    let png = create_png_auto(&[255, 0, 0, 255], 1, 1).unwrap();
    assert_eq!(decode(&png).dimensions(), (1, 1));
}

#[test]
fn test_single_color_image() {
    let pixels: Vec<u8> = [128, 64, 32, 255].repeat(100 * 100);
    let png = create_png_auto(&pixels, 100, 100).unwrap();

    // Single color should result in very small file
    assert!(png.len() < 1000, "Single color 100x100 should be very small");
}

#[test]
fn test_all_transparent() {
    let pixels = vec![0u8; 10 * 10 * 4];
    let png = create_png_auto(&pixels, 10, 10).unwrap();
    assert!(decode(&png).pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_grayscale_gradient_plus_one() {
    // 257 colors (one more than max palette size)
    let mut pixels = Vec::with_capacity(257 * 4);
    for i in 0..256 {
        let v = i as u8;
        pixels.extend_from_slice(&[v, v, v, 255]);
    }
    pixels.extend_from_slice(&[128, 0, 0, 255]);

    let png = create_png_auto(&pixels, 257, 1).unwrap();
    assert_eq!(decode(&png).into_raw(), pixels);
}

// ============================================================================
// File output
// ============================================================================

#[test]
fn test_write_png_creates_parent_dirs() {
    let dir = temp_output_dir();
    let path = dir.path().join("PM25").join("100m").join("hourly").join("a.png");

    let png = create_png_auto(&[0, 0, 0, 255], 1, 1).unwrap();
    write_png(&path, &png).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), png);
}
