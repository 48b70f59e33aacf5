//! Fixtures shared by unit tests.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Tag, Value};

/// Smallest baseline JPEG we can build by hand: one 1x1 grey block.
pub fn tiny_jpeg() -> Vec<u8> {
    let mut b = vec![0xFF, 0xD8];
    // APP0 / JFIF
    b.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
    b.extend_from_slice(b"JFIF\0");
    b.extend_from_slice(&[0x01, 0x01, 0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00]);
    // DQT
    b.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    b.extend_from_slice(&[0x01; 64]);
    // SOF0, 1x1, one component
    b.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00]);
    // DHT, DC then AC, each a single 1-bit code for symbol 0
    for class in [0x00, 0x10] {
        b.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, class, 0x01]);
        b.extend_from_slice(&[0x00; 15]);
        b.push(0x00);
    }
    // SOS
    b.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    b.push(0x3F);
    b.extend_from_slice(&[0xFF, 0xD9]);
    b
}

/// 1x1 greyscale PNG: IHDR, one IDAT, IEND.
pub fn tiny_png() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
        0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3A, 0x7E, 0x9B, 0x55, // IHDR
        0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60, 0x00, 0x00,
        0x00, 0x02, 0x00, 0x01, 0x48, 0xAF, 0xA4, 0x71, // IDAT
        0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82, // IEND
    ]
}

/// 1x1 lossless WebP (simple format, a lone VP8L chunk).
pub fn tiny_webp() -> Vec<u8> {
    let mut b = b"RIFF\x1a\x00\x00\x00WEBPVP8L\x0d\x00\x00\x00".to_vec();
    b.extend_from_slice(&[0x2F, 0x00, 0x00, 0x00, 0x10, 0x07, 0x10, 0x11, 0x11, 0x88, 0x88, 0xFE, 0x07]);
    // pad to even chunk length
    b.push(0x00);
    b
}

fn read_ascii(path: &Path, tag: Tag) -> Option<String> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    let field = exif.get_field(tag, In::PRIMARY)?;
    match &field.value {
        Value::Ascii(parts) => parts
            .first()
            .map(|p| String::from_utf8_lossy(p).into_owned()),
        _ => None,
    }
}

pub fn date_time_original(path: &Path) -> Option<String> {
    read_ascii(path, Tag::DateTimeOriginal)
}

pub fn image_description(path: &Path) -> Option<String> {
    read_ascii(path, Tag::ImageDescription)
}

pub fn mtime_secs(path: &Path) -> i64 {
    filetime::FileTime::from_last_modification_time(&std::fs::metadata(path).unwrap()).unix_seconds()
}
