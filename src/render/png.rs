//! PNG encoding for RGBA image data.
//!
//! Writes 8-bit RGBA (color type 6) PNGs: signature, IHDR, one zlib IDAT
//! with unfiltered scanlines, IEND. Small chart images compress well
//! enough without a palette pass.

use crate::errors::{ClimaPrepError, Result};
use std::io::Write;

/// Encode RGBA pixel data (4 bytes per pixel, row-major) as a PNG.
pub fn encode_png(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    debug_assert_eq!(pixels.len(), width * height * 4);

    let mut png = Vec::new();

    // PNG signature
    png.extend_from_slice(&[137, 80, 78, 71, 13, 10, 26, 10]);

    // IHDR chunk
    let mut ihdr_data = Vec::new();
    ihdr_data.extend_from_slice(&(width as u32).to_be_bytes());
    ihdr_data.extend_from_slice(&(height as u32).to_be_bytes());
    ihdr_data.push(8); // bit depth
    ihdr_data.push(6); // color type (RGBA)
    ihdr_data.push(0); // compression method
    ihdr_data.push(0); // filter method
    ihdr_data.push(0); // interlace method
    write_chunk(&mut png, b"IHDR", &ihdr_data);

    // IDAT chunk (image data)
    let idat_data = deflate_idat_rgba(pixels, width, height)?;
    write_chunk(&mut png, b"IDAT", &idat_data);

    // IEND chunk
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Write a PNG chunk: length, type, data, CRC over type+data
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let crc_data = [chunk_type.as_slice(), data].concat();
    let crc = crc32fast::hash(&crc_data);
    png.extend_from_slice(&crc.to_be_bytes());
}

/// Deflate RGBA image data for the IDAT chunk.
fn deflate_idat_rgba(pixels: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    // Filter byte (0 = no filter) prepended to each scanline
    let mut uncompressed = Vec::with_capacity(height * (1 + width * 4));
    for y in 0..height {
        uncompressed.push(0);
        let row_start = y * width * 4;
        uncompressed.extend_from_slice(&pixels[row_start..row_start + width * 4]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&uncompressed)
        .map_err(|e| ClimaPrepError::Generic(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| ClimaPrepError::Generic(format!("IDAT compression failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_signature_and_chunks() {
        let pixels = vec![255u8; 4 * 4]; // 2x2 white
        let png = encode_png(&pixels, 2, 2).unwrap();

        assert_eq!(&png[..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
        // IHDR follows the signature
        assert_eq!(&png[12..16], b"IHDR");
        // IEND terminates the stream
        assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
    }

    #[test]
    fn ihdr_records_dimensions() {
        let pixels = vec![0u8; 3 * 5 * 4];
        let png = encode_png(&pixels, 3, 5).unwrap();
        assert_eq!(&png[16..20], &3u32.to_be_bytes());
        assert_eq!(&png[20..24], &5u32.to_be_bytes());
    }
}
