use bytes::Bytes;
use color_eyre::{eyre::eyre, Result};
use jpeg_decoder::{Decoder, PixelFormat};

use super::frame::DecodedFrame;

/// Decode one delimited JPEG into an RGB24 frame.
///
/// Corrupt candidates come straight off the wire; the caller treats a
/// failure here as a skipped frame, not a fault.
pub fn decode_frame(data: &[u8], sequence: u64) -> Result<DecodedFrame> {
    let mut decoder = Decoder::new(data);
    let pixels = decoder.decode()?;
    let info = decoder
        .info()
        .ok_or_else(|| eyre!("decoder produced no image info"))?;

    if info.width == 0 || info.height == 0 {
        return Err(eyre!("zero-sized image"));
    }

    let rgb = match info.pixel_format {
        PixelFormat::RGB24 => pixels,
        PixelFormat::L8 => {
            // Expand grayscale to RGB so downstream sees one format.
            let mut rgb = Vec::with_capacity(pixels.len() * 3);
            for luma in pixels {
                rgb.extend_from_slice(&[luma, luma, luma]);
            }
            rgb
        }
        other => return Err(eyre!("unsupported pixel format: {:?}", other)),
    };

    Ok(DecodedFrame::new(
        Bytes::from(rgb),
        info.width as u32,
        info.height as u32,
        sequence,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_test_jpeg(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([shade, shade, shade]));
        let mut out = Vec::new();
        let mut encoder = image::codecs::jpeg::JpegEncoder::new(&mut out);
        encoder
            .encode_image(&image)
            .expect("encode test jpeg");
        out
    }

    #[test]
    fn decodes_valid_jpeg() {
        let jpeg = encode_test_jpeg(64, 48, 128);
        let frame = decode_frame(&jpeg, 7).expect("decode");
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.sequence, 7);
        assert_eq!(frame.data.len(), 64 * 48 * 3);
    }

    #[test]
    fn rejects_corrupt_bytes() {
        // Valid marker pair around a garbage body.
        let mut bytes = vec![0xFF, 0xD8];
        bytes.extend_from_slice(b"definitely not entropy-coded data");
        bytes.extend_from_slice(&[0xFF, 0xD9]);
        assert!(decode_frame(&bytes, 1).is_err());
    }

    #[test]
    fn rejects_truncated_jpeg() {
        let jpeg = encode_test_jpeg(64, 48, 128);
        assert!(decode_frame(&jpeg[..jpeg.len() / 2], 1).is_err());
    }
}
