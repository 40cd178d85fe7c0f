//! Raster images as PDF XObjects
//!
//! JPEG data is embedded untouched behind `DCTDecode`. PNG data is decoded,
//! flattened onto a white page background and stored behind `FlateDecode`.

use crate::{fmt_num, PdfError, Result};
use image::{DynamicImage, ImageFormat};
use lopdf::{dictionary, Object, Stream};
use std::io::Write;

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// How an image is fitted into its slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageScaleMode {
    /// Fill the slot exactly
    Stretch,
    /// Largest size that fits the slot without distortion
    #[default]
    FitBox,
}

impl ImageScaleMode {
    /// Display size in points for a `pixels` image placed in a `slot`
    pub fn fit(self, pixels: (u32, u32), slot: (f64, f64)) -> (f64, f64) {
        let (px_w, px_h) = pixels;
        if px_w == 0 || px_h == 0 || self == ImageScaleMode::Stretch {
            return slot;
        }
        let scale = (slot.0 / px_w as f64).min(slot.1 / px_h as f64);
        (px_w as f64 * scale, px_h as f64 * scale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    DeviceGray,
    DeviceRgb,
}

impl ColorSpace {
    fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::DeviceGray => "DeviceGray",
            ColorSpace::DeviceRgb => "DeviceRGB",
        }
    }
}

/// Stream filter the image data is stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    Dct,
    Flate,
}

impl ImageFilter {
    fn pdf_name(self) -> &'static str {
        match self {
            ImageFilter::Dct => "DCTDecode",
            ImageFilter::Flate => "FlateDecode",
        }
    }
}

/// Image ready to be written as a PDF XObject
#[derive(Debug, Clone)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub filter: ImageFilter,
    /// Encoded sample data, 8 bits per component
    pub data: Vec<u8>,
}

fn is_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8, 0xFF])
}

/// Width, height and component count from the JPEG frame header
fn jpeg_frame(data: &[u8]) -> Option<(u32, u32, u8)> {
    let read_u16 = |at: usize| -> Option<usize> {
        Some(u16::from_be_bytes([*data.get(at)?, *data.get(at + 1)?]) as usize)
    };

    let mut pos = 2;
    loop {
        // Skip fill bytes between segments
        while *data.get(pos)? == 0xFF && *data.get(pos + 1)? == 0xFF {
            pos += 1;
        }
        if *data.get(pos)? != 0xFF {
            return None;
        }
        let marker = *data.get(pos + 1)?;
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let height = read_u16(pos + 5)? as u32;
            let width = read_u16(pos + 7)? as u32;
            let components = *data.get(pos + 9)?;
            return Some((width, height, components));
        }
        let length = read_u16(pos + 2)?;
        if length < 2 {
            return None;
        }
        pos += 2 + length;
    }
}

/// Composite a sample over white
fn flatten(sample: u8, alpha: u8) -> u8 {
    let (sample, alpha) = (sample as u32, alpha as u32);
    ((sample * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

impl ImageXObject {
    /// Build from JPEG or PNG file bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if is_jpeg(data) {
            Self::from_jpeg(data)
        } else if data.starts_with(&PNG_SIGNATURE) {
            Self::from_png(data)
        } else {
            Err(PdfError::ImageError(
                "Unsupported image format, expected JPEG or PNG".to_string(),
            ))
        }
    }

    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let (width, height, components) = jpeg_frame(data)
            .ok_or_else(|| PdfError::ImageError("Could not read JPEG frame header".to_string()))?;

        let color_space = match components {
            1 => ColorSpace::DeviceGray,
            3 => ColorSpace::DeviceRgb,
            other => {
                return Err(PdfError::ImageError(format!(
                    "Unsupported JPEG with {other} color components"
                )))
            }
        };

        Ok(Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Dct,
            data: data.to_vec(),
        })
    }

    pub fn from_png(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Png)?;
        let (width, height) = (decoded.width(), decoded.height());
        let color = decoded.color();

        let (color_space, samples) = match (color.has_color(), color.has_alpha()) {
            (false, false) => (ColorSpace::DeviceGray, decoded.into_luma8().into_raw()),
            (false, true) => (
                ColorSpace::DeviceGray,
                decoded
                    .into_luma_alpha8()
                    .pixels()
                    .map(|p| flatten(p[0], p[1]))
                    .collect(),
            ),
            (true, false) => (ColorSpace::DeviceRgb, decoded.into_rgb8().into_raw()),
            (true, true) => (ColorSpace::DeviceRgb, flatten_rgba(decoded)),
        };

        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&samples)?;

        Ok(Self {
            width,
            height,
            color_space,
            filter: ImageFilter::Flate,
            data: encoder.finish()?,
        })
    }

    pub fn to_pdf_stream(&self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => Object::Name(self.color_space.pdf_name().as_bytes().to_vec()),
            "BitsPerComponent" => 8_i64,
            "Filter" => Object::Name(self.filter.pdf_name().as_bytes().to_vec()),
        };
        Stream::new(dict, self.data.clone())
    }
}

fn flatten_rgba(image: DynamicImage) -> Vec<u8> {
    image
        .into_rgba8()
        .pixels()
        .flat_map(|p| [flatten(p[0], p[3]), flatten(p[1], p[3]), flatten(p[2], p[3])])
        .collect()
}

/// Operators painting image resource `name` with its lower-left corner at
/// (`x`, `y`) in PDF coordinates
pub fn image_operators(name: &str, x: f64, y: f64, width: f64, height: f64) -> Vec<u8> {
    format!(
        "q\n{} 0 0 {} {} {} cm\n/{name} Do\nQ\n",
        fmt_num(width),
        fmt_num(height),
        fmt_num(x),
        fmt_num(y)
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn baseline_jpeg_header() -> Vec<u8> {
        vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0 with empty payload
            0xFF, 0xC0, 0x00, 0x11, 0x08, // SOF0, precision 8
            0x00, 0x64, // height 100
            0x00, 0xC8, // width 200
            0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01, // components
            0xFF, 0xD9, // EOI
        ]
    }

    fn png(image: DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn inflate(data: &[u8]) -> Vec<u8> {
        let mut raw = Vec::new();
        std::io::Read::read_to_end(&mut flate2::read::ZlibDecoder::new(data), &mut raw).unwrap();
        raw
    }

    #[test]
    fn test_jpeg_frame_after_app_segment() {
        let xobject = ImageXObject::from_bytes(&baseline_jpeg_header()).unwrap();
        assert_eq!((xobject.width, xobject.height), (200, 100));
        assert_eq!(xobject.color_space, ColorSpace::DeviceRgb);
        assert_eq!(xobject.filter, ImageFilter::Dct);
        assert_eq!(xobject.data, baseline_jpeg_header());
    }

    #[test]
    fn test_cmyk_jpeg_is_rejected() {
        let mut header = baseline_jpeg_header();
        header[17] = 0x04;
        let err = ImageXObject::from_bytes(&header).unwrap_err();
        assert!(matches!(err, PdfError::ImageError(ref msg) if msg.contains("4 color components")));
    }

    #[test]
    fn test_truncated_jpeg() {
        let header = baseline_jpeg_header();
        assert!(ImageXObject::from_jpeg(&header[..12]).is_err());
    }

    #[test]
    fn test_unknown_bytes() {
        let err = ImageXObject::from_bytes(b"GIF89a....").unwrap_err();
        assert!(matches!(err, PdfError::ImageError(_)));
        assert!(ImageXObject::from_bytes(&[]).is_err());
    }

    #[test]
    fn test_transparent_png_is_flattened_on_white() {
        let pixels = image::RgbaImage::from_raw(2, 1, vec![0, 0, 0, 0, 10, 20, 30, 255]).unwrap();
        let xobject = ImageXObject::from_bytes(&png(DynamicImage::ImageRgba8(pixels))).unwrap();

        assert_eq!(xobject.color_space, ColorSpace::DeviceRgb);
        assert_eq!(xobject.filter, ImageFilter::Flate);
        assert_eq!(inflate(&xobject.data), vec![255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn test_gray_png() {
        let pixels = image::GrayImage::from_raw(1, 2, vec![0, 200]).unwrap();
        let xobject = ImageXObject::from_bytes(&png(DynamicImage::ImageLuma8(pixels))).unwrap();

        assert_eq!(xobject.color_space, ColorSpace::DeviceGray);
        assert_eq!((xobject.width, xobject.height), (1, 2));
        assert_eq!(inflate(&xobject.data), vec![0, 200]);
    }

    #[test]
    fn test_pdf_stream_dictionary() {
        let stream = ImageXObject::from_jpeg(&baseline_jpeg_header())
            .unwrap()
            .to_pdf_stream();

        assert_eq!(stream.dict.get(b"Subtype").unwrap().as_name().unwrap(), b"Image");
        assert_eq!(stream.dict.get(b"Width").unwrap().as_i64().unwrap(), 200);
        assert_eq!(
            stream.dict.get(b"Filter").unwrap().as_name().unwrap(),
            b"DCTDecode"
        );
        assert_eq!(
            stream.dict.get(b"ColorSpace").unwrap().as_name().unwrap(),
            b"DeviceRGB"
        );
    }

    #[test]
    fn test_fit_preserves_aspect_ratio() {
        // A 20x24 logo in the 50x57 header slot is height-limited
        assert_eq!(ImageScaleMode::FitBox.fit((20, 24), (50.0, 57.0)), (47.5, 57.0));
        assert_eq!(ImageScaleMode::FitBox.fit((800, 600), (100.0, 200.0)), (100.0, 75.0));
    }

    #[test]
    fn test_fit_stretch_and_degenerate() {
        assert_eq!(ImageScaleMode::Stretch.fit((800, 600), (100.0, 200.0)), (100.0, 200.0));
        assert_eq!(ImageScaleMode::FitBox.fit((0, 10), (50.0, 57.0)), (50.0, 57.0));
    }

    #[test]
    fn test_image_operators() {
        let ops = String::from_utf8(image_operators("Im1", 28.0, 757.0, 47.5, 57.0)).unwrap();
        assert_eq!(ops, "q\n47.5 0 0 57 28 757 cm\n/Im1 Do\nQ\n");
    }
}
