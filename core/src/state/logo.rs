use crate::error::{CoreError, CoreResult};
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

pub const ALLOWED_LOGO_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/bmp", "image/gif"];
pub const LOGO_TYPE_MESSAGE: &str = "Please upload a JPEG, PNG, BMP, or GIF image.";

const LOGO_SCALE: f64 = 0.5;

/// The embedded image: raw bytes plus the display size in pixels (half the
/// natural size).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLogo {
    pub data: Vec<u8>,
    pub mime: String,
    pub width: u32,
    pub height: u32,
}

impl ImageLogo {
    pub fn from_path(path: &Path) -> CoreResult<Self> {
        let mime = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let data = std::fs::read(path)?;
        Self::from_bytes(data, &mime)
    }

    pub fn from_bytes(data: Vec<u8>, mime: &str) -> CoreResult<Self> {
        if !ALLOWED_LOGO_TYPES.contains(&mime) {
            return Err(CoreError::Validation(LOGO_TYPE_MESSAGE.to_string()));
        }
        let reader = ImageReader::new(Cursor::new(&data))
            .with_guessed_format()
            .map_err(|e| CoreError::Image(e.to_string()))?;
        let sniffed = match reader.format() {
            Some(f @ (ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp)) => f,
            _ => return Err(CoreError::Validation(LOGO_TYPE_MESSAGE.to_string())),
        };
        if sniffed.to_mime_type() != mime {
            return Err(CoreError::Validation(format!(
                "logo declared as {} but the file is {}",
                mime,
                sniffed.to_mime_type()
            )));
        }
        let (w, h) = reader
            .into_dimensions()
            .map_err(|e| CoreError::Image(e.to_string()))?;
        Ok(Self {
            data,
            mime: mime.to_string(),
            width: scale(w),
            height: scale(h),
        })
    }

    /// The logo as PNG, which is how it is embedded in the report.
    pub fn png_data(&self) -> CoreResult<Vec<u8>> {
        if self.mime == "image/png" {
            return Ok(self.data.clone());
        }
        let img = image::load_from_memory(&self.data).map_err(|e| CoreError::Image(e.to_string()))?;
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png)
            .map_err(|e| CoreError::Image(e.to_string()))?;
        Ok(out.into_inner())
    }
}

fn scale(px: u32) -> u32 {
    ((px as f64) * LOGO_SCALE).round().max(1.0) as u32
}
