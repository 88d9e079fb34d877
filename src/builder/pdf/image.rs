//! Raster images prepared for embedding as PDF image XObjects.

use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{Error, Result};

/// An RGB image, zlib-compressed for a `FlateDecode` stream.
#[derive(Debug, Clone)]
pub(crate) struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl ImageXObject {
    /// Decode an image file (PNG or JPEG).
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let failure = |reason: String| Error::Image {
            path: path.to_path_buf(),
            reason,
        };
        if !path.is_file() {
            return Err(failure("file not found".to_string()));
        }

        let decoded = image::open(path).map_err(|e| failure(e.to_string()))?;
        let rgb = decoded.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 {
            return Err(failure("image has no pixels".to_string()));
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(rgb.as_raw())?;
        let data = encoder.finish()?;

        log::debug!(
            "Loaded image {} ({}x{}, {} bytes compressed)",
            path.display(),
            width,
            height,
            data.len()
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Natural size in points, one pixel per point (72 dpi).
    pub(crate) fn natural_size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32)
    }

    /// Display size for a requested size, keeping the aspect ratio when only
    /// one side is given and shrinking to fit `max_width` x `max_height`.
    pub(crate) fn display_size(
        &self,
        width: f32,
        height: f32,
        max_width: f32,
        max_height: f32,
    ) -> (f32, f32) {
        let (natural_w, natural_h) = self.natural_size();
        let (mut w, mut h) = match (width > 0.0, height > 0.0) {
            (true, true) => (width, height),
            (true, false) => (width, width * natural_h / natural_w),
            (false, true) => (height * natural_w / natural_h, height),
            (false, false) => (natural_w, natural_h),
        };

        let scale = (max_width / w).min(max_height / h).min(1.0);
        if scale < 1.0 {
            w *= scale;
            h *= scale;
        }
        (w, h)
    }
}
