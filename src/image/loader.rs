use crate::utils::error::DecodeError;
use base64::Engine;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};

/// 单帧最大字节数
pub const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024;

pub struct ImageLoader;

impl ImageLoader {
    /// 从base64字符串加载图像，支持 `data:image/xxx;base64,` 前缀
    pub fn from_base64(base64_data: &str) -> Result<RgbImage, DecodeError> {
        let trimmed = base64_data.trim();
        let base64_clean = match trimmed.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => trimmed,
        };

        if base64_clean.is_empty() {
            return Err(DecodeError::Empty);
        }

        let image_bytes = base64::engine::general_purpose::STANDARD.decode(base64_clean)?;
        Self::from_bytes(&image_bytes)
    }

    /// 从字节流加载图像
    pub fn from_bytes(bytes: &[u8]) -> Result<RgbImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(DecodeError::TooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        let format = image::guess_format(bytes)?;
        if !Self::is_supported_format(format) {
            return Err(DecodeError::UnsupportedFormat(format!("{:?}", format)));
        }

        let image = image::load_from_memory_with_format(bytes, format)?;
        Self::validate_dimensions(&image)?;

        Ok(image.to_rgb8())
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }

    /// 验证图像尺寸
    pub fn validate_dimensions(image: &DynamicImage) -> Result<(), DecodeError> {
        let (width, height) = image.dimensions();

        if width < 16 || height < 16 {
            return Err(DecodeError::InvalidDimensions(format!(
                "{}x{}, minimum 16x16",
                width, height
            )));
        }

        if width > 8192 || height > 8192 {
            return Err(DecodeError::InvalidDimensions(format!(
                "{}x{}, maximum 8192x8192",
                width, height
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn decodes_data_url() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(32, 24));
        let image = ImageLoader::from_base64(&format!("data:image/png;base64,{}", encoded)).unwrap();
        assert_eq!(image.dimensions(), (32, 24));
    }

    #[test]
    fn decodes_plain_base64() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(png_bytes(16, 16));
        assert!(ImageLoader::from_base64(&encoded).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            ImageLoader::from_base64("not base64!!"),
            Err(DecodeError::Base64(_))
        ));
        assert!(matches!(ImageLoader::from_base64(""), Err(DecodeError::Empty)));
        assert!(ImageLoader::from_bytes(b"plain text, not an image").is_err());
    }

    #[test]
    fn rejects_tiny_images() {
        assert!(matches!(
            ImageLoader::from_bytes(&png_bytes(8, 8)),
            Err(DecodeError::InvalidDimensions(_))
        ));
    }
}
