// Decoding lives outside the census engine; this helper is the thin bridge the
// binary uses to turn an image file into an owned RGBA8 buffer.

pub mod image_helper {
    use crate::error::AppError;
    use crate::pipeline::Bitmap;
    use std::path::Path;

    /// An owned, row-major RGBA8 image.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DecodedImage {
        pub width: u32,
        pub height: u32,
        pub data: Vec<u8>,
    }

    impl DecodedImage {
        pub fn as_bitmap(&self) -> Bitmap<'_> {
            Bitmap {
                width: self.width,
                height: self.height,
                data: &self.data,
            }
        }
    }

    impl From<image::DynamicImage> for DecodedImage {
        fn from(image: image::DynamicImage) -> Self {
            let rgba = image.into_rgba8();
            Self {
                width: rgba.width(),
                height: rgba.height(),
                data: rgba.into_raw(),
            }
        }
    }

    /// Decodes any format the `image` crate recognises, converting to RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<DecodedImage, AppError> {
        let image = image::ImageReader::open(path.as_ref())
            .map_err(|error| AppError::Read(error, path.as_ref().display().to_string()))?
            .with_guessed_format()
            .map_err(|error| AppError::Read(error, path.as_ref().display().to_string()))?
            .decode()?;
        Ok(image.into())
    }

    /// Decodes an in-memory encoded image (PNG, JPEG, ...).
    pub fn decode(bytes: &[u8]) -> Result<DecodedImage, AppError> {
        Ok(image::load_from_memory(bytes)?.into())
    }
}
