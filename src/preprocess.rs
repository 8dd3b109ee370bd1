//! Turn decoded images into the tensor layout the classifier was trained on.
//!
//! The pipeline is: stretch to 256x256 with Lanczos3, cut out the centered
//! 224x224 square, cast to f32, reorder RGB to BGR, subtract the per-channel
//! means and add a batch dimension. There is no scaling to `[0, 1]` and no
//! std normalization.

use crate::errors::*;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, ImageOutputFormat, RgbImage};
use log::*;
use tract_onnx::prelude::tract_ndarray::Array4;

/// Side length the image is stretched to before cropping
pub const RESIZE: u32 = 256;
/// Side length of the centered crop fed into the model
pub const CROP: u32 = 224;
/// Channel means in B, G, R order
pub const MEAN_BGR: [f32; 3] = [104.0, 117.0, 123.0];
/// Quality used when re-encoding in [`Mode::JpegRoundTrip`]
pub const JPEG_QUALITY: u8 = 75;

/// How the resized image is handed to the crop step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Crop the resized pixels directly
    Simple,
    /// Encode the resized image as JPEG and decode it again before cropping.
    ///
    /// This reproduces the compression artifacts the original Caffe model
    /// saw during training and shifts scores slightly.
    JpegRoundTrip,
}

impl Default for Mode {
    fn default() -> Mode {
        Mode::Simple
    }
}

/// Produce a `[1, 224, 224, 3]` BGR, mean-subtracted tensor from an RGB image.
///
/// The output shape does not depend on the input dimensions. Images are
/// stretched, not letterboxed, so the aspect ratio is lost.
pub fn preprocess(image: &RgbImage, mode: Mode) -> Result<Array4<f32>> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::Preprocess(format!(
            "image has no pixels ({}x{})",
            width, height
        )));
    }

    let mut resized = resize(image);
    if mode == Mode::JpegRoundTrip {
        resized = jpeg_round_trip(resized)?;
    }

    let cropped = center_crop(&resized, CROP)?;
    let tensor = to_bgr_tensor(&cropped);
    trace!("preprocessed {}x{} into {:?}", width, height, tensor.shape());
    Ok(tensor)
}

/// Stretch to exactly `RESIZE`x`RESIZE` with a Lanczos3 filter
pub fn resize(image: &RgbImage) -> RgbImage {
    imageops::resize(image, RESIZE, RESIZE, FilterType::Lanczos3)
}

fn jpeg_round_trip(image: RgbImage) -> Result<RgbImage> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY))
        .map_err(|err| Error::Preprocess(format!("jpeg encode failed: {}", err)))?;
    let decoded = image::load_from_memory_with_format(&buf, ImageFormat::Jpeg)
        .map_err(|err| Error::Preprocess(format!("jpeg decode failed: {}", err)))?;
    Ok(decoded.into_rgb8())
}

/// Cut the centered `size`x`size` square out of `image`.
///
/// Offsets use floor division, `(dim - size) / 2`, so odd margins put the
/// extra pixel on the right/bottom.
pub fn center_crop(image: &RgbImage, size: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width < size || height < size {
        return Err(Error::Preprocess(format!(
            "can't crop {}x{} out of {}x{}",
            size, size, width, height
        )));
    }

    let left = (width - size) / 2;
    let top = (height - size) / 2;
    Ok(imageops::crop_imm(image, left, top, size, size).to_image())
}

/// Cast to f32, reverse channels to BGR, subtract [`MEAN_BGR`], add the batch axis
pub fn to_bgr_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    Array4::from_shape_fn(
        (1, height as usize, width as usize, 3),
        |(_, y, x, c)| {
            let px = image.get_pixel(x as u32, y as u32);
            f32::from(px[2 - c]) - MEAN_BGR[c]
        },
    )
}
