use crate::errors::*;
use image::io::Reader;
use image::GenericImageView;
use image::{ImageError, RgbImage};
use log::*;
use std::path::Path;

/// Open and decode an image file, normalized to 8-bit RGB.
///
/// The format is detected from the file contents, the extension is only a
/// fallback, so a PNG named `x.jpg` still decodes. Alpha is dropped and
/// higher bit depths are scaled down, so the returned buffer always has
/// exactly 3 channels. The file handle is closed before this returns.
pub fn load<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path = path.as_ref();
    let decode_err = |cause| Error::Decode {
        path: path.to_path_buf(),
        cause,
    };
    let img = Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| decode_err(ImageError::IoError(err)))?
        .decode()
        .map_err(decode_err)?;
    debug!(
        "decoded {:?}: dimensions={:?} color={:?}",
        path,
        img.dimensions(),
        img.color()
    );
    Ok(img.into_rgb8())
}
