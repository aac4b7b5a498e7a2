//! Rotate an image file in place.

use super::{display_name, FileOperation, OperationKind, OperationState};
use crate::core::metadata::Rotation;
use crate::core::scanner::ImageFormat;
use crate::error::{OperationError, OperationResult};
use image::{DynamicImage, ImageError, ImageReader};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Rotates the image at `path` by a signed multiple of 90 degrees
/// (negative = counter-clockwise).
///
/// The rotated image is encoded to a temp file beside the original and
/// swapped in with a rename, so a failed decode or encode leaves the
/// original bytes untouched. JPEG output is re-compressed on every pass.
#[derive(Debug)]
pub struct RotateOperation {
    path: PathBuf,
    degrees: i32,
    rotation: Rotation,
    applied: bool,
    description: String,
}

impl RotateOperation {
    pub fn new(path: impl Into<PathBuf>, degrees: i32) -> OperationResult<Self> {
        let rotation =
            Rotation::from_degrees(degrees).ok_or(OperationError::InvalidAngle { degrees })?;
        let path = path.into();
        let description = format!("Rotate {} {}°", display_name(&path), degrees);
        Ok(Self {
            path,
            degrees,
            rotation,
            applied: false,
            description,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn degrees(&self) -> i32 {
        self.degrees
    }
}

impl FileOperation for RotateOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Rotate
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn state(&self) -> OperationState {
        if self.applied {
            OperationState::Applied
        } else {
            OperationState::Unexecuted
        }
    }

    fn apply(&mut self) -> OperationResult<()> {
        if self.applied {
            return Err(OperationError::AlreadyApplied {
                description: self.description.clone(),
            });
        }
        rotate_in_place(&self.path, self.rotation)?;
        self.applied = true;
        Ok(())
    }

    fn revert(&mut self) -> OperationResult<()> {
        if !self.applied {
            return Err(OperationError::NotApplied {
                description: self.description.clone(),
            });
        }
        rotate_in_place(&self.path, self.rotation.inverse())?;
        self.applied = false;
        Ok(())
    }

    fn affected_paths(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

/// Decode, rotate clockwise by `rotation`, re-encode, and atomically replace.
pub(crate) fn rotate_in_place(path: &Path, rotation: Rotation) -> OperationResult<()> {
    let metadata = fs::metadata(path).map_err(|e| OperationError::from_io(path, e))?;
    if rotation == Rotation::Rotate0 {
        return Ok(());
    }

    let image = ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| OperationError::from_io(path, e))?
        .decode()
        .map_err(|e| image_error(path, e))?;

    let rotated = match rotation {
        Rotation::Rotate0 => image,
        Rotation::Rotate90 => image.rotate90(),
        Rotation::Rotate180 => image.rotate180(),
        Rotation::Rotate270 => image.rotate270(),
    };

    let format = ImageFormat::from_path(path);
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let io_err = |source: std::io::Error| OperationError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(&mut temp);
        encode(&rotated, format, &mut writer).map_err(|e| image_error(path, e))?;
        writer.flush().map_err(io_err)?;
    }
    temp.as_file().sync_all().map_err(io_err)?;
    temp.as_file()
        .set_permissions(metadata.permissions())
        .map_err(io_err)?;

    // Rename over the original; the temp file is removed if this fails
    temp.persist(path).map_err(|e| io_err(e.error))?;

    debug!(?path, degrees = rotation.degrees(), ?format, "rotated");
    Ok(())
}

fn encode<W: Write + std::io::Seek>(
    image: &DynamicImage,
    format: ImageFormat,
    writer: &mut W,
) -> Result<(), ImageError> {
    let target = format.encoder_format();
    match target {
        // The JPEG encoder rejects alpha and 16-bit buffers
        image::ImageFormat::Jpeg => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(writer, target)
        }
        image::ImageFormat::Bmp if image.color().has_alpha() => {
            DynamicImage::ImageRgba8(image.to_rgba8()).write_to(writer, target)
        }
        image::ImageFormat::Bmp => {
            DynamicImage::ImageRgb8(image.to_rgb8()).write_to(writer, target)
        }
        _ => image.write_to(writer, target),
    }
}

fn image_error(path: &Path, err: ImageError) -> OperationError {
    match err {
        ImageError::IoError(e) => OperationError::from_io(path, e),
        other => OperationError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationErrorKind;
    use image::{GenericImageView, Rgb, RgbImage};
    use tempfile::TempDir;

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

    fn two_pixel_png(dir: &Path, name: &str) -> PathBuf {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, RED);
        img.put_pixel(1, 0, BLUE);
        let path = dir.join(name);
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn rotate_90_turns_clockwise() {
        let dir = TempDir::new().unwrap();
        let path = two_pixel_png(dir.path(), "a.png");

        let mut op = RotateOperation::new(&path, 90).unwrap();
        op.apply().unwrap();

        let rotated = image::open(&path).unwrap().to_rgb8();
        assert_eq!(rotated.dimensions(), (1, 2));
        assert_eq!(*rotated.get_pixel(0, 0), RED);
        assert_eq!(*rotated.get_pixel(0, 1), BLUE);
    }

    #[test]
    fn undo_restores_png_exactly() {
        let dir = TempDir::new().unwrap();
        let path = two_pixel_png(dir.path(), "a.png");
        let before = image::open(&path).unwrap().to_rgb8();

        let mut op = RotateOperation::new(&path, -90).unwrap();
        op.apply().unwrap();
        assert_eq!(image::open(&path).unwrap().dimensions(), (1, 2));

        op.revert().unwrap();

        let after = image::open(&path).unwrap().to_rgb8();
        assert_eq!(before, after);
        assert_eq!(op.state(), OperationState::Unexecuted);
    }

    #[test]
    fn jpeg_round_trip_keeps_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        RgbImage::from_pixel(8, 4, Rgb([120, 80, 40])).save(&path).unwrap();

        let mut op = RotateOperation::new(&path, 270).unwrap();
        op.apply().unwrap();
        assert_eq!(image::open(&path).unwrap().dimensions(), (4, 8));

        op.revert().unwrap();
        assert_eq!(image::open(&path).unwrap().dimensions(), (8, 4));
    }

    #[test]
    fn rejects_non_right_angles() {
        let err = RotateOperation::new("/photos/a.jpg", 45).unwrap_err();
        assert_eq!(err.kind(), OperationErrorKind::InvalidAngle);
    }

    #[test]
    fn corrupt_image_is_left_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let mut op = RotateOperation::new(&path, 90).unwrap();
        let err = op.apply().unwrap_err();

        assert_eq!(err.kind(), OperationErrorKind::DecodeFailure);
        assert_eq!(fs::read(&path).unwrap(), b"definitely not a png");
        assert_eq!(op.state(), OperationState::Unexecuted);
        // No stray temp files left beside the original
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let mut op = RotateOperation::new(dir.path().join("gone.png"), 180).unwrap();
        assert_eq!(op.apply().unwrap_err().kind(), OperationErrorKind::NotFound);
    }

    #[test]
    fn description_keeps_sign() {
        let op = RotateOperation::new("/photos/a.jpg", -90).unwrap();
        assert_eq!(op.description(), "Rotate a.jpg -90°");
        assert_eq!(op.degrees(), -90);
    }

    #[cfg(unix)]
    #[test]
    fn permissions_survive_rotation() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = two_pixel_png(dir.path(), "a.png");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut op = RotateOperation::new(&path, 180).unwrap();
        op.apply().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }
}
