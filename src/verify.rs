use std::fs;
use std::path::Path;

use image::ImageReader;
use tracing::warn;

use crate::error::SpecimenError;
use crate::store::{IMAGE_EXT, write_lines};

pub fn verify_images(dir: &Path) -> Result<Vec<String>, SpecimenError> {
    let entries = fs::read_dir(dir).map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|name| name.to_str())
            && name.ends_with(&format!(".{IMAGE_EXT}"))
        {
            names.push(name.to_string());
        }
    }
    names.sort();

    let mut bad = Vec::new();
    for name in names {
        if let Err(err) = check_image(&dir.join(&name)) {
            warn!(image = %name, error = %err, "image failed verification");
            bad.push(name);
        }
    }
    Ok(bad)
}

pub fn check_image(path: &Path) -> Result<(), SpecimenError> {
    let decode_err = |message: String| SpecimenError::ImageDecode {
        path: path.to_path_buf(),
        message,
    };
    ImageReader::open(path)
        .map_err(|err| decode_err(err.to_string()))?
        .with_guessed_format()
        .map_err(|err| decode_err(err.to_string()))?
        .decode()
        .map_err(|err| decode_err(err.to_string()))?;
    Ok(())
}

pub fn write_bad_image_report(path: &Path, names: &[String]) -> Result<(), SpecimenError> {
    write_lines(path, names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_jpeg_is_reported() {
        let temp = tempfile::tempdir().unwrap();
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 200, 30]))
            .save(temp.path().join("good.jpg"))
            .unwrap();
        let bytes = fs::read(temp.path().join("good.jpg")).unwrap();
        fs::write(temp.path().join("bad.jpg"), &bytes[..20]).unwrap();
        fs::write(temp.path().join("notes.txt"), b"ignored").unwrap();

        let bad = verify_images(temp.path()).unwrap();
        assert_eq!(bad, vec!["bad.jpg".to_string()]);
    }
}
