use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::Builder;

use crate::error::SpecimenError;

pub const IMAGES_DIR: &str = "images";
pub const METADATA_FILE: &str = "metadata.csv";
pub const FAILURE_LOG_FILE: &str = "undownloaded-images.txt";
pub const BAD_IMAGES_FILE: &str = "bad-images.txt";
pub const IMAGE_EXT: &str = "jpg";

#[derive(Debug, Clone)]
pub struct Layout {
    root: Utf8PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_path(root: &Path) -> Result<Self, SpecimenError> {
        let root = Utf8PathBuf::from_path_buf(root.to_path_buf()).map_err(|path| {
            SpecimenError::Filesystem(format!("non UTF-8 path {}", path.display()))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn images_dir(&self) -> Utf8PathBuf {
        self.root.join(IMAGES_DIR)
    }

    pub fn image_path(&self, image_id: &str) -> Utf8PathBuf {
        self.images_dir().join(image_file_name(image_id))
    }

    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.root.join(METADATA_FILE)
    }

    pub fn failure_log_path(&self) -> Utf8PathBuf {
        self.root.join(FAILURE_LOG_FILE)
    }

    pub fn bad_images_path(&self) -> Utf8PathBuf {
        self.root.join(BAD_IMAGES_FILE)
    }

    pub fn ensure_images_dir(&self) -> Result<(), SpecimenError> {
        fs::create_dir_all(self.images_dir().as_std_path())
            .map_err(|err| SpecimenError::Filesystem(err.to_string()))
    }

    pub fn has_images_dir(&self) -> bool {
        self.images_dir().as_std_path().is_dir()
    }
}

pub fn image_file_name(image_id: &str) -> String {
    format!("{image_id}.{IMAGE_EXT}")
}

pub fn existing_image_ids(dir: &Path) -> Result<HashSet<String>, SpecimenError> {
    let mut ids = HashSet::new();
    if !dir.exists() {
        return Ok(ids);
    }
    let entries = fs::read_dir(dir).map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    for entry in entries {
        let entry = entry.map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(stem) = name.split('.').next().filter(|stem| !stem.is_empty()) {
            ids.insert(stem.to_string());
        }
    }
    Ok(ids)
}

pub fn write_bytes_atomic(path: &Path, content: &[u8]) -> Result<(), SpecimenError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    let mut temp = Builder::new()
        .prefix(".herbarium-part")
        .tempfile_in(parent)
        .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    Ok(())
}

pub fn append_line(path: &Path, line: &str) -> Result<(), SpecimenError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    writeln!(file, "{line}").map_err(|err| SpecimenError::Filesystem(err.to_string()))
}

pub fn write_lines(path: &Path, lines: &[String]) -> Result<(), SpecimenError> {
    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    write_bytes_atomic(path, content.as_bytes())
}
