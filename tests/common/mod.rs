#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;

use herbarium_specimens::metadata::{SpecimenRecord, write_canonical};

pub fn jpeg_bytes() -> Vec<u8> {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        6,
        4,
        image::Rgb([120, 160, 40]),
    ));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Jpeg)
        .unwrap();
    buffer.into_inner()
}

pub fn write_jpeg(path: &Path) {
    std::fs::write(path, jpeg_bytes()).unwrap();
}

pub fn record(
    image_id: &str,
    taxon_id: &str,
    family: &str,
    genus: Option<&str>,
    species: Option<&str>,
    full_name: &str,
) -> SpecimenRecord {
    SpecimenRecord {
        image_id: image_id.to_string(),
        catalogue_number: Some(format!("K{image_id}")),
        taxon_id: taxon_id.to_string(),
        full_name: full_name.to_string(),
        family: family.to_string(),
        genus: genus.map(str::to_string),
        species: species.map(str::to_string),
        country_code: Some("GB".to_string()),
        image_url: None,
    }
}

/// Writes a canonical table plus images for every id in `with_images`.
pub fn write_dataset(root: &Path, records: &[SpecimenRecord], with_images: &[&str]) {
    let images = root.join("images");
    std::fs::create_dir_all(&images).unwrap();
    write_canonical(&root.join("metadata.csv"), records).unwrap();
    for id in with_images {
        write_jpeg(&images.join(format!("{id}.jpg")));
    }
}

/// Six specimens over five taxa; `i6` has no image on disk.
pub fn herbarium_records() -> Vec<SpecimenRecord> {
    vec![
        record("i1", "t1", "Poaceae", Some("Zea"), Some("Zea mays"), "Zea mays L."),
        record("i2", "t2", "Poaceae", Some("Avena"), Some("Avena sativa"), "Avena sativa L."),
        record("i3", "t3", "Fabaceae", Some("Pisum"), None, "Pisum"),
        record("i4", "t4", "Asteraceae", None, None, "Asteraceae"),
        record("i5", "t1", "Poaceae", Some("Zea"), Some("Zea mays"), "Zea mays L."),
        record("i6", "t5", "Rosaceae", Some("Rosa"), Some("Rosa canina"), "Rosa canina L."),
    ]
}

pub const HERBARIUM_IMAGES: [&str; 5] = ["i1", "i2", "i3", "i4", "i5"];
