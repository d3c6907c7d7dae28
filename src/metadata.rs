use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::image_id_from_composite;
use crate::error::SpecimenError;
use crate::store::write_bytes_atomic;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Digifolia", default)]
    pub digifolia: Option<String>,
    #[serde(rename = "CatalogueNumber", default)]
    pub catalogue_number: Option<String>,
    #[serde(rename = "Kewid", default)]
    pub taxon_id: Option<String>,
    #[serde(rename = "FullName", default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(rename = "ISOAlpha2", default)]
    pub country_code: Option<String>,
    #[serde(rename = "JpegUrl", default)]
    pub image_url: Option<String>,
}

impl RawRecord {
    pub fn image_id(&self) -> Option<&str> {
        self.digifolia.as_deref().and_then(image_id_from_composite)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecimenRecord {
    #[serde(alias = "imgId")]
    pub image_id: String,
    #[serde(alias = "CatalogueNumber", default)]
    pub catalogue_number: Option<String>,
    #[serde(alias = "Kewid")]
    pub taxon_id: String,
    #[serde(alias = "FullName")]
    pub full_name: String,
    pub family: String,
    #[serde(default)]
    pub genus: Option<String>,
    #[serde(default)]
    pub species: Option<String>,
    #[serde(alias = "ISOAlpha2", default)]
    pub country_code: Option<String>,
    #[serde(skip)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanStats {
    pub rows_in: usize,
    pub dropped_incomplete: usize,
    pub dropped_duplicate: usize,
    pub rows_out: usize,
}

pub fn load_raw(path: &Path) -> Result<Vec<RawRecord>, SpecimenError> {
    read_table(path)
}

pub fn read_canonical(path: &Path) -> Result<Vec<SpecimenRecord>, SpecimenError> {
    read_table(path)
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, SpecimenError> {
    let file = File::open(path).map_err(|_| SpecimenError::MetadataRead(path.to_path_buf()))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|err| SpecimenError::MetadataParse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

pub fn write_canonical(path: &Path, records: &[SpecimenRecord]) -> Result<(), SpecimenError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer
            .serialize(record)
            .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    }
    let content = writer
        .into_inner()
        .map_err(|err| SpecimenError::Filesystem(err.to_string()))?;
    write_bytes_atomic(path, &content)
}

pub fn clean(raw: Vec<RawRecord>) -> (Vec<SpecimenRecord>, CleanStats) {
    let mut stats = CleanStats {
        rows_in: raw.len(),
        ..CleanStats::default()
    };
    let mut seen = HashSet::new();
    let mut records = Vec::new();

    for row in raw {
        let image_id = row.image_id().map(str::to_string);
        let (Some(image_id), Some(family), Some(full_name), Some(taxon_id)) = (
            image_id,
            present(row.family),
            present(row.full_name),
            present(row.taxon_id),
        ) else {
            stats.dropped_incomplete += 1;
            continue;
        };
        if !seen.insert(image_id.clone()) {
            debug!(image_id = %image_id, "dropping duplicate image id");
            stats.dropped_duplicate += 1;
            continue;
        }

        let (genus, species) =
            resolve_degenerate(&family, derive_genus(&full_name), derive_species(&full_name));
        records.push(SpecimenRecord {
            image_id,
            catalogue_number: present(row.catalogue_number),
            taxon_id,
            full_name,
            family,
            genus,
            species,
            country_code: present(row.country_code),
            image_url: present(row.image_url),
        });
    }

    stats.rows_out = records.len();
    info!(
        rows_in = stats.rows_in,
        dropped_incomplete = stats.dropped_incomplete,
        dropped_duplicate = stats.dropped_duplicate,
        rows_out = stats.rows_out,
        "cleaned specimen metadata"
    );
    (records, stats)
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn derive_genus(full_name: &str) -> Option<String> {
    full_name.split_whitespace().next().map(str::to_string)
}

fn derive_species(full_name: &str) -> Option<String> {
    let tokens = full_name.split_whitespace().take(2).collect::<Vec<_>>();
    (!tokens.is_empty()).then(|| tokens.join(" "))
}

fn resolve_degenerate(
    family: &str,
    genus: Option<String>,
    species: Option<String>,
) -> (Option<String>, Option<String>) {
    let genus = genus.filter(|genus| genus != family);
    let species = species
        .filter(|species| species != family)
        .filter(|species| genus.as_deref() != Some(species.as_str()));
    (genus, species)
}
