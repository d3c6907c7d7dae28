use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

use image::DynamicImage;
use indexmap::{IndexMap, IndexSet};
use tracing::info;

use crate::domain::{Label, TargetType, UNKNOWN};
use crate::error::SpecimenError;
use crate::metadata::{SpecimenRecord, read_canonical};
use crate::store::{Layout, image_file_name};

pub const SORT_KEY: [TargetType; 4] = TargetType::ALL;

pub type ImageTransform = Box<dyn Fn(DynamicImage) -> Result<DynamicImage, SpecimenError>>;
pub type LabelTransform = Box<dyn Fn(Label) -> Result<Label, SpecimenError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Taxon {
    values: [String; 4],
}

impl Taxon {
    fn from_record(record: &SpecimenRecord) -> Self {
        Self {
            values: [
                fill_unknown(Some(&record.family)),
                fill_unknown(record.genus.as_deref()),
                fill_unknown(record.species.as_deref()),
                fill_unknown(Some(&record.full_name)),
            ],
        }
    }

    pub fn get(&self, target: TargetType) -> &str {
        &self.values[target.position()]
    }

    fn cmp_by_sort_key(&self, other: &Self) -> Ordering {
        SORT_KEY
            .iter()
            .map(|target| self.get(*target).cmp(other.get(*target)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn fill_unknown(value: Option<&str>) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub file_name: String,
    pub catalogue_number: Option<String>,
    pub taxon_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    codes: [IndexSet<String>; 4],
}

impl Vocabulary {
    fn build<'a>(taxa: impl Iterator<Item = &'a Taxon> + Clone) -> Self {
        let mut vocabulary = Self::default();
        for target in TargetType::ALL {
            let codes = &mut vocabulary.codes[target.position()];
            for taxon in taxa.clone() {
                if !codes.contains(taxon.get(target)) {
                    codes.insert(taxon.get(target).to_string());
                }
            }
        }
        vocabulary
    }

    pub fn code(&self, target: TargetType, value: &str) -> Option<u32> {
        self.codes[target.position()]
            .get_index_of(value)
            .map(|index| index as u32)
    }

    pub fn name(&self, target: TargetType, code: u32) -> Option<&str> {
        self.codes[target.position()]
            .get_index(code as usize)
            .map(String::as_str)
    }

    pub fn len(&self, target: TargetType) -> usize {
        self.codes[target.position()].len()
    }

    pub fn names(&self, target: TargetType) -> impl Iterator<Item = &str> {
        self.codes[target.position()].iter().map(String::as_str)
    }
}

pub struct DatasetBuilder {
    root: Layout,
    target_types: Vec<TargetType>,
    include_unknown: bool,
    transform: Option<ImageTransform>,
    target_transform: Option<LabelTransform>,
}

impl DatasetBuilder {
    pub fn target_types(mut self, target_types: impl IntoIterator<Item = TargetType>) -> Self {
        self.target_types = target_types.into_iter().collect();
        self
    }

    pub fn include_unknown(mut self, include_unknown: bool) -> Self {
        self.include_unknown = include_unknown;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(DynamicImage) -> Result<DynamicImage, SpecimenError> + 'static,
    {
        self.transform = Some(Box::new(transform));
        self
    }

    pub fn target_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Label) -> Result<Label, SpecimenError> + 'static,
    {
        self.target_transform = Some(Box::new(transform));
        self
    }

    pub fn build(self) -> Result<SpecimenDataset, SpecimenError> {
        if self.target_types.is_empty() {
            return Err(SpecimenError::NoTargetTypes);
        }
        if !self.root.has_images_dir() {
            return Err(SpecimenError::DatasetNotFound(
                self.root.root().as_std_path().to_path_buf(),
            ));
        }

        let records = read_canonical(self.root.metadata_path().as_std_path())?;
        let rows_in = records.len();
        let mut rows = records
            .iter()
            .map(|record| (record, Taxon::from_record(record)))
            .filter(|(_, taxon)| {
                self.include_unknown
                    || self
                        .target_types
                        .iter()
                        .all(|target| taxon.get(*target) != UNKNOWN)
            })
            .collect::<Vec<_>>();
        rows.sort_by(|(_, left), (_, right)| left.cmp_by_sort_key(right));

        let mut categories = IndexMap::<String, Taxon>::new();
        for (record, taxon) in &rows {
            if !categories.contains_key(&record.taxon_id) {
                categories.insert(record.taxon_id.clone(), taxon.clone());
            }
        }
        let vocabulary = Vocabulary::build(categories.values());

        let index = rows
            .iter()
            .map(|(record, _)| record)
            .filter(|record| self.root.image_path(&record.image_id).as_std_path().exists())
            .map(|record| IndexEntry {
                file_name: image_file_name(&record.image_id),
                catalogue_number: record.catalogue_number.clone(),
                taxon_id: record.taxon_id.clone(),
            })
            .collect::<Vec<_>>();

        info!(
            rows_in,
            rows_kept = rows.len(),
            taxa = categories.len(),
            images = index.len(),
            "built specimen dataset"
        );

        Ok(SpecimenDataset {
            root: self.root,
            target_types: self.target_types,
            categories,
            vocabulary,
            index,
            transform: self.transform,
            target_transform: self.target_transform,
        })
    }
}

pub struct SpecimenDataset {
    root: Layout,
    target_types: Vec<TargetType>,
    categories: IndexMap<String, Taxon>,
    vocabulary: Vocabulary,
    index: Vec<IndexEntry>,
    transform: Option<ImageTransform>,
    target_transform: Option<LabelTransform>,
}

impl SpecimenDataset {
    pub fn builder(root: &Path) -> Result<DatasetBuilder, SpecimenError> {
        Ok(DatasetBuilder {
            root: Layout::from_path(root)?,
            target_types: vec![TargetType::FullName],
            include_unknown: false,
            transform: None,
            target_transform: None,
        })
    }

    pub fn build(
        root: &Path,
        target_types: &[TargetType],
        include_unknown: bool,
    ) -> Result<Self, SpecimenError> {
        Self::builder(root)?
            .target_types(target_types.iter().copied())
            .include_unknown(include_unknown)
            .build()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn target_types(&self) -> &[TargetType] {
        &self.target_types
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.index
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn taxon(&self, taxon_id: &str) -> Option<&Taxon> {
        self.categories.get(taxon_id)
    }

    pub fn label(&self, index: usize) -> Result<Label, SpecimenError> {
        let entry = self.entry(index)?;
        let taxon = self.categories.get(&entry.taxon_id).ok_or_else(|| {
            SpecimenError::Inconsistent(format!("taxon {} has no category entry", entry.taxon_id))
        })?;
        let codes = self
            .target_types
            .iter()
            .map(|target| {
                self.vocabulary
                    .code(*target, taxon.get(*target))
                    .ok_or_else(|| {
                        SpecimenError::Inconsistent(format!(
                            "{target} value {} has no code",
                            taxon.get(*target)
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Label::from_codes(codes))
    }

    pub fn get(&self, index: usize) -> Result<(DynamicImage, Label), SpecimenError> {
        let entry = self.entry(index)?;
        let path = self.root.images_dir().join(&entry.file_name);
        let mut image = image::open(path.as_std_path()).map_err(|err| SpecimenError::ImageDecode {
            path: path.as_std_path().to_path_buf(),
            message: err.to_string(),
        })?;
        let mut label = self.label(index)?;

        if let Some(transform) = &self.transform {
            image = transform(image)?;
        }
        if let Some(transform) = &self.target_transform {
            label = transform(label)?;
        }
        Ok((image, label))
    }

    pub fn category_name(&self, target: TargetType, code: u32) -> Result<&str, SpecimenError> {
        self.vocabulary
            .name(target, code)
            .ok_or_else(|| SpecimenError::InvalidCategoryId {
                target_type: target.to_string(),
                id: code,
            })
    }

    pub fn category_code(&self, target: TargetType, value: &str) -> Option<u32> {
        self.vocabulary.code(target, value)
    }

    pub fn num_classes(&self, target: TargetType) -> usize {
        self.vocabulary.len(target)
    }

    fn entry(&self, index: usize) -> Result<&IndexEntry, SpecimenError> {
        self.index
            .get(index)
            .ok_or_else(|| SpecimenError::IndexOutOfRange {
                index,
                len: self.index.len(),
            })
    }
}

impl fmt::Debug for SpecimenDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecimenDataset")
            .field("root", &self.root.root())
            .field("target_types", &self.target_types)
            .field("len", &self.index.len())
            .field("taxa", &self.categories.len())
            .finish()
    }
}
