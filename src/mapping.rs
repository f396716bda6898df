//! Field mappings for the app detail page
//!
//! Each output field is one entry: where its raw value lives and how to
//! normalize it. The positions track the current page layout; when the
//! upstream format moves, edit the paths here.

use crate::path::Path;
use crate::transform::{self, TransformFn};

/// Container a field's raw value is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The page's own datasets
    Primary,
    /// Datasets produced by the named service request; falls back to the
    /// primary datasets when that request's data is not available
    Auxiliary(&'static str),
}

/// How to produce one output field
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    pub path: Path,
    pub transform: Option<TransformFn>,
    pub source: Source,
}

impl FieldDescriptor {
    /// Raw value at `path`, unchanged
    pub const fn at(dataset: &'static str, indices: &'static [usize]) -> Self {
        Self {
            path: Path::new(dataset, indices),
            transform: None,
            source: Source::Primary,
        }
    }

    pub const fn with(self, transform: TransformFn) -> Self {
        Self {
            transform: Some(transform),
            ..self
        }
    }

    pub const fn from_request(self, request_id: &'static str) -> Self {
        Self {
            source: Source::Auxiliary(request_id),
            ..self
        }
    }

    /// The transform to run, identity for bare paths
    pub fn transform_fn(&self) -> TransformFn {
        self.transform.unwrap_or(transform::identity)
    }
}

/// Named output field
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub descriptor: FieldDescriptor,
}

const fn field(name: &'static str, descriptor: FieldDescriptor) -> Field {
    Field { name, descriptor }
}

/// Service request that carries the review data
pub const REVIEWS_REQUEST_ID: &str = "UsvDTd";

const DS: &str = "ds:4";

pub static APP_FIELDS: &[Field] = &[
    field("title", FieldDescriptor::at(DS, &[1, 2, 0, 0])),
    field(
        "description",
        FieldDescriptor::at(DS, &[1, 2, 72, 0, 1]).with(transform::description_text),
    ),
    field("descriptionHTML", FieldDescriptor::at(DS, &[1, 2, 72, 0, 1])),
    field("summary", FieldDescriptor::at(DS, &[1, 2, 73, 0, 1])),
    field("installs", FieldDescriptor::at(DS, &[1, 2, 13, 0])),
    field("minInstalls", FieldDescriptor::at(DS, &[1, 2, 13, 1])),
    field("maxInstalls", FieldDescriptor::at(DS, &[1, 2, 13, 2])),
    field("score", FieldDescriptor::at(DS, &[1, 2, 51, 0, 1])),
    field("scoreText", FieldDescriptor::at(DS, &[1, 2, 51, 0, 0])),
    field("ratings", FieldDescriptor::at(DS, &[1, 2, 51, 2, 1])),
    field("reviews", FieldDescriptor::at(DS, &[1, 2, 51, 3, 1])),
    field(
        "histogram",
        FieldDescriptor::at(DS, &[1, 2, 51, 1]).with(transform::histogram),
    ),
    field(
        "price",
        FieldDescriptor::at(DS, &[1, 2, 57, 0, 0, 0, 0, 1, 0, 0]).with(transform::price),
    ),
    field(
        "free",
        FieldDescriptor::at(DS, &[1, 2, 57, 0, 0, 0, 0, 1, 0, 0]).with(transform::free),
    ),
    field("currency", FieldDescriptor::at(DS, &[1, 2, 57, 0, 0, 0, 0, 1, 0, 1])),
    field(
        "priceText",
        FieldDescriptor::at(DS, &[1, 2, 57, 0, 0, 0, 0, 1, 0, 2]).with(transform::price_text),
    ),
    field(
        "offersIAP",
        FieldDescriptor::at(DS, &[1, 2, 19, 0]).with(transform::boolean),
    ),
    field("IAPRange", FieldDescriptor::at(DS, &[1, 2, 19, 0])),
    field("developer", FieldDescriptor::at(DS, &[1, 2, 68, 0])),
    field(
        "developerId",
        FieldDescriptor::at(DS, &[1, 2, 68, 1, 4, 2]).with(transform::developer_id),
    ),
    field("developerEmail", FieldDescriptor::at(DS, &[1, 2, 69, 1, 0])),
    field("developerWebsite", FieldDescriptor::at(DS, &[1, 2, 69, 0, 5, 2])),
    field("developerAddress", FieldDescriptor::at(DS, &[1, 2, 69, 2, 0])),
    field("privacyPolicy", FieldDescriptor::at(DS, &[1, 2, 99, 0, 5, 2])),
    field("genre", FieldDescriptor::at(DS, &[1, 2, 79, 0, 0, 0])),
    field("genreId", FieldDescriptor::at(DS, &[1, 2, 79, 0, 0, 2])),
    field("icon", FieldDescriptor::at(DS, &[1, 2, 95, 0, 3, 2])),
    field("headerImage", FieldDescriptor::at(DS, &[1, 2, 96, 0, 3, 2])),
    field(
        "screenshots",
        FieldDescriptor::at(DS, &[1, 2, 78, 0]).with(transform::screenshots),
    ),
    field("video", FieldDescriptor::at(DS, &[1, 2, 100, 0, 0, 3, 2])),
    field("videoImage", FieldDescriptor::at(DS, &[1, 2, 100, 1, 0, 3, 2])),
    field("contentRating", FieldDescriptor::at(DS, &[1, 2, 9, 0])),
    field("contentRatingDescription", FieldDescriptor::at(DS, &[1, 2, 9, 2, 1])),
    field(
        "adSupported",
        FieldDescriptor::at(DS, &[1, 2, 48]).with(transform::boolean),
    ),
    field("released", FieldDescriptor::at(DS, &[1, 2, 10, 0])),
    field(
        "updated",
        FieldDescriptor::at(DS, &[1, 2, 145, 0, 1, 0]).with(transform::timestamp_millis),
    ),
    field("version", FieldDescriptor::at(DS, &[1, 2, 140, 0, 0, 0])),
    field("recentChanges", FieldDescriptor::at(DS, &[1, 2, 144, 1, 1])),
    field(
        "comments",
        FieldDescriptor::at("ds:8", &[0])
            .with(transform::comments)
            .from_request(REVIEWS_REQUEST_ID),
    ),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_unique() {
        let names: HashSet<&str> = APP_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names.len(), APP_FIELDS.len());
    }

    #[test]
    fn test_context_keys_not_mapped() {
        assert!(APP_FIELDS.iter().all(|f| f.name != "appId" && f.name != "url"));
    }

    #[test]
    fn test_only_comments_use_auxiliary_source() {
        let auxiliary: Vec<&str> = APP_FIELDS
            .iter()
            .filter(|f| f.descriptor.source != Source::Primary)
            .map(|f| f.name)
            .collect();
        assert_eq!(auxiliary, vec!["comments"]);
    }

    #[test]
    fn test_builder() {
        let descriptor = FieldDescriptor::at("ds:1", &[0]);
        assert!(descriptor.transform.is_none());
        assert_eq!(descriptor.source, Source::Primary);

        let descriptor = descriptor.with(transform::boolean).from_request("abc");
        assert!(descriptor.transform.is_some());
        assert_eq!(descriptor.source, Source::Auxiliary("abc"));
    }
}
