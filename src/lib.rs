//! App detail page extractor
//!
//! Pulls structured app metadata out of the data blobs embedded in an app
//! store detail page:
//! - page scripts parsed into positional datasets (`page`)
//! - a static table of field paths and transforms (`mapping`)
//! - a total path walker and per-field transforms (`path`, `transform`)
//! - one pass producing a flat record (`extract`)
//! - an async client and a C ABI on top (`client`, `ffi`)

pub mod client;
pub mod error;
pub mod extract;
pub mod ffi;
pub mod html;
pub mod mapping;
pub mod node;
pub mod page;
pub mod path;
pub mod record;
pub mod transform;

pub use client::{extract_app_page, AppClient, AppRequest, Fetch, HttpFetcher, RequestOptions};
pub use error::{Error, FetchError, Result, TransformError};
pub use extract::{extract_all, AuxiliaryDatasets, Context};
pub use mapping::{Field, FieldDescriptor, Source, APP_FIELDS};
pub use node::{Datasets, Node};
pub use page::ParsedPage;
pub use path::{extract, Path};
pub use record::{AppDetails, AppRecord, FieldError};
