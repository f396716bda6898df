//! Mapping-driven extraction of one app record

use serde_json::Value;
use std::collections::HashMap;
use tracing::{trace, warn};

use crate::mapping::{Field, Source};
use crate::node::Datasets;
use crate::path::extract;
use crate::record::{AppRecord, FieldError};

/// Datasets from secondary requests, keyed by request id
pub type AuxiliaryDatasets = HashMap<String, Datasets>;

/// Caller-supplied values merged into every record
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub app_id: &'a str,
    pub url: &'a str,
}

/// Run every field of `table` against the datasets.
///
/// Every field ends up in the record. A transform that rejects its input
/// does not stop the others: the failure is logged and recorded in
/// `AppRecord::errors`, and the field gets the value its transform yields for
/// missing data. `appId` and `url` from `context` are written last.
pub fn extract_all(
    table: &[Field],
    primary: &Datasets,
    auxiliary: &AuxiliaryDatasets,
    context: Context<'_>,
) -> AppRecord {
    let mut record = AppRecord::default();

    for field in table {
        let descriptor = &field.descriptor;
        let source = match descriptor.source {
            Source::Primary => primary,
            Source::Auxiliary(request_id) => auxiliary.get(request_id).unwrap_or(primary),
        };

        let raw = extract(source, &descriptor.path);
        if raw.is_none() {
            trace!(field = field.name, path = %descriptor.path, "path not found");
        }

        let transform = descriptor.transform_fn();
        let value = match transform(raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(field = field.name, path = %descriptor.path, error = %e, "transform failed, using default");
                record.errors.push(FieldError {
                    field: field.name.to_string(),
                    message: e.to_string(),
                });
                transform(None).unwrap_or(Value::Null)
            }
        };

        record.fields.insert(field.name.to_string(), value);
    }

    record
        .fields
        .insert("appId".to_string(), Value::String(context.app_id.to_string()));
    record
        .fields
        .insert("url".to_string(), Value::String(context.url.to_string()));

    record
}
