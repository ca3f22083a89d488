//! # docsmith
//!
//! Normalizes raw extracted HTTP endpoint metadata into canonical records
//! ready for documentation rendering.
//!
//! ## Overview
//!
//! A route/documentation extraction pipeline produces one unnormalized
//! description per endpoint: method strings, a URI template, parameters
//! grouped by location, captured responses, and auth info. This crate turns
//! each description into an [`EndpointRecord`]:
//!
//! - HTTP methods are parsed and deduplicated (the implicit HEAD that
//!   routing layers add next to GET is stripped unless it stands alone)
//! - each parameter group gets a "clean" projection holding only example
//!   values, the set actually substitutable into a request
//! - path placeholders in the URI are bound to their example values
//! - body parameters split into ordinary values and upload files, with the
//!   `multipart/form-data` content type set when files exist
//! - dotted and bracketed body-parameter names (`user.name`, `items[].id`)
//!   regroup into a nested tree mirroring the request body's shape
//!
//! Normalization is pure and all-or-nothing: malformed input fails with a
//! [`ValidationError`] naming the offending field, and no partial record is
//! ever observable.
//!
//! ## Quick start
//!
//! ```
//! use docsmith::EndpointRecord;
//! use serde_json::json;
//!
//! let record = EndpointRecord::from_value(json!({
//!     "methods": ["GET", "HEAD"],
//!     "uri": "/users/{id}",
//!     "urlParameters": { "id": { "type": "integer", "example": 42 } }
//! }))?;
//!
//! assert_eq!(record.bound_uri, "/users/42");
//! assert_eq!(record.endpoint_id(), "GET-users--id-");
//! # Ok::<(), docsmith::ValidationError>(())
//! ```
//!
//! Batch ingestion from the extraction pipeline's YAML/JSON dumps goes
//! through [`load_endpoints`].

pub mod endpoint;
pub mod error;

pub use endpoint::{
    bind_uri, clean_parameters, dedup_methods, endpoints_from_value, load_endpoints,
    nest_parameters, AuthInfo, EndpointRecord, ExampleValue, FileRef, Metadata, NestedValue,
    Parameter, ParameterKind, RawEndpoint, RawParameter, RawResponseField, ResponseEntry,
    ResponseFieldDescription,
};
pub use error::ValidationError;
