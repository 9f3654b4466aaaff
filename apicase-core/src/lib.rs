//! Apicase Core Library
//!
//! Test case codec, catalog client and import reconciliation for apicase.

pub mod case;
pub mod catalog;
pub mod infer;
pub mod normalize;
pub mod reconcile;
pub mod tree;

pub use case::{
    decode, encode, encode_form, CanonicalRequest, CanonicalTestCase, CaseForm, DecodeError,
    EditorTestCase, Encoded, FormError, Level,
};
pub use catalog::{CatalogClient, MenuResponse, RemoteCatalogItem, DETAIL_CONCURRENCY};
pub use infer::{classify, classify_value, Classified, InferError, TypeTag, ValueParseError};
pub use normalize::{CatalogMeta, NormalizeError, NormalizedItem, Normalizer};
pub use reconcile::{diff_for_sync, merge_api, ImportedRecord, SyncPlan};
pub use tree::{CategoryTree, CategoryTreeNode};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
