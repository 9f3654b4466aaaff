//! Catalog import: pulls catalog items into a local project.
//!
//! One run merges catalog categories into the project's category tree,
//! diffs catalog update times against what was imported before, fetches
//! only new or changed items, and stores them as canonical test cases.

mod importer;

pub use importer::{ImportError, ImportReport, Importer};
