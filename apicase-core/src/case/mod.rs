//! Test case representations and the converters between them.
//!
//! - [`form`]: what the editor submits (groups + companion descriptions)
//! - [`canonical`]: what the runner executes
//! - [`editor`]: what the editor renders (rows with type tags)
//!
//! [`encode()`] goes form → canonical, [`decode()`] goes canonical → editor,
//! and [`EditorTestCase::to_form`] closes the loop.

pub mod canonical;
pub mod decode;
pub mod editor;
pub mod encode;
pub mod form;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use canonical::{CanonicalRequest, CanonicalTestCase, Descriptions, KeyedList};
pub use decode::{decode, DecodeError};
pub use editor::{EditorRequest, EditorTestCase, FormError, HookRow, Row, TypedRow, ValidateRow};
pub use encode::{encode, encode_form, Encoded, FormMeta};
pub use form::CaseForm;

/// Which kind of entity a case describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Test,
    Config,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Test => write!(f, "test"),
            Level::Config => write!(f, "config"),
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Level::Test),
            "config" => Ok(Level::Config),
            _ => Err(format!(
                "Invalid level '{}'. Valid options: test, config",
                s
            )),
        }
    }
}
