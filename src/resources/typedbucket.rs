//! String-backed key/value bucket with typed retrieval.
//!
//! A [`TypedBucket`] stores every value as authored text and decodes it on
//! read. Decoding is a fixed cascade isolated in [`decode_value`]:
//!
//! 1. integer parse
//! 2. floating-point parse
//! 3. boolean parse (case-insensitive `true`/`false`)
//! 4. otherwise the raw string
//!
//! The first successful parse wins, so `"5"` is always an integer and
//! `"true"` only becomes a bool after both numeric parses fail. Requesting a
//! `String` is an exact type match and returns the authored text untouched.
//!
//! Float requests accept integers with ordinary float rounding, so a large
//! integer read as `f32` loses precision. Non-finite results (`"inf"`,
//! `"NaN"`, or `"1e300"` read as `f32`) are rejected as a type mismatch.
//!
//! Buckets are filled at authoring time (builder, JSON object, INI section)
//! and are read-only afterwards.
//!
//! # Example
//!
//! ```
//! use playkit::resources::typedbucket::TypedBucket;
//!
//! let bucket = TypedBucket::new("player")
//!     .with("lives", "3")
//!     .with("speed", "2.5")
//!     .with("god_mode", "false");
//!
//! assert_eq!(bucket.get::<i32>("lives"), Some(3));
//! assert_eq!(bucket.get::<f32>("speed"), Some(2.5));
//! assert_eq!(bucket.get::<bool>("god_mode"), Some(false));
//! assert_eq!(bucket.get::<i32>("missing"), None);
//! ```

use configparser::ini::Ini;
use log::warn;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{KitError, KitResult};

/// Decoded form of a bucket entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BucketValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

/// Decode authored text using the fixed int → float → bool → string cascade.
pub fn decode_value(raw: &str) -> BucketValue {
    let text = raw.trim();
    if let Ok(int) = text.parse::<i64>() {
        return BucketValue::Int(int);
    }
    if let Ok(float) = text.parse::<f64>() {
        return BucketValue::Float(float);
    }
    if text.eq_ignore_ascii_case("true") {
        return BucketValue::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return BucketValue::Bool(false);
    }
    BucketValue::Str(raw.to_string())
}

/// Types that can be produced from a bucket entry.
pub trait FromBucketValue: Sized {
    /// Name used in diagnostics.
    const TYPE_NAME: &'static str;

    /// Convert authored text. The default runs [`decode_value`] first.
    fn from_raw(raw: &str) -> Option<Self> {
        Self::from_value(decode_value(raw))
    }

    /// Convert an already decoded value.
    fn from_value(value: BucketValue) -> Option<Self>;
}

impl FromBucketValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_raw(raw: &str) -> Option<Self> {
        Some(raw.to_string())
    }

    fn from_value(value: BucketValue) -> Option<Self> {
        Some(match value {
            BucketValue::Int(v) => v.to_string(),
            BucketValue::Float(v) => v.to_string(),
            BucketValue::Bool(v) => v.to_string(),
            BucketValue::Str(v) => v,
        })
    }
}

impl FromBucketValue for i64 {
    const TYPE_NAME: &'static str = "i64";

    fn from_value(value: BucketValue) -> Option<Self> {
        match value {
            BucketValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl FromBucketValue for i32 {
    const TYPE_NAME: &'static str = "i32";

    fn from_value(value: BucketValue) -> Option<Self> {
        match value {
            BucketValue::Int(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }
}

impl FromBucketValue for u32 {
    const TYPE_NAME: &'static str = "u32";

    fn from_value(value: BucketValue) -> Option<Self> {
        match value {
            BucketValue::Int(v) => u32::try_from(v).ok(),
            _ => None,
        }
    }
}

impl FromBucketValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: BucketValue) -> Option<Self> {
        let float = match value {
            BucketValue::Int(v) => Some(v as f64),
            BucketValue::Float(v) => Some(v),
            _ => None,
        };
        float.filter(|v| v.is_finite())
    }
}

impl FromBucketValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_value(value: BucketValue) -> Option<Self> {
        let float = match value {
            BucketValue::Int(v) => Some(v as f32),
            BucketValue::Float(v) => Some(v as f32),
            _ => None,
        };
        float.filter(|v| v.is_finite())
    }
}

impl FromBucketValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: BucketValue) -> Option<Self> {
        match value {
            BucketValue::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Name-keyed store of string-encoded values.
#[derive(Debug, Clone, Default)]
pub struct TypedBucket {
    name: String,
    values: FxHashMap<String, String>,
}

impl TypedBucket {
    /// Create an empty bucket. `name` only appears in diagnostics.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: FxHashMap::default(),
        }
    }

    /// Builder: author one entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Author a bucket from a JSON object of scalars.
    ///
    /// Strings are stored verbatim; numbers and booleans are stored in their
    /// JSON text form. Nulls, arrays and nested objects are skipped with a
    /// warning.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> KitResult<Self> {
        let mut bucket = Self::new(name);
        let map: serde_json::Map<String, Value> = serde_json::from_str(json)?;
        for (key, value) in map {
            match value {
                Value::String(text) => {
                    bucket.values.insert(key, text);
                }
                Value::Number(number) => {
                    bucket.values.insert(key, number.to_string());
                }
                Value::Bool(flag) => {
                    bucket.values.insert(key, flag.to_string());
                }
                other => warn!(
                    "TypedBucket '{}': skipping '{}', not a scalar: {}",
                    bucket.name, key, other
                ),
            }
        }
        Ok(bucket)
    }

    /// Author a bucket from one section of INI text.
    ///
    /// Keys keep their case. Keys without a value are skipped.
    pub fn from_ini_str(name: impl Into<String>, ini_text: &str, section: &str) -> KitResult<Self> {
        let mut ini = Ini::new_cs();
        ini.read(ini_text.to_string()).map_err(KitError::Config)?;
        let mut bucket = Self::new(name);
        let Some(entries) = ini.get_map_ref().get(section) else {
            return Err(KitError::NotFound {
                container: "ini".to_string(),
                name: section.to_string(),
            });
        };
        for (key, value) in entries {
            if let Some(value) = value {
                bucket.values.insert(key.clone(), value.clone());
            }
        }
        Ok(bucket)
    }

    /// Diagnostic name of this bucket.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up `key` and coerce it to `T`.
    ///
    /// A missing key or an unsupported coercion logs a warning and yields
    /// `None`; this never panics.
    pub fn get<T: FromBucketValue>(&self, key: &str) -> Option<T> {
        match self.try_get::<T>(key) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("TypedBucket: {}", err);
                None
            }
        }
    }

    /// Same as [`get`](Self::get) but returns the reason for a miss and
    /// does not log.
    pub fn try_get<T: FromBucketValue>(&self, key: &str) -> KitResult<T> {
        let raw = self.values.get(key).ok_or_else(|| KitError::NotFound {
            container: format!("bucket '{}'", self.name),
            name: key.to_string(),
        })?;
        T::from_raw(raw).ok_or_else(|| KitError::TypeMismatch {
            container: format!("bucket '{}'", self.name),
            name: key.to_string(),
            raw: raw.clone(),
            requested: T::TYPE_NAME,
        })
    }

    /// Decoded value for `key` without coercion.
    pub fn value(&self, key: &str) -> Option<BucketValue> {
        self.values.get(key).map(|raw| decode_value(raw))
    }

    /// Authored text for `key`.
    pub fn raw_value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Read-only view of the backing map.
    pub fn raw(&self) -> &FxHashMap<String, String> {
        &self.values
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
