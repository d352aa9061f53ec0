//! Extraction record data types
//!
//! An `ExtractionRecord` is the normalized output of one extraction pass: an
//! insertion-ordered map from field name to `FieldValue`. Field order is part
//! of the contract (serialization and export flattening replay it verbatim),
//! so the maps here are `IndexMap`, never `HashMap`.

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Field names produced by the built-in detectors, plus the sub-keys used
/// inside grouped fields.
pub mod fields {
    pub const PERSONS: &str = "Persons";
    pub const PERSONAL_DETAILS: &str = "PersonalDetails";
    pub const ADDRESS: &str = "Address";
    pub const PHONE: &str = "Phone";
    pub const EMAIL: &str = "Email";
    pub const SALARY: &str = "Salary";
    pub const AMOUNT: &str = "Amount";
    pub const DATES: &str = "Dates";
    pub const PINCODE: &str = "Pincode";
    pub const TRANSACTION: &str = "Transaction";
    pub const PRODUCTS: &str = "Products";
    pub const NOTES: &str = "Notes";
    pub const TIMESTAMP: &str = "timestamp";

    /// Sub-keys of the `Dates` group
    pub const DATE_PRIMARY: &str = "primary";
    pub const DATE_SECONDARY: &str = "secondary";
    pub const DATE_ADDITIONAL: &str = "additional";

    /// Sub-key of the `Address` group
    pub const ADDRESS_RAW: &str = "Raw";

    /// Sub-keys of the `Transaction` group
    pub const TXN_REFERENCE: &str = "Reference";
    pub const TXN_MODE: &str = "Mode";

    /// Sub-keys of a `Products` entry
    pub const PRODUCT_NAME: &str = "Name";
    pub const PRODUCT_QUANTITY: &str = "Quantity";
    pub const PRODUCT_PRICE: &str = "Price";

    /// Sub-keys of a `PersonalDetails` entry
    pub const DETAIL_AGE: &str = "Age";
    pub const DETAIL_GENDER: &str = "Gender";
}

/// All built-in record field names, in assembly order (timestamp last).
///
/// Any field name a record carries is either in this list or registered in
/// field memory.
pub fn builtin_fields() -> &'static [&'static str] {
    &[
        fields::PERSONS,
        fields::PERSONAL_DETAILS,
        fields::ADDRESS,
        fields::PHONE,
        fields::EMAIL,
        fields::SALARY,
        fields::AMOUNT,
        fields::DATES,
        fields::PINCODE,
        fields::TRANSACTION,
        fields::PRODUCTS,
        fields::NOTES,
        fields::TIMESTAMP,
    ]
}

/// A single field's value: scalar text, ordered list, or nested group.
///
/// Serializes untagged, so records read as plain JSON objects: scalars are
/// strings, lists are arrays, groups are objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Scalar string value
    Text(String),
    /// Ordered list of values
    List(Vec<FieldValue>),
    /// Nested insertion-ordered mapping
    Group(IndexMap<String, FieldValue>),
}

impl FieldValue {
    /// Scalar from anything string-like
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// List of scalars, preserving order
    pub fn list_of(values: impl IntoIterator<Item = String>) -> Self {
        Self::List(values.into_iter().map(Self::Text).collect())
    }

    /// Empty group ready for insertion
    pub fn group() -> Self {
        Self::Group(IndexMap::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, FieldValue>> {
        match self {
            Self::Group(map) => Some(map),
            _ => None,
        }
    }

    /// Insert into a group value; no-op on non-groups.
    pub fn group_insert(&mut self, key: impl Into<String>, value: FieldValue) {
        if let Self::Group(map) = self {
            map.insert(key.into(), value);
        }
    }

    /// True for empty lists and empty groups; scalars are never empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(_) => false,
            Self::List(items) => items.is_empty(),
            Self::Group(map) => map.is_empty(),
        }
    }

    /// Collect scalar leaves depth-first, in order. These are the sample
    /// values field memory learns from.
    pub fn leaf_samples(&self, out: &mut Vec<String>) {
        match self {
            Self::Text(s) => out.push(s.clone()),
            Self::List(items) => {
                for item in items {
                    item.leaf_samples(out);
                }
            }
            Self::Group(map) => {
                for value in map.values() {
                    value.leaf_samples(out);
                }
            }
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// The normalized output of one extraction pass.
///
/// Field names are unique within a record; the first write wins. The
/// `timestamp` field is appended last by [`ExtractionRecord::stamp`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractionRecord {
    entries: IndexMap<String, FieldValue>,
}

impl ExtractionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field unless the name is already present.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.entries.entry(name.into()).or_insert(value);
    }

    /// Insert only when the value is non-empty (absent beats empty).
    pub fn insert_non_empty(&mut self, name: impl Into<String>, value: FieldValue) {
        if !value.is_empty() {
            self.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Field names in record order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Append the `timestamp` field (RFC 3339, UTC). Always lands last, even
    /// if a timestamp was already present.
    pub fn stamp(&mut self) {
        self.entries.shift_remove(fields::TIMESTAMP);
        self.entries.insert(
            fields::TIMESTAMP.to_string(),
            FieldValue::Text(Utc::now().to_rfc3339()),
        );
    }

    /// The record as a JSON value, field order intact.
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
