//! Reference domain model.
//!
//! # Responsibility
//! - Define the named-field record stored as one `REFERENCE` row.
//! - Provide by-name field access for import and mapping-shaped callers.
//!
//! # Invariants
//! - `citekey` is non-blank for any record accepted by `validate()`.
//! - Absent optional fields are omitted from `get_fields()` output.
//!
//! # See also
//! - `repo::reference_repo` for the row binding of each field.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Mapping-shaped view of a reference: column name to value.
///
/// Missing values are omitted rather than stored as empty strings.
pub type FieldMap = BTreeMap<String, String>;

/// One column of the `REFERENCE` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceField {
    Citekey,
    Author,
    Title,
    Publisher,
    Journal,
    Year,
    VolumeOrNumber,
    Volume,
    Number,
    Pages,
    Series,
    Address,
    Edition,
    Month,
    Note,
}

impl ReferenceField {
    /// All fields in schema column order.
    pub const ALL: [ReferenceField; 15] = [
        Self::Citekey,
        Self::Author,
        Self::Title,
        Self::Publisher,
        Self::Journal,
        Self::Year,
        Self::VolumeOrNumber,
        Self::Volume,
        Self::Number,
        Self::Pages,
        Self::Series,
        Self::Address,
        Self::Edition,
        Self::Month,
        Self::Note,
    ];

    /// Column name used in storage and in `FieldMap` keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Citekey => "citekey",
            Self::Author => "author",
            Self::Title => "title",
            Self::Publisher => "publisher",
            Self::Journal => "journal",
            Self::Year => "year",
            Self::VolumeOrNumber => "volume_or_number",
            Self::Volume => "volume",
            Self::Number => "number",
            Self::Pages => "pages",
            Self::Series => "series",
            Self::Address => "address",
            Self::Edition => "edition",
            Self::Month => "month",
            Self::Note => "note",
        }
    }
}

impl Display for ReferenceField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceField {
    type Err = ReferenceValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == value)
            .ok_or_else(|| ReferenceValidationError::UnknownField(value.to_string()))
    }
}

/// Validation failure for reference input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceValidationError {
    /// Citekey is missing or blank.
    MissingCitekey,
    /// Field name is not part of the reference catalogue.
    UnknownField(String),
}

impl Display for ReferenceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCitekey => write!(f, "reference citekey must not be empty"),
            Self::UnknownField(name) => write!(f, "unknown reference field `{name}`"),
        }
    }
}

impl Error for ReferenceValidationError {}

/// Anything that can present itself as a reference field mapping.
///
/// The repository only depends on this shape, so parsed import candidates
/// (plain `FieldMap`s) and `Reference` records are accepted alike.
pub trait ReferenceFields {
    fn get_fields(&self) -> FieldMap;

    /// Citekey carried by the mapping, if any.
    fn citekey(&self) -> Option<String> {
        self.get_fields().remove(ReferenceField::Citekey.as_str())
    }
}

/// Canonical bibliographic record; one instance per `REFERENCE` row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub citekey: String,
    pub author: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    pub journal: Option<String>,
    pub year: Option<String>,
    pub volume_or_number: Option<String>,
    pub volume: Option<String>,
    pub number: Option<String>,
    pub pages: Option<String>,
    pub series: Option<String>,
    pub address: Option<String>,
    pub edition: Option<String>,
    pub month: Option<String>,
    pub note: Option<String>,
}

impl Reference {
    /// Creates a reference with only the citekey set.
    pub fn new(citekey: impl Into<String>) -> Self {
        Self {
            citekey: citekey.into(),
            ..Self::default()
        }
    }

    /// Builds a reference from a field mapping.
    ///
    /// Keys outside the field catalogue are ignored; import sources carry
    /// extra BibTeX fields that have no column.
    ///
    /// # Errors
    /// - `MissingCitekey` when the mapping has no non-blank `citekey`.
    pub fn from_field_map(fields: &FieldMap) -> Result<Self, ReferenceValidationError> {
        let mut reference = Self::default();
        for (name, value) in fields {
            if let Ok(field) = name.parse::<ReferenceField>() {
                reference.put(field, Some(value.clone()));
            }
        }
        reference.validate()?;
        Ok(reference)
    }

    /// Checks identity invariants.
    pub fn validate(&self) -> Result<(), ReferenceValidationError> {
        if self.citekey.trim().is_empty() {
            return Err(ReferenceValidationError::MissingCitekey);
        }
        Ok(())
    }

    /// Returns one field value by catalogue entry.
    pub fn get_field(&self, field: ReferenceField) -> Option<&str> {
        match field {
            ReferenceField::Citekey => Some(self.citekey.as_str()),
            ReferenceField::Author => self.author.as_deref(),
            ReferenceField::Title => self.title.as_deref(),
            ReferenceField::Publisher => self.publisher.as_deref(),
            ReferenceField::Journal => self.journal.as_deref(),
            ReferenceField::Year => self.year.as_deref(),
            ReferenceField::VolumeOrNumber => self.volume_or_number.as_deref(),
            ReferenceField::Volume => self.volume.as_deref(),
            ReferenceField::Number => self.number.as_deref(),
            ReferenceField::Pages => self.pages.as_deref(),
            ReferenceField::Series => self.series.as_deref(),
            ReferenceField::Address => self.address.as_deref(),
            ReferenceField::Edition => self.edition.as_deref(),
            ReferenceField::Month => self.month.as_deref(),
            ReferenceField::Note => self.note.as_deref(),
        }
    }

    /// Sets one field by column name.
    ///
    /// `None` clears an optional field; for `citekey` it resets to empty.
    pub fn set_field(
        &mut self,
        name: &str,
        value: Option<String>,
    ) -> Result<(), ReferenceValidationError> {
        let field = name.parse::<ReferenceField>()?;
        self.put(field, value);
        Ok(())
    }

    fn put(&mut self, field: ReferenceField, value: Option<String>) {
        let slot = match field {
            ReferenceField::Citekey => {
                self.citekey = value.unwrap_or_default();
                return;
            }
            ReferenceField::Author => &mut self.author,
            ReferenceField::Title => &mut self.title,
            ReferenceField::Publisher => &mut self.publisher,
            ReferenceField::Journal => &mut self.journal,
            ReferenceField::Year => &mut self.year,
            ReferenceField::VolumeOrNumber => &mut self.volume_or_number,
            ReferenceField::Volume => &mut self.volume,
            ReferenceField::Number => &mut self.number,
            ReferenceField::Pages => &mut self.pages,
            ReferenceField::Series => &mut self.series,
            ReferenceField::Address => &mut self.address,
            ReferenceField::Edition => &mut self.edition,
            ReferenceField::Month => &mut self.month,
            ReferenceField::Note => &mut self.note,
        };
        *slot = value;
    }
}

impl ReferenceFields for Reference {
    fn get_fields(&self) -> FieldMap {
        ReferenceField::ALL
            .into_iter()
            .filter_map(|field| {
                self.get_field(field)
                    .map(|value| (field.as_str().to_string(), value.to_string()))
            })
            .collect()
    }

    fn citekey(&self) -> Option<String> {
        Some(self.citekey.clone())
    }
}

impl ReferenceFields for FieldMap {
    fn get_fields(&self) -> FieldMap {
        self.clone()
    }

    fn citekey(&self) -> Option<String> {
        self.get(ReferenceField::Citekey.as_str()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldMap, Reference, ReferenceField, ReferenceFields, ReferenceValidationError};

    #[test]
    fn field_names_roundtrip_through_from_str() {
        for field in ReferenceField::ALL {
            assert_eq!(field.as_str().parse::<ReferenceField>(), Ok(field));
        }
        assert_eq!(
            "tag".parse::<ReferenceField>(),
            Err(ReferenceValidationError::UnknownField("tag".to_string()))
        );
    }

    #[test]
    fn get_fields_omits_absent_values() {
        let mut reference = Reference::new("knuth1984");
        reference.title = Some("Literate Programming".to_string());

        let fields = reference.get_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("citekey").map(String::as_str), Some("knuth1984"));
        assert!(!fields.contains_key("author"));
    }

    #[test]
    fn from_field_map_ignores_unknown_keys_and_requires_citekey() {
        let mut fields = FieldMap::new();
        fields.insert("title".to_string(), "Untitled".to_string());
        fields.insert("doi".to_string(), "10.1000/xyz".to_string());
        assert_eq!(
            Reference::from_field_map(&fields),
            Err(ReferenceValidationError::MissingCitekey)
        );

        fields.insert("citekey".to_string(), "anon".to_string());
        let reference = Reference::from_field_map(&fields).unwrap();
        assert_eq!(reference.citekey, "anon");
        assert_eq!(reference.title.as_deref(), Some("Untitled"));
    }

    #[test]
    fn set_field_clears_with_none_and_rejects_unknown_names() {
        let mut reference = Reference::new("a");
        reference
            .set_field("volume_or_number", Some("4".to_string()))
            .unwrap();
        assert_eq!(reference.get_field(ReferenceField::VolumeOrNumber), Some("4"));

        reference.set_field("volume_or_number", None).unwrap();
        assert_eq!(reference.get_field(ReferenceField::VolumeOrNumber), None);

        let err = reference.set_field("keywords", None).unwrap_err();
        assert_eq!(err, ReferenceValidationError::UnknownField("keywords".into()));
    }
}
