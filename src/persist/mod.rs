//! # Aspect Persistence
//!
//! Every stateful table entity (the table header, each row, column and cell)
//! is persisted as one aspect: a record keyed by the entity's [`ElementId`]
//! holding a fixed, ordinal-indexed list of optional scalar properties. The
//! property layout of each aspect type lives in the static [`ASPECT_TYPES`]
//! table; an external store only ever sees [`AspectRecord`]s.
//!
//! Overrides equal to the table defaults are culled by
//! [`TableAspect::flush_changes_to_properties`] before a save, so rows,
//! columns and cells without real overrides are never written.
use crate::table::cell::CellAlignment;
use crate::table::cell::CellOrientation;
use crate::table::cell::Margins;
use crate::table::ElementId;
use std::fmt::Display;
use thiserror::Error;

mod aspects;
pub mod store;

pub use store::AspectRecord;
pub use store::AspectStore;
pub use store::MemoryStore;
pub use store::SaveSummary;

/// Errors raised while binding or assigning aspect properties.
#[derive(Error, Debug, PartialEq)]
pub enum PersistError {
    /// Ordinal beyond the aspect's property list
    #[error("{aspect} has no property at ordinal {ordinal}")]
    UnknownProperty { aspect: AspectType, ordinal: usize },

    /// Stored value of the wrong kind
    #[error("{aspect}.{property} expects {expected}, got {actual}")]
    KindMismatch {
        aspect: AspectType,
        property: &'static str,
        expected: PropertyKind,
        actual: &'static str,
    },

    /// A required property is null
    #[error("{aspect}.{property} is required")]
    MissingProperty { aspect: AspectType, property: &'static str },

    /// Value of the right kind outside the accepted range
    #[error("{aspect}.{property} has invalid value {value}")]
    InvalidValue {
        aspect: AspectType,
        property: &'static str,
        value: String,
    },

    /// Record with a different number of values than the aspect defines
    #[error("{aspect} record carries {actual} values, expected {expected}")]
    RecordShape { aspect: AspectType, expected: usize, actual: usize },

    /// Store does not hold exactly one table header
    #[error("Expected exactly one table header, found {0}")]
    HeaderCount(usize),

    /// Row, column or cell record positioned outside the table
    #[error("{aspect} {id} refers to {position}, outside the table")]
    OutsideTable {
        aspect: AspectType,
        id: ElementId,
        position: String,
    },
}

/// The kinds of persisted entity.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AspectType {
    TableHeader,
    Row,
    Column,
    Cell,
}

impl AspectType {
    pub const ALL: [AspectType; 4] = [AspectType::TableHeader, AspectType::Row, AspectType::Column, AspectType::Cell];

    /// Static layout of this aspect type.
    pub fn data(self) -> &'static AspectTypeData {
        let index = match self {
            AspectType::TableHeader => 0,
            AspectType::Row => 1,
            AspectType::Column => 2,
            AspectType::Cell => 3,
        };
        &ASPECT_TYPES[index]
    }

    /// Name of the property at `ordinal`.
    pub fn property(self, ordinal: usize) -> Result<&'static PropertyDef, PersistError> {
        self.data()
            .properties
            .get(ordinal)
            .ok_or(PersistError::UnknownProperty { aspect: self, ordinal })
    }
}

impl Display for AspectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.data().name)
    }
}

/// Storage kind of a property.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropertyKind {
    /// 64-bit signed integers, also used for enums and style ids
    Integer,
    /// Double-precision sizes
    Double,
    Boolean,
    /// Opaque bytes
    Blob,
}

impl PropertyKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Integer => "integer",
            PropertyKind::Double => "double",
            PropertyKind::Boolean => "boolean",
            PropertyKind::Blob => "blob",
        }
    }
}

impl Display for PropertyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct PropertyDef {
    pub name: &'static str,
    pub kind: PropertyKind,
}

/// Name and ordered properties of an aspect type.
#[derive(Debug)]
pub struct AspectTypeData {
    pub name: &'static str,
    pub properties: &'static [PropertyDef],
}

const fn property(name: &'static str, kind: PropertyKind) -> PropertyDef {
    PropertyDef { name, kind }
}

/// Property layouts, in [`AspectType`] order.
pub static ASPECT_TYPES: [AspectTypeData; 4] = [
    AspectTypeData {
        name: "TableHeader",
        properties: &[
            property("RowCount", PropertyKind::Integer),
            property("ColumnCount", PropertyKind::Integer),
            property("TitleRowCount", PropertyKind::Integer),
            property("HeaderRowCount", PropertyKind::Integer),
            property("FooterRowCount", PropertyKind::Integer),
            property("HeaderColumnCount", PropertyKind::Integer),
            property("FooterColumnCount", PropertyKind::Integer),
            property("DefaultRowHeight", PropertyKind::Double),
            property("DefaultColumnWidth", PropertyKind::Double),
            property("DefaultMarginTop", PropertyKind::Double),
            property("DefaultMarginBottom", PropertyKind::Double),
            property("DefaultMarginLeft", PropertyKind::Double),
            property("DefaultMarginRight", PropertyKind::Double),
            property("DefaultCellAlignment", PropertyKind::Integer),
            property("DefaultCellOrientation", PropertyKind::Integer),
            property("BodyTextStyle", PropertyKind::Integer),
            property("TitleRowTextStyle", PropertyKind::Integer),
            property("HeaderRowTextStyle", PropertyKind::Integer),
            property("FooterRowTextStyle", PropertyKind::Integer),
            property("HeaderColumnTextStyle", PropertyKind::Integer),
            property("FooterColumnTextStyle", PropertyKind::Integer),
        ],
    },
    AspectTypeData {
        name: "Row",
        properties: &[
            property("RowIndex", PropertyKind::Integer),
            property("Height", PropertyKind::Double),
            property("HeightLock", PropertyKind::Boolean),
        ],
    },
    AspectTypeData {
        name: "Column",
        properties: &[
            property("ColumnIndex", PropertyKind::Integer),
            property("Width", PropertyKind::Double),
            property("WidthLock", PropertyKind::Boolean),
        ],
    },
    AspectTypeData {
        name: "Cell",
        properties: &[
            property("RowIndex", PropertyKind::Integer),
            property("ColumnIndex", PropertyKind::Integer),
            property("FillKey", PropertyKind::Integer),
            property("Alignment", PropertyKind::Integer),
            property("Orientation", PropertyKind::Integer),
            property("MarginTop", PropertyKind::Double),
            property("MarginBottom", PropertyKind::Double),
            property("MarginLeft", PropertyKind::Double),
            property("MarginRight", PropertyKind::Double),
            property("TextBlock", PropertyKind::Blob),
        ],
    },
];

/// A nullable persisted value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Null,
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Blob(Vec<u8>),
}

impl PropertyValue {
    pub const fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Integer(_) => PropertyKind::Integer.as_str(),
            PropertyValue::Double(_) => PropertyKind::Double.as_str(),
            PropertyValue::Boolean(_) => PropertyKind::Boolean.as_str(),
            PropertyValue::Blob(_) => PropertyKind::Blob.as_str(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }
}

impl From<Option<i64>> for PropertyValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Integer)
    }
}

impl From<Option<f64>> for PropertyValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Double)
    }
}

impl From<Option<bool>> for PropertyValue {
    fn from(value: Option<bool>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Boolean)
    }
}

impl From<Option<Vec<u8>>> for PropertyValue {
    fn from(value: Option<Vec<u8>>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Blob)
    }
}

/// Typed reads of an assigned value, checked against the property layout.
pub(crate) struct Assignment {
    aspect: AspectType,
    property: &'static PropertyDef,
    value: PropertyValue,
}

impl Assignment {
    pub(crate) fn new(aspect: AspectType, ordinal: usize, value: PropertyValue) -> Result<Self, PersistError> {
        let property = aspect.property(ordinal)?;
        Ok(Self { aspect, property, value })
    }

    fn mismatch(&self) -> PersistError {
        PersistError::KindMismatch {
            aspect: self.aspect,
            property: self.property.name,
            expected: self.property.kind,
            actual: self.value.kind_name(),
        }
    }

    fn invalid(&self) -> PersistError {
        PersistError::InvalidValue {
            aspect: self.aspect,
            property: self.property.name,
            value: format!("{:?}", self.value),
        }
    }

    fn missing(&self) -> PersistError {
        PersistError::MissingProperty {
            aspect: self.aspect,
            property: self.property.name,
        }
    }

    pub(crate) fn integer(&self) -> Result<Option<i64>, PersistError> {
        match self.value {
            PropertyValue::Null => Ok(None),
            PropertyValue::Integer(value) => Ok(Some(value)),
            _ => Err(self.mismatch()),
        }
    }

    pub(crate) fn double(&self) -> Result<Option<f64>, PersistError> {
        match self.value {
            PropertyValue::Null => Ok(None),
            PropertyValue::Double(value) => Ok(Some(value)),
            _ => Err(self.mismatch()),
        }
    }

    pub(crate) fn boolean(&self) -> Result<Option<bool>, PersistError> {
        match self.value {
            PropertyValue::Null => Ok(None),
            PropertyValue::Boolean(value) => Ok(Some(value)),
            _ => Err(self.mismatch()),
        }
    }

    pub(crate) fn blob(self) -> Result<Option<Vec<u8>>, PersistError> {
        match self.value {
            PropertyValue::Null => Ok(None),
            PropertyValue::Blob(bytes) => Ok(Some(bytes)),
            _ => Err(self.mismatch()),
        }
    }

    pub(crate) fn required_double(&self) -> Result<f64, PersistError> {
        self.double()?.ok_or_else(|| self.missing())
    }

    /// Non-negative integer, e.g. a count or an index; null reads as `None`.
    pub(crate) fn index(&self) -> Result<Option<usize>, PersistError> {
        self.integer()?
            .map(|value| usize::try_from(value).map_err(|_| self.invalid()))
            .transpose()
    }

    pub(crate) fn required_index(&self) -> Result<usize, PersistError> {
        self.index()?.ok_or_else(|| self.missing())
    }

    pub(crate) fn fill_key(&self) -> Result<Option<u32>, PersistError> {
        self.integer()?
            .map(|value| u32::try_from(value).map_err(|_| self.invalid()))
            .transpose()
    }

    pub(crate) fn alignment(&self) -> Result<Option<CellAlignment>, PersistError> {
        self.integer()?
            .map(|value| CellAlignment::from_ordinal(value).ok_or_else(|| self.invalid()))
            .transpose()
    }

    pub(crate) fn orientation(&self) -> Result<Option<CellOrientation>, PersistError> {
        self.integer()?
            .map(|value| CellOrientation::from_ordinal(value).ok_or_else(|| self.invalid()))
            .transpose()
    }
}

/// Persistence bookkeeping carried by every aspect.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AspectState {
    persisted: bool,
    changed: bool,
}

impl AspectState {
    /// True when the store holds a record for the entity.
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }

    /// True when properties changed since the last save or load.
    pub fn has_changes(&self) -> bool {
        self.changed
    }

    pub(crate) fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub(crate) fn mark_saved(&mut self, persisted: bool) {
        self.persisted = persisted;
        self.changed = false;
    }
}

/// Table defaults that per-entity overrides are compared against.
#[derive(Copy, Clone, Debug)]
pub struct AspectDefaults {
    pub row_height: f64,
    pub column_width: f64,
    pub margins: Margins,
    pub alignment: CellAlignment,
    pub orientation: CellOrientation,
}

/// The persistence surface of a header, row, column or cell.
pub trait TableAspect {
    fn aspect_type(&self) -> AspectType;

    fn aspect_id(&self) -> ElementId;

    fn state(&self) -> &AspectState;

    fn state_mut(&mut self) -> &mut AspectState;

    fn has_changes(&self) -> bool {
        self.state().has_changes()
    }

    /// Clears overrides equal to the table defaults.
    fn flush_changes_to_properties(&mut self, defaults: &AspectDefaults);

    /// False when the entity holds nothing the defaults do not already say.
    fn should_be_persisted(&self) -> bool;

    fn bind_property(&self, ordinal: usize) -> Result<PropertyValue, PersistError>;

    fn assign_property(&mut self, ordinal: usize, value: PropertyValue) -> Result<(), PersistError>;

    /// Binds every property into a record.
    fn to_record(&self) -> Result<AspectRecord, PersistError> {
        let aspect = self.aspect_type();
        let values = (0..aspect.data().properties.len())
            .map(|ordinal| self.bind_property(ordinal))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AspectRecord {
            aspect,
            id: self.aspect_id(),
            values,
        })
    }

    /// Assigns every value of a record of this aspect type.
    fn assign_record(&mut self, record: AspectRecord) -> Result<(), PersistError> {
        let aspect = self.aspect_type();
        let expected = aspect.data().properties.len();
        if record.aspect != aspect || record.values.len() != expected {
            return Err(PersistError::RecordShape {
                aspect,
                expected,
                actual: record.values.len(),
            });
        }
        for (ordinal, value) in record.values.into_iter().enumerate() {
            self.assign_property(ordinal, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_are_unique_per_aspect() {
        for aspect in AspectType::ALL {
            let names: Vec<&str> = aspect.data().properties.iter().map(|property| property.name).collect();
            let mut unique = names.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), names.len(), "{aspect}");
        }
    }

    #[test]
    fn unknown_ordinal_is_reported() {
        assert_eq!(
            AspectType::Row.property(3).map(|property| property.name),
            Err(PersistError::UnknownProperty { aspect: AspectType::Row, ordinal: 3 })
        );
    }

    #[test]
    fn assignment_checks_kinds() {
        let assignment = Assignment::new(AspectType::Column, 1, PropertyValue::Boolean(true)).expect("known ordinal");
        assert_eq!(
            assignment.double(),
            Err(PersistError::KindMismatch {
                aspect: AspectType::Column,
                property: "Width",
                expected: PropertyKind::Double,
                actual: "boolean",
            })
        );
    }

    #[test]
    fn negative_index_is_invalid() {
        let assignment = Assignment::new(AspectType::Row, 0, PropertyValue::Integer(-2)).expect("known ordinal");
        assert!(matches!(assignment.index(), Err(PersistError::InvalidValue { property: "RowIndex", .. })));
    }

    #[test]
    fn null_required_value_is_missing() {
        let assignment = Assignment::new(AspectType::TableHeader, 7, PropertyValue::Null).expect("known ordinal");
        assert_eq!(
            assignment.required_double(),
            Err(PersistError::MissingProperty {
                aspect: AspectType::TableHeader,
                property: "DefaultRowHeight",
            })
        );
    }
}
