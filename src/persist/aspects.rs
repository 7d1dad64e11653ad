use crate::content::CellContent;
use crate::content::TextContent;
use crate::persist::AspectDefaults;
use crate::persist::AspectState;
use crate::persist::AspectType;
use crate::persist::Assignment;
use crate::persist::PersistError;
use crate::persist::PropertyValue;
use crate::persist::TableAspect;
use crate::style::StyleId;
use crate::table::cell::Cell;
use crate::table::cell::CellIndex;
use crate::table::column::Column;
use crate::table::is_equal;
use crate::table::region::Region;
use crate::table::row::Row;
use crate::table::ElementId;
use crate::table::TableHeader;

/// First ordinal of the six per-region text styles.
const TEXT_STYLE_ORDINAL: usize = 15;

/// Drops an override equal to its default.
fn cull_size(value: &mut Option<f64>, default: f64) {
    if value.is_some_and(|value| is_equal(value, default)) {
        *value = None;
    }
}

fn cull<T: PartialEq>(value: &mut Option<T>, default: &T) {
    if value.as_ref() == Some(default) {
        *value = None;
    }
}

fn index_value(index: usize) -> PropertyValue {
    PropertyValue::Integer(index as i64)
}

impl TableHeader {
    pub(crate) fn defaults(&self) -> AspectDefaults {
        AspectDefaults {
            row_height: self.default_row_height,
            column_width: self.default_column_width,
            margins: self.default_margins,
            alignment: self.default_alignment,
            orientation: self.default_orientation,
        }
    }
}

impl TableAspect for TableHeader {
    fn aspect_type(&self) -> AspectType {
        AspectType::TableHeader
    }

    fn aspect_id(&self) -> ElementId {
        self.id
    }

    fn state(&self) -> &AspectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AspectState {
        &mut self.state
    }

    /// The header holds the defaults themselves; nothing to cull.
    fn flush_changes_to_properties(&mut self, _defaults: &AspectDefaults) {}

    fn should_be_persisted(&self) -> bool {
        true
    }

    fn bind_property(&self, ordinal: usize) -> Result<PropertyValue, PersistError> {
        let margins = &self.default_margins;
        let value = match ordinal {
            0 => index_value(self.row_count),
            1 => index_value(self.column_count),
            2 => index_value(self.title_row_count),
            3 => index_value(self.header_row_count),
            4 => index_value(self.footer_row_count),
            5 => index_value(self.header_column_count),
            6 => index_value(self.footer_column_count),
            7 => PropertyValue::Double(self.default_row_height),
            8 => PropertyValue::Double(self.default_column_width),
            9 => PropertyValue::Double(margins.top),
            10 => PropertyValue::Double(margins.bottom),
            11 => PropertyValue::Double(margins.left),
            12 => PropertyValue::Double(margins.right),
            13 => PropertyValue::Integer(self.default_alignment.ordinal()),
            14 => PropertyValue::Integer(self.default_orientation.ordinal()),
            style if style < TEXT_STYLE_ORDINAL + Region::COUNT => {
                PropertyValue::from(self.text_styles[style - TEXT_STYLE_ORDINAL].map(|id| id.0 as i64))
            }
            _ => Err(PersistError::UnknownProperty {
                aspect: AspectType::TableHeader,
                ordinal,
            })?,
        };
        Ok(value)
    }

    fn assign_property(&mut self, ordinal: usize, value: PropertyValue) -> Result<(), PersistError> {
        let value = Assignment::new(AspectType::TableHeader, ordinal, value)?;
        match ordinal {
            0 => self.row_count = value.required_index()?,
            1 => self.column_count = value.required_index()?,
            2 => self.title_row_count = value.index()?.unwrap_or(0),
            3 => self.header_row_count = value.index()?.unwrap_or(0),
            4 => self.footer_row_count = value.index()?.unwrap_or(0),
            5 => self.header_column_count = value.index()?.unwrap_or(0),
            6 => self.footer_column_count = value.index()?.unwrap_or(0),
            7 => self.default_row_height = value.required_double()?,
            8 => self.default_column_width = value.required_double()?,
            9 => self.default_margins.top = value.required_double()?,
            10 => self.default_margins.bottom = value.required_double()?,
            11 => self.default_margins.left = value.required_double()?,
            12 => self.default_margins.right = value.required_double()?,
            13 => self.default_alignment = value.alignment()?.unwrap_or_default(),
            14 => self.default_orientation = value.orientation()?.unwrap_or_default(),
            style => {
                self.text_styles[style - TEXT_STYLE_ORDINAL] = value.integer()?.map(|id| StyleId(id as u64));
            }
        }
        Ok(())
    }
}

impl TableAspect for Row {
    fn aspect_type(&self) -> AspectType {
        AspectType::Row
    }

    fn aspect_id(&self) -> ElementId {
        self.id
    }

    fn state(&self) -> &AspectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AspectState {
        &mut self.state
    }

    fn flush_changes_to_properties(&mut self, defaults: &AspectDefaults) {
        cull_size(&mut self.height, defaults.row_height);
        // An absent row lock reads as unlocked.
        cull(&mut self.height_lock, &false);
    }

    fn should_be_persisted(&self) -> bool {
        self.height.is_some() || self.height_lock.is_some()
    }

    fn bind_property(&self, ordinal: usize) -> Result<PropertyValue, PersistError> {
        match ordinal {
            0 => Ok(index_value(self.index)),
            1 => Ok(PropertyValue::from(self.height)),
            2 => Ok(PropertyValue::from(self.height_lock)),
            _ => Err(PersistError::UnknownProperty {
                aspect: AspectType::Row,
                ordinal,
            }),
        }
    }

    fn assign_property(&mut self, ordinal: usize, value: PropertyValue) -> Result<(), PersistError> {
        let value = Assignment::new(AspectType::Row, ordinal, value)?;
        match ordinal {
            0 => self.index = value.required_index()?,
            1 => self.height = value.double()?,
            _ => self.height_lock = value.boolean()?,
        }
        Ok(())
    }
}

impl TableAspect for Column {
    fn aspect_type(&self) -> AspectType {
        AspectType::Column
    }

    fn aspect_id(&self) -> ElementId {
        self.id
    }

    fn state(&self) -> &AspectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AspectState {
        &mut self.state
    }

    fn flush_changes_to_properties(&mut self, defaults: &AspectDefaults) {
        cull_size(&mut self.width, defaults.column_width);
        // An absent column lock reads as locked.
        cull(&mut self.width_lock, &true);
    }

    fn should_be_persisted(&self) -> bool {
        self.width.is_some() || self.width_lock.is_some()
    }

    fn bind_property(&self, ordinal: usize) -> Result<PropertyValue, PersistError> {
        match ordinal {
            0 => Ok(index_value(self.index)),
            1 => Ok(PropertyValue::from(self.width)),
            2 => Ok(PropertyValue::from(self.width_lock)),
            _ => Err(PersistError::UnknownProperty {
                aspect: AspectType::Column,
                ordinal,
            }),
        }
    }

    fn assign_property(&mut self, ordinal: usize, value: PropertyValue) -> Result<(), PersistError> {
        let value = Assignment::new(AspectType::Column, ordinal, value)?;
        match ordinal {
            0 => self.index = value.required_index()?,
            1 => self.width = value.double()?,
            _ => self.width_lock = value.boolean()?,
        }
        Ok(())
    }
}

impl TableAspect for Cell {
    fn aspect_type(&self) -> AspectType {
        AspectType::Cell
    }

    fn aspect_id(&self) -> ElementId {
        self.id
    }

    fn state(&self) -> &AspectState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut AspectState {
        &mut self.state
    }

    fn flush_changes_to_properties(&mut self, defaults: &AspectDefaults) {
        cull(&mut self.alignment, &defaults.alignment);
        cull(&mut self.orientation, &defaults.orientation);
        cull_size(&mut self.margins.top, defaults.margins.top);
        cull_size(&mut self.margins.bottom, defaults.margins.bottom);
        cull_size(&mut self.margins.left, defaults.margins.left);
        cull_size(&mut self.margins.right, defaults.margins.right);
    }

    fn should_be_persisted(&self) -> bool {
        self.content.is_persistable()
            || self.fill_key.is_some()
            || self.alignment.is_some()
            || self.orientation.is_some()
            || !self.margins.is_empty()
    }

    fn bind_property(&self, ordinal: usize) -> Result<PropertyValue, PersistError> {
        let value = match ordinal {
            0 => index_value(self.index.row),
            1 => index_value(self.index.col),
            2 => PropertyValue::from(self.fill_key.map(i64::from)),
            3 => PropertyValue::from(self.alignment.map(|alignment| alignment.ordinal())),
            4 => PropertyValue::from(self.orientation.map(|orientation| orientation.ordinal())),
            5 => PropertyValue::from(self.margins.top),
            6 => PropertyValue::from(self.margins.bottom),
            7 => PropertyValue::from(self.margins.left),
            8 => PropertyValue::from(self.margins.right),
            9 if !self.content.is_persistable() => PropertyValue::Null,
            9 => PropertyValue::from(self.content.text().to_blob()),
            _ => Err(PersistError::UnknownProperty {
                aspect: AspectType::Cell,
                ordinal,
            })?,
        };
        Ok(value)
    }

    fn assign_property(&mut self, ordinal: usize, value: PropertyValue) -> Result<(), PersistError> {
        let value = Assignment::new(AspectType::Cell, ordinal, value)?;
        match ordinal {
            0 => self.index = CellIndex::new(value.required_index()?, self.index.col),
            1 => self.index = CellIndex::new(self.index.row, value.required_index()?),
            2 => self.fill_key = value.fill_key()?,
            3 => self.alignment = value.alignment()?,
            4 => self.orientation = value.orientation()?,
            5 => self.margins.top = value.double()?,
            6 => self.margins.bottom = value.double()?,
            7 => self.margins.left = value.double()?,
            8 => self.margins.right = value.double()?,
            _ => {
                self.content = match value.blob()? {
                    Some(blob) => CellContent::Text(TextContent::from_persisted(blob)),
                    None => CellContent::default(),
                };
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TextBlock;
    use crate::style::TextStyle;
    use crate::table::cell::CellAlignment;
    use crate::table::cell::Margins;
    use crate::table::cell::CellOrientation;

    fn defaults() -> AspectDefaults {
        AspectDefaults {
            row_height: 1.6,
            column_width: 10.0,
            margins: Margins::uniform(0.3),
            alignment: CellAlignment::TopLeft,
            orientation: CellOrientation::Horizontal,
        }
    }

    #[test]
    fn column_width_equal_to_default_is_culled() {
        let mut column = Column::new(ElementId(4), 0);
        column.width = Some(10.0 + 1e-9);
        column.width_lock = Some(true);

        column.flush_changes_to_properties(&defaults());

        assert_eq!(column.width_override(), None);
        assert_eq!(column.width_lock_override(), None);
        assert!(!column.should_be_persisted());
    }

    #[test]
    fn unlocked_column_is_kept() {
        let mut column = Column::new(ElementId(4), 2);
        column.width_lock = Some(false);
        column.flush_changes_to_properties(&defaults());

        assert!(column.should_be_persisted());
        let record = column.to_record().expect("bindable");
        assert_eq!(
            record.values,
            vec![PropertyValue::Integer(2), PropertyValue::Null, PropertyValue::Boolean(false)]
        );
    }

    #[test]
    fn cell_overrides_matching_defaults_are_culled() {
        let mut cell = Cell::new(ElementId(9), CellIndex::new(1, 1));
        cell.alignment = Some(CellAlignment::TopLeft);
        cell.margins.left = Some(0.3);
        cell.margins.right = Some(0.5);

        cell.flush_changes_to_properties(&defaults());

        assert_eq!(cell.alignment_override(), None);
        assert_eq!(cell.margin_overrides().left, None);
        assert_eq!(cell.margin_overrides().right, Some(0.5));
        assert!(cell.should_be_persisted());
    }

    #[test]
    fn cell_record_restores_content_and_overrides() {
        let mut cell = Cell::new(ElementId(9), CellIndex::new(3, 2));
        cell.set_text_block(Some(TextBlock::new("M8 x 1.25", TextStyle::new(1.0, 1.0))));
        cell.orientation = Some(CellOrientation::Rotate270);
        cell.fill_key = Some(7);
        let record = cell.to_record().expect("bindable");

        let mut restored = Cell::new(ElementId(9), CellIndex::new(0, 0));
        restored.assign_record(record).expect("assignable");

        assert_eq!(restored.index(), CellIndex::new(3, 2));
        assert_eq!(restored.orientation_override(), Some(CellOrientation::Rotate270));
        assert_eq!(restored.fill_key(), Some(7));
        assert_eq!(restored.text_block().map(TextBlock::text), Some("M8 x 1.25"));
    }

    #[test]
    fn header_binds_text_styles_by_region() {
        let mut header = TableHeader::new(ElementId(1), 2, 3);
        header.text_styles[Region::FooterRow.ordinal()] = Some(StyleId(12));

        let footer = TEXT_STYLE_ORDINAL + Region::FooterRow.ordinal();
        assert_eq!(header.bind_property(footer), Ok(PropertyValue::Integer(12)));
        assert_eq!(header.bind_property(TEXT_STYLE_ORDINAL), Ok(PropertyValue::Null));
        assert!(header.bind_property(TEXT_STYLE_ORDINAL + Region::COUNT).is_err());
    }

    #[test]
    fn header_rejects_null_row_count() {
        let mut header = TableHeader::new(ElementId(1), 2, 3);
        assert!(matches!(
            header.assign_property(0, PropertyValue::Null),
            Err(PersistError::MissingProperty { property: "RowCount", .. })
        ));
    }

    #[test]
    fn record_with_wrong_shape_is_rejected() {
        let mut row = Row::new(&mut Default::default(), 0, 1);
        let record = crate::persist::AspectRecord {
            aspect: AspectType::Row,
            id: ElementId(3),
            values: vec![PropertyValue::Integer(0)],
        };
        assert_eq!(
            row.assign_record(record),
            Err(PersistError::RecordShape { aspect: AspectType::Row, expected: 3, actual: 1 })
        );
    }
}
