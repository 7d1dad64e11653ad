//! # Table Options
//!
//! Engine-wide settings carried by a [`TableEnvironment`]. Options can be
//! written as text, `"name=value, name=value"`, and parsed with
//! [`TableOptions::try_from`]; every option has its own [`NamedOption`]
//! handler that knows its name and how to validate its value.
//!
//! [`TableEnvironment`]: crate::table::TableEnvironment
use regex::Regex;
use thiserror::Error;

/// Errors raised while parsing option text.
#[derive(Error, Debug, PartialEq)]
pub enum OptionsError {
    /// Entry not of the form `name=value`
    #[error("Invalid option entry '{0}'")]
    InvalidFormat(String),

    /// Name that matches no option
    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    /// Value rejected by the option's handler
    #[error("Invalid value for option '{name}': {message}")]
    InvalidValue { name: &'static str, message: String },
}

/// Settings of the sizing engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TableOptions {
    /// Nested row/column resizes allowed within one mutation
    pub max_propagation_depth: usize,
    /// Text height used when no region style resolves
    pub backup_text_height: f64,
    /// Descender adjustment as a fraction of the text height
    pub descender_ratio: f64,
    /// New tables get a default column width of this many character heights
    pub column_width_factor: f64,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            max_propagation_depth: 64,
            backup_text_height: 1.0,
            descender_ratio: 0.3,
            column_width_factor: 10.0,
        }
    }
}

/// Handler for one textual option.
///
/// # Type Parameters
///
/// * `T` - The type of the option value
pub trait NamedOption<T> {
    /// Returns the option name as written in option text
    fn name() -> &'static str;

    /// Parses and validates the textual value
    fn read(value: &str) -> Result<T, OptionsError>;

    /// Stores a validated value
    fn assign(options: &mut TableOptions, value: T);

    /// Parses `value` and stores it in `options`
    fn apply(options: &mut TableOptions, value: &str) -> Result<(), OptionsError> {
        let value = Self::read(value)?;
        Self::assign(options, value);
        Ok(())
    }
}

struct MaxPropagationDepthOption;

struct BackupTextHeightOption;

struct DescenderRatioOption;

struct ColumnWidthFactorOption;

fn invalid(name: &'static str, message: String) -> OptionsError {
    OptionsError::InvalidValue { name, message }
}

/// Parses a finite number accepted by `filter`.
fn read_number(name: &'static str, value: &str, filter: fn(f64) -> bool, expected: &str) -> Result<f64, OptionsError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite() && filter(*number))
        .ok_or_else(|| invalid(name, format!("'{value}' is not {expected}")))
}

impl NamedOption<usize> for MaxPropagationDepthOption {
    fn name() -> &'static str {
        "max_propagation_depth"
    }

    fn read(value: &str) -> Result<usize, OptionsError> {
        value
            .parse::<usize>()
            .ok()
            .filter(|depth| *depth > 0)
            .ok_or_else(|| invalid(Self::name(), format!("'{value}' is not a positive integer")))
    }

    fn assign(options: &mut TableOptions, value: usize) {
        options.max_propagation_depth = value;
    }
}

impl NamedOption<f64> for BackupTextHeightOption {
    fn name() -> &'static str {
        "backup_text_height"
    }

    fn read(value: &str) -> Result<f64, OptionsError> {
        read_number(Self::name(), value, |number| number > 0.0, "a positive number")
    }

    fn assign(options: &mut TableOptions, value: f64) {
        options.backup_text_height = value;
    }
}

impl NamedOption<f64> for DescenderRatioOption {
    fn name() -> &'static str {
        "descender_ratio"
    }

    fn read(value: &str) -> Result<f64, OptionsError> {
        read_number(Self::name(), value, |number| number >= 0.0, "a non-negative number")
    }

    fn assign(options: &mut TableOptions, value: f64) {
        options.descender_ratio = value;
    }
}

impl NamedOption<f64> for ColumnWidthFactorOption {
    fn name() -> &'static str {
        "column_width_factor"
    }

    fn read(value: &str) -> Result<f64, OptionsError> {
        read_number(Self::name(), value, |number| number > 0.0, "a positive number")
    }

    fn assign(options: &mut TableOptions, value: f64) {
        options.column_width_factor = value;
    }
}

impl TryFrom<&str> for TableOptions {
    type Error = OptionsError;

    /// Parses comma separated `name=value` entries over the defaults.
    ///
    /// Names are case-insensitive; empty entries are ignored.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^\s*([A-Za-z_]+)\s*=\s*(\S+)\s*$").expect("Hardcode regex pattern");
        let mut options = TableOptions::default();
        for entry in value.split(',').filter(|entry| !entry.trim().is_empty()) {
            let captures = pattern
                .captures(entry)
                .ok_or_else(|| OptionsError::InvalidFormat(entry.trim().to_owned()))?;
            let name = captures[1].to_ascii_lowercase();
            let value = &captures[2];
            match name.as_str() {
                name if name == MaxPropagationDepthOption::name() => MaxPropagationDepthOption::apply(&mut options, value)?,
                name if name == BackupTextHeightOption::name() => BackupTextHeightOption::apply(&mut options, value)?,
                name if name == DescenderRatioOption::name() => DescenderRatioOption::apply(&mut options, value)?,
                name if name == ColumnWidthFactorOption::name() => ColumnWidthFactorOption::apply(&mut options, value)?,
                unknown => return Err(OptionsError::UnknownOption(unknown.to_owned())),
            }
        }
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_gives_defaults() {
        assert_eq!(TableOptions::try_from(""), Ok(TableOptions::default()));
        assert_eq!(TableOptions::try_from(" , "), Ok(TableOptions::default()));
    }

    #[test]
    fn parses_known_options() {
        let options = TableOptions::try_from("max_propagation_depth=8, Descender_Ratio = 0.25,column_width_factor=12")
            .expect("valid options");

        assert_eq!(options.max_propagation_depth, 8);
        assert_eq!(options.descender_ratio, 0.25);
        assert_eq!(options.column_width_factor, 12.0);
        assert_eq!(options.backup_text_height, 1.0);
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            TableOptions::try_from("line_spacing=2"),
            Err(OptionsError::UnknownOption("line_spacing".to_owned()))
        );
    }

    #[test]
    fn rejects_malformed_entries() {
        assert_eq!(
            TableOptions::try_from("descender_ratio"),
            Err(OptionsError::InvalidFormat("descender_ratio".to_owned()))
        );
    }

    #[test]
    fn validates_values() {
        assert!(matches!(
            TableOptions::try_from("max_propagation_depth=0"),
            Err(OptionsError::InvalidValue { name: "max_propagation_depth", .. })
        ));
        assert!(matches!(
            TableOptions::try_from("backup_text_height=-1"),
            Err(OptionsError::InvalidValue { name: "backup_text_height", .. })
        ));
        assert!(matches!(
            TableOptions::try_from("column_width_factor=inf"),
            Err(OptionsError::InvalidValue { name: "column_width_factor", .. })
        ));
    }
}
