//! # Annotation Table
//!
//! A content-sized table annotation for engineering drawings: a grid of rows
//! and columns whose sizes are negotiated from the measured size of the text
//! placed in each cell.
//!
//! ## Features
//!
//! - **Structural regions**: title, header and footer row bands, header and
//!   footer column bands, each with its own text style
//! - **Content-driven sizing**: minimum, alternate minimum and fully expanded
//!   row heights and column widths derived from the cells' content
//! - **Cascading propagation**: a column resize re-wraps its cells and grows
//!   or shrinks the rows they sit in, and the reverse for rotated text
//! - **Locks**: explicitly sized tracks keep their size; unlocked tracks
//!   follow their content
//! - **Stable identity**: rows, columns and cells keep their [`ElementId`]
//!   across insertions and deletions
//! - **Sparse persistence**: only entities with real overrides are written to
//!   an [`AspectStore`]
//!
//! Text layout and style resolution are supplied by the host through the
//! [`ContentMeasurer`] and [`StyleResolver`] traits; [`MonospaceMeasurer`]
//! and [`StyleCatalog`] are simple built-in implementations.
//!
//! ```
//! use annotation_table::{CellIndex, MonospaceMeasurer, Region, StyleCatalog, Table, TableEnvironment, TextStyle};
//!
//! let mut styles = StyleCatalog::new();
//! let body = styles.insert(TextStyle::new(2.5, 1.0));
//! let env = TableEnvironment::new(styles, MonospaceMeasurer::default());
//! let mut table = Table::create(3, 2, body, env)?;
//!
//! let block = table.new_text_block(Region::Body, "M10 hex nut, zinc plated");
//! table.set_cell_text_block(CellIndex::try_from("A2")?, block)?;
//! assert!(table.row_height(1) > Some(table.default_row_height()));
//! # Ok::<(), annotation_table::AnnotationTableError>(())
//! ```
pub mod content;
pub mod error;
pub mod options;
pub mod persist;
pub mod reference;
pub mod style;
pub mod table;

mod helpers;

pub use content::CellContent;
pub use content::ContentError;
pub use content::ContentMeasurer;
pub use content::MonospaceMeasurer;
pub use content::TextBlock;
pub use content::TextMetrics;
pub use error::AnnotationTableError;
pub use helpers::bytes::BytesError;
pub use options::OptionsError;
pub use options::TableOptions;
pub use persist::AspectRecord;
pub use persist::AspectStore;
pub use persist::AspectType;
pub use persist::MemoryStore;
pub use persist::PersistError;
pub use persist::PropertyValue;
pub use persist::TableAspect;
pub use reference::ReferenceError;
pub use style::StyleCatalog;
pub use style::StyleId;
pub use style::StyleResolver;
pub use style::TextStyle;
pub use table::cell::Cell;
pub use table::cell::CellAlignment;
pub use table::cell::CellIndex;
pub use table::cell::CellOrientation;
pub use table::cell::CellSize;
pub use table::cell::MarginOverrides;
pub use table::cell::Margins;
pub use table::cell::SizeMode;
pub use table::column::Column;
pub use table::region::Band;
pub use table::region::Region;
pub use table::row::Row;
pub use table::Axis;
pub use table::ElementId;
pub use table::InsertDirection;
pub use table::LockAction;
pub use table::Table;
pub use table::TableEnvironment;
pub use table::TableError;
pub use table::TableHeader;
