//! Structural bands and regions.
//!
//! Rows fall into Title, Header, Body and Footer bands; columns into Header,
//! Body and Footer bands. A cell's region combines the two: Title, Header
//! and Footer rows run the full table width, so their band wins, and column
//! bands only matter inside the Body rows.
use std::fmt::Display;

/// The structural band of a single row or column.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Band {
    Title,
    Header,
    Footer,
    Body,
}

/// The resolved structural classification of a cell, and the key for the
/// per-region text styles.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Region {
    Body,
    TitleRow,
    HeaderRow,
    FooterRow,
    HeaderColumn,
    FooterColumn,
}

impl Region {
    pub const COUNT: usize = 6;

    pub const ALL: [Region; Region::COUNT] = [
        Region::Body,
        Region::TitleRow,
        Region::HeaderRow,
        Region::FooterRow,
        Region::HeaderColumn,
        Region::FooterColumn,
    ];

    /// Dense position of the region, used to index per-region tables.
    pub const fn ordinal(self) -> usize {
        match self {
            Region::Body => 0,
            Region::TitleRow => 1,
            Region::HeaderRow => 2,
            Region::FooterRow => 3,
            Region::HeaderColumn => 4,
            Region::FooterColumn => 5,
        }
    }

    /// The region a row band imposes on every cell of the row, if any.
    pub const fn for_row_band(band: Band) -> Option<Region> {
        match band {
            Band::Title => Some(Region::TitleRow),
            Band::Header => Some(Region::HeaderRow),
            Band::Footer => Some(Region::FooterRow),
            Band::Body => None,
        }
    }

    /// The region of a Body-row cell in a column of the given band.
    pub const fn for_column_band(band: Band) -> Region {
        match band {
            Band::Header => Region::HeaderColumn,
            Band::Footer => Region::FooterColumn,
            Band::Title | Band::Body => Region::Body,
        }
    }

    /// Combines a row band and a column band into a cell region.
    pub const fn of_cell(row_band: Band, column_band: Band) -> Region {
        match Region::for_row_band(row_band) {
            Some(region) => region,
            None => Region::for_column_band(column_band),
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::Body => "body",
            Region::TitleRow => "title row",
            Region::HeaderRow => "header row",
            Region::FooterRow => "footer row",
            Region::HeaderColumn => "header column",
            Region::FooterColumn => "footer column",
        };
        f.write_str(name)
    }
}

/// Classifies position `index` of a dimension holding `count` entries.
///
/// Header is tested before Footer, so overlapping header and footer bands
/// resolve to Header. Columns pass `num_title = 0`.
pub fn classify(num_title: usize, num_header: usize, num_footer: usize, count: usize, index: usize) -> Band {
    if index < num_title {
        Band::Title
    } else if index < num_title + num_header {
        Band::Header
    } else if index + num_footer >= count {
        Band::Footer
    } else {
        Band::Body
    }
}
