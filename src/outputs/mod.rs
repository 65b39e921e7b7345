//! Output generation: row layout and the spreadsheet sink.
//!
//! # Submodules
//!
//! - [`rows`]: Lays out one item's harvested content as fixed-width rows
//! - [`sheets`]: The [`sheets::RowStore`] seam and its Google Sheets client
//!
//! # Output Structure
//!
//! ```text
//! output spreadsheet
//! └── 250101            # one sheet per date key, replaced on every run
//!     ├── row 1         header
//!     ├── row 2         item 1 primary row
//!     ├── row 3         item 1 body page 2
//!     └── row 4 ...     item 2 primary row
//! ```

#[cfg(test)]
pub mod memory;
pub mod rows;
pub mod sheets;
