//! # htmltables
//!
//! Extract HTML tables into nested Rust values.
//!
//! A table is read in three levels: a rows query finds the rows of the
//! table, a cells query finds the cells of each row, and a content query
//! finds the content of each cell. Each level is reduced by a selection
//! strategy, so the shape of the result is up to the caller.
//!
//! ## Quick Start
//!
//! ```
//! let html = r#"
//!     <table>
//!       <tbody>
//!         <tr><td>A</td><td>B</td></tr>
//!         <tr><th>C</th><td>D</td></tr>
//!       </tbody>
//!     </table>"#;
//!
//! let rows = htmltables::parse_text(html).unwrap();
//! assert_eq!(rows[0], [Some("A".to_string()), Some("B".to_string())]);
//! assert_eq!(rows[1], [Some("C".to_string()), Some("D".to_string())]);
//! ```
//!
//! ## Custom Queries and Strategies
//!
//! Queries are XPath by default, or CSS with a `css:` prefix. Strategies
//! live in [`table::select`].
//!
//! ```
//! use htmltables::{Count, JoinText, TableParser};
//!
//! let html = "<table><tr class=x><td>a<b>b</b>c</td></tr><tr><td>d</td></tr></table>";
//!
//! let rows = TableParser::new()
//!     .rows_query("css:tr.x")?
//!     .content_query(".//text()")?
//!     .content_select(JoinText::new(""))
//!     .parse_text(html);
//! assert_eq!(rows, Some(vec![vec![Some("abc".to_string())]]));
//!
//! let row_count = TableParser::new().rows_select(Count).parse_text(html);
//! assert_eq!(row_count, Some(2));
//! # Ok::<(), htmltables::Error>(())
//! ```
//!
//! ## Working with Documents
//!
//! Parse once with [`Document::parse`] to run several extractions, to reach
//! tables other than the first, or to keep results that borrow from the
//! document:
//!
//! ```
//! use htmltables::{Document, FirstOrNone, Item, TableParser};
//!
//! let doc = Document::parse("<table><tr><td>1</td></tr></table><table><tr><td>2</td></tr></table>");
//! let parser = TableParser::new().content_select(FirstOrNone);
//!
//! let second = doc.tables().nth(1).unwrap();
//! let rows = parser.parse_table(&second);
//! assert_eq!(rows, vec![vec![Some(Item::Value("2"))]]);
//! ```

pub mod dom;
pub mod error;
pub mod query;
pub mod table;

pub use dom::{Document, NodeRef};
pub use error::{Error, Result};
pub use query::{CSS_PREFIX, Item, Query, Selection, TreeNode};
pub use table::select::{
    CellsSelect, Collect, ContentSelect, Count, FirstOrNone, FirstText, JoinText, RowsSelect,
    SelectFn,
};
pub use table::{Cells, Rows, TableParser, TableQueries, parse_table, parse_text, table_rows};
