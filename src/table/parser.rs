//! Builder bundling the queries and strategies of an extraction.

use tracing::debug;

use super::select::{CellsSelect, Collect, ContentSelect, FirstText, RowsSelect};
use super::{Rows, TableQueries};
use crate::dom::{Document, NodeRef};
use crate::error::Result;

/// Extracts tables with a fixed set of queries and strategies.
///
/// Defaults to `tbody/tr` rows, `td | th` cells and the first `text()` of
/// each cell, collected into `Vec<Vec<Option<String>>>`.
///
/// ```
/// use htmltables::{Count, TableParser};
///
/// let html = "<table><tr><td>A</td><td>B</td></tr><tr><th>C</th><td>D</td></tr></table>";
///
/// let rows = TableParser::new().parse_text(html).unwrap();
/// assert_eq!(rows[1][0].as_deref(), Some("C"));
///
/// let counted = TableParser::new().rows_select(Count).parse_text(html);
/// assert_eq!(counted, Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct TableParser<CF = FirstText, CS = Collect, RS = Collect> {
    queries: TableQueries,
    content_select: CF,
    cells_select: CS,
    rows_select: RS,
}

impl TableParser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for TableParser {
    fn default() -> Self {
        Self {
            queries: TableQueries::default(),
            content_select: FirstText,
            cells_select: Collect,
            rows_select: Collect,
        }
    }
}

impl<CF, CS, RS> TableParser<CF, CS, RS> {
    pub fn queries(&self) -> &TableQueries {
        &self.queries
    }

    pub fn with_queries(mut self, queries: TableQueries) -> Self {
        self.queries = queries;
        self
    }

    /// Replace the rows query. Fails on syntax errors and on queries that
    /// cannot select elements.
    pub fn rows_query(mut self, expr: &str) -> Result<Self> {
        self.queries = self.queries.with_rows(expr)?;
        Ok(self)
    }

    /// Replace the cells query. Same validation as [`Self::rows_query`].
    pub fn cells_query(mut self, expr: &str) -> Result<Self> {
        self.queries = self.queries.with_cells(expr)?;
        Ok(self)
    }

    pub fn content_query(mut self, expr: &str) -> Result<Self> {
        self.queries = self.queries.with_content(expr)?;
        Ok(self)
    }

    pub fn content_select<C>(self, content_select: C) -> TableParser<C, CS, RS> {
        TableParser {
            queries: self.queries,
            content_select,
            cells_select: self.cells_select,
            rows_select: self.rows_select,
        }
    }

    pub fn cells_select<C>(self, cells_select: C) -> TableParser<CF, C, RS> {
        TableParser {
            queries: self.queries,
            content_select: self.content_select,
            cells_select,
            rows_select: self.rows_select,
        }
    }

    pub fn rows_select<R>(self, rows_select: R) -> TableParser<CF, CS, R> {
        TableParser {
            queries: self.queries,
            content_select: self.content_select,
            cells_select: self.cells_select,
            rows_select,
        }
    }

    /// Parse `text` and extract its first table.
    ///
    /// Returns `None` when the document has no table. The parse tree is
    /// dropped before returning, so the content strategy must produce owned
    /// values; use [`Self::parse_document`] for borrowed ones.
    pub fn parse_text<T, R, O>(&self, text: &str) -> Option<O>
    where
        CF: Clone + for<'a> ContentSelect<NodeRef<'a>, Output = T>,
        CS: Clone + CellsSelect<T, Output = R>,
        RS: Clone + RowsSelect<R, Output = O>,
    {
        let doc = Document::parse(text);
        let Some(table) = doc.first_table() else {
            debug!("document contains no table");
            return None;
        };
        let extracted = super::parse_table(
            &table,
            &self.queries,
            self.content_select.clone(),
            self.cells_select.clone(),
            self.rows_select.clone(),
        );
        Some(extracted)
    }

    /// Extract the first table of an already parsed document.
    pub fn parse_document<'a>(
        &self,
        doc: &'a Document,
    ) -> Option<<RS as RowsSelect<CS::Output>>::Output>
    where
        CF: Clone + ContentSelect<NodeRef<'a>>,
        CS: Clone + CellsSelect<CF::Output>,
        RS: Clone + RowsSelect<CS::Output>,
    {
        let table = doc.first_table()?;
        Some(self.parse_table(&table))
    }

    /// Extract `table`, which need not be a `table` element.
    pub fn parse_table<'a>(&self, table: &NodeRef<'a>) -> <RS as RowsSelect<CS::Output>>::Output
    where
        CF: Clone + ContentSelect<NodeRef<'a>>,
        CS: Clone + CellsSelect<CF::Output>,
        RS: Clone + RowsSelect<CS::Output>,
    {
        super::parse_table(
            table,
            &self.queries,
            self.content_select.clone(),
            self.cells_select.clone(),
            self.rows_select.clone(),
        )
    }

    /// Lazy rows of `table`, bypassing the rows strategy.
    pub fn rows<'a>(&self, table: &NodeRef<'a>) -> Rows<'_, NodeRef<'a>, CF, CS>
    where
        CF: Clone,
        CS: Clone,
    {
        super::table_rows(
            table,
            &self.queries,
            self.content_select.clone(),
            self.cells_select.clone(),
        )
    }
}

/// Extract the first table of `text` with the default queries and strategies.
///
/// ```
/// let rows = htmltables::parse_text("<table><tr><td>A</td><td></td></tr></table>");
/// assert_eq!(rows, Some(vec![vec![Some("A".to_string()), None]]));
///
/// assert_eq!(htmltables::parse_text("<p>no tables here</p>"), None);
/// ```
pub fn parse_text(text: &str) -> Option<Vec<Vec<Option<String>>>> {
    TableParser::new().parse_text(text)
}
