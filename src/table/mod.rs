//! Table extraction pipeline.
//!
//! Rows are found with the rows query, cells within each row with the cells
//! query, and content within each cell with the content query. The three
//! selection strategies reduce each level; see [`select`].
//!
//! Everything is pulled lazily: nothing beyond the row query itself is
//! evaluated until the rows strategy asks for the next row, so a strategy
//! that stops early never touches the remaining rows.

mod parser;
pub mod select;

pub use parser::{TableParser, parse_text};

use tracing::debug;

use crate::error::{Error, Result};
use crate::query::xpath::{Expr, LocationPath, Step};
use crate::query::{Item, Query, TreeNode};
use select::{CellsSelect, ContentSelect, RowsSelect};

/// Default rows query: body rows.
pub const DEFAULT_ROWS_QUERY: &str = "tbody/tr";
/// Default cells query: data and header cells.
pub const DEFAULT_CELLS_QUERY: &str = "td | th";
/// Default content query: the cell's direct text nodes.
pub const DEFAULT_CONTENT_QUERY: &str = "text()";

/// The three queries driving an extraction.
#[derive(Debug, Clone)]
pub struct TableQueries<Q = Query> {
    /// Finds rows relative to the table node.
    pub rows: Q,
    /// Finds cells relative to each row.
    pub cells: Q,
    /// Finds content relative to each cell.
    pub content: Q,
}

impl TableQueries<Query> {
    /// Compile and validate all three queries.
    pub fn new(rows: &str, cells: &str, content: &str) -> Result<Self> {
        Ok(Self {
            rows: row_query(rows)?,
            cells: cell_query(cells)?,
            content: Query::parse(content)?,
        })
    }

    pub fn with_rows(mut self, rows: &str) -> Result<Self> {
        self.rows = row_query(rows)?;
        Ok(self)
    }

    pub fn with_cells(mut self, cells: &str) -> Result<Self> {
        self.cells = cell_query(cells)?;
        Ok(self)
    }

    pub fn with_content(mut self, content: &str) -> Result<Self> {
        self.content = Query::parse(content)?;
        Ok(self)
    }
}

impl Default for TableQueries<Query> {
    fn default() -> Self {
        let rows = LocationPath::relative(vec![Step::child("tbody"), Step::child("tr")]);
        let cells = Expr::union(vec![
            LocationPath::relative(vec![Step::child("td")]),
            LocationPath::relative(vec![Step::child("th")]),
        ]);
        let content = LocationPath::relative(vec![Step::text()]);

        Self {
            rows: Query::from_xpath(DEFAULT_ROWS_QUERY, rows.into()),
            cells: Query::from_xpath(DEFAULT_CELLS_QUERY, cells),
            content: Query::from_xpath(DEFAULT_CONTENT_QUERY, content.into()),
        }
    }
}

fn row_query(expr: &str) -> Result<Query> {
    node_query("rows", expr)
}

fn cell_query(expr: &str) -> Result<Query> {
    node_query("cells", expr)
}

/// Rows and cells become context nodes for further queries, so a query that
/// can only produce scalars is a configuration error.
fn node_query(role: &'static str, expr: &str) -> Result<Query> {
    let query = Query::parse(expr)?;
    if query.selects_values() {
        return Err(Error::ValueQuery {
            role,
            expr: expr.to_string(),
        });
    }
    Ok(query)
}

/// Extract `table` into whatever the three strategies compose to.
///
/// Any scalar items returned by the rows or cells query are skipped.
pub fn parse_table<N, CF, CS, RS>(
    table: &N,
    queries: &TableQueries<N::Query>,
    content_select: CF,
    cells_select: CS,
    rows_select: RS,
) -> RS::Output
where
    N: TreeNode,
    CF: ContentSelect<N>,
    CS: CellsSelect<CF::Output>,
    RS: RowsSelect<CS::Output>,
{
    rows_select.select_rows(table_rows(table, queries, content_select, cells_select))
}

/// The lazy row sequence of `table`, each row already reduced by
/// `cells_select`.
pub fn table_rows<'q, N, CF, CS>(
    table: &N,
    queries: &'q TableQueries<N::Query>,
    content_select: CF,
    cells_select: CS,
) -> Rows<'q, N, CF, CS>
where
    N: TreeNode,
{
    debug!("extracting table rows");
    Rows {
        rows: table.select(&queries.rows),
        queries,
        content_select,
        cells_select,
    }
}

/// Lazy iterator over the rows of a table.
pub struct Rows<'q, N: TreeNode, CF, CS> {
    rows: N::Selection,
    queries: &'q TableQueries<N::Query>,
    content_select: CF,
    cells_select: CS,
}

impl<N, CF, CS> Iterator for Rows<'_, N, CF, CS>
where
    N: TreeNode,
    CF: ContentSelect<N>,
    CS: CellsSelect<CF::Output>,
{
    type Item = CS::Output;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.by_ref().find_map(Item::into_node)?;
        let cells = Cells {
            cells: row.select(&self.queries.cells),
            content_query: &self.queries.content,
            content_select: &mut self.content_select,
        };
        Some(self.cells_select.select_cells(cells))
    }
}

/// Lazy iterator over the cell values of one row.
pub struct Cells<'r, N: TreeNode, CF> {
    cells: N::Selection,
    content_query: &'r N::Query,
    content_select: &'r mut CF,
}

impl<N, CF> Iterator for Cells<'_, N, CF>
where
    N: TreeNode,
    CF: ContentSelect<N>,
{
    type Item = CF::Output;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.cells.by_ref().find_map(Item::into_node)?;
        Some(
            self.content_select
                .select_content(cell.select(self.content_query)),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::select::{Collect, Count, FirstOrNone, FirstText, SelectFn};
    use super::*;

    // A hand-built tree with string queries, to exercise the pipeline
    // independently of the HTML document model.
    #[derive(Clone)]
    struct Toy {
        label: &'static str,
        children: Rc<Vec<Toy>>,
        calls: Rc<Cell<usize>>,
    }

    struct ToyQuery(&'static str);

    impl Toy {
        fn leaf(label: &'static str, calls: &Rc<Cell<usize>>) -> Self {
            Self::branch(label, vec![], calls)
        }

        fn branch(label: &'static str, children: Vec<Toy>, calls: &Rc<Cell<usize>>) -> Self {
            Self {
                label,
                children: Rc::new(children),
                calls: Rc::clone(calls),
            }
        }
    }

    impl TreeNode for Toy {
        type Value = &'static str;
        type Query = ToyQuery;
        type Selection = std::vec::IntoIter<Item<Toy, &'static str>>;

        fn select(&self, query: &ToyQuery) -> Self::Selection {
            self.calls.set(self.calls.get() + 1);
            let items: Vec<_> = match query.0 {
                "children" => self.children.iter().cloned().map(Item::Node).collect(),
                "label" if !self.label.is_empty() => vec![Item::Value(self.label)],
                "labels-mixed" => vec![Item::Value("stray"), Item::Node(self.clone())],
                _ => vec![],
            };
            items.into_iter()
        }

        fn text_content(&self) -> String {
            self.label.to_string()
        }
    }

    fn toy_queries() -> TableQueries<ToyQuery> {
        TableQueries {
            rows: ToyQuery("children"),
            cells: ToyQuery("children"),
            content: ToyQuery("label"),
        }
    }

    fn toy_table(calls: &Rc<Cell<usize>>) -> Toy {
        let row = |cells: &[&'static str]| {
            Toy::branch(
                "row",
                cells.iter().map(|&c| Toy::leaf(c, calls)).collect(),
                calls,
            )
        };
        Toy::branch(
            "table",
            vec![row(&["A", "B"]), row(&[]), row(&["C", ""])],
            calls,
        )
    }

    #[test]
    fn test_default_shape() {
        let calls = Rc::new(Cell::new(0));
        let table = toy_table(&calls);

        let rows = parse_table(&table, &toy_queries(), FirstText, Collect, Collect);
        assert_eq!(
            rows,
            vec![
                vec![Some("A".to_string()), Some("B".to_string())],
                vec![],
                vec![Some("C".to_string()), None],
            ]
        );
    }

    #[test]
    fn test_each_query_runs_once_per_node() {
        let calls = Rc::new(Cell::new(0));
        let table = toy_table(&calls);

        parse_table(&table, &toy_queries(), FirstText, Collect, Collect);
        // 1 rows query + 3 cells queries + 4 content queries.
        assert_eq!(calls.get(), 8);
    }

    #[test]
    fn test_rows_are_lazy() {
        let calls = Rc::new(Cell::new(0));
        let table = toy_table(&calls);
        let queries = toy_queries();

        let mut rows = table_rows(&table, &queries, FirstText, Collect);
        assert_eq!(calls.get(), 1);

        let first = rows.next().unwrap();
        assert_eq!(first.len(), 2);
        // Only the first row's cells and contents were queried.
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_first_or_none_rows_short_circuits() {
        let calls = Rc::new(Cell::new(0));
        let table = toy_table(&calls);

        let first = parse_table(&table, &toy_queries(), FirstText, Count, FirstOrNone);
        assert_eq!(first, Some(2));
        assert_eq!(calls.get(), 4);
    }

    #[test]
    fn test_strategies_change_shape() {
        let calls = Rc::new(Cell::new(0));
        let table = toy_table(&calls);
        let queries = toy_queries();

        assert_eq!(parse_table(&table, &queries, FirstText, Collect, Count), 3);
        assert_eq!(
            parse_table(&table, &queries, FirstText, Count, Collect),
            vec![2, 0, 2]
        );

        let present = parse_table(
            &table,
            &queries,
            FirstText,
            SelectFn(|cells: &mut dyn Iterator<Item = Option<String>>| {
                cells.flatten().collect::<Vec<_>>().join(",")
            }),
            Collect,
        );
        assert_eq!(present, vec!["A,B", "", "C"]);
    }

    #[test]
    fn test_scalar_rows_skipped() {
        let calls = Rc::new(Cell::new(0));
        let table = Toy::branch("t", vec![], &calls);
        let queries = TableQueries {
            rows: ToyQuery("labels-mixed"),
            cells: ToyQuery("nothing"),
            content: ToyQuery("label"),
        };

        let rows = parse_table(&table, &queries, FirstText, Collect, Collect);
        assert_eq!(rows, vec![Vec::<Option<String>>::new()]);
    }

    #[test]
    fn test_node_queries_validated() {
        assert!(TableQueries::new("tr", "td", "text()").is_ok());
        assert!(matches!(
            TableQueries::new("tr/text()", "td", "text()"),
            Err(Error::ValueQuery { role: "rows", .. })
        ));
        assert!(matches!(
            TableQueries::default().with_cells("td/@class"),
            Err(Error::ValueQuery { role: "cells", .. })
        ));
        assert!(TableQueries::default().with_content("@class").is_ok());
        assert!(matches!(
            TableQueries::default().with_rows("tr["),
            Err(Error::XPath { .. })
        ));
    }

    #[test]
    fn test_default_queries_match_their_source() {
        let queries = TableQueries::default();
        assert_eq!(queries.rows.as_str(), DEFAULT_ROWS_QUERY);
        assert_eq!(queries.cells.as_str(), DEFAULT_CELLS_QUERY);
        assert_eq!(queries.content.as_str(), DEFAULT_CONTENT_QUERY);

        let parsed = TableQueries::new(
            DEFAULT_ROWS_QUERY,
            DEFAULT_CELLS_QUERY,
            DEFAULT_CONTENT_QUERY,
        )
        .unwrap();
        assert!(parsed.content.selects_values());
        assert!(queries.content.selects_values());
    }
}
