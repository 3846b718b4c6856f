//! Selection strategies for the three levels of the extraction pipeline.
//!
//! Each level receives a lazy iterator and reduces it to one value:
//!
//! | level   | input                                  | default       |
//! |---------|----------------------------------------|---------------|
//! | content | items matched by the content query     | [`FirstText`] |
//! | cells   | per-cell values of one row             | [`Collect`]   |
//! | rows    | per-row values of the table            | [`Collect`]   |
//!
//! Closures plug in through [`SelectFn`]:
//!
//! ```
//! use htmltables::{SelectFn, TableParser};
//!
//! let parser = TableParser::new().rows_select(SelectFn(
//!     |rows: &mut dyn Iterator<Item = Vec<Option<String>>>| rows.skip(1).collect::<Vec<_>>(),
//! ));
//! let body = parser
//!     .parse_text("<table><tr><th>h</th></tr><tr><td>v</td></tr></table>")
//!     .unwrap();
//! assert_eq!(body, vec![vec![Some("v".to_string())]]);
//! ```

use crate::query::{Item, TreeNode};

/// Reduces the items matched inside one cell to the cell's value.
pub trait ContentSelect<N: TreeNode> {
    type Output;

    fn select_content(&mut self, content: N::Selection) -> Self::Output;
}

/// Reduces the lazy per-cell values of one row to the row's value.
pub trait CellsSelect<T> {
    type Output;

    fn select_cells<I: Iterator<Item = T>>(&mut self, cells: I) -> Self::Output;
}

/// Reduces the lazy per-row values to the final result.
pub trait RowsSelect<T> {
    type Output;

    fn select_rows<I: Iterator<Item = T>>(self, rows: I) -> Self::Output;
}

/// First element, or `None` for an empty sequence. Valid at every level.
///
/// At content level the item is returned as is, so the value still borrows
/// from the document.
///
/// Later items are dropped: a cell such as `<td>a<b>b</b>c</td>` has three
/// text nodes under `.//text()` and yields only `"a"`. Use [`JoinText`] to
/// keep them all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstOrNone;

impl<N: TreeNode> ContentSelect<N> for FirstOrNone {
    type Output = Option<Item<N, N::Value>>;

    fn select_content(&mut self, mut content: N::Selection) -> Self::Output {
        content.next()
    }
}

impl<T> CellsSelect<T> for FirstOrNone {
    type Output = Option<T>;

    fn select_cells<I: Iterator<Item = T>>(&mut self, mut cells: I) -> Option<T> {
        cells.next()
    }
}

impl<T> RowsSelect<T> for FirstOrNone {
    type Output = Option<T>;

    fn select_rows<I: Iterator<Item = T>>(self, mut rows: I) -> Option<T> {
        rows.next()
    }
}

/// First item as an owned string, or `None` when nothing matched.
///
/// Nodes are converted through their text content. Same data loss caveat as
/// [`FirstOrNone`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstText;

impl<N: TreeNode> ContentSelect<N> for FirstText {
    type Output = Option<String>;

    fn select_content(&mut self, mut content: N::Selection) -> Option<String> {
        content.next().map(|item| item.text())
    }
}

/// Text of every matched item joined with a separator, or `None` when
/// nothing matched.
#[derive(Debug, Clone, Default)]
pub struct JoinText {
    pub separator: String,
}

impl JoinText {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl<N: TreeNode> ContentSelect<N> for JoinText {
    type Output = Option<String>;

    fn select_content(&mut self, content: N::Selection) -> Option<String> {
        let mut joined: Option<String> = None;
        for item in content {
            match &mut joined {
                Some(text) => {
                    text.push_str(&self.separator);
                    text.push_str(&item.text());
                }
                None => joined = Some(item.text()),
            }
        }
        joined
    }
}

/// Materialize the sequence into a `Vec`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Collect;

impl<T> CellsSelect<T> for Collect {
    type Output = Vec<T>;

    fn select_cells<I: Iterator<Item = T>>(&mut self, cells: I) -> Vec<T> {
        cells.collect()
    }
}

impl<T> RowsSelect<T> for Collect {
    type Output = Vec<T>;

    fn select_rows<I: Iterator<Item = T>>(self, rows: I) -> Vec<T> {
        rows.collect()
    }
}

/// Number of elements in the sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Count;

impl<N: TreeNode> ContentSelect<N> for Count {
    type Output = usize;

    fn select_content(&mut self, content: N::Selection) -> usize {
        content.count()
    }
}

impl<T> CellsSelect<T> for Count {
    type Output = usize;

    fn select_cells<I: Iterator<Item = T>>(&mut self, cells: I) -> usize {
        cells.count()
    }
}

impl<T> RowsSelect<T> for Count {
    type Output = usize;

    fn select_rows<I: Iterator<Item = T>>(self, rows: I) -> usize {
        rows.count()
    }
}

/// Adapts a closure over `&mut dyn Iterator` into a strategy.
///
/// The closure must spell out its argument type, e.g.
/// `|cells: &mut dyn Iterator<Item = Option<String>>| ...`.
#[derive(Debug, Clone, Copy)]
pub struct SelectFn<F>(pub F);

impl<N, F, O> ContentSelect<N> for SelectFn<F>
where
    N: TreeNode,
    F: FnMut(&mut dyn Iterator<Item = Item<N, N::Value>>) -> O,
{
    type Output = O;

    fn select_content(&mut self, mut content: N::Selection) -> O {
        (self.0)(&mut content)
    }
}

impl<T, F, O> CellsSelect<T> for SelectFn<F>
where
    F: FnMut(&mut dyn Iterator<Item = T>) -> O,
{
    type Output = O;

    fn select_cells<I: Iterator<Item = T>>(&mut self, mut cells: I) -> O {
        (self.0)(&mut cells)
    }
}

impl<T, F, O> RowsSelect<T> for SelectFn<F>
where
    F: FnOnce(&mut dyn Iterator<Item = T>) -> O,
{
    type Output = O;

    fn select_rows<I: Iterator<Item = T>>(self, mut rows: I) -> O {
        (self.0)(&mut rows)
    }
}
