use super::TypedElement;
use crate::by::By;
use crate::element::{Element, WebElement};
use crate::result::{PagewrightError, PagewrightResult};
use std::collections::HashMap;

crate::typed_element! {
    /// HTML table.
    ///
    /// Headings are the table's `th` cells; rows are its `tr` elements
    /// holding `td` cells. A `tr` made only of `th` cells is a heading row
    /// and is not reported as a data row.
    Table
}

fn texts(cells: &[WebElement]) -> PagewrightResult<Vec<String>> {
    cells.iter().map(WebElement::text).collect()
}

impl Table {
    pub fn headings(&self) -> PagewrightResult<Vec<WebElement>> {
        self.element().find_elements(&By::tag_name("th"))
    }

    pub fn headings_as_string(&self) -> PagewrightResult<Vec<String>> {
        texts(&self.headings()?)
    }

    /// Data rows, each as its `td` cells
    pub fn rows(&self) -> PagewrightResult<Vec<Vec<WebElement>>> {
        let mut rows = Vec::new();
        for tr in self.element().find_elements(&By::tag_name("tr"))? {
            let cells = tr.find_elements(&By::tag_name("td"))?;
            if cells.is_empty() && !tr.find_elements(&By::tag_name("th"))?.is_empty() {
                continue;
            }
            rows.push(cells);
        }
        Ok(rows)
    }

    pub fn rows_as_string(&self) -> PagewrightResult<Vec<Vec<String>>> {
        self.rows()?.iter().map(|row| texts(row)).collect()
    }

    pub fn row(&self, index: usize) -> PagewrightResult<Vec<WebElement>> {
        let mut rows = self.rows()?;
        if index >= rows.len() {
            return Err(PagewrightError::IndexOutOfRange {
                what: format!("row of table '{}'", self.name()),
                index,
                len: rows.len(),
            });
        }
        Ok(rows.swap_remove(index))
    }

    /// Columns as wide as the first row
    pub fn columns(&self) -> PagewrightResult<Vec<Vec<WebElement>>> {
        let rows = self.rows()?;
        let Some(width) = rows.first().map(Vec::len) else {
            return Ok(Vec::new());
        };
        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (r, row) in rows.iter().enumerate() {
            for (c, column) in columns.iter_mut().enumerate() {
                let cell = row.get(c).ok_or_else(|| PagewrightError::IndexOutOfRange {
                    what: format!("cell of row {r}"),
                    index: c,
                    len: row.len(),
                })?;
                column.push(cell.clone());
            }
        }
        Ok(columns)
    }

    pub fn columns_as_string(&self) -> PagewrightResult<Vec<Vec<String>>> {
        self.columns()?.iter().map(|column| texts(column)).collect()
    }

    pub fn rows_mapped_to_headings(&self) -> PagewrightResult<Vec<HashMap<String, WebElement>>> {
        self.rows_mapped_to_headings_with(&self.headings_as_string()?)
    }

    /// Every row keyed by `headings`; a row of different width fails
    pub fn rows_mapped_to_headings_with(
        &self,
        headings: &[String],
    ) -> PagewrightResult<Vec<HashMap<String, WebElement>>> {
        self.rows()?
            .into_iter()
            .enumerate()
            .map(|(r, row)| {
                if row.len() != headings.len() {
                    return Err(PagewrightError::HeadingCountMismatch {
                        row: r,
                        headings: headings.len(),
                        cells: row.len(),
                    });
                }
                Ok(headings.iter().cloned().zip(row).collect::<HashMap<_, _>>())
            })
            .collect()
    }

    pub fn rows_as_string_mapped_to_headings(
        &self,
    ) -> PagewrightResult<Vec<HashMap<String, String>>> {
        self.rows_as_string_mapped_to_headings_with(&self.headings_as_string()?)
    }

    pub fn rows_as_string_mapped_to_headings_with(
        &self,
        headings: &[String],
    ) -> PagewrightResult<Vec<HashMap<String, String>>> {
        self.rows_mapped_to_headings_with(headings)?
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(heading, cell)| Ok((heading, cell.text()?)))
                    .collect::<PagewrightResult<HashMap<_, _>>>()
            })
            .collect()
    }
}
