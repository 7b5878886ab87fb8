//! Table rendering for list output

use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};

/// Builds aligned tables for terminal output
pub struct TableFormatter {
    builder: Builder,
    numeric_from: Option<usize>,
}

impl TableFormatter {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut builder = Builder::default();
        builder.push_record(headers.into_iter().map(Into::into));
        Self {
            builder,
            numeric_from: None,
        }
    }

    /// Right-align every column from `index` onward
    pub fn numeric_from(mut self, index: usize) -> Self {
        self.numeric_from = Some(index);
        self
    }

    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builder.push_record(cells.into_iter().map(Into::into));
    }

    pub fn render(self) -> String {
        let numeric_from = self.numeric_from;
        let mut table = self.builder.build();
        table.with(Style::rounded());
        if let Some(from) = numeric_from {
            table.with(Modify::new(Columns::new(from..)).with(Alignment::right()));
        }
        table.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_renders_headers_and_rows() {
        let mut fmt = TableFormatter::new(["RING", "COEFF"]);
        fmt.add_row(["Open", "71.0"]);
        fmt.add_row(["Ring A", "35.5"]);
        let out = fmt.render();

        assert!(out.contains("RING"));
        assert!(out.contains("Ring A"));
        assert!(out.lines().count() >= 4);
    }
}
