use crate::finding::Severity;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Severity")]
    pub label: String,
    #[tabled(rename = "Findings")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            label: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Severity breakdown for the run summary; `none` counts clean files
pub fn severity_table(counts: &[(Severity, usize)]) -> String {
    let mut builder = TableBuilder::new();
    for (severity, count) in counts {
        let label = match severity {
            Severity::None => "none (clean files)",
            other => other.as_str(),
        };
        builder.add_row(label, &count.to_string());
    }
    builder.build()
}
