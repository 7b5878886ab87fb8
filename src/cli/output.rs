//! Output formatting utilities

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Table
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Join one record for delimited output
pub fn delimited_record(cells: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Csv => cells
            .iter()
            .map(|c| escape_csv(c))
            .collect::<Vec<_>>()
            .join(","),
        _ => cells.join("\t"),
    }
}

/// Escape a field for CSV output per RFC 4180
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_resolves_by_context() {
        assert_eq!(
            effective_format(OutputFormat::Auto, true),
            OutputFormat::Table
        );
        assert_eq!(
            effective_format(OutputFormat::Auto, false),
            OutputFormat::Yaml
        );
        assert_eq!(
            effective_format(OutputFormat::Json, true),
            OutputFormat::Json
        );
    }

    #[test]
    fn test_csv_escaping() {
        let cells = vec!["plain".to_string(), "with,comma".to_string()];
        assert_eq!(
            delimited_record(&cells, OutputFormat::Csv),
            "plain,\"with,comma\""
        );
        assert_eq!(
            delimited_record(&cells, OutputFormat::Tsv),
            "plain\twith,comma"
        );
    }
}
