//! YAML parsing with error handling

use serde::de::DeserializeOwned;

use crate::yaml::diagnostics::{YamlError, YamlSyntaxError};

/// Parse YAML content into a typed value with nice error messages
pub fn parse_yaml<T: DeserializeOwned + 'static>(content: &str, filename: &str) -> Result<T, YamlError> {
    serde_yml::from_str(content)
        .map_err(|e| YamlError::Syntax(YamlSyntaxError::from_serde_error(&e, content, filename)))
}

/// Parse YAML from a file path
pub fn parse_yaml_file<T: DeserializeOwned + 'static>(path: &std::path::Path) -> Result<T, YamlError> {
    let content = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();
    parse_yaml(&content, &filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TestSession;

    #[test]
    fn test_parse_session_yaml() {
        let yaml = "\
id: SES-01J8ME0QGKXV3T4C8YQBW0F7EZ
title: Lot 14 final test
author: marie
created: 2026-03-02T09:00:00Z
points:
  - index: 1
    target_pa: 50.0
    fan_pa: 45.0
    ring: open
";
        let session: TestSession = parse_yaml(yaml, "SES-test.bdt.yaml").unwrap();
        assert_eq!(session.title, "Lot 14 final test");
        assert_eq!(session.points.len(), 1);
    }

    #[test]
    fn test_parse_invalid_yaml_returns_error() {
        let yaml = "title: test\n  bad indentation";
        let result: Result<TestSession, _> = parse_yaml(yaml, "broken.bdt.yaml");
        assert!(matches!(result, Err(YamlError::Syntax(_))));
    }

    #[test]
    fn test_parse_missing_file_is_io_error() {
        let result: Result<TestSession, _> =
            parse_yaml_file(std::path::Path::new("/nonexistent/SES-x.bdt.yaml"));
        assert!(matches!(result, Err(YamlError::Io(_))));
    }
}
