use std::fmt;
use tracing::error;

/// One problem found while building parameter definitions from a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(location: impl Into<String>, kind: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Prefix the location with the enclosing path/operation.
    #[must_use]
    pub fn within(mut self, outer: &str) -> Self {
        self.location = format!("{outer} → {}", self.location);
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.location, self.message)
    }
}

/// Turn collected issues into a single error listing all of them.
pub fn fail_if_issues(issues: Vec<ValidationIssue>) -> anyhow::Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    for issue in &issues {
        error!(kind = %issue.kind, location = %issue.location, "{}", issue.message);
    }
    let listing = issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    anyhow::bail!(
        "OpenAPI spec validation failed. {} issue(s) found:\n{listing}",
        issues.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_issues_is_ok() {
        assert!(fail_if_issues(Vec::new()).is_ok());
    }

    #[test]
    fn test_issues_are_listed() {
        let err = fail_if_issues(vec![
            ValidationIssue::new("limit (query)", "InvalidSchema", "bad").within("/pets → GET"),
            ValidationIssue::new("id (path)", "MissingSchema", "none"),
        ])
        .unwrap_err()
        .to_string();
        assert!(err.contains("2 issue(s)"));
        assert!(err.contains("[InvalidSchema] /pets → GET → limit (query): bad"));
    }
}
