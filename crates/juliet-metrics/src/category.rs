use std::fmt;
use std::str::FromStr;

/// Which bug classes a report covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Category {
    All,
    /// Either a short id (`CWE121`) or a full class directory name.
    Cwe(String),
}

impl Category {
    pub fn matches(&self, class: &str) -> bool {
        match self {
            Category::All => true,
            Category::Cwe(c) => {
                class == c
                    || class
                        .strip_prefix(c.as_str())
                        .is_some_and(|rest| rest.starts_with('_'))
            }
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Category::All);
        }
        let upper = s.to_ascii_uppercase();
        if upper.starts_with("CWE") && s.len() > 3 {
            // Normalise the prefix only; the class suffix keeps its case.
            Ok(Category::Cwe(format!("CWE{}", &s[3..])))
        } else {
            Err(format!(
                "invalid category '{}' (expected 'all' or a CWE class such as CWE121)",
                s
            ))
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::All => f.write_str("all"),
            Category::Cwe(c) => f.write_str(c),
        }
    }
}
