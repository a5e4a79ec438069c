use crate::warehouse::error::LoadError;
use std::fmt;
use std::str::FromStr;

/// Fully qualified destination table.
///
/// # Examples
///
/// ```
/// use weather_etl::TableRef;
///
/// let table: TableRef = "my-project.weather.daily".parse().unwrap();
/// assert_eq!(table.dataset_id, "weather");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(project_id: &str, dataset_id: &str, table_id: &str) -> Result<Self, LoadError> {
        format!("{project_id}.{dataset_id}.{table_id}").parse()
    }
}

impl FromStr for TableRef {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            [project, dataset, table]
                if !project.is_empty() && !dataset.is_empty() && !table.is_empty() =>
            {
                Ok(Self {
                    project_id: project.to_string(),
                    dataset_id: dataset.to_string(),
                    table_id: table.to_string(),
                })
            }
            _ => Err(LoadError::InvalidTableId(s.to_string())),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

/// How a load job treats rows already in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Truncate the table, then load.
    Replace,
    /// Add rows to the existing contents.
    Append,
}

impl WriteMode {
    pub(crate) fn write_disposition(&self) -> &'static str {
        match self {
            WriteMode::Replace => "WRITE_TRUNCATE",
            WriteMode::Append => "WRITE_APPEND",
        }
    }
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_id() {
        let table: TableRef = "proj-1.weather.cleveland_daily".parse().unwrap();
        assert_eq!(table.project_id, "proj-1");
        assert_eq!(table.dataset_id, "weather");
        assert_eq!(table.table_id, "cleveland_daily");
        assert_eq!(table.to_string(), "proj-1.weather.cleveland_daily");
        assert_eq!(TableRef::new("proj-1", "weather", "cleveland_daily").unwrap(), table);
    }

    #[test]
    fn test_reject_bad_table_ids() {
        for bad in ["", "a.b", "a.b.c.d", "a..c", ".b.c"] {
            assert!(
                matches!(bad.parse::<TableRef>(), Err(LoadError::InvalidTableId(_))),
                "'{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn test_write_disposition() {
        assert_eq!(WriteMode::Replace.write_disposition(), "WRITE_TRUNCATE");
        assert_eq!(WriteMode::Append.write_disposition(), "WRITE_APPEND");
    }
}
