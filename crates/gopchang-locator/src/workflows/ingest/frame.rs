use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::warn;

use super::aliases::{find_column, normalize_header, DISTRICT_KEY, PERIOD_ALIASES};
use super::{IngestError, SchemaError};

/// Header-plus-rows view of one CSV source. Cells stay textual; numeric
/// interpretation happens when district metrics are extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub source: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl Frame {
    pub fn from_path(path: &Path, source: impl Into<String>) -> Result<Self, IngestError> {
        let file = std::fs::File::open(path).map_err(|err| IngestError::MissingSource {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_reader(file, source)
    }

    pub fn from_reader<R: Read>(reader: R, source: impl Into<String>) -> Result<Self, IngestError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row = (0..columns.len())
                .map(|idx| {
                    record
                        .get(idx)
                        .filter(|cell| !cell.is_empty())
                        .map(str::to_string)
                })
                .collect();
            rows.push(row);
        }

        Ok(Self {
            source: source.into(),
            columns,
            rows,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Renames the first matching alias to `canonical`, failing with the
    /// source name and its actual columns when none is present.
    pub fn canonicalize(&mut self, aliases: &[&str], canonical: &str) -> Result<usize, SchemaError> {
        let idx = find_column(&self.columns, aliases).ok_or_else(|| SchemaError {
            source_name: self.source.clone(),
            expected: aliases.iter().map(|alias| alias.to_string()).collect(),
            columns: self.columns.clone(),
        })?;
        self.columns[idx] = canonical.to_string();
        Ok(idx)
    }

    pub fn require(&self, aliases: &[&str]) -> Result<usize, SchemaError> {
        find_column(&self.columns, aliases).ok_or_else(|| SchemaError {
            source_name: self.source.clone(),
            expected: aliases.iter().map(|alias| alias.to_string()).collect(),
            columns: self.columns.clone(),
        })
    }

    /// One row per district key. When a key repeats (quarterly exports), the
    /// row with the greatest period code wins, otherwise the first one seen.
    pub fn index_by_key(&self) -> Result<HashMap<String, usize>, SchemaError> {
        let key_idx = self.require(&[DISTRICT_KEY])?;
        let period_idx = find_column(&self.columns, PERIOD_ALIASES);

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut duplicates = 0usize;
        for (row_idx, row) in self.rows.iter().enumerate() {
            let Some(key) = row[key_idx].as_deref() else {
                continue;
            };
            match index.get(key).copied() {
                None => {
                    index.insert(key.to_string(), row_idx);
                }
                Some(existing) => {
                    duplicates += 1;
                    if let Some(period_idx) = period_idx {
                        if period_of(row, period_idx) > period_of(&self.rows[existing], period_idx) {
                            index.insert(key.to_string(), row_idx);
                        }
                    }
                }
            }
        }

        if duplicates > 0 {
            warn!(
                source = %self.source,
                duplicates,
                "repeated district keys collapsed to the latest period"
            );
        }

        Ok(index)
    }
}

fn period_of(row: &[Option<String>], idx: usize) -> i64 {
    row[idx]
        .as_deref()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(i64::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::ingest::aliases::DISTRICT_KEY_ALIASES;

    #[test]
    fn canonicalize_renames_english_alias() {
        let csv = "market_code,flow_population\n3110001,1200\n";
        let mut frame = Frame::from_reader(csv.as_bytes(), "flow").expect("csv parses");
        let idx = frame
            .canonicalize(DISTRICT_KEY_ALIASES, DISTRICT_KEY)
            .expect("alias found");
        assert_eq!(idx, 0);
        assert_eq!(frame.columns[0], DISTRICT_KEY);
    }

    #[test]
    fn missing_key_names_source_and_columns() {
        let csv = "code,flow\n1,2\n";
        let mut frame = Frame::from_reader(csv.as_bytes(), "flow").expect("csv parses");
        let err = frame
            .canonicalize(DISTRICT_KEY_ALIASES, DISTRICT_KEY)
            .expect_err("no key column");
        let message = err.to_string();
        assert!(message.contains("flow"));
        assert!(message.contains("code"));
        assert_eq!(err.columns, vec!["code".to_string(), "flow".to_string()]);
    }

    #[test]
    fn latest_period_wins_for_repeated_keys() {
        let csv = "\u{feff}상권_코드,기준_년분기_코드,유동인구_수\n1,20231,10\n1,20242,30\n1,20234,20\n2,,5\n";
        let frame = Frame::from_reader(csv.as_bytes(), "flow").expect("csv parses");
        let index = frame.index_by_key().expect("key present");
        assert_eq!(index.len(), 2);
        assert_eq!(frame.rows[index["1"]][2].as_deref(), Some("30"));
        assert_eq!(frame.rows[index["2"]][1], None);
    }
}
