//! Rewrites CSV exports (often CP949/EUC-KR) as UTF-8 with a byte-order mark
//! so spreadsheet tools and the loader read Korean headers identically.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("no files matched the given patterns")]
    NoMatches,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionStatus {
    Converted { detected: &'static str },
    AlreadyUtf8,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutcome {
    pub path: PathBuf,
    pub status: ConversionStatus,
}

/// Expands every pattern, de-duplicates and sorts the matches.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>, EncodingError> {
    let mut files = BTreeSet::new();
    for pattern in patterns {
        let paths = glob::glob(pattern).map_err(|source| EncodingError::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
        for path in paths.filter_map(Result::ok) {
            if path.is_file() {
                files.insert(path);
            }
        }
    }
    if files.is_empty() {
        return Err(EncodingError::NoMatches);
    }
    Ok(files.into_iter().collect())
}

/// Converts every matched file. A file that cannot be read or decoded is
/// reported and skipped; the remaining files are still processed.
pub fn convert_patterns(patterns: &[String]) -> Result<Vec<ConversionOutcome>, EncodingError> {
    let files = expand_patterns(patterns)?;
    Ok(files.iter().map(|path| convert_file(path)).collect())
}

pub fn convert_file(path: &Path) -> ConversionOutcome {
    let status = match std::fs::read(path) {
        Ok(raw) => match transcode(&raw) {
            Transcoded::Unchanged => ConversionStatus::AlreadyUtf8,
            Transcoded::Rewritten { bytes, detected } => match std::fs::write(path, bytes) {
                Ok(()) => ConversionStatus::Converted { detected },
                Err(err) => ConversionStatus::Failed {
                    reason: format!("write failed: {err}"),
                },
            },
            Transcoded::Malformed { detected } => ConversionStatus::Failed {
                reason: format!("content is not valid {detected}"),
            },
        },
        Err(err) => ConversionStatus::Failed {
            reason: format!("read failed: {err}"),
        },
    };

    match &status {
        ConversionStatus::Converted { detected } => {
            info!(path = %path.display(), detected, "converted to UTF-8")
        }
        ConversionStatus::AlreadyUtf8 => info!(path = %path.display(), "already UTF-8"),
        ConversionStatus::Failed { reason } => {
            warn!(path = %path.display(), %reason, "conversion skipped")
        }
    }

    ConversionOutcome {
        path: path.to_path_buf(),
        status,
    }
}

enum Transcoded {
    Unchanged,
    Rewritten { bytes: Vec<u8>, detected: &'static str },
    Malformed { detected: &'static str },
}

fn transcode(raw: &[u8]) -> Transcoded {
    if raw.starts_with(UTF8_BOM) {
        return Transcoded::Unchanged;
    }

    let encoding = detect(raw);
    let (text, had_errors) = encoding.decode_without_bom_handling(raw);
    if had_errors {
        return Transcoded::Malformed {
            detected: encoding.name(),
        };
    }

    let mut bytes = Vec::with_capacity(UTF8_BOM.len() + text.len());
    bytes.extend_from_slice(UTF8_BOM);
    bytes.extend_from_slice(text.as_bytes());
    Transcoded::Rewritten {
        bytes,
        detected: encoding.name(),
    }
}

fn detect(raw: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(raw).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(raw, true);
    detector.guess(Some(b"kr"), true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euc_kr_headers_become_utf8_with_bom() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode(
            "상권_코드,상권_코드_명,총_상주인구_수\n1,강남역 일대 상권,1200\n2,홍대입구역 먹자골목,980\n3,명동 관광특구 남대문로,450\n",
        );
        let Transcoded::Rewritten { bytes, detected } = transcode(&encoded) else {
            panic!("expected rewrite");
        };
        assert_eq!(detected, "EUC-KR");
        assert!(bytes.starts_with(UTF8_BOM));
        let text = std::str::from_utf8(&bytes[UTF8_BOM.len()..]).expect("utf-8 output");
        assert!(text.starts_with("상권_코드"));
    }

    #[test]
    fn files_with_bom_are_left_alone() {
        let mut raw = UTF8_BOM.to_vec();
        raw.extend_from_slice("상권_코드\n".as_bytes());
        assert!(matches!(transcode(&raw), Transcoded::Unchanged));
    }

    #[test]
    fn conversion_continues_past_unreadable_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("flow_all.csv");
        std::fs::write(&good, "상권_코드\n1\n").expect("write fixture");

        let outcome = convert_file(&dir.path().join("missing.csv"));
        assert!(matches!(outcome.status, ConversionStatus::Failed { .. }));

        let pattern = format!("{}/*.csv", dir.path().display());
        let outcomes = convert_patterns(&[pattern]).expect("pattern matches");
        assert_eq!(outcomes.len(), 1);
        assert_eq!(
            outcomes[0].status,
            ConversionStatus::Converted { detected: "UTF-8" }
        );
        let written = std::fs::read(&good).expect("read back");
        assert!(written.starts_with(UTF8_BOM));
    }

    #[test]
    fn unmatched_patterns_are_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pattern = format!("{}/*.csv", dir.path().display());
        assert!(matches!(
            convert_patterns(&[pattern]),
            Err(EncodingError::NoMatches)
        ));
    }
}
