use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use super::aliases::{english_name, normalize_header};
use super::loader::DataLayout;
use super::IngestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameOutcome {
    pub path: PathBuf,
    pub renamed: usize,
}

/// Applies the fixed Korean→English column map to every raw CSV in place.
pub fn rename_raw_sources(layout: &DataLayout) -> Result<Vec<RenameOutcome>, IngestError> {
    layout
        .raw_sources()
        .into_iter()
        .map(|(_, path)| rename_file(&path))
        .collect()
}

pub fn rename_file(path: &Path) -> Result<RenameOutcome, IngestError> {
    let file = std::fs::File::open(path).map_err(|source| IngestError::MissingSource {
        path: path.to_path_buf(),
        source,
    })?;
    let (contents, renamed) = rename_columns(file)?;
    std::fs::write(path, contents)?;
    info!(path = %path.display(), renamed, "columns renamed");
    Ok(RenameOutcome {
        path: path.to_path_buf(),
        renamed,
    })
}

/// Rewrites the header row through the rename table; data rows pass through.
pub fn rename_columns<R: Read>(reader: R) -> Result<(Vec<u8>, usize), IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut renamed = 0usize;
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|header| {
            let header = normalize_header(header);
            match english_name(&header) {
                Some(english) => {
                    renamed += 1;
                    english.to_string()
                }
                None => header,
            }
        })
        .collect();

    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(Vec::new());
    writer.write_record(&headers)?;
    for record in csv_reader.records() {
        writer.write_record(&record?)?;
    }
    let contents = writer
        .into_inner()
        .map_err(|err| IngestError::Io(err.into_error()))?;

    Ok((contents, renamed))
}
