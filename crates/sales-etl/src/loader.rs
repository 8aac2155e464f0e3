//! CSV loading.
//!
//! [`load_csv`] reads a delimited export into a DataFrame in a single
//! attempt. Bytes are decoded with the requested encoding first (legacy
//! exports are usually latin1), then handed to the polars CSV reader.
//! Each failure kind gets its own [`EtlError`] variant and its own log line.

use crate::error::{EtlError, Result};
use encoding_rs::Encoding;
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions};
use polars::prelude::*;
use std::borrow::Cow;
use std::io::{Cursor, ErrorKind};
use std::path::Path;
use tracing::{error, info};

/// Load a delimited file into a DataFrame.
///
/// `encoding` is a WHATWG label such as `"latin1"` or `"utf-8"`. A byte
/// order mark, when present, overrides it.
pub fn load_csv(path: impl AsRef<Path>, encoding: &str) -> Result<DataFrame> {
    let path = path.as_ref();
    match read_table(path, encoding) {
        Ok(df) => {
            info!(
                "Data successfully read from the file {} ({} rows, {} columns).",
                path.display(),
                df.height(),
                df.width()
            );
            Ok(df)
        }
        Err(e) => {
            error!("{}", e);
            Err(e)
        }
    }
}

fn read_table(path: &Path, encoding: &str) -> Result<DataFrame> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => EtlError::FileNotFound(path.to_path_buf()),
        _ => EtlError::Unexpected(format!("{}: {}", path.display(), e)),
    })?;

    if bytes.is_empty() {
        return Err(EtlError::EmptyFile(path.to_path_buf()));
    }

    let text = decode(&bytes, encoding)?;
    if text.trim().is_empty() {
        return Err(EtlError::EmptyFile(path.to_path_buf()));
    }

    parse_csv(text.into_owned())
}

/// Decode raw bytes, failing on any malformed sequence instead of
/// substituting replacement characters.
pub(crate) fn decode<'a>(bytes: &'a [u8], label: &str) -> Result<Cow<'a, str>> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((bom_encoding, bom_len)) => (bom_encoding, &bytes[bom_len..]),
        None => {
            let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
                EtlError::Encoding {
                    encoding: label.to_string(),
                    reason: "unknown encoding label".to_string(),
                }
            })?;
            (encoding, bytes)
        }
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .ok_or_else(|| EtlError::Encoding {
            encoding: encoding.name().to_string(),
            reason: "input contains byte sequences that are not valid in this encoding"
                .to_string(),
        })
}

fn parse_csv(text: String) -> Result<DataFrame> {
    let cursor = Cursor::new(text.into_bytes());

    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .into_reader_with_file_handle(cursor)
        .finish()
        .map_err(|e| EtlError::MalformedContent(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_missing_file() {
        let result = load_csv("/definitely/not/here/sales.csv", "latin1");
        assert!(matches!(result, Err(EtlError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_file() {
        let file = write_temp(b"");
        assert!(matches!(
            load_csv(file.path(), "latin1"),
            Err(EtlError::EmptyFile(_))
        ));

        let file = write_temp(b"  \n\n ");
        assert!(matches!(
            load_csv(file.path(), "latin1"),
            Err(EtlError::EmptyFile(_))
        ));
    }

    #[test]
    fn test_directory_is_unexpected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_csv(dir.path(), "latin1"),
            Err(EtlError::Unexpected(_))
        ));
    }

    #[test]
    fn test_latin1_bytes_decode() {
        // "Sörensen" with o-umlaut as a single latin1 byte
        let file = write_temp(b"CONTACT,SALES\nS\xf6rensen,10.5\n");
        let df = load_csv(file.path(), "latin1").unwrap();

        let contact = df.column("CONTACT").unwrap().as_materialized_series().clone();
        assert_eq!(contact.str().unwrap().get(0), Some("Sörensen"));
    }

    #[test]
    fn test_invalid_utf8_is_encoding_error() {
        let file = write_temp(b"CONTACT,SALES\nS\xf6rensen,10.5\n");
        assert!(matches!(
            load_csv(file.path(), "utf-8"),
            Err(EtlError::Encoding { .. })
        ));
    }

    #[test]
    fn test_unknown_label_is_encoding_error() {
        let file = write_temp(b"A,B\n1,2\n");
        assert!(matches!(
            load_csv(file.path(), "no-such-charset"),
            Err(EtlError::Encoding { .. })
        ));
    }

    #[test]
    fn test_utf8_bom_overrides_label() {
        let file = write_temp("\u{feff}CITY,SALES\nMünchen,1\n".as_bytes());
        let df = load_csv(file.path(), "latin1").unwrap();

        assert_eq!(df.get_column_names()[0].as_str(), "CITY");
        let city = df.column("CITY").unwrap().as_materialized_series().clone();
        assert_eq!(city.str().unwrap().get(0), Some("München"));
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let file = write_temp(b"A,B\n1,2\n3,4,5,6\n");
        assert!(matches!(
            load_csv(file.path(), "latin1"),
            Err(EtlError::MalformedContent(_))
        ));
    }

    #[test]
    fn test_missing_cells_are_null() {
        let file = write_temp(b"ORDERNUMBER,ADDRESSLINE2,PRICEEACH\n10107,,95.7\n10121,Level 3,abc\n");
        let df = load_csv(file.path(), "latin1").unwrap();

        assert_eq!(df.shape(), (2, 3));
        assert_eq!(df.column("ADDRESSLINE2").unwrap().null_count(), 1);
        // one non-numeric cell keeps the whole column textual
        assert_eq!(df.column("PRICEEACH").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_header_only_file_loads_empty_table() {
        let file = write_temp(b"ORDERNUMBER,SALES\n");
        let df = load_csv(file.path(), "latin1").unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 2);
    }
}
