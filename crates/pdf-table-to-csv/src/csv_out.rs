use std::io;
use std::path::Path;

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::error::ExtractError;
use crate::model::MergedOutput;

pub const BYTE_ORDER_MARK: char = '\u{FEFF}';
pub const CSV_MIME_TYPE: &str = "text/csv;charset=utf-8";

/// Encoded CSV text without the byte-order mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvDocument {
    text: String,
}

impl CsvDocument {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The text with a leading U+FEFF so spreadsheet tools detect UTF-8.
    #[must_use]
    pub fn to_text_with_bom(&self) -> String {
        let mut out = String::with_capacity(self.text.len() + BYTE_ORDER_MARK.len_utf8());
        out.push(BYTE_ORDER_MARK);
        out.push_str(&self.text);
        out
    }

    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_text_with_bom().into_bytes()
    }
}

/// Quotes every cell, doubles embedded quotes, joins rows with `\n` and drops the final
/// terminator.
pub(crate) fn encode_rows<I, R, S>(rows: I) -> Result<CsvDocument, ExtractError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::<u8>::new());
    for row in rows {
        for cell in row {
            writer.write_field(cell.as_ref())?;
        }
        writer.write_record(None::<&[u8]>)?;
    }
    writer.flush()?;

    let mut bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Io(error.into_error()))?;
    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }

    let text = String::from_utf8(bytes)
        .map_err(|error| ExtractError::Io(io::Error::new(io::ErrorKind::InvalidData, error)))?;
    Ok(CsvDocument { text })
}

pub(crate) fn write_csv_to_string(merged: &MergedOutput) -> Result<CsvDocument, ExtractError> {
    encode_rows(merged.headers.iter().chain(merged.rows.iter()))
}

pub(crate) fn write_csv(path: &Path, merged: &MergedOutput) -> Result<CsvDocument, ExtractError> {
    let document = write_csv_to_string(merged)?;
    std::fs::write(path, document.to_bytes())?;
    Ok(document)
}

/// Replaces the extension of `source_name` with `.csv`, keeping any directory part.
#[must_use]
pub fn csv_file_name(source_name: &str) -> String {
    Path::new(source_name)
        .with_extension("csv")
        .to_string_lossy()
        .into_owned()
}
