//! CSV sampling adapter.

use odf_core::{
    application::ports::SchemaReader,
    domain::DomainError,
    error::{OdfError, OdfResult},
};

/// Reads the header and first record of comma-separated text.
#[derive(Debug, Clone, Copy)]
pub struct CsvSchemaReader {
    delimiter: u8,
}

impl CsvSchemaReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvSchemaReader {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaReader for CsvSchemaReader {
    fn first_record(&self, text: &str) -> OdfResult<Option<Vec<(String, String)>>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(text.as_bytes());

        // Zero-byte sources are sampled like header-only ones.
        let headers = reader.headers().map_err(csv_error)?.clone();
        if headers.is_empty() {
            return Ok(None);
        }

        let Some(record) = reader.records().next().transpose().map_err(csv_error)? else {
            return Ok(None);
        };

        Ok(Some(
            headers
                .iter()
                .zip(record.iter().chain(std::iter::repeat("")))
                .map(|(header, value)| (header.to_string(), value.to_string()))
                .collect(),
        ))
    }
}

fn csv_error(e: csv::Error) -> OdfError {
    DomainError::MalformedSource {
        reason: e.to_string(),
    }
    .into()
}
