//! Tabular source sampling adapters.

mod csv_reader;

pub use csv_reader::CsvSchemaReader;
