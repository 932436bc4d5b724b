//! I/O module
//!
//! Handles replay CSV parsing and response output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, response serialization)
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_record, write_responses_csv, CsvRecord, Outcome, RequestRecord, ResponseRecord,
};
