//! Asynchronous CSV reader with batch interface
//!
//! Provides batched reading of replay requests from a CSV file.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of RequestRecords
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord, RequestRecord};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Maintains streaming behavior: only one batch is held in memory at a time.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` requests
    ///
    /// Rows that fail to parse or name an unknown operation are logged and
    /// skipped. Returns an empty vector at end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<RequestRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(request) => batch.push(request),
                    Err(e) => warn!(error = %e, "skipping replay row"),
                },
                Some(Err(e)) => warn!(error = %e, "CSV parse error"),
                None => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChargeRequest, ResetRequest};
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "op,account,service\ncharge,a,voice\nreset,a,\ncharge,b,data\n";
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = async_reader.read_batch(2).await;
        assert_eq!(
            batch,
            vec![
                RequestRecord::Charge(ChargeRequest::new("a", "voice")),
                RequestRecord::Reset(ResetRequest::new("a")),
            ]
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch, vec![RequestRecord::Charge(ChargeRequest::new("b", "data"))]);

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = AsyncReader::new(Cursor::new("op,account,service\n".as_bytes()));

        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_unknown_operation() {
        let csv_content = "op,account,service\nrefund,a,voice\ncharge,a,message\n";
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch, vec![RequestRecord::Charge(ChargeRequest::new("a", "message"))]);
    }

    #[tokio::test]
    async fn test_async_reader_keeps_incomplete_rows() {
        // the engine decides these are no-ops, the reader only parses
        let csv_content = "op,account,service\ncharge,,voice\ncharge,a\nreset\n";
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0].account(), "");
        assert_eq!(
            batch[1],
            RequestRecord::Charge(ChargeRequest {
                account_id: Some("a".to_string()),
                service_type: None,
            })
        );
        assert_eq!(batch[2], RequestRecord::Reset(ResetRequest::default()));
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let csv_content = "op,account,service\n  CHARGE  ,  a  ,  voice  \n";
        let mut async_reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch, vec![RequestRecord::Charge(ChargeRequest::new("a", "voice"))]);
    }
}
