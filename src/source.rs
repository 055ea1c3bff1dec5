use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::error::{IndexerError, IndexerResult};
use crate::types::ReceiptWithOutcome;

/// Reads one `ReceiptWithOutcome` per line of newline-delimited JSON.
pub struct ReceiptSource<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R: AsyncBufRead + Unpin> ReceiptSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }

    /// Next receipt, `None` at end of input. Blank lines are skipped.
    pub async fn next_receipt(&mut self) -> Option<IndexerResult<ReceiptWithOutcome>> {
        loop {
            let text = match self.lines.next_line().await {
                Ok(Some(text)) => text,
                Ok(None) => return None,
                Err(e) => return Some(Err(IndexerError::Io(e))),
            };
            self.line += 1;

            if text.trim().is_empty() {
                continue;
            }

            return Some(serde_json::from_str(&text).map_err(|source| {
                IndexerError::MalformedReceipt {
                    line: self.line,
                    source,
                }
            }));
        }
    }
}

/// Open the configured input: a file path, or stdin for `-`.
pub async fn open(path: &str) -> IndexerResult<ReceiptSource<BufReader<Box<dyn tokio::io::AsyncRead + Unpin + Send>>>> {
    let reader: Box<dyn tokio::io::AsyncRead + Unpin + Send> = if path == "-" {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(path).await?)
    };
    Ok(ReceiptSource::new(BufReader::new(reader)))
}
