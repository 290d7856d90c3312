//! Source-side types: raw log rows and the paged source contract.

use crate::error::SourceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One raw log row from the source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRow {
    pub transaction_hash: String,
    pub block_number: u64,
    pub log_index: u64,
    pub address: String,
    /// ABI-encoded non-indexed payload, hex.
    pub data: String,
    /// topic0..topic3; null columns are already dropped by the adapter.
    pub topics: Vec<String>,
}

/// A paged reader over the raw logs table.
///
/// Implementations guarantee rows ascend by `(block_number, log_index)`
/// within `[start_block, end_block]` and that removed rows are filtered at
/// the source.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn select_logs(
        &self,
        start_block: u64,
        end_block: u64,
        page_size: u64,
        offset: u64,
    ) -> Result<Vec<LogRow>, SourceError>;
}

/// Keyset-style page advancement expressed through `(start_block, offset)`.
///
/// Plain `LIMIT/OFFSET` paging over a table that mutates between pages can
/// duplicate or drop rows. Restarting every page at the last block already
/// seen, with `offset` skipping only the rows of that block consumed so
/// far, keeps the offset window no wider than a single block; earlier
/// inserts and merges cannot shift later pages.
#[derive(Debug, Clone)]
pub struct PageCursor {
    start_block: u64,
    offset: u64,
    page_size: u64,
    done: bool,
}

impl PageCursor {
    pub fn new(start_block: u64, page_size: u64) -> Self {
        Self {
            start_block,
            offset: 0,
            page_size: page_size.max(1),
            done: false,
        }
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Advance past `page`. Returns `false` when pagination is exhausted
    /// (the page came back shorter than the page size).
    pub fn advance(&mut self, page: &[LogRow]) -> bool {
        if (page.len() as u64) < self.page_size {
            self.done = true;
            return false;
        }
        // page.len() >= page_size >= 1 here.
        let last_block = page[page.len() - 1].block_number;
        let rows_in_last_block = page
            .iter()
            .rev()
            .take_while(|row| row.block_number == last_block)
            .count() as u64;

        if last_block == self.start_block {
            self.offset += rows_in_last_block;
        } else {
            self.start_block = last_block;
            self.offset = rows_in_last_block;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(block_number: u64, log_index: u64) -> LogRow {
        LogRow {
            transaction_hash: format!("0x{block_number:02x}{log_index:02x}"),
            block_number,
            log_index,
            address: "0xcontract".into(),
            data: "0x".into(),
            topics: vec![],
        }
    }

    #[test]
    fn short_page_terminates() {
        let mut cursor = PageCursor::new(100, 3);
        assert!(!cursor.advance(&[row(100, 0)]));
        assert!(cursor.is_done());
    }

    #[test]
    fn full_page_restarts_at_last_block() {
        let mut cursor = PageCursor::new(100, 3);
        let page = vec![row(100, 0), row(100, 1), row(101, 0)];
        assert!(cursor.advance(&page));
        assert_eq!(cursor.start_block(), 101);
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn single_block_pages_accumulate_offset() {
        let mut cursor = PageCursor::new(100, 2);
        assert!(cursor.advance(&[row(100, 0), row(100, 1)]));
        assert_eq!(cursor.start_block(), 100);
        assert_eq!(cursor.offset(), 2);
        assert!(cursor.advance(&[row(100, 2), row(100, 3)]));
        assert_eq!(cursor.offset(), 4);
        // Block finally rolls over; offset resets to the tail count.
        assert!(cursor.advance(&[row(100, 4), row(101, 0)]));
        assert_eq!(cursor.start_block(), 101);
        assert_eq!(cursor.offset(), 1);
    }
}
