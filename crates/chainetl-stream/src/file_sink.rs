//! Per-block columnar file sink.
//!
//! Each batch is split by block number and written to
//! `<output_dir>/block_<N>.parquet` (or `.json` as the fallback format).
//! A later flush touching the same block rewrites that block's file, so
//! the batch size should exceed the largest per-block row count when one
//! complete file per block matters.

use crate::error::SinkError;
use crate::sink::BatchWriter;
use chainetl_decode::DecodedRecord;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Output format of the block files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Json,
    /// Requires the `parquet` cargo feature; falls back to JSON otherwise,
    /// mirroring the conditional build of the columnar dependency.
    Parquet,
}

/// Writes decoded records into one file per block.
pub struct BlockFileWriter {
    output_dir: PathBuf,
    format: FileFormat,
}

impl BlockFileWriter {
    /// Create the writer, making sure the output directory exists.
    pub fn new(output_dir: impl Into<PathBuf>, format: FileFormat) -> Result<Self, SinkError> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        let writer = Self { output_dir, format };
        tracing::info!(
            dir = %writer.output_dir.display(),
            format = ?writer.effective_format(),
            "block file output directory ready"
        );
        Ok(writer)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// The format actually written, accounting for the `parquet` feature.
    pub fn effective_format(&self) -> FileFormat {
        match self.format {
            FileFormat::Json => FileFormat::Json,
            FileFormat::Parquet => {
                if cfg!(feature = "parquet") {
                    FileFormat::Parquet
                } else {
                    FileFormat::Json
                }
            }
        }
    }

    /// Path of the file for one block.
    pub fn block_path(&self, block_number: u64) -> PathBuf {
        let ext = match self.effective_format() {
            FileFormat::Json => "json",
            FileFormat::Parquet => "parquet",
        };
        self.output_dir.join(format!("block_{block_number}.{ext}"))
    }

    fn write_block(
        &self,
        block_number: u64,
        records: &[&DecodedRecord],
    ) -> Result<(), SinkError> {
        match self.effective_format() {
            FileFormat::Json => self.write_block_json(block_number, records),
            FileFormat::Parquet => self.write_block_parquet(block_number, records),
        }
    }

    /// JSON fallback: a top-level array, 2-space indent.
    fn write_block_json(
        &self,
        block_number: u64,
        records: &[&DecodedRecord],
    ) -> Result<(), SinkError> {
        let path = self.block_path(block_number);
        let file = std::fs::File::create(&path)?;
        serde_json::to_writer_pretty(file, records)?;
        tracing::debug!(
            block = block_number,
            records = records.len(),
            path = %path.display(),
            "wrote block file"
        );
        Ok(())
    }

    #[cfg(feature = "parquet")]
    fn write_block_parquet(
        &self,
        block_number: u64,
        records: &[&DecodedRecord],
    ) -> Result<(), SinkError> {
        use arrow::array::{ArrayRef, StringArray, UInt32Array, UInt64Array};
        use arrow::datatypes::{DataType, Field, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;
        use std::sync::Arc;

        let schema = Arc::new(Schema::new(vec![
            Field::new("transaction_hash", DataType::Utf8, false),
            Field::new("block_number", DataType::UInt64, false),
            Field::new("log_index", DataType::UInt32, false),
            Field::new("contract_address", DataType::Utf8, false),
            Field::new("event_name", DataType::Utf8, false),
            Field::new("event_signature", DataType::Utf8, false),
            Field::new("signature", DataType::Utf8, false),
            Field::new("args", DataType::Utf8, false),
        ]));

        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.transaction_hash.as_str()),
            )),
            Arc::new(UInt64Array::from_iter_values(
                records.iter().map(|r| r.block_number),
            )),
            Arc::new(UInt32Array::from_iter_values(
                records.iter().map(|r| r.log_index as u32),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.contract_address.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.event_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.event_signature.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.signature.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.args.as_str()),
            )),
        ];

        let batch = RecordBatch::try_new(Arc::clone(&schema), columns)
            .map_err(|e| SinkError::Columnar(e.to_string()))?;

        let path = self.block_path(block_number);
        let file = std::fs::File::create(&path)?;
        let mut writer = ArrowWriter::try_new(file, schema, None)
            .map_err(|e| SinkError::Columnar(e.to_string()))?;
        writer
            .write(&batch)
            .map_err(|e| SinkError::Columnar(e.to_string()))?;
        writer
            .close()
            .map_err(|e| SinkError::Columnar(e.to_string()))?;

        tracing::debug!(
            block = block_number,
            records = records.len(),
            path = %path.display(),
            "wrote block file"
        );
        Ok(())
    }

    #[cfg(not(feature = "parquet"))]
    fn write_block_parquet(
        &self,
        block_number: u64,
        records: &[&DecodedRecord],
    ) -> Result<(), SinkError> {
        self.write_block_json(block_number, records)
    }
}

impl BatchWriter for BlockFileWriter {
    fn name(&self) -> &str {
        "block-files"
    }

    fn write_batch(&mut self, records: &[DecodedRecord]) -> Result<(), SinkError> {
        let mut by_block: BTreeMap<u64, Vec<&DecodedRecord>> = BTreeMap::new();
        for record in records {
            by_block.entry(record.block_number).or_default().push(record);
        }
        for (block_number, block_records) in &by_block {
            self.write_block(*block_number, block_records)?;
        }
        Ok(())
    }
}
