use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::application::{AppError, LedgerService};
use crate::domain::{format_cents, Transaction, DATE_FORMAT};

use super::{csv_error, json_error, ExchangeFormat, ExchangeRecord, EXCHANGE_FIELDS, UTF8_BOM};

/// Exporter for writing the whole ledger to an exchange format.
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export every transaction as CSV (with a leading BOM), newest first.
    pub async fn export_csv<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        let transactions = self.service.list_all_transactions().await?;
        write_csv(&transactions, writer)
    }

    /// Export every transaction as a JSON array, newest first.
    pub async fn export_json<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        let transactions = self.service.list_all_transactions().await?;
        write_json(&transactions, writer)
    }

    // Read the ledger before `File::create` truncates the target
    pub async fn export_csv_file(&self, path: &Path) -> Result<usize, AppError> {
        let transactions = self.service.list_all_transactions().await?;
        let count = write_csv(&transactions, BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), count, "exported transactions as csv");
        Ok(count)
    }

    pub async fn export_json_file(&self, path: &Path) -> Result<usize, AppError> {
        let transactions = self.service.list_all_transactions().await?;
        let count = write_json(&transactions, BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), count, "exported transactions as json");
        Ok(count)
    }

    /// Export to a file, choosing the format from its extension.
    pub async fn export_file(&self, path: &Path) -> Result<usize, AppError> {
        self.export_file_as(path, ExchangeFormat::from_path(path)?).await
    }

    pub async fn export_file_as(
        &self,
        path: &Path,
        format: ExchangeFormat,
    ) -> Result<usize, AppError> {
        match format {
            ExchangeFormat::Csv => self.export_csv_file(path).await,
            ExchangeFormat::Json => self.export_json_file(path).await,
        }
    }
}

fn write_csv<W: Write>(transactions: &[Transaction], mut writer: W) -> Result<usize, AppError> {
    writer.write_all(UTF8_BOM.as_bytes())?;
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXCHANGE_FIELDS).map_err(csv_error)?;

    for t in transactions {
        csv_writer
            .write_record([
                t.date.format(DATE_FORMAT).to_string(),
                t.kind.as_str().to_string(),
                format_cents(t.amount_cents),
                t.description.clone(),
            ])
            .map_err(csv_error)?;
    }

    csv_writer.flush()?;
    Ok(transactions.len())
}

fn write_json<W: Write>(transactions: &[Transaction], mut writer: W) -> Result<usize, AppError> {
    let records: Vec<ExchangeRecord> = transactions.iter().map(ExchangeRecord::from).collect();

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    records.serialize(&mut serializer).map_err(json_error)?;
    writer.flush()?;

    Ok(records.len())
}
