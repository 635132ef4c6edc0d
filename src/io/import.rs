use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::application::{AppError, LedgerService};
use crate::domain::{parse_date, units_to_cents, NewTransaction, TransactionId, ValidationError};

use super::{
    csv_error, json_error, CsvRecord, ExchangeFormat, JsonAmount, JsonRecord, EXCHANGE_FIELDS,
    UTF8_BOM,
};

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    /// Records created (or that would be created, on a dry run)
    pub imported: usize,
    /// Ids assigned to the created transactions, in file order
    pub ids: Vec<TransactionId>,
}

/// Options for import operations
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate every record without writing anything
    pub dry_run: bool,
}

/// Importer for loading exchange files into the ledger.
///
/// Records are created one at a time in file order. The first bad record
/// aborts the import; records created before it stay in the ledger.
pub struct Importer<'a> {
    service: &'a LedgerService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Import transactions from CSV with a `date,type,amount,description` header.
    pub async fn import_csv<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let content = read_text(reader)?;
        let mut csv_reader = csv::Reader::from_reader(content.as_bytes());
        let headers = csv_reader.headers().map_err(csv_error)?;
        if let Some(missing) = EXCHANGE_FIELDS
            .iter()
            .find(|field| !headers.iter().any(|h| h.trim() == **field))
        {
            return Err(AppError::Format(format!(
                "header is missing the '{}' column",
                missing
            )));
        }

        let mut result = ImportResult::default();

        for (index, record) in csv_reader.deserialize::<CsvRecord>().enumerate() {
            let line = index + 2; // header is line 1
            let record = record.map_err(|e| AppError::Format(format!("line {}: {}", line, e)))?;

            let fields = NewTransaction::parse(
                &record.date,
                &record.kind,
                &record.amount,
                record.description,
            )
            .map_err(|e| rejected(line, e))?;
            self.apply(fields, &options, &mut result).await?;
        }

        Ok(result)
    }

    /// Import transactions from a JSON array of records.
    pub async fn import_json<R: Read>(
        &self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let content = read_text(reader)?;
        let records: Vec<JsonRecord> = serde_json::from_str(&content).map_err(json_error)?;
        let mut result = ImportResult::default();

        for (index, record) in records.into_iter().enumerate() {
            let position = index + 1;
            let fields = json_fields(record).map_err(|e| rejected(position, e))?;
            self.apply(fields, &options, &mut result).await?;
        }

        Ok(result)
    }

    pub async fn import_csv_file(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let reader = BufReader::new(File::open(path)?);
        let result = self.import_csv(reader, options).await?;
        info!(path = %path.display(), imported = result.imported, "imported csv file");
        Ok(result)
    }

    pub async fn import_json_file(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let reader = BufReader::new(File::open(path)?);
        let result = self.import_json(reader, options).await?;
        info!(path = %path.display(), imported = result.imported, "imported json file");
        Ok(result)
    }

    /// Import from a file, choosing the format from its extension.
    pub async fn import_file(
        &self,
        path: &Path,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        self.import_file_as(path, ExchangeFormat::from_path(path)?, options)
            .await
    }

    pub async fn import_file_as(
        &self,
        path: &Path,
        format: ExchangeFormat,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        match format {
            ExchangeFormat::Csv => self.import_csv_file(path, options).await,
            ExchangeFormat::Json => self.import_json_file(path, options).await,
        }
    }

    async fn apply(
        &self,
        fields: NewTransaction,
        options: &ImportOptions,
        result: &mut ImportResult,
    ) -> Result<(), AppError> {
        if !options.dry_run {
            let id = self.service.create_transaction(fields).await?;
            result.ids.push(id);
        }
        result.imported += 1;
        Ok(())
    }
}

/// Read the whole input as UTF-8, dropping a leading byte-order mark.
fn read_text<R: Read>(mut reader: R) -> Result<String, AppError> {
    let mut content = String::new();
    reader.read_to_string(&mut content).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => AppError::Format("file is not valid UTF-8".to_string()),
        _ => AppError::Io(e),
    })?;

    match content.strip_prefix(UTF8_BOM) {
        Some(stripped) => Ok(stripped.to_string()),
        None => Ok(content),
    }
}

fn json_fields(record: JsonRecord) -> Result<NewTransaction, ValidationError> {
    let description = record.description.unwrap_or_default();
    match record.amount {
        JsonAmount::Text(amount) => {
            NewTransaction::parse(&record.date, &record.kind, &amount, description)
        }
        JsonAmount::Number(amount) => {
            let amount_cents = units_to_cents(amount)
                .map_err(|_| ValidationError::InvalidAmount(amount.to_string()))?;
            NewTransaction::new(
                parse_date(&record.date)?,
                record.kind.parse()?,
                amount_cents,
                description,
            )
        }
    }
}

fn rejected(position: usize, err: ValidationError) -> AppError {
    warn!(position, error = %err, "import aborted on invalid record");
    AppError::Validation(err)
}
