//! Contact records from a CSV export.
//!
//! The export carries one row per message with a header row. Only four
//! columns matter here; anything else in the file is ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use crate::error::{SyncError, SyncResult};
use crate::models::ContactRecord;

pub const REPLY_TO_COLUMN: &str = "Reply-To Email";
pub const FROM_COLUMN: &str = "From Email";
pub const NAME_COLUMN: &str = "Name";
pub const PHONE_COLUMN: &str = "Mobile Number";

struct ColumnIndex {
    reply_to: usize,
    from: usize,
    name: usize,
    phone: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> SyncResult<Self> {
        let find = |column: &str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or_else(|| SyncError::parse(format!("missing column '{column}' in header")))
        };

        Ok(Self {
            reply_to: find(REPLY_TO_COLUMN)?,
            from: find(FROM_COLUMN)?,
            name: find(NAME_COLUMN)?,
            phone: find(PHONE_COLUMN)?,
        })
    }
}

/// Read every contact from the file at `path`, in file order.
pub fn load(path: &Path) -> SyncResult<Vec<ContactRecord>> {
    let file = File::open(path).map_err(|source| SyncError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_reader(file)?;
    log::info!("parsed {} contacts from {}", records.len(), path.display());
    Ok(records)
}

/// Parse contacts from any CSV reader.
///
/// Blank rows are dropped. Rows without any address are dropped with a
/// warning since they have no key to reconcile on.
pub fn parse_reader<R: Read>(reader: R) -> SyncResult<Vec<ContactRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    log::debug!("csv headers: {:?}", headers.iter().collect::<Vec<_>>());
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        if row.iter().all(str::is_empty) {
            continue;
        }

        let field = |i: usize| row.get(i).unwrap_or("");
        let record = ContactRecord::from_columns(
            field(columns.reply_to),
            field(columns.from),
            field(columns.name),
            field(columns.phone),
        );

        if record.email.is_empty() {
            let line = row.position().map_or(0, |pos| pos.line());
            log::warn!("skipping line {}: no reply-to or from email", line);
            continue;
        }

        log::debug!("csv record: {:?}", record);
        records.push(record);
    }

    Ok(records)
}
