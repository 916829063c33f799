//! Line format of the products file.
//!
//! One record per line: `id,name,quantity,price`, no header. Fields are only
//! quoted when they need to be, so plain names produce the bare
//! comma-separated form and older unquoted files decode unchanged, with one
//! exception: an unquoted name that starts with `"` is read as a quoted
//! field, so `"Best" pen` loads as `Best pen`.

use std::str::FromStr;

use csv::{ByteRecord, Position, QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};
use rust_decimal::Decimal;

use crate::domain::product::{ProductId, ProductRecord};
use crate::errors::RecordError;

pub const DELIMITER: u8 = b',';
const FIELD_COUNT: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedLine {
    pub line: u64,
    pub result: Result<ProductRecord, RecordError>,
}

pub fn encode(records: &[ProductRecord]) -> Result<Vec<u8>, csv::Error> {
    let mut buffer = Vec::new();
    {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .delimiter(DELIMITER)
            .quote_style(QuoteStyle::Necessary)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buffer);

        for record in records {
            writer.write_record([
                record.id.0.to_string(),
                record.name.clone(),
                record.quantity.to_string(),
                record.price.to_string(),
            ])?;
        }
        writer.flush()?;
    }

    Ok(buffer)
}

/// Decodes every line of `raw`; each line succeeds or fails on its own.
/// Line numbers are physical lines of `raw`, blank lines included.
pub fn decode(raw: &[u8]) -> Vec<DecodedLine> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(DELIMITER)
        .from_reader(raw);

    let mut lines = LineCounter::new(raw);
    let mut decoded = Vec::new();
    let mut record = ByteRecord::new();
    loop {
        match reader.read_byte_record(&mut record) {
            Ok(true) => {
                let line = lines.line_at(record.position().map(Position::byte));
                decoded.push(DecodedLine { line, result: decode_record(&record) });
            }
            Ok(false) => break,
            Err(error) => {
                let line = lines.line_at(error.position().map(Position::byte));
                decoded.push(DecodedLine {
                    line,
                    result: Err(RecordError::Malformed(error.to_string())),
                });
                break;
            }
        }
    }

    decoded
}

/// Maps record start offsets to 1-based line numbers. The reader reports a
/// record as starting where the previous one ended, before any blank lines it
/// skipped, so those terminators are stepped over first. Offsets must not
/// decrease.
struct LineCounter<'a> {
    raw: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(raw: &'a [u8]) -> Self {
        Self { raw, offset: 0, line: 1 }
    }

    fn line_at(&mut self, byte: Option<u64>) -> u64 {
        let Some(byte) = byte else {
            return self.line;
        };
        let mut target = usize::try_from(byte).unwrap_or(usize::MAX).min(self.raw.len());
        while matches!(self.raw.get(target), Some(b'\r' | b'\n')) {
            target += 1;
        }
        if target > self.offset {
            let newlines = self.raw[self.offset..target].iter().filter(|&&b| b == b'\n').count();
            self.line += newlines as u64;
            self.offset = target;
        }
        self.line
    }
}

fn decode_record(record: &ByteRecord) -> Result<ProductRecord, RecordError> {
    if record.len() != FIELD_COUNT {
        return Err(RecordError::FieldCount { found: record.len() });
    }

    let id = field(record, 0)?;
    let name = field(record, 1)?;
    let quantity = field(record, 2)?;
    let price = field(record, 3)?;

    Ok(ProductRecord {
        id: ProductId(parse_id(id)?),
        name: name.to_string(),
        quantity: parse_quantity(quantity)?,
        price: parse_price(price)?,
    })
}

fn field(record: &ByteRecord, index: usize) -> Result<&str, RecordError> {
    let bytes =
        record.get(index).ok_or(RecordError::FieldCount { found: record.len() })?;
    std::str::from_utf8(bytes)
        .map_err(|_| RecordError::Malformed(format!("field {} is not valid UTF-8", index + 1)))
}

fn parse_id(raw: &str) -> Result<i64, RecordError> {
    raw.trim().parse::<i64>().map_err(|_| RecordError::InvalidId(raw.to_string()))
}

fn parse_quantity(raw: &str) -> Result<i64, RecordError> {
    raw.trim().parse::<i64>().map_err(|_| RecordError::InvalidQuantity(raw.to_string()))
}

fn parse_price(raw: &str) -> Result<Decimal, RecordError> {
    let trimmed = raw.trim();
    // Older files may carry exponent notation, e.g. `1e+06`.
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| RecordError::InvalidPrice(raw.to_string()))
}
