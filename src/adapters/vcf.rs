use crate::domain::model::VariantEntry;
use crate::utils::error::{PgxError, Result};
use std::collections::HashMap;
use std::io::{BufRead, Cursor};

use noodles_vcf as nvcf;
use nvcf::variant::record::Ids as _;
use nvcf::variant::record_buf::info::field::Value;

const MISSING_FIELD: &str = ".";

/// A variant-call stream with its header already decoded.
///
/// Opening fails only when the stream itself is not valid VCF (missing or
/// unparseable header); individual data lines that fail to parse surface as
/// recoverable per-entry errors during iteration, so one bad line never ends
/// the pass.
#[derive(Debug)]
pub struct VcfSource<R> {
    inner: nvcf::io::Reader<R>,
    header: nvcf::Header,
}

impl VcfSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }
}

impl<R: BufRead> VcfSource<R> {
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut inner = nvcf::io::Reader::new(reader);
        let header = inner
            .read_header()
            .map_err(|e| PgxError::invalid_input(format!("Invalid VCF file: {}", e)))?;
        Ok(Self { inner, header })
    }

    pub fn header(&self) -> &nvcf::Header {
        &self.header
    }

    /// Consumes the source, yielding one entry per data line.
    pub fn entries(self) -> Entries<R> {
        Entries {
            inner: self.inner,
            header: self.header,
            record: nvcf::variant::RecordBuf::default(),
        }
    }
}

pub struct Entries<R> {
    inner: nvcf::io::Reader<R>,
    header: nvcf::Header,
    record: nvcf::variant::RecordBuf,
}

impl<R: BufRead> Iterator for Entries<R> {
    type Item = Result<VariantEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.read_record_buf(&self.header, &mut self.record) {
            Ok(0) => None,
            Ok(_) => Some(Ok(convert_record(&self.record))),
            // 該行已被讀取，下一次呼叫會繼續解析後面的紀錄
            Err(e) => Some(Err(PgxError::ProcessingError {
                message: format!("Failed to parse VCF record: {}", e),
            })),
        }
    }
}

fn convert_record(record: &nvcf::variant::RecordBuf) -> VariantEntry {
    let ids = record.ids();
    let id = if ids.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(";")
    };

    let mut info = HashMap::new();
    for (key, value) in record.info().as_ref() {
        info.insert(key.clone(), stringify_info_value(value.as_ref()));
    }

    VariantEntry { id, info }
}

fn stringify_info_value(value: Option<&Value>) -> String {
    use nvcf::variant::record_buf::info::field::value::Array;

    match value {
        None => MISSING_FIELD.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Integer(n)) => n.to_string(),
        Some(Value::Float(f)) => f.to_string(),
        Some(Value::Character(c)) => c.to_string(),
        Some(Value::Flag) => "true".to_string(),
        Some(Value::Array(array)) => match array {
            Array::Integer(values) => join_array(values),
            Array::Float(values) => join_array(values),
            Array::Character(values) => join_array(values),
            Array::String(values) => join_array(values),
        },
    }
}

fn join_array<T: std::fmt::Display>(values: &[Option<T>]) -> String {
    values
        .iter()
        .map(|v| match v {
            Some(v) => v.to_string(),
            None => MISSING_FIELD.to_string(),
        })
        .collect::<Vec<_>>()
        .join(",")
}
