//! Request trace reader.
//!
//! A trace is a text file with one request per line:
//!
//! ```text
//! # cycle  op  address   [data]
//! 0        W   0x1000    deadbeef
//! 4        R   0x1000
//! 9        RP  0x2040    00000000
//! ```
//!
//! `op` is one of `R`, `W`, `RP` (read + precharge) or `WP` (write + precharge). Writes need
//! hex data, which sets their size. For reads the data column is optional: when present its
//! length sets the read size, otherwise the read covers one cache line. Blank lines and `#`
//! comments are skipped. Request ids are assigned in file order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::common::TraceError;
use crate::controller::request::{Request, RequestId, RequestKind};

/// One trace entry: a request and the cycle at which it is first presented.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceRecord {
    /// Cycle the issuer first presents the request.
    pub cycle: u64,
    /// The request.
    pub request: Request,
}

/// Streaming trace parser.
#[derive(Debug)]
pub struct TraceReader<R> {
    input: R,
    line_bytes: usize,
    line_no: usize,
    next_id: RequestId,
    buf: String,
}

impl TraceReader<BufReader<File>> {
    /// Opens the trace file at `path`.
    ///
    /// # Errors
    ///
    /// [`TraceError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>, line_bytes: usize) -> Result<Self, TraceError> {
        Ok(Self::new(BufReader::new(File::open(path)?), line_bytes))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps a buffered reader; reads without data cover `line_bytes` bytes.
    pub const fn new(input: R, line_bytes: usize) -> Self {
        Self {
            input,
            line_bytes,
            line_no: 0,
            next_id: 0,
            buf: String::new(),
        }
    }

    /// Reads every remaining record.
    ///
    /// # Errors
    ///
    /// The first parse or I/O error encountered.
    pub fn read_all(self) -> Result<Vec<TraceRecord>, TraceError> {
        self.collect()
    }

    fn parse_line(&mut self, text: &str) -> Result<Option<TraceRecord>, TraceError> {
        let text = text.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            return Ok(None);
        }

        let line = self.line_no;
        let err = |reason: String| TraceError::Parse { line, reason };
        let mut fields = text.split_whitespace();

        let cycle = fields
            .next()
            .ok_or_else(|| err("missing cycle".into()))?;
        let cycle = cycle
            .parse::<u64>()
            .map_err(|_| err(format!("invalid cycle {cycle:?}")))?;

        let op = fields
            .next()
            .ok_or_else(|| err("missing operation".into()))?;
        let kind = match op.to_ascii_uppercase().as_str() {
            "R" => RequestKind::Read,
            "RP" => RequestKind::ReadPrecharge,
            "W" => RequestKind::Write,
            "WP" => RequestKind::WritePrecharge,
            _ => return Err(err(format!("unknown operation {op:?}"))),
        };

        let address = fields
            .next()
            .ok_or_else(|| err("missing address".into()))?;
        let address = parse_address(address).ok_or_else(|| err(format!("invalid address {address:?}")))?;

        let data = fields
            .next()
            .map(|hex| parse_hex(hex).ok_or_else(|| err(format!("invalid data {hex:?}"))))
            .transpose()?;

        if let Some(extra) = fields.next() {
            return Err(err(format!("unexpected field {extra:?}")));
        }

        let id = self.next_id;
        let request = match (kind.is_write(), data) {
            (true, Some(data)) => Request::write(id, address, data).with_kind(kind),
            (true, None) => return Err(err("write without data".into())),
            (false, Some(data)) => Request::new(id, kind, address, data.len()),
            (false, None) => Request::new(id, kind, address, self.line_bytes),
        };
        self.next_id += 1;
        Ok(Some(TraceRecord { cycle, request }))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;
            let text = std::mem::take(&mut self.buf);
            let parsed = self.parse_line(&text);
            self.buf = text;
            match parsed {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

fn parse_address(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

fn parse_hex(text: &str) -> Option<Vec<u8>> {
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    if text.is_empty() || text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}
