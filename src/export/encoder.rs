//! CSV record encoding.

use std::io::{self, Write};

use csv::{Writer, WriterBuilder};

use super::columns::ColumnDescriptor;
use super::sanitize::normalize_into;
use super::ExportConfig;

/// Writes header and data records with the configured delimiter, quoting and
/// line ending.
///
/// Data fields are sanitized before encoding; the writer doubles embedded
/// quotes, so a field is written as `"` + [`sanitize`](super::sanitize) + `"`.
/// Header names are quoted and escaped but otherwise written verbatim.
pub struct CsvEncoder<W: Write> {
    writer: Writer<W>,
    scratch: String,
}

impl<W: Write> CsvEncoder<W> {
    /// Creates an encoder writing to `inner`.
    pub fn new(inner: W, config: &ExportConfig) -> Self {
        let writer = WriterBuilder::new()
            .delimiter(config.delimiter)
            .quote(b'"')
            .double_quote(true)
            .quote_style(config.quote_mode.style())
            .terminator(config.line_ending.terminator())
            .flexible(false)
            .from_writer(inner);
        Self {
            writer,
            scratch: String::new(),
        }
    }

    /// Writes the header record.
    pub fn write_header(&mut self, columns: &[ColumnDescriptor]) -> csv::Result<()> {
        self.writer
            .write_record(columns.iter().map(|column| column.name.as_bytes()))
    }

    /// Sanitizes `raw` and writes it as the next field of the current record.
    pub fn write_field(&mut self, raw: &[u8]) -> csv::Result<()> {
        normalize_into(raw, &mut self.scratch);
        self.writer.write_field(self.scratch.as_bytes())
    }

    /// Terminates the current record.
    pub fn end_record(&mut self) -> csv::Result<()> {
        self.writer.write_record(None::<&[u8]>)
    }

    /// Writes a full data record.
    pub fn write_row<'a, I>(&mut self, fields: I) -> csv::Result<()>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        for field in fields {
            self.write_field(field)?;
        }
        self.end_record()
    }

    /// Flushes the encoder and the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// The underlying writer.
    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|err| err.into_error())
    }
}
