use std::io::Write;

/// Column layout of the exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `Title,Description,Link,PubDate`
    Plain,
    /// `Title,Description,Original_Title,Original_Description,Link,PubDate`
    Translated,
}

impl Schema {
    pub fn for_translation(enabled: bool) -> Self {
        if enabled {
            Self::Translated
        } else {
            Self::Plain
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            Self::Plain => "Title,Description,Link,PubDate",
            Self::Translated => "Title,Description,Original_Title,Original_Description,Link,PubDate",
        }
    }
}

/// Cells of one output row.
///
/// `translated` holds the translated `(title, description)` pair when the
/// run translates; the originals then move to the `Original_*` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub translated: Option<(String, String)>,
    pub link: &'a str,
    pub pub_date: String,
}

impl ExportRow<'_> {
    fn cells(&self, schema: Schema) -> Vec<&str> {
        match (schema, &self.translated) {
            (Schema::Translated, Some((title, description))) => vec![
                title.as_str(),
                description.as_str(),
                self.title,
                self.description,
                self.link,
                self.pub_date.as_str(),
            ],
            // A translated schema without a translation falls back to the originals
            (Schema::Translated, None) => vec![
                self.title,
                self.description,
                self.title,
                self.description,
                self.link,
                self.pub_date.as_str(),
            ],
            (Schema::Plain, _) => {
                vec![self.title, self.description, self.link, self.pub_date.as_str()]
            }
        }
    }
}

/// Writes the export document: a bare channel title, a blank line, the
/// header, then one fully quoted row per item.
///
/// Rows go through the `csv` crate with every field quoted, so embedded
/// double quotes are doubled. The title and header lines are written raw.
pub struct RecordWriter<W: Write> {
    csv: csv::Writer<W>,
    schema: Schema,
    rows: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Writes the preamble (title, blank line, header) and returns a writer
    /// ready for rows.
    pub fn new(mut out: W, channel_title: &str, schema: Schema) -> std::io::Result<Self> {
        writeln!(out, "{channel_title}")?;
        writeln!(out)?;
        writeln!(out, "{}", schema.header())?;

        let csv = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(out);

        Ok(Self {
            csv,
            schema,
            rows: 0,
        })
    }

    pub fn write_row(&mut self, row: &ExportRow<'_>) -> Result<(), csv::Error> {
        self.csv.write_record(row.cells(self.schema))?;
        self.rows += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flushes buffered rows and hands back the underlying writer.
    pub fn finish(self) -> std::io::Result<W> {
        self.csv.into_inner().map_err(|e| e.into_error())
    }
}
