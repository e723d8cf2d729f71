use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::writer::{ExportRow, RecordWriter, Schema};
use super::ExportError;
use crate::config::ExportConfig;
use crate::feed::{fetch_feed, normalize_pub_date, parse_feed, Feed};
use crate::report::print_feed;
use crate::translate::{AzureTranslator, Translator};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Outcome of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub rows: usize,
    pub translated: bool,
    pub output_path: PathBuf,
}

/// Runs the whole export: fetch, parse, print, then write the CSV.
///
/// # Errors
///
/// Any failure aborts the run. If it happens inside the item loop the output
/// file keeps the rows written before the failing item.
pub async fn run_export(config: &ExportConfig) -> Result<ExportSummary, ExportError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(crate::feed::FetchError::Network)?;

    let bytes = fetch_feed(&client, &config.feed_url).await?;
    let feed = parse_feed(&bytes)?;
    tracing::info!(
        channel = %feed.channel.title,
        items = feed.items.len(),
        "Feed parsed"
    );

    print_feed(&mut std::io::stdout().lock(), &feed)?;

    let translator = config
        .translator
        .as_ref()
        .map(|t| AzureTranslator::new(client.clone(), t))
        .transpose()?;
    if let Some(t) = &translator {
        tracing::info!(url = %t.url(), "Translation enabled");
    }

    let rows = export_to_path(
        &config.output_path,
        &feed,
        translator.as_ref().map(|t| t as &dyn Translator),
        config.write_bom,
    )
    .await?;

    tracing::info!(
        rows,
        path = %config.output_path.display(),
        "Export complete"
    );

    Ok(ExportSummary {
        rows,
        translated: config.translation_enabled(),
        output_path: config.output_path.clone(),
    })
}

/// Creates (or truncates) `path` and writes the export into it.
pub async fn export_to_path(
    path: &Path,
    feed: &Feed,
    translator: Option<&dyn Translator>,
    write_bom: bool,
) -> Result<usize, ExportError> {
    let file = File::create(path).map_err(|source| ExportError::CreateOutput {
        path: path.to_path_buf(),
        source,
    })?;
    let mut out = BufWriter::new(file);
    if write_bom {
        out.write_all(UTF8_BOM)?;
    }

    export_feed(out, feed, translator).await
}

/// Writes `feed` as CSV into `out`, translating each item when a translator
/// is given.
///
/// Items are processed one at a time in feed order; for each, the title and
/// then the description are translated (two sequential calls) before its row
/// is written. The first error stops the loop. Rows already written are
/// flushed when the writer is dropped, so a partial file remains.
pub async fn export_feed<W: Write>(
    out: W,
    feed: &Feed,
    translator: Option<&dyn Translator>,
) -> Result<usize, ExportError> {
    let schema = Schema::for_translation(translator.is_some());
    let mut writer = RecordWriter::new(out, &feed.channel.title, schema)?;

    for (index, item) in feed.items.iter().enumerate() {
        let pub_date = normalize_pub_date(&item.pub_date);

        let translated = match translator {
            Some(translator) => {
                let title = translator
                    .translate(&item.title)
                    .await
                    .map_err(|source| ExportError::Translation { index, source })?;
                let description = translator
                    .translate(&item.description)
                    .await
                    .map_err(|source| ExportError::Translation { index, source })?;
                Some((title, description))
            }
            None => None,
        };

        writer.write_row(&ExportRow {
            title: &item.title,
            description: &item.description,
            translated,
            link: &item.link,
            pub_date,
        })?;
        tracing::debug!(index, title = %item.title, "Row written");
    }

    let rows = writer.rows();
    let mut out = writer.finish()?;
    out.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{Channel, Item};
    use crate::translate::TranslationError;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Prefixes text with the target language; fails on the `fail_on`-th call.
    struct StubTranslator {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    impl StubTranslator {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on,
            }
        }
    }

    #[async_trait::async_trait]
    impl Translator for StubTranslator {
        async fn translate(&self, text: &str) -> Result<String, TranslationError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if Some(call) == self.fail_on {
                return Err(TranslationError::NoTranslations);
            }
            Ok(format!("ja:{text}"))
        }
    }

    fn feed_with(items: &[(&str, &str)]) -> Feed {
        Feed {
            channel: Channel {
                title: "Azure updates".to_string(),
                description: "d".to_string(),
                link: "https://azure.microsoft.com/updates/".to_string(),
                last_build_date: "now".to_string(),
            },
            items: items
                .iter()
                .map(|(title, description)| Item {
                    title: title.to_string(),
                    link: "http://x".to_string(),
                    pub_date: "Wed, 02 Oct 2019 00:00:00 Z".to_string(),
                    description: description.to_string(),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_export_without_translation() {
        let mut out = Vec::new();
        let rows = export_feed(&mut out, &feed_with(&[("Foo", "Bar")]), None)
            .await
            .unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Azure updates\n\nTitle,Description,Link,PubDate\n\"Foo\",\"Bar\",\"http://x\",\"2019/10/02\"\n"
        );
    }

    #[tokio::test]
    async fn test_export_with_translation_calls_twice_per_item() {
        let translator = StubTranslator::new(None);
        let mut out = Vec::new();
        let rows = export_feed(
            &mut out,
            &feed_with(&[("Foo", "Bar"), ("Baz", "Qux")]),
            Some(&translator as &dyn Translator),
        )
        .await
        .unwrap();

        assert_eq!(rows, 2);
        assert_eq!(translator.calls.load(Ordering::SeqCst), 4);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[2],
            "Title,Description,Original_Title,Original_Description,Link,PubDate"
        );
        assert_eq!(
            lines[3],
            "\"ja:Foo\",\"ja:Bar\",\"Foo\",\"Bar\",\"http://x\",\"2019/10/02\""
        );
        assert_eq!(
            lines[4],
            "\"ja:Baz\",\"ja:Qux\",\"Baz\",\"Qux\",\"http://x\",\"2019/10/02\""
        );
    }

    #[tokio::test]
    async fn test_translation_failure_keeps_only_earlier_rows() {
        // Call 2 is the second item's title
        let translator = StubTranslator::new(Some(2));
        let mut out = Vec::new();
        let err = export_feed(
            &mut out,
            &feed_with(&[("A", "a"), ("B", "b"), ("C", "c")]),
            Some(&translator as &dyn Translator),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ExportError::Translation { index: 1, .. }));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 3);

        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().skip(3).collect();
        assert_eq!(rows, vec!["\"ja:A\",\"ja:a\",\"A\",\"a\",\"http://x\",\"2019/10/02\""]);
    }

    #[tokio::test]
    async fn test_empty_feed_writes_preamble_only() {
        let mut out = Vec::new();
        let rows = export_feed(&mut out, &feed_with(&[]), None).await.unwrap();
        assert_eq!(rows, 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Azure updates\n\nTitle,Description,Link,PubDate\n"
        );
    }

    #[tokio::test]
    async fn test_export_to_path_with_bom() {
        let dir = std::env::temp_dir().join("rss_export_test_bom");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.csv");

        let rows = export_to_path(&path, &feed_with(&[("Foo", "Bar")]), None, true)
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        assert!(bytes[UTF8_BOM.len()..].starts_with(b"Azure updates\n"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_export_to_missing_directory_fails() {
        let path = std::env::temp_dir()
            .join("rss_export_test_missing_dir")
            .join("nested")
            .join("out.csv");
        let err = export_to_path(&path, &feed_with(&[]), None, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::CreateOutput { .. }));
    }
}
