use std::sync::Arc;

use crate::collector::{Environment, FileSystem};
use crate::report::{Report, ReportKind};
use crate::reports::dir_names;
use crate::reports::locale::{LocaleName, effective_locale};
use crate::sink::{InfoWriter, LogSink};

/// Charsets per output line.
const CHARSETS_PER_LINE: usize = 8;

const CHARMAP_DIR: &str = "/usr/share/i18n/charmaps";

/// Charset of the portable locale.
const PORTABLE_CHARSET: &str = "US-ASCII";

/// Canonical spelling of a locale codeset (`utf8` becomes `UTF-8`).
pub(crate) fn canonical_charset(codeset: &str) -> String {
    let upper = codeset.to_ascii_uppercase();
    match upper.as_str() {
        "UTF8" => "UTF-8".to_string(),
        "EUCJP" => "EUC-JP".to_string(),
        "EUCKR" => "EUC-KR".to_string(),
        _ => upper,
    }
}

/// Charset implied by a locale name.
pub(crate) fn locale_charset(name: &str) -> String {
    let locale = LocaleName::parse(name);
    match locale.codeset {
        Some(codeset) => canonical_charset(&codeset),
        None if locale.is_portable() => PORTABLE_CHARSET.to_string(),
        // glibc's default for territory locales without a codeset.
        None => "ISO-8859-1".to_string(),
    }
}

pub struct CharsetReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
}

impl CharsetReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, env: Arc<Environment>) -> Self {
        Self { sink, fs, env }
    }
}

impl Report for CharsetReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Charset
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let locale = effective_locale(&self.env);
        w.entry("default charset", locale_charset(&locale));
        w.entry("from locale", &locale);

        match dir_names(self.fs.as_ref(), CHARMAP_DIR) {
            Ok(names) => {
                let mut charsets: Vec<String> = names
                    .iter()
                    .map(|n| n.strip_suffix(".gz").unwrap_or(n).to_string())
                    .collect();
                charsets.dedup();
                w.wrapped("available charsets", &charsets, CHARSETS_PER_LINE);
            }
            Err(marker) => w.entry("available charsets", marker),
        }
    }
}
