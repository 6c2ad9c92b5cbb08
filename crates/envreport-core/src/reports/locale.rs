use std::sync::Arc;

use crate::collector::{Environment, FileSystem};
use crate::report::{Report, ReportKind};
use crate::reports::dir_names;
use crate::sink::{InfoWriter, LogSink};

/// Available locales per output line.
const LOCALES_PER_LINE: usize = 10;

/// Directory holding compiled locales.
const LOCALE_DIR: &str = "/usr/lib/locale";

/// Locale variables, in the order they are listed.
const LOCALE_VARIABLES: [&str; 9] = [
    "LANG",
    "LANGUAGE",
    "LC_ALL",
    "LC_COLLATE",
    "LC_CTYPE",
    "LC_MESSAGES",
    "LC_MONETARY",
    "LC_NUMERIC",
    "LC_TIME",
];

/// A POSIX locale name, `language[_territory][.codeset][@modifier]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocaleName {
    pub language: String,
    pub territory: Option<String>,
    pub codeset: Option<String>,
    pub modifier: Option<String>,
}

impl LocaleName {
    pub fn parse(name: &str) -> Self {
        let (rest, modifier) = match name.split_once('@') {
            Some((r, m)) => (r, Some(m.to_string())),
            None => (name, None),
        };
        let (rest, codeset) = match rest.split_once('.') {
            Some((r, c)) => (r, Some(c.to_string())),
            None => (rest, None),
        };
        let (language, territory) = match rest.split_once('_') {
            Some((l, t)) => (l.to_string(), Some(t.to_string())),
            None => (rest.to_string(), None),
        };
        Self {
            language,
            territory,
            codeset,
            modifier,
        }
    }

    /// True for the portable `C` and `POSIX` locales.
    pub fn is_portable(&self) -> bool {
        self.language == "C" || self.language == "POSIX"
    }
}

/// Locale in effect for character classification: `LC_ALL`, then
/// `LC_CTYPE`, then `LANG`, defaulting to `C`.
pub(crate) fn effective_locale(env: &Environment) -> String {
    env.get("LC_ALL")
        .or_else(|| env.get("LC_CTYPE"))
        .or_else(|| env.get("LANG"))
        .unwrap_or("C")
        .to_string()
}

pub struct LocaleReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
}

impl LocaleReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, env: Arc<Environment>) -> Self {
        Self { sink, fs, env }
    }
}

impl Report for LocaleReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Locale
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let name = effective_locale(&self.env);
        let locale = LocaleName::parse(&name);
        w.entry("default", &name);
        w.entry("language", &locale.language);
        w.entry("country", locale.territory.as_deref().unwrap_or("n/a"));
        w.entry("codeset", locale.codeset.as_deref().unwrap_or("n/a"));
        w.entry("modifier", locale.modifier.as_deref().unwrap_or("n/a"));

        for var in LOCALE_VARIABLES {
            w.entry(var, self.env.get(var).unwrap_or("(unset)"));
        }

        match dir_names(self.fs.as_ref(), LOCALE_DIR) {
            Ok(names) => {
                let mut available: Vec<String> = vec!["C".to_string(), "POSIX".to_string()];
                available.extend(names.into_iter().filter(|n| n != "locale-archive"));
                w.wrapped("available locales", &available, LOCALES_PER_LINE);
            }
            Err(marker) => w.entry("available locales", marker),
        }
    }
}
