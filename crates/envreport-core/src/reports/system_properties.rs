use std::collections::BTreeMap;
use std::sync::Arc;

use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Process properties, sorted by key, with sensitive values masked.
pub struct SystemPropertiesReport {
    sink: Arc<dyn LogSink>,
    properties: BTreeMap<String, String>,
    redactor: Redactor,
}

impl SystemPropertiesReport {
    pub fn new(
        sink: Arc<dyn LogSink>,
        properties: BTreeMap<String, String>,
        redactor: Redactor,
    ) -> Self {
        Self {
            sink,
            properties,
            redactor,
        }
    }
}

impl Report for SystemPropertiesReport {
    fn kind(&self) -> ReportKind {
        ReportKind::SystemProperties
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        for (key, value) in &self.properties {
            w.entry(key, self.redactor.render(key, value));
        }
    }
}
