use std::sync::Arc;

use crate::collector::Environment;
use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Environment variables, sorted by name, with sensitive values masked.
pub struct EnvironmentReport {
    sink: Arc<dyn LogSink>,
    env: Arc<Environment>,
    redactor: Redactor,
}

impl EnvironmentReport {
    pub fn new(sink: Arc<dyn LogSink>, env: Arc<Environment>, redactor: Redactor) -> Self {
        Self {
            sink,
            env,
            redactor,
        }
    }
}

impl Report for EnvironmentReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Environment
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        if self.env.is_empty() {
            w.item("none");
            return;
        }
        for (name, value) in self.env.iter() {
            w.entry(name, self.redactor.render(name, value));
        }
    }
}
