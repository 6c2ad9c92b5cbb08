use std::sync::Arc;

use crate::redact::Redactor;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Executable and arguments the process was started with.
///
/// `-D<key>=<value>` and `--<key>=<value>` arguments with sensitive keys
/// have their values masked.
pub struct CommandLineReport {
    sink: Arc<dyn LogSink>,
    args: Vec<String>,
    redactor: Redactor,
}

impl CommandLineReport {
    /// `args` includes the program name at index 0.
    pub fn new(sink: Arc<dyn LogSink>, args: Vec<String>, redactor: Redactor) -> Self {
        Self {
            sink,
            args,
            redactor,
        }
    }

    /// Arguments of the current process, converted lossily.
    pub fn current_args() -> Vec<String> {
        std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl Report for CommandLineReport {
    fn kind(&self) -> ReportKind {
        ReportKind::CommandLine
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let mut args = self.args.iter();
        w.entry("program", args.next().map(String::as_str).unwrap_or("n/a"));
        let rest: Vec<&String> = args.collect();
        w.entry("argument count", rest.len());
        if rest.is_empty() {
            return;
        }
        w.item("arguments:");
        for arg in rest {
            w.nested_item(self.redactor.render_argument(arg));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::testing::{capture, output};

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arguments_are_redacted() {
        let (sink, dyn_sink) = capture();
        let report = CommandLineReport::new(
            dyn_sink,
            args(&[
                "/usr/bin/app",
                "-Ddb.password=hunter2",
                "--api-token=abc",
                "--port=8080",
                "serve",
            ]),
            Redactor::default(),
        );

        assert_eq!(
            output(&sink, &report),
            "Command Line:\n\
             \x20 - program: /usr/bin/app\n\
             \x20 - argument count: 4\n\
             \x20 - arguments:\n\
             \x20     -Ddb.password=********\n\
             \x20     --api-token=********\n\
             \x20     --port=8080\n\
             \x20     serve"
        );
    }

    #[test]
    fn test_no_arguments() {
        let (sink, dyn_sink) = capture();
        let report = CommandLineReport::new(dyn_sink, args(&["app"]), Redactor::default());
        assert_eq!(
            output(&sink, &report),
            "Command Line:\n  - program: app\n  - argument count: 0"
        );
    }

    #[test]
    fn test_current_args_has_program() {
        assert!(!CommandLineReport::current_args().is_empty());
    }
}
