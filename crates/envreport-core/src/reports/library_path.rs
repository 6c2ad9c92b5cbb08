use std::sync::Arc;

use crate::collector::procfs::parse_mapped_libraries;
use crate::collector::{Environment, FileSystem};
use crate::report::{Report, ReportKind};
use crate::reports::read_with;
use crate::sink::{InfoWriter, LogSink};

const SEARCH_VARIABLES: [&str; 2] = ["LD_LIBRARY_PATH", "PATH"];

/// Library and executable search paths, plus the shared objects mapped into
/// the process.
pub struct LibraryPathReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
}

impl LibraryPathReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, env: Arc<Environment>) -> Self {
        Self { sink, fs, env }
    }
}

impl Report for LibraryPathReport {
    fn kind(&self) -> ReportKind {
        ReportKind::LibraryPath
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        for var in SEARCH_VARIABLES {
            let entries = self.env.split_paths(var);
            if entries.is_empty() {
                w.entry(var, "(unset)");
                continue;
            }
            w.item(format!("{}:", var));
            for entry in &entries {
                w.nested_item(entry);
            }
        }

        match read_with(self.fs.as_ref(), "/proc/self/maps", |c| {
            Ok(parse_mapped_libraries(c))
        }) {
            Ok(libs) if libs.is_empty() => w.entry("loaded libraries", "none"),
            Ok(libs) => {
                w.item(format!("loaded libraries ({}):", libs.len()));
                for lib in &libs {
                    w.nested_item(lib);
                }
            }
            Err(marker) => w.entry("loaded libraries", marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::reports::testing::{capture, output};

    const MAPS: &str = "\
55d4c1a00000-55d4c1a02000 r--p 00000000 08:01 131 /usr/bin/app
7f3a10000000-7f3a10022000 r--p 00000000 08:01 200 /usr/lib/x86_64-linux-gnu/libc.so.6
7f3a10022000-7f3a10190000 r-xp 00022000 08:01 200 /usr/lib/x86_64-linux-gnu/libc.so.6
7f3a10200000-7f3a10210000 r--p 00000000 08:01 210 /opt/app/lib/libssl.so.3
7ffd1c000000-7ffd1c021000 rw-p 00000000 00:00 0 [stack]
";

    #[test]
    fn test_library_path_report() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/self/maps", MAPS);
        let env = Environment::from_pairs([("PATH", "/usr/local/bin:/usr/bin")]);
        let (sink, dyn_sink) = capture();
        let report = LibraryPathReport::new(dyn_sink, Arc::new(fs), Arc::new(env));

        assert_eq!(
            output(&sink, &report),
            "Library Path:\n\
             \x20 - LD_LIBRARY_PATH: (unset)\n\
             \x20 - PATH:\n\
             \x20     /usr/local/bin\n\
             \x20     /usr/bin\n\
             \x20 - loaded libraries (2):\n\
             \x20     /opt/app/lib/libssl.so.3\n\
             \x20     /usr/lib/x86_64-linux-gnu/libc.so.6"
        );
    }

    #[test]
    fn test_maps_unavailable() {
        let (sink, dyn_sink) = capture();
        let report = LibraryPathReport::new(
            dyn_sink,
            Arc::new(MockFs::new()),
            Arc::new(Environment::default()),
        );
        let text = output(&sink, &report);
        assert!(text.ends_with("  - loaded libraries: Not available"));
    }
}
