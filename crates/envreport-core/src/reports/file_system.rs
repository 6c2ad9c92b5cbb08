use std::sync::Arc;

use sysinfo::Disks;

use crate::collector::Environment;
use crate::fmt;
use crate::report::{Report, ReportKind, io_marker};
use crate::sink::{InfoWriter, LogSink};

/// Roots per output line.
const ROOTS_PER_LINE: usize = 5;

/// One mounted file system.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskInfo {
    pub mount_point: String,
    pub file_system: String,
    pub kind: String,
    pub total: u64,
    pub available: u64,
    pub removable: bool,
}

impl DiskInfo {
    /// Lists mounted disks, sorted by mount point.
    pub fn collect() -> Vec<DiskInfo> {
        let disks = Disks::new_with_refreshed_list();
        let mut list: Vec<DiskInfo> = disks
            .list()
            .iter()
            .map(|d| DiskInfo {
                mount_point: d.mount_point().display().to_string(),
                file_system: d.file_system().to_string_lossy().into_owned(),
                kind: d.kind().to_string(),
                total: d.total_space(),
                available: d.available_space(),
                removable: d.is_removable(),
            })
            .collect();
        list.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
        list
    }
}

pub struct FileSystemReport {
    sink: Arc<dyn LogSink>,
    disks: Vec<DiskInfo>,
    env: Arc<Environment>,
}

impl FileSystemReport {
    pub fn new(sink: Arc<dyn LogSink>, disks: Vec<DiskInfo>, env: Arc<Environment>) -> Self {
        Self { sink, disks, env }
    }
}

impl Report for FileSystemReport {
    fn kind(&self) -> ReportKind {
        ReportKind::FileSystem
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let roots: Vec<&str> = self.disks.iter().map(|d| d.mount_point.as_str()).collect();
        w.wrapped("roots", &roots, ROOTS_PER_LINE);

        for disk in &self.disks {
            w.item(format!("{}:", disk.mount_point));
            w.nested("file system", &disk.file_system);
            w.nested("kind", &disk.kind);
            w.nested("total space", fmt::bytes_u64(disk.total));
            w.nested("available space", fmt::bytes_u64(disk.available));
            w.nested("removable", disk.removable);
        }

        w.entry("home directory", self.env.get("HOME").unwrap_or("n/a"));
        w.entry("temp directory", self.env.get("TMPDIR").unwrap_or("/tmp"));
        match std::env::current_dir() {
            Ok(dir) => w.entry("working directory", dir.display()),
            Err(e) => w.entry("working directory", io_marker(&e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::testing::{assert_line, capture, output};

    fn disk(mount: &str, total: u64) -> DiskInfo {
        DiskInfo {
            mount_point: mount.to_string(),
            file_system: "ext4".to_string(),
            kind: "SSD".to_string(),
            total,
            available: total / 2,
            removable: false,
        }
    }

    #[test]
    fn test_file_system_report() {
        let disks = vec![
            disk("/", 107_374_182_400),
            disk("/boot", 536_870_912),
            disk("/data", 1_099_511_627_776),
            disk("/home", 53_687_091_200),
            disk("/mnt/a", 1024),
            disk("/mnt/b", 2048),
        ];
        let env = Environment::from_pairs([("HOME", "/home/alice")]);
        let (sink, dyn_sink) = capture();
        let text = output(&sink, &FileSystemReport::new(dyn_sink, disks, Arc::new(env)));

        assert!(text.starts_with("File System:\n"));
        assert_line(&text, "  - roots: /, /boot, /data, /home, /mnt/a");
        assert_line(&text, "      /mnt/b");
        assert_line(&text, "  - /data:");
        assert_line(&text, "      total space: 1.0TB");
        assert_line(&text, "      available space: 512.0GB");
        assert_line(&text, "      removable: false");
        assert_line(&text, "  - home directory: /home/alice");
        assert_line(&text, "  - temp directory: /tmp");
    }

    #[test]
    fn test_no_disks() {
        let (sink, dyn_sink) = capture();
        let report = FileSystemReport::new(dyn_sink, Vec::new(), Arc::new(Environment::default()));
        let text = output(&sink, &report);
        assert_line(&text, "  - roots: none");
        assert_line(&text, "  - home directory: n/a");
    }
}
