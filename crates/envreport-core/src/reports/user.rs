use std::sync::Arc;

use crate::collector::procfs::{parse_passwd, parse_proc_status};
use crate::collector::{Environment, FileSystem};
use crate::report::{Report, ReportKind, io_marker};
use crate::reports::read_with;
use crate::sink::{InfoWriter, LogSink};

/// Identity of the user the process runs as.
pub struct UserReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
}

impl UserReport {
    pub fn new(sink: Arc<dyn LogSink>, fs: Arc<dyn FileSystem>, env: Arc<Environment>) -> Self {
        Self { sink, fs, env }
    }
}

impl Report for UserReport {
    fn kind(&self) -> ReportKind {
        ReportKind::User
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let status = read_with(self.fs.as_ref(), "/proc/self/status", parse_proc_status);
        let account = status.as_ref().ok().and_then(|s| {
            read_with(self.fs.as_ref(), "/etc/passwd", |c| Ok(parse_passwd(c)))
                .ok()
                .and_then(|mut users| users.remove(&s.uid))
        });

        let name = account
            .as_ref()
            .map(|a| a.username.as_str())
            .or_else(|| self.env.get("USER"))
            .or_else(|| self.env.get("LOGNAME"))
            .unwrap_or("n/a");
        w.entry("name", name);

        match &status {
            Ok(s) => {
                w.entry("uid", s.uid);
                w.entry("effective uid", s.euid);
                w.entry("gid", s.gid);
                w.entry("effective gid", s.egid);
            }
            Err(marker) => w.entry("ids", marker),
        }

        if let Some(gecos) = account.as_ref().map(|a| a.gecos.as_str())
            && !gecos.is_empty()
        {
            w.entry("full name", gecos);
        }

        let home = account
            .as_ref()
            .map(|a| a.home.as_str())
            .or_else(|| self.env.get("HOME"))
            .unwrap_or("n/a");
        w.entry("home", home);

        let shell = account
            .as_ref()
            .map(|a| a.shell.as_str())
            .or_else(|| self.env.get("SHELL"))
            .unwrap_or("n/a");
        w.entry("shell", shell);

        match std::env::current_dir() {
            Ok(dir) => w.entry("working directory", dir.display()),
            Err(e) => w.entry("working directory", io_marker(&e)),
        }
        w.entry("temp directory", self.env.get("TMPDIR").unwrap_or("/tmp"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::reports::testing::{assert_line, capture, output};

    const STATUS: &str = "Name:\tenvreport\nPid:\t42\nUid:\t1000\t1000\t1000\t1000\nGid:\t100\t100\t100\t100\nThreads:\t1\n";

    #[test]
    fn test_user_from_passwd() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/self/status", STATUS);
        fs.add_file(
            "/etc/passwd",
            "root:x:0:0:root:/root:/bin/bash\nalice:x:1000:100:Alice Doe:/home/alice:/bin/zsh\n",
        );
        let env = Environment::from_pairs([("USER", "ignored"), ("TMPDIR", "/var/tmp")]);
        let (sink, dyn_sink) = capture();
        let text = output(&sink, &UserReport::new(dyn_sink, Arc::new(fs), Arc::new(env)));

        assert!(text.starts_with("User:\n"));
        assert_line(&text, "  - name: alice");
        assert_line(&text, "  - uid: 1000");
        assert_line(&text, "  - effective gid: 100");
        assert_line(&text, "  - full name: Alice Doe");
        assert_line(&text, "  - home: /home/alice");
        assert_line(&text, "  - shell: /bin/zsh");
        assert_line(&text, "  - temp directory: /var/tmp");
    }

    #[test]
    fn test_user_falls_back_to_environment() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/self/status", STATUS);
        fs.add_file("/etc/passwd", "");
        fs.deny("/etc/passwd");
        let env = Environment::from_pairs([("USER", "bob"), ("HOME", "/home/bob")]);
        let (sink, dyn_sink) = capture();
        let text = output(&sink, &UserReport::new(dyn_sink, Arc::new(fs), Arc::new(env)));

        assert_line(&text, "  - name: bob");
        assert_line(&text, "  - home: /home/bob");
        assert_line(&text, "  - shell: n/a");
        assert_line(&text, "  - temp directory: /tmp");
    }

    #[test]
    fn test_user_without_proc() {
        let (sink, dyn_sink) = capture();
        let report = UserReport::new(
            dyn_sink,
            Arc::new(MockFs::new()),
            Arc::new(Environment::default()),
        );
        let text = output(&sink, &report);
        assert_line(&text, "  - name: n/a");
        assert_line(&text, "  - ids: Not available");
    }
}
