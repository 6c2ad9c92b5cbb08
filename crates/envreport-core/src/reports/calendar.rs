use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};

use crate::collector::{Environment, FileSystem};
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Zone regions per output line.
const REGIONS_PER_LINE: usize = 15;

const ZONEINFO_DIR: &str = "/usr/share/zoneinfo";

/// Clock, offset and time zone database facts.
pub struct CalendarReport {
    sink: Arc<dyn LogSink>,
    fs: Arc<dyn FileSystem>,
    env: Arc<Environment>,
    now: DateTime<Utc>,
}

impl CalendarReport {
    pub fn new(
        sink: Arc<dyn LogSink>,
        fs: Arc<dyn FileSystem>,
        env: Arc<Environment>,
        now: DateTime<Utc>,
    ) -> Self {
        Self { sink, fs, env, now }
    }

    /// Zone identifier: `TZ`, then `/etc/timezone`, then the `/etc/localtime` link.
    fn zone_id(&self) -> Option<String> {
        if let Some(tz) = self.env.get("TZ") {
            return Some(tz.trim_start_matches(':').to_string());
        }
        if let Ok(content) = self.fs.read_to_string(Path::new("/etc/timezone"))
            && !content.trim().is_empty()
        {
            return Some(content.trim().to_string());
        }
        let target = self.fs.read_link(Path::new("/etc/localtime")).ok()?;
        let target = target.to_string_lossy();
        target
            .split_once("zoneinfo/")
            .map(|(_, zone)| zone.to_string())
    }

    fn regions(&self) -> Result<Vec<String>, String> {
        let entries = self
            .fs
            .read_dir(Path::new(ZONEINFO_DIR))
            .map_err(|e| crate::report::io_marker(&e))?;
        let mut regions: Vec<String> = entries
            .iter()
            .filter(|p| self.fs.is_dir(p))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .filter(|n| n.starts_with(|c: char| c.is_ascii_uppercase()))
            .collect();
        regions.sort();
        Ok(regions)
    }
}

impl Report for CalendarReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Calendar
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());

        let local = self.now.with_timezone(&Local);
        w.entry("utc time", self.now.format("%Y-%m-%d %H:%M:%S UTC"));
        w.entry("local time", local.format("%Y-%m-%d %H:%M:%S"));
        w.entry("offset", local.format("%:z"));
        w.entry("day of week", self.now.format("%A"));
        w.entry("week of year", self.now.format("%V"));
        w.entry("TZ", self.env.get("TZ").unwrap_or("(unset)"));
        w.entry("zone id", self.zone_id().unwrap_or_else(|| "n/a".to_string()));

        match self.regions() {
            Ok(regions) => w.wrapped("zone regions", &regions, REGIONS_PER_LINE),
            Err(marker) => w.entry("zone regions", marker),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;
    use crate::reports::testing::{assert_line, capture, output};

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn zoneinfo() -> MockFs {
        let mut fs = MockFs::new();
        for region in [
            "Africa", "America", "Antarctica", "Arctic", "Asia", "Atlantic", "Australia",
            "Brazil", "Canada", "Chile", "Etc", "Europe", "Indian", "Mexico", "Pacific", "US",
        ] {
            fs.add_dir(format!("{}/{}", ZONEINFO_DIR, region));
        }
        fs.add_dir(format!("{}/posix", ZONEINFO_DIR));
        fs.add_file(format!("{}/UTC", ZONEINFO_DIR), "TZif");
        fs
    }

    #[test]
    fn test_calendar_report() {
        let mut fs = zoneinfo();
        fs.add_link("/etc/localtime", "/usr/share/zoneinfo/Europe/Berlin");
        let (sink, dyn_sink) = capture();
        let report = CalendarReport::new(
            dyn_sink,
            Arc::new(fs),
            Arc::new(Environment::default()),
            now(),
        );
        let text = output(&sink, &report);

        assert!(text.starts_with("Calendar:\n"));
        assert_line(&text, "  - utc time: 2023-11-14 22:13:20 UTC");
        assert_line(&text, "  - day of week: Tuesday");
        assert_line(&text, "  - week of year: 46");
        assert_line(&text, "  - TZ: (unset)");
        assert_line(&text, "  - zone id: Europe/Berlin");
        assert_line(
            &text,
            "  - zone regions: Africa, America, Antarctica, Arctic, Asia, Atlantic, Australia, \
             Brazil, Canada, Chile, Etc, Europe, Indian, Mexico, Pacific",
        );
        assert_line(&text, "      US");
    }

    #[test]
    fn test_zone_id_precedence() {
        let mut fs = MockFs::new();
        fs.add_file("/etc/timezone", "America/New_York\n");
        fs.add_link("/etc/localtime", "/usr/share/zoneinfo/Europe/Berlin");
        let fs: Arc<dyn FileSystem> = Arc::new(fs);
        let (_, dyn_sink) = capture();

        let env = Arc::new(Environment::from_pairs([("TZ", ":Asia/Tokyo")]));
        let report = CalendarReport::new(dyn_sink.clone(), fs.clone(), env, now());
        assert_eq!(report.zone_id().as_deref(), Some("Asia/Tokyo"));

        let report = CalendarReport::new(dyn_sink, fs, Arc::new(Environment::default()), now());
        assert_eq!(report.zone_id().as_deref(), Some("America/New_York"));
    }

    #[test]
    fn test_calendar_report_is_repeatable() {
        let fs: Arc<dyn FileSystem> = Arc::new(zoneinfo());
        let (sink, dyn_sink) = capture();
        let report = CalendarReport::new(dyn_sink, fs, Arc::new(Environment::default()), now());
        let first = output(&sink, &report);
        let second = output(&sink, &report);
        assert_eq!(first, second);
        assert_line(&first, "  - zone id: n/a");
    }
}
