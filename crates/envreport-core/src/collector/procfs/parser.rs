//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::{BTreeSet, HashMap};

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/[pid]/stat` (the fields the runtime report uses).
#[derive(Debug, Clone, Default)]
pub struct ProcStat {
    pub pid: u32,
    pub comm: String,
    pub state: char,
    pub ppid: u32,
    pub num_threads: i32,
    /// Start time after boot, in clock ticks.
    pub starttime: u64,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    let pid: u32 = content[..open_paren]
        .trim()
        .parse()
        .map_err(|_| ParseError::new("invalid pid"))?;

    let comm = content[open_paren + 1..close_paren].to_string();

    // Fields after the closing ')', starting with state.
    let remaining = &content[close_paren + 1..];
    let fields: Vec<&str> = remaining.split_whitespace().collect();

    if fields.len() < 20 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 20+, got {}",
            fields.len()
        )));
    }

    let parse_field = |idx: usize, name: &str| -> Result<i64, ParseError> {
        fields
            .get(idx)
            .ok_or_else(|| ParseError::new(format!("missing field {}", name)))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        pid,
        comm,
        state: fields[0].chars().next().unwrap_or('?'),
        ppid: parse_field(1, "ppid")? as u32,
        num_threads: parse_field(17, "num_threads")? as i32,
        starttime: parse_field(19, "starttime")? as u64,
    })
}

/// Parsed data from `/proc/[pid]/status`.
///
/// Memory fields are in KiB, as the kernel reports them.
#[derive(Debug, Clone, Default)]
pub struct ProcStatus {
    pub name: String,
    pub pid: u32,
    pub uid: u32,
    pub euid: u32,
    pub gid: u32,
    pub egid: u32,
    pub threads: u32,
    pub vm_peak: u64,
    pub vm_size: u64,
    pub vm_hwm: u64,
    pub vm_rss: u64,
    pub vm_data: u64,
    pub vm_swap: u64,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus, ParseError> {
    let mut status = ProcStatus::default();
    let mut fields: HashMap<&str, &str> = HashMap::new();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    if fields.is_empty() {
        return Err(ParseError::new("empty status"));
    }

    status.name = fields.get("Name").unwrap_or(&"").to_string();
    status.pid = fields.get("Pid").and_then(|s| s.parse().ok()).unwrap_or(0);
    status.threads = fields
        .get("Threads")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    // Uid and Gid have format: real effective saved fs
    if let Some(uid_line) = fields.get("Uid") {
        let parts: Vec<&str> = uid_line.split_whitespace().collect();
        if let Some(uid) = parts.first() {
            status.uid = uid.parse().unwrap_or(0);
        }
        if let Some(euid) = parts.get(1) {
            status.euid = euid.parse().unwrap_or(0);
        }
    }
    if let Some(gid_line) = fields.get("Gid") {
        let parts: Vec<&str> = gid_line.split_whitespace().collect();
        if let Some(gid) = parts.first() {
            status.gid = gid.parse().unwrap_or(0);
        }
        if let Some(egid) = parts.get(1) {
            status.egid = egid.parse().unwrap_or(0);
        }
    }

    // Memory fields are in kB format: "12345 kB"
    let parse_kb = |key: &str| -> u64 {
        fields
            .get(key)
            .and_then(|s| s.split_whitespace().next())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    status.vm_peak = parse_kb("VmPeak");
    status.vm_size = parse_kb("VmSize");
    status.vm_hwm = parse_kb("VmHWM");
    status.vm_rss = parse_kb("VmRSS");
    status.vm_data = parse_kb("VmData");
    status.vm_swap = parse_kb("VmSwap");

    Ok(status)
}

/// Parsed data from `/proc/meminfo`, in KiB.
#[derive(Debug, Clone, Default)]
pub struct MemInfo {
    pub mem_total: u64,
    pub mem_free: u64,
    pub mem_available: u64,
    pub buffers: u64,
    pub cached: u64,
    pub swap_total: u64,
    pub swap_free: u64,
}

/// Parses `/proc/meminfo` content.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ParseError> {
    let mut info = MemInfo::default();
    let mut seen = false;

    let parse_kb = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    };

    for line in content.lines() {
        if line.starts_with("MemTotal:") {
            info.mem_total = parse_kb(line);
            seen = true;
        } else if line.starts_with("MemFree:") {
            info.mem_free = parse_kb(line);
        } else if line.starts_with("MemAvailable:") {
            info.mem_available = parse_kb(line);
        } else if line.starts_with("Buffers:") {
            info.buffers = parse_kb(line);
        } else if line.starts_with("Cached:") {
            info.cached = parse_kb(line);
        } else if line.starts_with("SwapTotal:") {
            info.swap_total = parse_kb(line);
        } else if line.starts_with("SwapFree:") {
            info.swap_free = parse_kb(line);
        }
    }

    if !seen {
        return Err(ParseError::new("missing MemTotal in meminfo"));
    }

    Ok(info)
}

/// Global stats from `/proc/stat`.
#[derive(Debug, Clone, Default)]
pub struct GlobalStat {
    /// Number of per-cpu lines (`cpu0`, `cpu1`, ...).
    pub cpu_count: u32,
    /// Boot time, seconds since the epoch.
    pub btime: u64,
    pub processes: u64,
    pub procs_running: u32,
}

/// Parses `/proc/stat` content.
pub fn parse_global_stat(content: &str) -> Result<GlobalStat, ParseError> {
    let mut stat = GlobalStat::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        let value = || parts.get(1).and_then(|s| s.parse().ok()).unwrap_or(0);

        match parts[0] {
            "ctxt" | "intr" | "softirq" | "cpu" => {}
            "btime" => stat.btime = value(),
            "processes" => stat.processes = value(),
            "procs_running" => stat.procs_running = value() as u32,
            name if name.starts_with("cpu") => stat.cpu_count += 1,
            _ => {}
        }
    }

    if stat.btime == 0 {
        return Err(ParseError::new("missing btime in stat"));
    }

    Ok(stat)
}

/// Parsed data from `/proc/loadavg`.
#[derive(Debug, Clone, Default)]
pub struct LoadAvg {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
    pub running: u32,
    pub total: u32,
}

/// Parses `/proc/loadavg` content.
pub fn parse_loadavg(content: &str) -> Result<LoadAvg, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::new("invalid loadavg format"));
    }

    let load1 = parts[0]
        .parse()
        .map_err(|_| ParseError::new("invalid load1"))?;
    let load5 = parts[1]
        .parse()
        .map_err(|_| ParseError::new("invalid load5"))?;
    let load15 = parts[2]
        .parse()
        .map_err(|_| ParseError::new("invalid load15"))?;

    // Format: running/total
    let (running, total) = if let Some((r, t)) = parts[3].split_once('/') {
        (r.parse().unwrap_or(0), t.parse().unwrap_or(0))
    } else {
        (0, 0)
    };

    Ok(LoadAvg {
        load1,
        load5,
        load15,
        running,
        total,
    })
}

/// Parsed entry from `/etc/passwd`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PasswdEntry {
    pub username: String,
    pub uid: u32,
    pub gid: u32,
    pub gecos: String,
    pub home: String,
    pub shell: String,
}

/// Parses `/etc/passwd` content and returns a map of UID -> entry.
///
/// Format: username:password:uid:gid:gecos:home:shell
pub fn parse_passwd(content: &str) -> HashMap<u32, PasswdEntry> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() >= 3
            && let Ok(uid) = parts[2].parse::<u32>()
        {
            let field = |idx: usize| parts.get(idx).unwrap_or(&"").to_string();
            map.insert(
                uid,
                PasswdEntry {
                    username: parts[0].to_string(),
                    uid,
                    gid: parts.get(3).and_then(|s| s.parse().ok()).unwrap_or(0),
                    gecos: field(4),
                    home: field(5),
                    shell: field(6),
                },
            );
        }
    }
    map
}

/// A resource limit from `/proc/[pid]/limits`.
///
/// `None` means `unlimited`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Limit {
    pub soft: Option<u64>,
    pub hard: Option<u64>,
}

/// Parses `/proc/[pid]/limits` content into a map of limit name -> values.
///
/// Format: fixed-width table, `Limit  Soft Limit  Hard Limit  Units`. Limit
/// names contain spaces, so values are taken from the right-hand side.
pub fn parse_limits(content: &str) -> Result<HashMap<String, Limit>, ParseError> {
    let mut limits = HashMap::new();

    for line in content.lines().skip(1) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 3 {
            continue;
        }

        // Units column is optional ("Max realtime timeout" has "us", "Max nice" has none).
        let has_units = parts.len() >= 4
            && parts[parts.len() - 1]
                .chars()
                .all(|c| c.is_ascii_alphabetic())
            && parts[parts.len() - 1] != "unlimited";
        let end = if has_units {
            parts.len() - 1
        } else {
            parts.len()
        };
        if end < 3 {
            continue;
        }

        let parse_value = |s: &str| -> Result<Option<u64>, ParseError> {
            if s == "unlimited" {
                Ok(None)
            } else {
                s.parse()
                    .map(Some)
                    .map_err(|_| ParseError::new(format!("invalid limit value '{}'", s)))
            }
        };

        let name = parts[..end - 2].join(" ");
        let limit = Limit {
            soft: parse_value(parts[end - 2])?,
            hard: parse_value(parts[end - 1])?,
        };
        limits.insert(name, limit);
    }

    if limits.is_empty() {
        return Err(ParseError::new("no limits found"));
    }

    Ok(limits)
}

/// Extracts the paths of shared objects mapped into a process from
/// `/proc/[pid]/maps`, deduplicated and sorted.
pub fn parse_mapped_libraries(content: &str) -> BTreeSet<String> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().nth(5))
        .filter(|path| path.starts_with('/') && is_shared_object(path))
        .map(str::to_string)
        .collect()
}

fn is_shared_object(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    file.ends_with(".so") || file.contains(".so.")
}

/// Parses `/proc/uptime` content into whole seconds since boot.
pub fn parse_uptime(content: &str) -> Result<u64, ParseError> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?;
    let secs: f64 = first
        .parse()
        .map_err(|_| ParseError::new(format!("invalid uptime: {}", first)))?;
    Ok(secs as u64)
}
