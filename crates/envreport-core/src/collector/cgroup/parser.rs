//! Parsers for cgroup v1 and v2 limit files.

use crate::collector::procfs::ParseError;

/// Value cgroup v1 reports for an unset memory limit: `i64::MAX` rounded
/// down to the page size. Anything at or above it means "no limit".
pub const V1_UNLIMITED_THRESHOLD: u64 = 0x7FFF_FFFF_FFFF_F000;

/// A limit value that may be explicitly unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitValue {
    Limited(u64),
    Unlimited,
}

/// CPU bandwidth limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuQuota {
    /// Quota in microseconds per period; `None` when unlimited.
    pub quota: Option<u64>,
    pub period: u64,
}

impl CpuQuota {
    /// Effective number of CPUs the quota allows.
    pub fn cpus(&self) -> Option<f64> {
        match self.quota {
            Some(q) if self.period > 0 => Some(q as f64 / self.period as f64),
            _ => None,
        }
    }
}

fn parse_u64(s: &str) -> Result<u64, ParseError> {
    s.parse()
        .map_err(|e| ParseError::new(format!("'{}': {}", s, e)))
}

/// Parses a single unsigned number (e.g. `memory.current`).
pub fn parse_number(content: &str) -> Result<u64, ParseError> {
    parse_u64(content.trim())
}

/// Parses `memory.max` (v2) or `memory.limit_in_bytes` (v1).
/// Format: number or "max"
pub fn parse_memory_limit(content: &str) -> Result<LimitValue, ParseError> {
    let trimmed = content.trim();
    if trimmed == "max" {
        return Ok(LimitValue::Unlimited);
    }
    let value = parse_u64(trimmed)?;
    if value >= V1_UNLIMITED_THRESHOLD {
        Ok(LimitValue::Unlimited)
    } else {
        Ok(LimitValue::Limited(value))
    }
}

/// Parses `pids.max`.
/// Format: number or "max"
pub fn parse_pids_max(content: &str) -> Result<LimitValue, ParseError> {
    let trimmed = content.trim();
    if trimmed == "max" {
        Ok(LimitValue::Unlimited)
    } else {
        parse_u64(trimmed).map(LimitValue::Limited)
    }
}

/// Parses cpu.max file (v2).
/// Format: "quota period" or "max period"
/// Example: "100000 100000" or "max 100000"
pub fn parse_cpu_max(content: &str) -> Result<CpuQuota, ParseError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 2 {
        return Err(ParseError::new(format!(
            "expected 'quota period', got '{}'",
            content.trim()
        )));
    }

    let quota = if parts[0] == "max" {
        None
    } else {
        Some(parse_u64(parts[0])?)
    };
    let period = parse_u64(parts[1])?;

    Ok(CpuQuota { quota, period })
}

/// Parses `cpu.cfs_quota_us` (v1). `-1` means unlimited.
pub fn parse_cfs_quota(content: &str) -> Result<Option<u64>, ParseError> {
    let trimmed = content.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|e| ParseError::new(format!("'{}': {}", trimmed, e)))?;
    if value < 0 {
        Ok(None)
    } else {
        Ok(Some(value as u64))
    }
}

/// Parses `cgroup.controllers` (v2): space-separated controller names.
pub fn parse_controllers(content: &str) -> Vec<String> {
    content.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cpu_max_with_quota() {
        let quota = parse_cpu_max("150000 100000\n").unwrap();
        assert_eq!(quota.quota, Some(150_000));
        assert_eq!(quota.period, 100_000);
        assert_eq!(quota.cpus(), Some(1.5));
    }

    #[test]
    fn test_parse_cpu_max_unlimited() {
        let quota = parse_cpu_max("max 100000\n").unwrap();
        assert_eq!(quota.quota, None);
        assert_eq!(quota.cpus(), None);
    }

    #[test]
    fn test_parse_cpu_max_malformed() {
        assert!(parse_cpu_max("100000").is_err());
        assert!(parse_cpu_max("lots 100000").is_err());
    }

    #[test]
    fn test_parse_memory_limit() {
        assert_eq!(
            parse_memory_limit("1073741824\n").unwrap(),
            LimitValue::Limited(1073741824)
        );
        assert_eq!(parse_memory_limit("max\n").unwrap(), LimitValue::Unlimited);
        assert_eq!(
            parse_memory_limit("9223372036854771712\n").unwrap(),
            LimitValue::Unlimited
        );
        assert!(parse_memory_limit("lots\n").is_err());
    }

    #[test]
    fn test_parse_pids_max() {
        assert_eq!(parse_pids_max("100\n").unwrap(), LimitValue::Limited(100));
        assert_eq!(parse_pids_max("max\n").unwrap(), LimitValue::Unlimited);
    }

    #[test]
    fn test_parse_cfs_quota() {
        assert_eq!(parse_cfs_quota("-1\n").unwrap(), None);
        assert_eq!(parse_cfs_quota("50000\n").unwrap(), Some(50_000));
        assert!(parse_cfs_quota("x").is_err());
    }

    #[test]
    fn test_parse_controllers() {
        assert_eq!(
            parse_controllers("cpuset cpu io memory pids\n"),
            vec!["cpuset", "cpu", "io", "memory", "pids"]
        );
    }
}
