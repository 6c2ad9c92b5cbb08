//! Readers for the Linux `/proc` filesystem.
//!
//! Parsers live in [`parser`]; they are pure functions over file contents so
//! report units can feed them from the real host or from a `MockFs`.

pub mod parser;

pub use parser::{
    GlobalStat, Limit, LoadAvg, MemInfo, ParseError, PasswdEntry, ProcStat, ProcStatus,
    parse_global_stat, parse_limits, parse_loadavg, parse_mapped_libraries, parse_meminfo,
    parse_passwd, parse_proc_stat, parse_proc_status, parse_uptime,
};
