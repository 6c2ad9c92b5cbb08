use std::sync::Arc;

use crate::fmt;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// Byte-sized statistics, in display order.
const BYTE_STATS: [(&str, &str); 6] = [
    ("allocated", "stats.allocated"),
    ("active", "stats.active"),
    ("resident", "stats.resident"),
    ("mapped", "stats.mapped"),
    ("retained", "stats.retained"),
    ("metadata", "stats.metadata"),
];

const ARENA_COUNT: &str = "arenas.narenas";

/// Source of allocator statistics.
pub trait AllocatorStats: Send + Sync {
    fn name(&self) -> &str;

    /// Makes subsequent reads observe current values.
    fn refresh(&self) {}

    /// Reads one statistic by its control name, `None` when unavailable.
    fn read(&self, stat: &str) -> Option<u64>;
}

/// Stands in when the process does not run on jemalloc.
pub struct NoAllocatorStats;

impl AllocatorStats for NoAllocatorStats {
    fn name(&self) -> &str {
        "system"
    }

    fn read(&self, _stat: &str) -> Option<u64> {
        None
    }
}

#[cfg(not(target_env = "msvc"))]
pub use jemalloc::JemallocStats;

#[cfg(not(target_env = "msvc"))]
mod jemalloc {
    use std::ffi::{CString, c_void};
    use std::ptr;

    use super::{ARENA_COUNT, AllocatorStats};

    /// Statistics read through `mallctl`.
    pub struct JemallocStats;

    impl JemallocStats {
        fn read_raw<T: Default>(name: &str) -> Option<T> {
            let name = CString::new(name).ok()?;
            let mut value = T::default();
            let mut len = std::mem::size_of::<T>();
            // SAFETY: `value` is a valid, writable T and `len` holds its exact size,
            // which is the type mallctl reports for the requested name.
            let rc = unsafe {
                tikv_jemalloc_sys::mallctl(
                    name.as_ptr(),
                    (&mut value as *mut T).cast::<c_void>(),
                    &mut len,
                    ptr::null_mut(),
                    0,
                )
            };
            (rc == 0 && len == std::mem::size_of::<T>()).then_some(value)
        }
    }

    impl AllocatorStats for JemallocStats {
        fn name(&self) -> &str {
            "jemalloc"
        }

        fn refresh(&self) {
            let mut epoch: u64 = 1;
            // SAFETY: writing "epoch" takes a u64 and refreshes the cached stats.
            unsafe {
                tikv_jemalloc_sys::mallctl(
                    c"epoch".as_ptr().cast(),
                    ptr::null_mut(),
                    ptr::null_mut(),
                    (&mut epoch as *mut u64).cast::<c_void>(),
                    std::mem::size_of::<u64>(),
                );
            }
        }

        fn read(&self, stat: &str) -> Option<u64> {
            if stat == ARENA_COUNT {
                Self::read_raw::<u32>(stat).map(u64::from)
            } else {
                Self::read_raw::<usize>(stat).map(|v| v as u64)
            }
        }
    }
}

/// Heap statistics of the process allocator.
pub struct AllocatorReport {
    sink: Arc<dyn LogSink>,
    stats: Arc<dyn AllocatorStats>,
}

impl AllocatorReport {
    pub fn new(sink: Arc<dyn LogSink>, stats: Arc<dyn AllocatorStats>) -> Self {
        Self { sink, stats }
    }
}

impl Report for AllocatorReport {
    fn kind(&self) -> ReportKind {
        ReportKind::Allocator
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        w.title(self.kind().title());
        w.entry("allocator", self.stats.name());

        self.stats.refresh();
        for (label, stat) in BYTE_STATS {
            match self.stats.read(stat) {
                Some(v) => w.entry(label, fmt::bytes_u64(v)),
                None => w.entry(label, "n/a"),
            }
        }
        match self.stats.read(ARENA_COUNT) {
            Some(n) => w.entry("arenas", n),
            None => w.entry("arenas", "n/a"),
        }
    }
}
