//! Fact sources for the report units.
//!
//! Everything that touches the host lives here: `/proc` and cgroup parsers,
//! interface enumeration, container markers, the environment snapshot and the
//! trust-store certificate reader.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Report units                          │
//! └───────┬──────────────┬───────────────┬──────────────┬────────┘
//!         │              │               │              │
//!  ┌──────▼─────┐ ┌──────▼──────┐ ┌──────▼─────┐ ┌──────▼──────┐
//!  │  procfs    │ │   cgroup    │ │  network   │ │    x509     │
//!  │  parsers   │ │   reader    │ │ enumerator │ │   reader    │
//!  └──────┬─────┘ └──────┬──────┘ └──────┬─────┘ └──────┬──────┘
//!         └──────────────┴───────┬───────┴──────────────┘
//!                         ┌──────▼──────┐
//!                         │  FileSystem │ (trait)
//!                         └──────┬──────┘
//!                  ┌─────────────┴─────────────┐
//!           ┌──────▼──────┐             ┌──────▼──────┐
//!           │   RealFs    │             │   MockFs    │
//!           └─────────────┘             └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use envreport_core::collector::{FileSystem, MockFs};
//! use std::path::Path;
//!
//! let mut fs = MockFs::new();
//! fs.add_file("/proc/loadavg", "0.10 0.20 0.30 1/100 4242\n");
//! let content = fs.read_to_string(Path::new("/proc/loadavg")).unwrap();
//! let load = envreport_core::collector::procfs::parse_loadavg(&content).unwrap();
//! assert_eq!(load.total, 100);
//! ```

pub mod cgroup;
pub mod container;
pub mod env;
pub mod mock;
pub mod network;
pub mod procfs;
pub mod traits;
pub mod x509;

pub use env::Environment;
pub use mock::MockFs;
pub use network::{AddressProbe, NetworkInterface, SystemProbe};
pub use procfs::ParseError;
pub use traits::{FileSystem, RealFs};
