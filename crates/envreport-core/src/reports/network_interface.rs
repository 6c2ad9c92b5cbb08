use std::sync::Arc;

use crate::collector::network::REACHABILITY_TIMEOUT;
use crate::collector::{AddressProbe, NetworkInterface};
use crate::fmt;
use crate::report::{Report, ReportKind};
use crate::sink::{InfoWriter, LogSink};

/// One network interface with its bound addresses.
pub struct NetworkInterfaceReport {
    sink: Arc<dyn LogSink>,
    interface: NetworkInterface,
    probe: Arc<dyn AddressProbe>,
}

impl NetworkInterfaceReport {
    pub fn new(
        sink: Arc<dyn LogSink>,
        interface: NetworkInterface,
        probe: Arc<dyn AddressProbe>,
    ) -> Self {
        Self {
            sink,
            interface,
            probe,
        }
    }
}

fn or_na<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "n/a".to_string())
}

impl Report for NetworkInterfaceReport {
    fn kind(&self) -> ReportKind {
        ReportKind::NetworkInterface
    }

    fn run(&self) {
        let Some(mut w) = InfoWriter::open(&self.sink) else {
            return;
        };
        let iface = &self.interface;
        w.title(&format!("{} {}", self.kind().title(), iface.name));
        w.entry("name", &iface.name);
        w.entry("index", or_na(iface.index));
        w.entry("mtu", or_na(iface.mtu));

        let labels = iface.flags.labels();
        if labels.is_empty() {
            w.entry("flags", "none");
        } else {
            w.entry("flags", labels.join("; "));
        }

        match &iface.hardware_address {
            Some(mac) => w.entry("hardware address", fmt::hex_groups(mac)),
            None => w.entry("hardware address", "n/a"),
        }

        if iface.addresses.is_empty() {
            w.entry("addresses", "none");
            return;
        }
        w.item("addresses:");
        for address in &iface.addresses {
            w.nested("address", format!("{}/{}", address.addr, address.prefix));
            match self.probe.host_name(address.addr) {
                Ok(name) => w.nested("host name", name),
                Err(e) => w.nested("host name", format!("n/a ({})", e)),
            }
            match self.probe.canonical_host_name(address.addr) {
                Ok(name) => w.nested("canonical host name", name),
                Err(e) => w.nested("canonical host name", format!("n/a ({})", e)),
            }
            match self.probe.is_reachable(address.addr, REACHABILITY_TIMEOUT) {
                Ok(reachable) => w.nested(
                    &format!("reachable ({}ms)", REACHABILITY_TIMEOUT.as_millis()),
                    reachable,
                ),
                Err(e) => w.nested(
                    &format!("reachable ({}ms)", REACHABILITY_TIMEOUT.as_millis()),
                    format!("failed ({})", e),
                ),
            }
        }
    }
}
