//! Container environment detection.
//!
//! Detects whether the current process is running inside a container
//! (Docker, Kubernetes, Podman, LXC, etc.) and which markers gave it away.

use std::path::Path;

use crate::collector::env::Environment;
use crate::collector::traits::FileSystem;

/// Cgroup path fragments that identify a container runtime.
const CGROUP_PATTERNS: [&str; 5] = [
    "kubepods",
    "docker",
    "containerd",
    "lxc",
    "/system.slice/containerd",
];

/// Markers found while probing for a container runtime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerMarkers {
    /// `KUBERNETES_SERVICE_HOST` is set.
    pub kubernetes_env: bool,
    /// The Kubernetes service account token is mounted.
    pub service_account: bool,
    /// Value of the `container` variable set by systemd-nspawn, Podman and others.
    pub container_env: Option<String>,
    /// `/.dockerenv` exists.
    pub dockerenv: bool,
    /// `/run/.containerenv` exists.
    pub containerenv: bool,
    /// First matching pattern in `/proc/1/cgroup`.
    pub cgroup_pattern: Option<&'static str>,
}

impl ContainerMarkers {
    /// Returns true if any marker was found.
    pub fn is_container(&self) -> bool {
        self.kubernetes_env
            || self.service_account
            || self.container_env.is_some()
            || self.dockerenv
            || self.containerenv
            || self.cgroup_pattern.is_some()
    }

    /// Best guess at the runtime that started the process.
    pub fn runtime(&self) -> &str {
        if self.kubernetes_env || self.service_account {
            "kubernetes"
        } else if self.dockerenv {
            "docker"
        } else if self.containerenv {
            "podman"
        } else if let Some(name) = self.container_env.as_deref() {
            name
        } else if let Some(pattern) = self.cgroup_pattern {
            pattern.trim_start_matches("/system.slice/")
        } else {
            "none"
        }
    }
}

/// Performs container detection using multiple methods.
pub fn detect(fs: &dyn FileSystem, env: &Environment) -> ContainerMarkers {
    ContainerMarkers {
        kubernetes_env: env.get("KUBERNETES_SERVICE_HOST").is_some(),
        service_account: fs.exists(Path::new(
            "/var/run/secrets/kubernetes.io/serviceaccount/token",
        )),
        container_env: env.get("container").map(str::to_string),
        dockerenv: fs.exists(Path::new("/.dockerenv")),
        containerenv: fs.exists(Path::new("/run/.containerenv")),
        cgroup_pattern: check_cgroup(fs),
    }
}

/// Checks cgroup for container-specific patterns.
fn check_cgroup(fs: &dyn FileSystem) -> Option<&'static str> {
    let content = fs.read_to_string(Path::new("/proc/1/cgroup")).ok()?;
    CGROUP_PATTERNS
        .iter()
        .copied()
        .find(|p| content.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn test_bare_metal() {
        let fs = MockFs::new();
        let markers = detect(&fs, &Environment::default());
        assert!(!markers.is_container());
        assert_eq!(markers.runtime(), "none");
    }

    #[test]
    fn test_kubernetes_env() {
        let fs = MockFs::new();
        let env = Environment::from_pairs([("KUBERNETES_SERVICE_HOST", "10.0.0.1")]);
        let markers = detect(&fs, &env);
        assert!(markers.is_container());
        assert_eq!(markers.runtime(), "kubernetes");
    }

    #[test]
    fn test_dockerenv_marker() {
        let mut fs = MockFs::new();
        fs.add_file("/.dockerenv", "");
        let markers = detect(&fs, &Environment::default());
        assert!(markers.dockerenv);
        assert_eq!(markers.runtime(), "docker");
    }

    #[test]
    fn test_cgroup_pattern() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/cgroup", "0::/system.slice/containerd.service\n");
        let markers = detect(&fs, &Environment::default());
        assert_eq!(markers.cgroup_pattern, Some("containerd"));
        assert!(markers.is_container());
    }
}
