//! Host platform detection

use std::fmt;

/// Operating system family, detected once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux (procfs and vm sysctls)
    Linux,
    /// macOS (vm_stat, purge)
    MacOs,
    /// Windows
    Windows,
    /// Anything else, carrying the raw OS name
    Other(&'static str),
}

impl Platform {
    /// Platform this binary was built for
    pub fn current() -> Self {
        Self::from_os(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` value to a platform
    pub fn from_os(os: &'static str) -> Self {
        match os {
            "linux" => Platform::Linux,
            "macos" => Platform::MacOs,
            "windows" => Platform::Windows,
            other => Platform::Other(other),
        }
    }

    /// Get the platform name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
            Platform::Other(name) => name,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_os() {
        assert_eq!(Platform::from_os("linux"), Platform::Linux);
        assert_eq!(Platform::from_os("macos"), Platform::MacOs);
        assert_eq!(Platform::from_os("windows"), Platform::Windows);
        assert_eq!(Platform::from_os("freebsd"), Platform::Other("freebsd"));
        assert_eq!(Platform::Other("freebsd").to_string(), "freebsd");
    }

    #[test]
    fn test_current_matches_consts() {
        assert_eq!(Platform::current().as_str(), std::env::consts::OS);
    }
}
