// src/config.rs
// =============================================================================
// Settings that every resolution step reads.
//
// A ResolutionConfig is built once from the command line and then shared
// (behind an Arc) by every resolver task. It never changes during a run.
//
// It also knows how to build the URLs for the index service:
//   package page:    {index_base}/{version}/{arch}/{package}
//   resolution page: {index_base}{relative path from the package page}
// =============================================================================

use crate::retry::RetryPolicy;
use url::Url;

pub const DEFAULT_INDEX: &str = "https://packages.debian.org";
pub const DEFAULT_VERSION: &str = "bookworm";
pub const DEFAULT_MIRROR: &str = "ftp.us.debian.org/debian";

// The C library package. Almost everything depends on it, so it can be
// left out of a download set (it's nearly always already installed).
pub const LIBC_PACKAGE: &str = "libc6";

#[derive(Debug, Clone)]
pub struct ResolutionConfig {
    /// Base URL of the package index service
    pub index_base: Url,
    /// Distribution version, e.g. "bookworm"
    pub version: String,
    /// Debian architecture name, e.g. "amd64"
    pub arch: String,
    /// Mirror host + path that downloads must come from, e.g. "ftp.us.debian.org/debian"
    pub mirror: String,
    pub allow_libc: bool,
    pub retry: RetryPolicy,
}

impl ResolutionConfig {
    pub fn new(index_base: Url, version: &str, arch: &str, mirror: &str) -> Self {
        Self {
            index_base,
            version: version.to_string(),
            arch: arch.to_string(),
            mirror: mirror.trim_end_matches('/').to_string(),
            allow_libc: true,
            retry: RetryPolicy::default(),
        }
    }

    // Asking for libc6 itself always excludes it from the dependency lists,
    // whatever the caller asked for.
    pub fn with_libc(mut self, root_package: &str, allow_libc: bool) -> Self {
        self.allow_libc = allow_libc && root_package != LIBC_PACKAGE;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn package_url(&self, package: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.index_base.as_str().trim_end_matches('/'),
            self.version,
            self.arch,
            package
        )
    }

    // Resolution links on package pages are host-relative ("/bookworm/amd64/x/download")
    pub fn index_url(&self, relative: &str) -> String {
        match self.index_base.join(relative) {
            Ok(url) => url.to_string(),
            Err(_) => format!(
                "{}{}",
                self.index_base.as_str().trim_end_matches('/'),
                relative
            ),
        }
    }

    // The last path segment of the mirror ("debian" for "ftp.us.debian.org/debian").
    // Candidate download links are cut at this segment before comparing.
    pub fn mirror_root(&self) -> &str {
        match self.mirror.rsplit_once('/') {
            Some((_, root)) if !root.is_empty() => root,
            _ => "debian",
        }
    }
}

// Maps the architecture this binary was built for to Debian's naming.
// Falls back to the Rust name for anything we don't know.
pub fn host_arch() -> &'static str {
    debian_arch(std::env::consts::ARCH)
}

pub fn debian_arch(rust_arch: &'static str) -> &'static str {
    match rust_arch {
        "x86_64" => "amd64",
        "x86" => "i386",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        "mips64" => "mips64el",
        "loongarch64" => "loong64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ResolutionConfig {
        ResolutionConfig::new(
            Url::parse(DEFAULT_INDEX).unwrap(),
            DEFAULT_VERSION,
            "amd64",
            DEFAULT_MIRROR,
        )
    }

    #[test]
    fn test_package_url() {
        assert_eq!(
            config().package_url("libdbus-1-3"),
            "https://packages.debian.org/bookworm/amd64/libdbus-1-3"
        );
    }

    #[test]
    fn test_index_url_joins_relative_path() {
        assert_eq!(
            config().index_url("/bookworm/amd64/libcap2/download"),
            "https://packages.debian.org/bookworm/amd64/libcap2/download"
        );
    }

    #[test]
    fn test_libc_forced_off_for_libc_root() {
        assert!(config().with_libc("libdbus-1-3", true).allow_libc);
        assert!(!config().with_libc("libdbus-1-3", false).allow_libc);
        assert!(!config().with_libc("libc6", true).allow_libc);
    }

    #[test]
    fn test_mirror_root() {
        assert_eq!(config().mirror_root(), "debian");

        let custom = ResolutionConfig::new(
            Url::parse(DEFAULT_INDEX).unwrap(),
            DEFAULT_VERSION,
            "amd64",
            "mirror.example.org/pub/ubuntu/",
        );
        assert_eq!(custom.mirror, "mirror.example.org/pub/ubuntu");
        assert_eq!(custom.mirror_root(), "ubuntu");
    }

    #[test]
    fn test_debian_arch_names() {
        assert_eq!(debian_arch("x86_64"), "amd64");
        assert_eq!(debian_arch("aarch64"), "arm64");
        assert_eq!(debian_arch("riscv64"), "riscv64");
    }
}
