// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// There are no subcommands: one run resolves one package. Every flag has a
// default, so `debfetch --package curl` is a complete command line.
//
// Note: `--version` is the Debian release to search ("bookworm"), so clap's
// built-in --version flag is switched off.
// =============================================================================

use crate::config::{self, DEFAULT_MIRROR, DEFAULT_VERSION};
use crate::pipeline::DEFAULT_QUEUE_SIZE;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "debfetch",
    about = "Download a Debian package and all of its dependencies",
    long_about = "debfetch walks a package's dependency tree on packages.debian.org and downloads \
                  the .deb for every package in it. Handy for installing software on machines \
                  without network access.",
    disable_version_flag = true
)]
pub struct Cli {
    /// The package to download
    #[arg(long, default_value = "wpasupplicant")]
    pub package: String,

    /// The Debian version to search packages for
    #[arg(long, default_value = DEFAULT_VERSION)]
    pub version: String,

    /// The CPU architecture to look for in packages (defaults to this machine's)
    #[arg(long, default_value_t = config::host_arch().to_string())]
    pub arch: String,

    /// The mirror to download packages from (host + path)
    #[arg(long, default_value = DEFAULT_MIRROR)]
    pub mirror: String,

    /// The directory to download the packages to (defaults to the current directory)
    ///
    /// Packages end up in <path>/<package>.
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Leave libc6 out of the download set
    ///
    /// Always on when the package itself is libc6.
    #[arg(long)]
    pub no_libc: bool,

    /// Base URL of the package index
    #[arg(long, default_value = config::DEFAULT_INDEX)]
    pub index_url: String,

    /// Number of download workers (defaults to the number of CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// How many resolved packages may wait for a download worker
    #[arg(long, default_value_t = DEFAULT_QUEUE_SIZE)]
    pub queue_size: usize,

    /// Attempts per page fetch or download before giving up
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Print a JSON summary instead of the completion message
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["debfetch"]).unwrap();
        assert_eq!(cli.package, "wpasupplicant");
        assert_eq!(cli.version, "bookworm");
        assert_eq!(cli.arch, config::host_arch());
        assert_eq!(cli.mirror, "ftp.us.debian.org/debian");
        assert_eq!(cli.path, None);
        assert!(!cli.no_libc);
        assert_eq!(cli.queue_size, 100);
        assert_eq!(cli.retries, 3);
    }

    #[test]
    fn test_version_is_the_debian_release() {
        let cli = Cli::try_parse_from([
            "debfetch",
            "--package",
            "libdbus-1-3",
            "--version",
            "trixie",
            "--arch",
            "arm64",
            "--no-libc",
            "--path",
            "/tmp/out",
        ])
        .unwrap();

        assert_eq!(cli.package, "libdbus-1-3");
        assert_eq!(cli.version, "trixie");
        assert_eq!(cli.arch, "arm64");
        assert!(cli.no_libc);
        assert_eq!(cli.path, Some(PathBuf::from("/tmp/out")));
    }
}
