/*!
 * Configuration handling for treegauge
 */

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Command-line arguments for treegauge
#[derive(Parser, Debug, Clone)]
#[clap(
    name = "treegauge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Serve compressed size and modification time of files and directories over HTTP",
    long_about = "Serves a JSON description of any path under the root directory: name, last modification time, gzip-compressed size for files, and a recursive listing for directories."
)]
pub struct Args {
    /// Directory whose contents are served
    #[clap(default_value = ".")]
    pub root: String,

    /// Address to listen on
    #[clap(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[clap(long, default_value = "8080")]
    pub port: u16,

    /// Number of threads used for walking (0 picks one per CPU)
    #[clap(long, default_value = "0")]
    pub threads: usize,

    /// Describe this path under the root once, print it and exit
    #[clap(long, value_name = "PATH")]
    pub print: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory that request paths are resolved against
    pub root: PathBuf,

    /// Listen address
    pub bind: String,

    /// Listen port
    pub port: u16,

    /// Walker threads, 0 for rayon's default
    pub num_threads: usize,

    /// One-shot path to print instead of serving
    pub print_path: Option<String>,

    /// Verbosity level from the command line
    pub verbose: u8,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args(args: Args) -> Self {
        Self {
            root: PathBuf::from(args.root),
            bind: args.bind,
            port: args.port,
            num_threads: args.threads,
            print_path: args.print,
            verbose: args.verbose,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> io::Result<()> {
        if !self.root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("Root directory not found: {}", self.root.display()),
            ));
        }

        self.socket_addr()?;
        Ok(())
    }

    /// Socket address built from `bind` and `port`
    pub fn socket_addr(&self) -> io::Result<SocketAddr> {
        let ip: IpAddr = self.bind.parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid bind address '{}': {}", self.bind, e),
            )
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Default log filter for the configured verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_defaults() {
        let config = Config::from_args(Args::parse_from(["treegauge"]));
        assert_eq!(config.root, PathBuf::from("."));
        assert_eq!(config.port, 8080);
        assert_eq!(config.num_threads, 0);
        assert!(config.print_path.is_none());
        assert_eq!(config.log_level(), "info");
        assert_eq!(
            config.socket_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn parses_flags() {
        let args = Args::parse_from([
            "treegauge", "/srv", "--bind", "127.0.0.1", "--port", "9000", "--threads", "3",
            "--print", "docs", "-vv",
        ]);
        let config = Config::from_args(args);
        assert_eq!(config.root, PathBuf::from("/srv"));
        assert_eq!(config.num_threads, 3);
        assert_eq!(config.print_path.as_deref(), Some("docs"));
        assert_eq!(config.log_level(), "trace");
    }

    #[test]
    fn rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_args(Args::parse_from(["treegauge"]));
        config.root = dir.path().join("missing");
        assert_eq!(config.validate().unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn rejects_bad_bind() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::from_args(Args::parse_from(["treegauge"]));
        config.root = dir.path().to_path_buf();
        config.bind = "not-an-ip".to_string();
        assert_eq!(
            config.validate().unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }
}
