//! spritelink - serve a microcontroller's sprite commands over a serial link

use clap::{ArgGroup, Parser};
use spritelink::{logging, Backend, Host, HostConfig, SoftwareRenderer, SoftwareRendererConfig};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

const EXIT_SUCCESS: u8 = 0;
const EXIT_ERROR: u8 = 1;

/// How long a serial or TCP read waits before the link re-checks the
/// running flag.
const LINK_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Baud rate the device firmware talks at.
const DEFAULT_BAUD: u32 = 38_400;

/// Render sprites for a device speaking the sprite command protocol
#[derive(Parser, Debug)]
#[command(name = "spritelink")]
#[command(version, about)]
#[command(group(ArgGroup::new("link").required(true).args(["device", "connect"])))]
struct Cli {
    /// Serial device, e.g. /dev/ttyUSB0 or COM3
    #[arg(short, long)]
    device: Option<String>,

    /// Serial baud rate
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Connect to a serial-over-TCP bridge at HOST:PORT
    #[arg(short, long)]
    connect: Option<String>,

    /// Directory sprite image names are resolved against
    #[arg(short, long, default_value = ".")]
    assets: PathBuf,

    /// Draw nowhere instead of in the terminal
    #[arg(long)]
    headless: bool,

    /// Headless only: save every presented frame as PNG here
    #[arg(long, requires = "headless")]
    snapshots: Option<PathBuf>,

    /// Target frames per second
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=1000))]
    fps: u32,

    /// Do not send the 0xFF initialisation byte on connect
    #[arg(long)]
    no_init_byte: bool,

    /// Do not discard the device's first byte
    #[arg(long)]
    no_sync: bool,

    /// Log level for spritelink events
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Write logs to this file [default: stderr when headless, otherwise spritelink.log]
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            target_fps: self.fps,
            send_init_byte: !self.no_init_byte,
            discard_sync_byte: !self.no_sync,
            ..HostConfig::default()
        }
    }

    fn renderer(&self) -> SoftwareRenderer {
        SoftwareRenderer::new(SoftwareRendererConfig {
            asset_root: self.assets.clone(),
            backend: if self.headless {
                Backend::Headless
            } else {
                Backend::Terminal
            },
            snapshot_dir: self.snapshots.clone(),
            ..SoftwareRendererConfig::default()
        })
    }
}

fn serve<T>(transport: T, cli: &Cli) -> ExitCode
where
    T: Read + Write + Send + 'static,
{
    let host = match Host::start(transport, Arc::new(cli.renderer()), cli.host_config()) {
        Ok(host) => host,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            eprintln!("Error: {e}");
            return ExitCode::from(EXIT_ERROR);
        }
    };

    tracing::debug!("waiting for device");
    match host.wait() {
        Ok(()) => {
            tracing::info!("session ended");
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn main() -> ExitCode {
    // clap exits with status 2 on invalid arguments
    let cli = Cli::parse();

    // The terminal window draws on the tty, so its logs go to a file
    let log_path = logging::log_path(cli.log_file.as_deref(), !cli.headless);
    if let Err(e) = logging::init(cli.log_level, log_path.as_deref()) {
        eprintln!("Error: {e}");
        return ExitCode::from(EXIT_ERROR);
    }

    if let Some(path) = &cli.device {
        // 8N1; reads time out so a closed window is noticed without input
        let port = serialport::new(path.as_str(), cli.baud)
            .timeout(LINK_READ_TIMEOUT)
            .open();
        match port {
            Ok(port) => {
                tracing::info!(device = %path, baud = cli.baud, "link open");
                serve(port, &cli)
            }
            Err(e) => {
                eprintln!("Error: cannot open {path}: {e}");
                ExitCode::from(EXIT_ERROR)
            }
        }
    } else if let Some(addr) = &cli.connect {
        let stream = TcpStream::connect(addr).and_then(|stream| {
            stream.set_read_timeout(Some(LINK_READ_TIMEOUT))?;
            stream.set_nodelay(true)?;
            Ok(stream)
        });
        match stream {
            Ok(stream) => {
                tracing::info!(%addr, "link open");
                serve(stream, &cli)
            }
            Err(e) => {
                eprintln!("Error: cannot connect to {addr}: {e}");
                ExitCode::from(EXIT_ERROR)
            }
        }
    } else {
        // Unreachable: clap requires one of the two
        ExitCode::from(EXIT_ERROR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_link_is_required() {
        assert!(Cli::try_parse_from(["spritelink"]).is_err());
        assert!(Cli::try_parse_from(["spritelink", "-d", "/dev/null", "-c", "x:1"]).is_err());
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::try_parse_from([
            "spritelink",
            "--connect",
            "127.0.0.1:9000",
            "--headless",
            "--fps",
            "30",
            "--no-init-byte",
        ])
        .unwrap();
        let config = cli.host_config();
        assert_eq!(config.target_fps, 30);
        assert!(!config.send_init_byte);
        assert!(config.discard_sync_byte);
        assert_eq!(cli.renderer().config().backend, Backend::Headless);
        assert_eq!(cli.log_level, tracing::Level::INFO);
        assert_eq!(cli.baud, DEFAULT_BAUD);
    }

    #[test]
    fn test_device_baud() {
        let cli = Cli::try_parse_from(["spritelink", "-d", "/dev/ttyUSB0", "-b", "9600"]).unwrap();
        assert_eq!(cli.device.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(cli.baud, 9600);
    }

    #[test]
    fn test_snapshots_require_headless() {
        assert!(Cli::try_parse_from(["spritelink", "-d", "/dev/null", "--snapshots", "out"]).is_err());
    }
}
