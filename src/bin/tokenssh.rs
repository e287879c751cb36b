use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use tracing::{error, info, warn};

use tokenssh::{
    agent::{AgentServer, Endpoint},
    api::{self, SeedKdfParams, SerialTransport, TerminalInput},
    use_cases, DeviceClient,
};

/// Comment appended to the printed authorized_keys line.
const AUTHORIZED_KEYS_COMMENT: &str = "my-44key";

#[derive(Parser, Debug)]
#[command(name = "tokenssh")]
#[command(about = "SSH agent for a serial-attached ed25519 token", version)]
pub struct Cli {
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Serial port the token is attached to (e.g. /dev/ttyACM0, COM3). Lists ports if omitted
    #[arg(long)]
    pub port: Option<String>,

    /// Format the device: clear all data and generate a new device secret
    #[arg(long, conflicts_with = "webpwd")]
    pub format: bool,

    /// Generate a site password instead of running the agent
    #[arg(long)]
    pub webpwd: bool,

    /// Agent socket path (Unix only, default /tmp/44ssh)
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.tracing_level_filter())
        .with_writer(std::io::stderr)
        .init();

    let Some(port) = cli.port.as_deref() else {
        print_ports();
        return Ok(());
    };

    let client = api::open_device(port).with_context(|| format!("unable to open device on {port}"))?;
    let mut input = TerminalInput;

    if cli.format {
        let entropy =
            use_cases::format_device(&client, &mut input).context("unable to format device")?;
        println!("Entropy: {}", hex::encode(entropy.as_bytes()));
        println!("Device formatted successfully!");
        return Ok(());
    }

    let public_key = use_cases::ensure_public_key(&client, &mut input, &SeedKdfParams::default())
        .context("unable to get public key")?;

    if cli.webpwd {
        let password = use_cases::generate_site_password(&client, &mut input)
            .context("unable to generate site password")?;
        println!("{}", password.as_str());
        return Ok(());
    }

    let authorized_key = public_key
        .to_openssh(AUTHORIZED_KEYS_COMMENT)
        .context("unable to encode public key")?;
    println!(
        "\n=== Public key in ssh format, add following line to ~/.ssh/authorized_keys on your remote servers ==="
    );
    println!("{authorized_key}");
    println!("=== End of public key ===\n");

    let endpoint = match cli.socket {
        Some(path) => Endpoint::UnixSocket(path),
        None => Endpoint::platform_default(),
    };
    if let Some(hint) = endpoint.client_hint() {
        println!("{hint}");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(serve(client, endpoint))
}

fn print_ports() {
    println!("--port is required, available serial ports:");
    match api::list_ports() {
        Ok(ports) => {
            for port in ports {
                println!("{port}");
            }
        }
        Err(err) => warn!("unable to list serial ports: {err}"),
    }
}

async fn serve(client: DeviceClient<SerialTransport>, endpoint: Endpoint) -> anyhow::Result<()> {
    let server = AgentServer::new(client, endpoint.clone());
    tokio::select! {
        result = server.run() => {
            if let Err(err) = &result {
                error!("agent on {endpoint} stopped: {err}");
            }
            result.with_context(|| format!("agent on {endpoint} stopped"))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}
