use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use p1_zigbee_rs::constants::{ENDPOINT_ELECTRICITY, ENDPOINT_GAS};
use p1_zigbee_rs::util::hex::{decode_hex, encode_hex_upper, pretty_hex};
use p1_zigbee_rs::{
    checksum, init_logger, log_info, meter_attribute_store, meter_endpoints,
    parse_captured_telegram, BridgeConfig, CommandEngine, InboundFrame, LogTransport, P1Bridge,
    P1SerialPort, ReportEncoder,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "p1-zigbee")]
#[command(about = "DSMR P1 telegram to Zigbee attribute bridge")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a captured telegram and print the reports it would produce
    Parse { file: PathBuf },
    /// Print the checksum of a captured telegram
    Checksum { file: PathBuf },
    /// Feed one inbound frame (hex payload) through the request engine
    Request {
        #[arg(long, value_parser = parse_u16, default_value = "0x0104")]
        profile: u16,
        #[arg(long, value_parser = parse_u16)]
        cluster: u16,
        /// Destination endpoint of the request
        #[arg(long, default_value = "1")]
        endpoint: u8,
        payload: String,
    },
    /// Run the bridge against a serial port, logging the frames it sends
    Run {
        #[arg(short, long)]
        port: Option<String>,
        #[arg(short, long)]
        baudrate: Option<u32>,
    },
}

fn parse_u16(value: &str) -> Result<u16, String> {
    let result = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => value.parse(),
    };
    result.map_err(|e| format!("{value}: {e}"))
}

fn read_telegram_file(path: &PathBuf) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading telegram {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => BridgeConfig::load_from_file(path)?,
        None => BridgeConfig::default(),
    };

    match cli.command {
        Commands::Parse { file } => {
            let telegram = read_telegram_file(&file)?;
            let (store, parsed) = parse_captured_telegram(&telegram, &config.device)?;
            println!(
                "Telegram {:?}, DSMR {:?}, gas read at {:?}",
                parsed.timestamp, parsed.version, parsed.gas_timestamp
            );
            let encoder = ReportEncoder::new(config.report_destination_endpoint);
            for dirty in parsed.dirty_sets() {
                for frame in encoder.preview(dirty, &store) {
                    println!(
                        "ep{} cluster 0x{:04X}: {}",
                        frame.source_endpoint,
                        frame.cluster,
                        encode_hex_upper(&frame.payload)
                    );
                }
            }
            for endpoint in [ENDPOINT_ELECTRICITY, ENDPOINT_GAS] {
                for attribute in store.endpoint_attributes(endpoint) {
                    if let Some(value) = attribute.value() {
                        println!("{} = {}", attribute.key(), encode_hex_upper(value));
                    }
                }
            }
        }
        Commands::Checksum { file } => {
            let telegram = read_telegram_file(&file)?;
            let start = telegram.iter().position(|&b| b == b'/').unwrap_or(0);
            let end = telegram[start..]
                .iter()
                .position(|&b| b == b'!')
                .map(|offset| start + offset)
                .context("telegram has no '!' end marker")?;
            let framed = &telegram[start..=end];
            println!("{}", pretty_hex(framed));
            println!("{:04X}", checksum(framed));
        }
        Commands::Request {
            profile,
            cluster,
            endpoint,
            payload,
        } => {
            let payload = decode_hex(&payload)?;
            let store = meter_attribute_store(&config.device)?;
            let mut engine = CommandEngine::new(meter_endpoints());
            let frame = InboundFrame {
                sender: 0,
                sender_nwk: 0,
                source_endpoint: endpoint,
                destination_endpoint: endpoint,
                cluster,
                profile,
                payload: Bytes::from(payload),
            };
            match engine.handle(&frame, &store)? {
                Some(reply) => println!(
                    "cluster 0x{:04X} ep{}->ep{}: {}",
                    reply.cluster,
                    reply.source_endpoint,
                    reply.destination_endpoint,
                    encode_hex_upper(&reply.payload)
                ),
                None => println!("no reply"),
            }
        }
        Commands::Run { port, baudrate } => {
            let mut config = config;
            if let Some(port) = port {
                config.serial.port = port;
            }
            if let Some(baudrate) = baudrate {
                config.serial.baudrate = baudrate;
            }
            let mut bridge = P1Bridge::new(&config)?;
            let mut source = P1SerialPort::open(&config.serial)?;
            let mut transport = LogTransport::new();
            log_info(&format!("Reading telegrams from {}", config.serial.port));

            // No radio attached: keep the inbound side open but silent.
            let (_inbound_tx, inbound_rx) = tokio::sync::mpsc::channel(16);
            bridge
                .run(&mut source, &mut transport, inbound_rx, config.cycle_time())
                .await;
        }
    }

    Ok(())
}
