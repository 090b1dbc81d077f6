// Live terminal view
//
// Polls both channels at a fixed cadence and prints the average and RMS of
// each frame, the way a plotting front end would update its legend.

use clap::Parser;
use polars::prelude::{CsvWriter, SerWriter};
use rigolscope_rs::{AcquisitionSession, Channel, SerialLink, Transport};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "live_view")]
#[command(version = "0.1")]
#[command(about = "Continuously read both channels of a Rigol DS1000 scope")]
struct Args {
    /// Device file (USBTMC) or serial port of the scope
    #[arg(default_value = "/dev/usbtmc0")]
    device: String,

    /// Talk over RS-232 at this baud rate instead of the USBTMC device file
    #[arg(long, help = "Use the serial port at the given baud rate")]
    baud: Option<u32>,

    /// Refresh interval in milliseconds
    #[arg(short, long, default_value_t = 200)]
    interval: u64,

    /// Number of frames to read, 0 for no limit
    #[arg(short, long, default_value_t = 50)]
    frames: u64,

    /// Re-read the scales and offsets every N frames, 0 to never refresh
    #[arg(short, long, default_value_t = 0)]
    refresh_every: u64,

    /// Write the last frame to this CSV file
    #[arg(long)]
    csv: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, help = "Show debug information and detailed logs")]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    #[cfg(feature = "cpu-profiling")]
    let _client = tracy_client::Client::start();

    let transport: Box<dyn Transport> = match args.baud {
        Some(baud) => Box::new(SerialLink::open(&args.device, baud, Duration::from_secs(2))?),
        None => Box::new(rigolscope_rs::DeviceFile::open(&args.device)?),
    };

    let mut session = AcquisitionSession::with_transport(transport)?;
    println!("✓ Connected to {}", session.identity());

    for channel in Channel::ALL {
        let (low, high) = session.calibration().channel(channel).display_range();
        println!("{}: {:.3} V to {:.3} V", channel, low, high);
    }
    println!("Press Ctrl+C to stop\n");

    let mut last_frame = None;
    let mut count = 0u64;

    while args.frames == 0 || count < args.frames {
        if args.refresh_every > 0 && count > 0 && count % args.refresh_every == 0 {
            session.refresh_calibration()?;
        }

        match session.acquire_frame() {
            Ok(frame) => {
                for channel in Channel::ALL {
                    let stats = frame.channel(channel).stats;
                    print!(
                        "Channel {}    Avg: {:.3}, RMS: {:.3}    ",
                        channel.number(),
                        stats.mean,
                        stats.rms
                    );
                }
                println!();
                last_frame = Some(frame);
            }
            // A bad frame is skipped, the next poll tries again
            Err(e) => eprintln!("Frame {} failed: {}", count, e),
        }

        count += 1;
        std::thread::sleep(Duration::from_millis(args.interval));
    }

    if let (Some(path), Some(frame)) = (args.csv, last_frame) {
        let mut df = frame.to_dataframe(session.time_axis())?;
        let mut file = std::fs::File::create(&path)?;
        CsvWriter::new(&mut file).finish(&mut df)?;
        println!("\nLast frame written to {}", path);
    }

    Ok(())
}
