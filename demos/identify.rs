// Connection check
//
// Opens the scope, prints its identity and the calibration it reports.

use rigolscope_rs::AcquisitionSession;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "/dev/usbtmc0".to_string());

    println!("Rigol Scope Connection Check");
    println!("============================\n");

    let session = AcquisitionSession::start(&path)?;
    println!("Connected to {} at {}\n", session.identity(), path);

    let params = session.calibration();
    println!("CH1: {} V/div, offset {} V", params.channel1.scale, params.channel1.offset);
    println!("CH2: {} V/div, offset {} V", params.channel2.scale, params.channel2.offset);
    println!("Time: {} s/div, offset {} s", params.time.scale, params.time.offset);

    let (start, end) = session.time_axis().span();
    println!("\nTime axis: {:.6} s to {:.6} s", start, end);

    Ok(())
}
