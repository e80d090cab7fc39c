use std::error::Error;

#[cfg(target_os = "linux")]
fn main() -> Result<(), Box<dyn Error>> {
    use std::time::Duration;

    use devreport_scsi::{
        ScsiDevice,
        commands::{inquiry::InquiryData, read_capacity::ReadCapacity10Data},
        transport::SgTransport,
    };

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: inquiry /dev/sgN");
        return Ok(());
    };

    let transport = SgTransport::open(&path, Duration::from_secs(10))?;
    let mut dev = ScsiDevice::new(transport);

    let inquiry_data = InquiryData::parse(&dev.inquiry()?)?;
    println!(
        "Inquiry:\n    product: '{}'\n    vendor: '{}'\n    revision: '{}'\n    type: {:?}",
        inquiry_data.product(),
        inquiry_data.vendor(),
        inquiry_data.revision(),
        inquiry_data.device_type(),
    );

    let read_capacity_data = match dev.read_capacity10() {
        Ok(buf) => ReadCapacity10Data::parse(&buf)?,
        Err(err) => {
            match err.sense_info() {
                Some(sense) => println!("\nREAD CAPACITY failed: {sense}"),
                None => println!("\nREAD CAPACITY failed: {err}"),
            }
            return Ok(());
        }
    };

    println!(
        "\nCapacity: {} bytes, block size: {} bytes",
        read_capacity_data.total_capacity_bytes(),
        read_capacity_data.block_length_bytes,
    );

    let block_buf = dev.read10(0, 1, read_capacity_data.block_length_bytes)?;

    println!("\nFirst {} bytes from device:", block_buf.len());
    for (i, byte) in block_buf.iter().enumerate() {
        if i % 16 == 0 {
            print!("\n{:04x}: ", i);
        }
        print!("{:02x} ", byte);
    }
    println!();

    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn main() -> Result<(), Box<dyn Error>> {
    eprintln!("SG_IO pass-through is only available on Linux.");
    Ok(())
}
