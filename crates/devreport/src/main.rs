use std::path::PathBuf;

use clap::Parser;
use env_logger::Env;

#[cfg(target_os = "linux")]
mod console;
#[cfg(target_os = "linux")]
mod progress_bar;

#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
struct Opts {
    /// Verbose
    #[clap(short, long)]
    verbose: bool,

    /// Write the report here instead of `<vendor>_<product>_<revision>.xml`
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Seconds each pass-through command may take
    #[clap(short, long, default_value_t = 10)]
    timeout: u64,

    /// TEST UNIT READY attempts while a medium settles
    #[clap(long, default_value_t = 20)]
    ready_attempts: u32,

    /// Seconds between those attempts
    #[clap(long, default_value_t = 2)]
    ready_interval: u64,

    /// Device node, e.g. /dev/sg0
    device: PathBuf,
}

#[cfg(target_os = "linux")]
fn run(opts: &Opts) -> anyhow::Result<()> {
    use std::{
        fs::{self, File},
        io::Write,
        time::Duration,
    };

    use anyhow::Context;
    use devreport_core::{ReportOptions, detect, write_report, xml::XmlWriter};
    use devreport_scsi::{ScsiDevice, transport::SgTransport};

    use crate::{console::StdinConsole, progress_bar::ProgressBarReporter};

    let transport = SgTransport::open(&opts.device, Duration::from_secs(opts.timeout))
        .with_context(|| format!("could not open {}", opts.device.display()))?;
    let mut device = ScsiDevice::new(transport);

    let detected = detect::detect(&mut device)?;
    println!(
        "Found {:?} device: {} {} {}",
        detected.class,
        detected.vendor(),
        detected.product(),
        detected.revision()
    );

    let path = opts
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(detect::report_file_name(&detected)));
    // Fail on an unwritable destination before the operator sits through the probes.
    let mut file =
        File::create(&path).with_context(|| format!("could not create {}", path.display()))?;

    let options = ReportOptions {
        ready_attempts: opts.ready_attempts,
        ready_interval: Duration::from_secs(opts.ready_interval),
    };
    let mut xml = XmlWriter::new();
    if let Err(err) = write_report(
        &mut device,
        &detected,
        &mut xml,
        &mut StdinConsole::new(),
        &mut ProgressBarReporter::new(),
        &options,
    ) {
        drop(file);
        fs::remove_file(&path).ok();
        return Err(err.into());
    }

    file.write_all(xml.finish().as_bytes())?;
    println!("Report written to {}", path.display());
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn run(_opts: &Opts) -> anyhow::Result<()> {
    anyhow::bail!("SG_IO pass-through is only available on Linux")
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    let level = if opts.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    run(&opts)
}
