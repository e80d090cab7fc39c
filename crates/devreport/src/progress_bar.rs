use std::io::Stdout;

use devreport_core::ProgressReporter;
use pbr::{ProgressBar, Units};

/// Draws the READ LONG size search on stdout.
pub struct ProgressBarReporter {
    pb: Option<ProgressBar<Stdout>>,
}

impl ProgressReporter for ProgressBarReporter {
    fn start(&mut self, total: usize) {
        let mut pb = ProgressBar::new(total as u64);
        pb.set_units(Units::Default);
        pb.message("Trying READ LONG sizes ");
        self.pb = Some(pb);
    }

    fn advance(&mut self, steps: usize) {
        if let Some(pb) = &mut self.pb {
            pb.add(steps as u64);
        }
    }

    fn finish(&mut self) {
        if let Some(mut pb) = self.pb.take() {
            pb.finish_println("");
        }
    }
}

impl ProgressBarReporter {
    pub fn new() -> Self {
        Self { pb: None }
    }
}

impl Default for ProgressBarReporter {
    fn default() -> Self {
        Self::new()
    }
}
