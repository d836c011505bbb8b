//! Progress bars for programming runs

use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mercflash_core::chip::{ChipModel, EraseTarget};
use mercflash_core::flash::{ProgramProgress, ProgramStats};

/// Create a progress bar style with phase label
fn create_progress_bar_with_phase(
    total: u64,
    phase: &str,
) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{bytes}}/{{total_bytes}} ({{bytes_per_sec}}, {{eta}}) {}",
                phase
            ))?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

/// Bar counting erase commands rather than bytes
fn create_erase_bar(total: u64) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );
    Ok(pb)
}

fn create_spinner_style() -> Result<ProgressStyle, Box<dyn std::error::Error>> {
    Ok(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?)
}

/// Progress reporter using indicatif
pub struct IndicatifProgress {
    multi: MultiProgress,
    current_bar: Option<ProgressBar>,
    written: u64,
}

impl IndicatifProgress {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            current_bar: None,
            written: 0,
        }
    }

    fn create_spinner(&mut self, message: String) {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(create_spinner_style().unwrap_or_else(|_| ProgressStyle::default_spinner()));
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    pub fn finish(&mut self, message: &str) {
        if let Some(pb) = self.current_bar.take() {
            pb.finish_with_message(message.to_string());
        }
    }
}

impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndicatifProgress {
    fn drop(&mut self) {
        // A failed run leaves a bar behind
        if let Some(pb) = self.current_bar.take() {
            pb.abandon();
        }
    }
}

impl ProgramProgress for IndicatifProgress {
    fn identified(&mut self, chip: ChipModel) {
        println!("Found: {} ({} bytes)", chip, chip.total_size());
    }

    fn erasing(&mut self, commands: u32) {
        let pb = create_erase_bar(commands as u64).unwrap_or_else(|_| ProgressBar::new(commands as u64));
        let pb = self.multi.add(pb);
        pb.set_message("Erasing");
        pb.enable_steady_tick(Duration::from_millis(100));
        self.current_bar = Some(pb);
    }

    fn erase_progress(&mut self, target: EraseTarget, done: u32) {
        if let Some(pb) = &self.current_bar {
            pb.set_position(done as u64);
            pb.set_message(format!("Erased {}", target));
        }
    }

    fn programming(&mut self, total_bytes: Option<usize>) {
        self.finish("Erase complete");
        self.written = 0;
        match total_bytes {
            Some(total) => {
                let pb = create_progress_bar_with_phase(total as u64, "Writing")
                    .unwrap_or_else(|_| ProgressBar::new(total as u64));
                self.current_bar = Some(self.multi.add(pb));
            }
            None => self.create_spinner("Writing...".to_string()),
        }
    }

    fn page_written(&mut self, page: u32, bytes: usize) {
        self.written += bytes as u64;
        if let Some(pb) = &self.current_bar {
            match pb.length() {
                Some(_) => pb.set_position(self.written),
                None => pb.set_message(format!("Wrote {} pages ({} bytes)", page + 1, self.written)),
            }
        }
    }

    fn complete(&mut self, stats: &ProgramStats) {
        self.finish("Write complete");
        println!(
            "Programmed {} bytes into {} pages of the {} ({} erase commands, {} status polls)",
            stats.image_bytes,
            stats.pages_written,
            stats.chip,
            stats.erase_commands,
            stats.status_polls
        );
    }
}
