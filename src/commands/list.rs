//! List commands implementation

use mercflash_core::chip::ChipModel;

use crate::programmers;

/// List all programmers compiled into this build
pub fn list_programmers() {
    println!("{}", programmers::programmer_help());
    for p in programmers::available_programmers() {
        if !p.aliases.is_empty() {
            println!("  {} is also known as: {}", p.name, p.aliases.join(", "));
        }
    }
}

/// List all supported flash chips
pub fn list_chips() {
    println!("Supported flash chips:");
    println!();
    println!("{:<12} {:>10} {:>8} {:>8} {:>6}", "Name", "Size", "Pages", "Sectors", "ID");
    println!("{}", "-".repeat(48));

    for chip in ChipModel::ALL {
        println!(
            "{:<12} {:>10} {:>8} {:>8} {:>6}",
            chip.name(),
            format_size(chip.total_size()),
            chip.page_count(),
            chip.sector_count(),
            format!("{:04X}", chip.device_id())
        );
    }
}

fn format_size(bytes: u32) -> String {
    if bytes >= 1024 * 1024 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
