//! Man page generator for mercflash
//!
//! Writes `mercflash.1` plus one `mercflash-<command>.1` page per
//! subcommand into the given directory (default: `man`).

use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;
#[allow(dead_code)]
#[path = "../programmers.rs"]
mod programmers;

/// Render the top-level page and one page per visible subcommand
fn render_pages(mut cmd: clap::Command) -> std::io::Result<Vec<(String, Vec<u8>)>> {
    // Propagates global arguments into the subcommands
    cmd.build();
    let name = cmd.get_name().to_string();
    let mut pages = Vec::new();

    for sub in cmd
        .get_subcommands()
        .filter(|s| !s.is_hide_set() && s.get_name() != "help")
    {
        let page_name = format!("{}-{}", name, sub.get_name());
        let mut buffer = Vec::new();
        clap_mangen::Man::new(sub.clone().name(page_name.clone())).render(&mut buffer)?;
        pages.push((format!("{}.1", page_name), buffer));
    }

    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    pages.insert(0, (format!("{}.1", name), buffer));
    Ok(pages)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    for (file, contents) in render_pages(cli::Cli::command())? {
        let path = output_dir.join(file);
        fs::write(&path, contents)?;
        println!("{}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pages_cover_every_subcommand() {
        let pages = render_pages(cli::Cli::command()).unwrap();
        let names: Vec<&str> = pages.iter().map(|(n, _)| n.as_str()).collect();
        for expected in [
            "mercflash.1",
            "mercflash-probe.1",
            "mercflash-erase.1",
            "mercflash-program.1",
            "mercflash-list-programmers.1",
            "mercflash-list-chips.1",
        ] {
            assert!(names.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_program_page_documents_poll_budget() {
        let pages = render_pages(cli::Cli::command()).unwrap();
        let (_, program) = pages
            .iter()
            .find(|(n, _)| n == "mercflash-program.1")
            .unwrap();
        let text = String::from_utf8_lossy(program);
        assert!(text.contains("poll\\-budget") || text.contains("poll-budget"));
    }
}
