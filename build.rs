#[path = "src/cli.rs"]
mod cli;

use clap::{CommandFactory, ValueEnum};
use clap_complete::{generate_to, Shell};
use clap_complete_fig::Fig;
use cli::Cli;
use std::fs::{create_dir_all, write};
use std::io::Result;
use std::path::Path;

const BIN_NAME: &str = "runlog";

fn main() -> Result<()> {
    // Rerun only when the CLI definition or this script changes, never for the files written below
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli.rs");

    write_completions(Path::new("contrib/completions"))?;
    write_manpage(Path::new("man/man1"))
}

/// Write a completion script for every shell clap_complete knows about, plus Fig
fn write_completions(out_dir: &Path) -> Result<()> {
    create_dir_all(out_dir)?;
    let cmd = &mut Cli::command();
    for shell in Shell::value_variants() {
        generate_to(*shell, cmd, BIN_NAME, out_dir)?;
    }
    generate_to(Fig, cmd, BIN_NAME, out_dir)?;
    Ok(())
}

fn write_manpage(out_dir: &Path) -> Result<()> {
    create_dir_all(out_dir)?;
    let mut page = Vec::new();
    clap_mangen::Man::new(Cli::command().name(BIN_NAME)).render(&mut page)?;
    write(out_dir.join(format!("{BIN_NAME}.1")), page)
}
