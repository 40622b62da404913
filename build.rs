//! Build script rendering the `nscale-wait` manual pages.
//!
//! `nscale-wait.1` documents the `create`, `update`, `delete`, and `read`
//! waits together with the `--kind`, `--id`, `--operation-tag`, and polling
//! overrides. Each subcommand also gets its own `nscale-wait-<name>.1` page.
//! All pages are written to `OUT_DIR` with clap-mangen.

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn render(command: clap::Command, out_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file_name = format!("{}.1", command.get_name());
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    File::create(out_dir.join(file_name))?.write_all(&buffer)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir =
        PathBuf::from(env::var_os("OUT_DIR").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "OUT_DIR was not set")
        })?);

    let command = Cli::command();
    for subcommand in command.get_subcommands() {
        let page = subcommand
            .clone()
            .name(format!("{}-{}", command.get_name(), subcommand.get_name()));
        render(page, &out_dir)?;
    }
    render(command, &out_dir)?;

    Ok(())
}
