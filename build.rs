//! Build script that renders the `pdctl` man page into the build output
//! directory via clap-mangen.

use std::env;
use std::fs;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

use cli::Cli;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or("OUT_DIR was not set")?;

    let mut rendered = Vec::new();
    Man::new(Cli::command()).render(&mut rendered)?;
    fs::write(out_dir.join("pdctl.1"), rendered)?;

    Ok(())
}
