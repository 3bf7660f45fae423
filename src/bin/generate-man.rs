// Generates the pipetrack(1) man page from the clap definition

use clap::CommandFactory;
use clap_mangen::Man;
use pipetrack::cli::Cli;
use std::io::Write;

fn main() -> std::io::Result<()> {
    let cmd = Cli::command();
    let man = Man::new(cmd);

    let mut buffer: Vec<u8> = Vec::new();
    man.render(&mut buffer)?;

    let out_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "pipetrack.1".to_string());
    std::fs::File::create(&out_path)?.write_all(&buffer)?;
    eprintln!("Wrote {}", out_path);
    Ok(())
}
