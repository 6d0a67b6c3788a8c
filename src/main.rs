#[macro_use]
extern crate log;

use clap::Parser;
use intcode::{Memory, Status, Vm};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intcode")]
#[command(about = "Run an Intcode program")]
struct Cli {
    /// Comma-separated program file
    program: PathBuf,
    /// Values for the input queue, consumed in order
    #[arg(allow_negative_numbers = true)]
    inputs: Vec<i64>,
    /// Patch memory before running (repeatable)
    #[arg(long = "set", value_name = "ADDR=VALUE", value_parser = parse_patch)]
    patches: Vec<(usize, i64)>,
    /// Print the final memory after the outputs
    #[arg(long)]
    dump_memory: bool,
}

fn parse_patch(s: &str) -> Result<(usize, i64), String> {
    let (addr, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VALUE, got {:?}", s))?;
    let addr = addr.trim().parse().map_err(|e| format!("invalid address {:?}: {}", addr, e))?;
    let value = value.trim().parse().map_err(|e| format!("invalid value {:?}: {}", value, e))?;
    Ok((addr, value))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let mut mem = Memory::load_file(&cli.program)?;
    debug!("Loaded {} words from {}", mem.len(), cli.program.display());
    for &(addr, value) in &cli.patches {
        mem.set(addr, value)?;
    }

    let mut vm = Vm::from_memory(mem, cli.inputs);
    let result = vm.run();
    for value in &result.output {
        println!("{}", value);
    }
    if cli.dump_memory {
        let words: Vec<String> = result.memory.iter().map(|n| n.to_string()).collect();
        println!("{}", words.join(","));
    }

    match result.status {
        Status::Halted => Ok(()),
        Status::Aborted(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patches() {
        assert_eq!(parse_patch("1=12"), Ok((1, 12)));
        assert_eq!(parse_patch(" 2 = -7"), Ok((2, -7)));
        assert!(parse_patch("12").is_err());
        assert!(parse_patch("-1=3").is_err());
        assert!(parse_patch("1=x").is_err());
    }

    #[test]
    fn patch_past_memory_limit() {
        let (addr, value) = parse_patch("99999999999=1").unwrap();
        let mut mem = Memory::from(vec![99]);
        assert!(mem.set(addr, value).is_err());
        assert_eq!(mem.as_slice(), &[99]);
    }

    #[test]
    fn cli_arguments() {
        let cli = Cli::try_parse_from(["intcode", "prog.txt", "5", "-3", "--set", "1=12", "--dump-memory"]).unwrap();
        assert_eq!(cli.program, PathBuf::from("prog.txt"));
        assert_eq!(cli.inputs, vec![5, -3]);
        assert_eq!(cli.patches, vec![(1, 12)]);
        assert!(cli.dump_memory);
    }
}
