use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser as _;

use wirekit_json::Value;
use wirekit_uri::Uri;

#[derive(clap::Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compress stdin to a raw DEFLATE stream on stdout.
    Deflate,

    /// Decompress a raw DEFLATE stream from stdin to stdout.
    Inflate,

    /// Wrap stdin in a gzip member on stdout.
    Gzip,

    /// Unwrap a gzip member from stdin to stdout.
    Gunzip,

    /// Compress stdin to an LZW `.Z` stream on stdout.
    Compress {
        /// Maximum code width in bits (9-16).
        #[arg(short = 'b', default_value_t = 16)]
        max_bits: u32,
    },

    /// Decompress an LZW `.Z` stream from stdin to stdout.
    Uncompress,

    /// Apply an RFC 6902 patch document to a target document.
    JsonPatch { target: PathBuf, patch: PathBuf },

    /// Apply an RFC 7396 merge patch to a target document.
    JsonMerge { target: PathBuf, patch: PathBuf },

    /// Resolve a URI reference against a base URI.
    UriResolve {
        base: String,
        reference: String,

        /// Treat a reference scheme equal to the base's as undefined.
        #[arg(long)]
        non_strict: bool,
    },
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init()
        .context("Error initializing logging")?;

    let args = Args::try_parse().context("Error parsing command line arguments")?;

    match args.command {
        Command::Deflate => write_output(&wirekit_flate::deflate(&read_input()?)),
        Command::Inflate => {
            let output = wirekit_flate::inflate(&read_input()?)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error decoding deflate stream")?;
            write_output(&output)
        }
        Command::Gzip => write_output(&wirekit_flate::gzip::encode(&read_input()?)),
        Command::Gunzip => {
            let output = wirekit_flate::gzip::decode(&read_input()?)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error decoding gzip member")?;
            write_output(&output)
        }
        Command::Compress { max_bits } => {
            write_output(&wirekit_flate::lzw::encode(&read_input()?, max_bits, true))
        }
        Command::Uncompress => {
            let output = wirekit_flate::lzw::decode(&read_input()?)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error decoding .Z stream")?;
            write_output(&output)
        }
        Command::JsonPatch { target, patch } => {
            let target = read_json(&target)?;
            let patch = read_json(&patch)?;
            let result = wirekit_json::patch::apply(&target, &patch)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error applying patch")?;
            println!("{result}");
            Ok(())
        }
        Command::JsonMerge { target, patch } => {
            let target = read_json(&target)?;
            let patch = read_json(&patch)?;
            println!("{}", wirekit_json::merge_patch(&target, &patch));
            Ok(())
        }
        Command::UriResolve { base, reference, non_strict } => {
            let base = Uri::parse(&base)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error parsing base URI")?;
            let reference = Uri::parse_reference(&reference)
                .map_err(|err| anyhow::anyhow!("{err:?}"))
                .context("Error parsing URI reference")?;
            println!("{}", base.resolve(&reference, !non_strict));
            Ok(())
        }
    }
}

fn read_input() -> Result<Vec<u8>, anyhow::Error> {
    let mut input = Vec::new();
    io::stdin().read_to_end(&mut input).context("Error reading stdin")?;
    Ok(input)
}

fn write_output(output: &[u8]) -> Result<(), anyhow::Error> {
    io::stdout().write_all(output).context("Error writing stdout")
}

fn read_json(path: &PathBuf) -> Result<Value, anyhow::Error> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Error reading {}", path.display()))?;
    Value::parse(&text)
        .map_err(|err| anyhow::anyhow!("{err:?}"))
        .with_context(|| format!("Error parsing {}", path.display()))
}
