//! huffstream CLI - streaming Huffman compression tool
//!
//! Reads from a file or stdin and writes to a file or stdout, so it can sit
//! in a pipeline. Input of any size is handled in bounded memory.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};

use huffstream::{Decoder, DecoderConfig, Encoder, EncoderConfig, ReplayBacking};

/// Compress and decompress byte streams with static Huffman coding.
#[derive(Parser, Debug)]
#[command(name = "huffstream")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print sizes and timing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compress INPUT (or stdin) into OUTPUT (or stdout)
    Encode {
        #[command(flatten)]
        files: IoArgs,

        /// Directory for the temporary replay file
        #[arg(long, value_name = "DIR")]
        temp_dir: Option<PathBuf>,

        /// Hold up to this many input bytes in memory before spilling to disk
        #[arg(long, value_name = "BYTES", conflicts_with = "temp_dir")]
        spool: Option<usize>,
    },
    /// Decompress INPUT (or stdin) into OUTPUT (or stdout)
    Decode {
        #[command(flatten)]
        files: IoArgs,
    },
}

#[derive(clap::Args, Debug)]
struct IoArgs {
    /// Input file; stdin when omitted
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Read and write chunk size in bytes
    #[arg(
        long,
        default_value = "65536",
        value_parser = clap::value_parser!(u64).range(1..=(1 << 30))
    )]
    chunk_size: u64,
}

fn open_input(path: &Option<PathBuf>) -> io::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => Box::new(BufReader::new(File::open(p)?)),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: &Option<PathBuf>) -> io::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::new(File::create(p)?)),
        None => Box::new(io::stdout().lock()),
    })
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();
    match args.command {
        Command::Encode {
            files,
            temp_dir,
            spool,
        } => {
            let replay = match spool {
                Some(threshold) => ReplayBacking::Spooled { threshold },
                None => ReplayBacking::TempFile { dir: temp_dir },
            };
            let config = EncoderConfig::default()
                .with_chunk_size(files.chunk_size as usize)
                .with_replay(replay);
            let encoder = Encoder::new(config)?;
            let stats = encoder.encode(open_input(&files.input)?, open_output(&files.output)?)?;
            if args.verbose {
                eprintln!("Encoded: {:?}", files.input.as_deref().unwrap_or("-".as_ref()));
                eprintln!("  Input: {} bytes", stats.input_bytes);
                eprintln!("  Distinct symbols: {}", stats.distinct_symbols);
                eprintln!(
                    "  Output: {} bytes ({} header + {} payload)",
                    stats.output_bytes(),
                    stats.header_bytes,
                    stats.payload_bytes
                );
                eprintln!("  Padding bits: {}", stats.padding_bits);
                eprintln!("  Ratio: {:.3}", stats.ratio());
            }
        }
        Command::Decode { files } => {
            let config = DecoderConfig::default().with_buffer_size(files.chunk_size as usize);
            let decoder = Decoder::new(config)?;
            let stats = decoder.decode(open_input(&files.input)?, open_output(&files.output)?)?;
            if args.verbose {
                eprintln!("Decoded: {:?}", files.input.as_deref().unwrap_or("-".as_ref()));
                eprintln!(
                    "  Input: {} bytes ({} header + {} payload)",
                    stats.header_bytes + stats.payload_bytes,
                    stats.header_bytes,
                    stats.payload_bytes
                );
                eprintln!("  Output: {} bytes", stats.output_bytes);
            }
        }
    }
    if args.verbose {
        eprintln!("  Time: {:.2?}", start.elapsed());
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("huffstream: {e}");
            ExitCode::FAILURE
        }
    }
}
