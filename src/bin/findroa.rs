//! Finding the ROAs in a repository tree that cover prefixes.

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use clap::Parser;
use log::error;
use rpki_inspect::error::ArgumentError;
use rpki_inspect::logging;
use rpki_inspect::prefix::Prefix;
use rpki_inspect::walk::{walk, WalkOptions};


//------------ main ----------------------------------------------------------

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 })
        }
    };
    logging::init(args.verbose);
    if let Err(()) = args.run() {
        std::process::exit(1)
    }
}


//------------ Args ----------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "findroa",
    about = "Finds the ROAs in a repository tree that cover prefixes."
)]
struct Args {
    /// The directory to search for ROAs.
    #[arg(value_name = "AUTHTREE")]
    directory: PathBuf,

    /// The prefixes to look for, as address or address/length.
    #[arg(value_name = "PREFIX", required = true)]
    prefixes: Vec<String>,

    /// Decode objects using DER rather than BER.
    #[arg(long)]
    strict: bool,

    /// Log every file visited.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn run(self) -> Result<(), ()> {
        let prefixes = self.parse_prefixes()?;
        let options = WalkOptions {
            strict: self.strict,
            .. Default::default()
        };
        let stdout = io::stdout();
        let mut target = stdout.lock();
        for prefix in &prefixes {
            if let Err(err) = walk(
                &self.directory, prefix, &options, &mut target
            ) {
                error!("Directory walk failed: {}", err);
                return Err(())
            }
        }
        Ok(())
    }

    /// Parses all prefixes before anything is searched.
    fn parse_prefixes(&self) -> Result<Vec<Prefix>, ()> {
        self.prefixes.iter().map(|arg| {
            Prefix::from_str(arg).map_err(|err| {
                error!("{}", ArgumentError::new(arg.as_str(), err));
            })
        }).collect()
    }
}
