//! Printing RPKI manifests.

use std::fs;
use std::path::{Path, PathBuf};
use bytes::Bytes;
use clap::Parser;
use log::error;
use rpki_inspect::error::ObjectError;
use rpki_inspect::logging;
use rpki_inspect::manifest::Manifest;
use rpki_inspect::report::{report, report_signer_info};
use rpki_inspect::sigobj::SignedObject;
use rpki_inspect::x509::Time;


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
#[command(name = "printmft", about = "Prints RPKI manifests.")]
struct Args {
    /// Also print the complete signed object.
    #[arg(short = 'c')]
    print_cms: bool,

    /// The manifest files to print.
    #[arg(value_name = "MANIFEST", required = true)]
    manifests: Vec<PathBuf>,

    /// Decode objects using DER rather than BER.
    #[arg(long)]
    strict: bool,

    /// Log debug messages.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Prints all manifests.
    ///
    /// Fails if any of them failed but tries every one first.
    fn run(&self) -> Result<(), ()> {
        let now = Time::now();
        let mut res = Ok(());
        for path in &self.manifests {
            if let Err(err) = self.print_manifest(path, now) {
                error!("{}: {}", path.display(), err);
                res = Err(())
            }
        }
        res
    }

    fn print_manifest(
        &self, path: &Path, now: Time
    ) -> Result<(), ObjectError> {
        let data = fs::read(path)?;
        let signed = SignedObject::decode(Bytes::from(data), self.strict)
            .map_err(ObjectError::Envelope)?;
        print!("{}", report_signer_info(&signed));

        let content = Manifest::decode_content(&signed, self.strict)?;
        print!("{}", report(signed.content_type(), &content, now));

        if self.print_cms {
            println!();
            print!("{}", signed.dump());
        }
        Ok(())
    }
}
