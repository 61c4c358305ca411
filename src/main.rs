//! `dwlocstat`: reports how much of each DWARF variable's and formal
//! parameter's scope is covered by a location description (§1).

mod bucket;
mod byteview;
mod classify;
mod cli;
mod config;
mod coverage;
mod die_iter;
mod error;
mod names;
mod object;
mod report;
mod run;
mod tally;

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;

fn main() -> ExitCode {
    let invocation = match cli::parse(std::env::args()) {
        Ok(invocation) => invocation,
        Err(code) => return code,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let multiple = invocation.files.len() > 1;

    for (index, path) in invocation.files.iter().enumerate() {
        if multiple {
            if index > 0 {
                let _ = writeln!(out);
            }
            let _ = writeln!(out, "{}:", path.display());
        }

        let outcome = run::process_file(path, &invocation.config, &mut out)
            .with_context(|| format!("processing {}", path.display()));

        if let Err(e) = outcome {
            // §7 level 2: log and move on to the next file.
            eprintln!("dwlocstat: {e:?}");
        }
    }

    ExitCode::SUCCESS
}
