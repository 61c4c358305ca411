//! Command-line surface (§6.1, §4.6 ambient). Builds the immutable [`Config`]
//! and the list of input files from `std::env::args`, using `clap`'s builder
//! API to match the rest of this codebase's CLI tools.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Arg, ArgAction, Command};

use crate::bucket::BucketRule;
use crate::config::{self, Config};

pub struct Invocation {
    pub config: Config,
    pub files: Vec<PathBuf>,
}

/// Parses `argv`. Returns `Err(code)` when argument parsing itself fails or
/// (§7 level 3) no input file was given; the caller should exit with that
/// code without doing any further work.
pub fn parse(args: impl Iterator<Item = String>) -> Result<Invocation, ExitCode> {
    let matches = command().try_get_matches_from(args).unwrap_or_else(|e| {
        e.exit();
    });

    let ignore = matches
        .get_one::<String>("ignore")
        .map(|s| config::parse_class_list(s))
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("dwlocstat: {e}");
            std::process::exit(1);
        })
        .unwrap_or_default();

    let dump = matches
        .get_one::<String>("dump")
        .map(|s| config::parse_class_list(s))
        .transpose()
        .unwrap_or_else(|e| {
            eprintln!("dwlocstat: {e}");
            std::process::exit(1);
        })
        .unwrap_or_default();

    let tabulate = matches
        .get_one::<String>("tabulate")
        .map(|s| BucketRule::parse(s))
        .unwrap_or_default();

    let config = Config {
        ignore,
        dump,
        tabulate,
        show_progress: matches.get_flag("show-progress"),
        ignore_implicit_pointer: matches.get_flag("ignore-implicit-pointer"),
    };

    let files: Vec<PathBuf> = matches
        .get_many::<String>("files")
        .map(|vs| vs.map(PathBuf::from).collect())
        .unwrap_or_default();

    if files.is_empty() {
        // §7 level 3: no input filename is a fatal program error.
        let _ = command().print_help();
        println!();
        return Err(ExitCode::FAILURE);
    }

    Ok(Invocation { config, files })
}

fn command() -> Command {
    Command::new("dwlocstat")
        .about("Reports DWARF variable/parameter location coverage as a percentage histogram")
        .arg(
            Arg::new("ignore")
                .long("ignore")
                .value_name("CLASS[,...]")
                .help("Skip DIEs tagged with any of the listed classes"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .value_name("CLASS[,...]")
                .help("Print the ancestor chain of DIEs tagged with any listed class"),
        )
        .arg(
            Arg::new("tabulate")
                .long("tabulate")
                .value_name("START[:STEP][,...]")
                .default_value("10:10")
                .help("Histogram bucket rule"),
        )
        .arg(
            Arg::new("show-progress")
                .long("show-progress")
                .short('p')
                .action(ArgAction::SetTrue)
                .help("Emit per-CU progress on stdout"),
        )
        .arg(
            Arg::new("ignore-implicit-pointer")
                .long("ignore-implicit-pointer")
                .action(ArgAction::SetTrue)
                .help("Don't follow DW_OP_GNU_implicit_pointer references into their target DIE"),
        )
        .arg(
            Arg::new("files")
                .value_name("FILE")
                .action(ArgAction::Append)
                .num_args(0..),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> impl Iterator<Item = String> + use<'_> {
        std::iter::once("dwlocstat".to_string()).chain(s.split_whitespace().map(String::from))
    }

    #[test]
    fn no_files_is_fatal() {
        assert!(parse(args("")).is_err());
    }

    #[test]
    fn parses_files_and_flags() {
        let invocation = parse(args("--ignore=artificial -p a.o b.o")).unwrap();
        assert_eq!(invocation.files.len(), 2);
        assert!(invocation.config.show_progress);
        assert!(invocation.config.ignore.contains(config::Category::ARTIFICIAL));
    }
}
