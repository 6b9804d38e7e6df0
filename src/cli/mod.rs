use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use crate::archive::Compression;
use crate::target::TargetClass;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file, created with defaults if it doesn't exist.
    #[arg(long, short = 'c', env = "MBACKUP_CONFIG", default_value = "/etc/mbackup/config.toml")]
    pub config: PathBuf,

    /// Verbosity of the command output.
    #[arg(long)]
    pub verbose: Option<LevelFilter>,

    /// Only backup targets of these classes. (Default: all)
    #[arg(long = "class", value_enum)]
    pub classes: Vec<TargetClass>,

    /// Number of targets of a class backed up at the same time.
    #[arg(long, short = 'j', value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Compression of archives and dumps, overrides the configuration file.
    #[arg(long, value_enum)]
    pub compression: Option<Compression>,

    /// Simulative backup run, commands are only logged.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON summary of the run to this file.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Cli {
    /// The selected classes, all of them if none are given.
    pub fn selected_classes(&self) -> Vec<TargetClass> {
        if self.classes.is_empty() {
            TargetClass::ALL.to_vec()
        } else {
            self.classes.clone()
        }
    }
}
