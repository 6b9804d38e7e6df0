//! Library to backup directories, databases and remote servers.
//!
//! The actual data is moved by well-known command line tools (`tar`,
//! `mysqldump`, `pg_dumpall`, `mongodump`, `rsync`). This library decides
//! which command to run for every configured target, isolates failures of
//! single targets and collects an [`Outcome`](report::Outcome) for each of them.
//!
//! - [`target`]: Typed and validated backup targets.
//! - [`backends`]: Command builders for databases and servers.
//! - [`archive`]: Compression of directories and dump files.
//! - [`orchestrator`]: The run loop over all targets.
//! - [`report`]: Outcome records and their human readable form.

#![forbid(unsafe_code)]

pub mod archive;
pub mod backends;
pub mod cli;
pub mod config;
pub mod exec;
pub mod orchestrator;
pub mod report;
pub mod target;
