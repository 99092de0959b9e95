// Record reconciliation pipeline: parse, resolve, join, assemble

pub mod assembler;
pub mod joiner;
pub mod parser;
pub mod resolver;

use std::path::PathBuf;

use tracing::info;

use crate::clock::{file_stamp, Clock};
use crate::config::Config;
use crate::error::Result;
use crate::storage;

/// Counts and artifacts from one completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_records: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub written: Vec<PathBuf>,
}

/// Sequences the four stages in fixed order. Owns no business logic: any
/// fatal error propagates out before a single artifact is written, so a
/// failed run leaves nothing behind.
pub struct Pipeline<'a> {
    config: &'a Config,
    clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config, clock: &'a dyn Clock) -> Self {
        Self { config, clock }
    }

    pub fn run(&self) -> Result<RunSummary> {
        let sources = parser::parse_sources(&self.config.sources)?;

        let mut records = sources.placements;
        let total_records = records.len();
        resolver::resolve_references(&mut records, &sources.groups, &sources.units);

        let results = joiner::join_registry(records, &sources.registry);

        let matched_dataset = assembler::assemble(&results.matched);
        let unmatched_dataset = assembler::assemble(&results.unmatched);

        // Stage every artifact first and rename them into place together, so
        // a failure mid-write leaves no half-written artifact pair behind.
        let stamp = file_stamp(self.clock.today());
        let dir = &self.config.output.directory;
        let mut staged = Vec::new();
        for format in &self.config.output.formats {
            let outputs = [
                (&matched_dataset, format!("oppilastiedot_{stamp}")),
                (&unmatched_dataset, format!("puuttuvat_oppilastiedot_{stamp}")),
            ];
            for (dataset, stem) in outputs {
                match storage::stage_dataset(format, dataset, dir, &stem) {
                    Ok(Some(artifact)) => staged.push(artifact),
                    Ok(None) => {}
                    Err(e) => {
                        storage::discard_staged(&staged);
                        return Err(e);
                    }
                }
            }
        }
        let written = storage::commit_staged(staged)?;

        info!(
            total = total_records,
            matched = results.matched.len(),
            unmatched = results.unmatched.len(),
            artifacts = written.len(),
            "pipeline run complete"
        );

        Ok(RunSummary {
            total_records,
            matched: results.matched.len(),
            unmatched: results.unmatched.len(),
            written,
        })
    }
}
