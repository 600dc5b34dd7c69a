use anyhow::{Result, bail};

use lotto_db::models::RecordSet;
use lotto_db::sink::FileJsonSink;
use lotto_db::table::{SpreadsheetSource, TableSource};

use crate::analysis::{Aggregate, aggregate};
use crate::config::PipelineConfig;
use crate::export::export;
use crate::merge::{MergeResult, absorb};

pub struct PipelineReport {
    pub merge: MergeResult,
    pub aggregate: Aggregate,
}

fn sources(config: &PipelineConfig) -> (SpreadsheetSource, SpreadsheetSource) {
    (
        SpreadsheetSource::new(&config.base, config.layout.clone()),
        SpreadsheetSource::new(&config.incoming, config.layout.clone()),
    )
}

/// Fusion → statistiques → export JSON.
pub fn run(config: &PipelineConfig) -> Result<PipelineReport> {
    log::debug!("Configuration : {:?}", config);
    let merge = merge_only(config)?;
    let aggregate = aggregate(&merge.records);
    export(
        &FileJsonSink,
        &merge.records,
        &aggregate,
        &config.stats_output,
        &config.history_output,
    )?;
    Ok(PipelineReport { merge, aggregate })
}

pub fn merge_only(config: &PipelineConfig) -> Result<MergeResult> {
    let (base, incoming) = sources(config);
    absorb(&base, &incoming)
}

/// Lecture seule de la base, sans fusion ni écriture.
pub fn load_base(config: &PipelineConfig) -> Result<RecordSet> {
    let (base, _) = sources(config);
    if !base.exists() {
        bail!("Fichier de base introuvable : {}", base.describe());
    }
    Ok(base.load()?.records)
}
