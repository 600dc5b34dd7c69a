use anyhow::Result;
use std::path::Path;

use lotto_db::models::{HistoryDocument, RecordSet, StatsDocument};
use lotto_db::sink::JsonSink;

use crate::analysis::Aggregate;

pub fn build_documents(records: &RecordSet, aggregate: &Aggregate) -> (StatsDocument, HistoryDocument) {
    let stats = StatsDocument {
        total_rounds: records.len(),
        position_stats: aggregate.positions.clone(),
        number_stats: aggregate.numbers.clone(),
        pair_stats: aggregate.pairs.clone(),
    };
    let history = HistoryDocument {
        total_rounds: records.len(),
        history: records.iter().cloned().collect(),
    };
    (stats, history)
}

/// Construit et écrit les deux documents, chacun de façon indépendante.
pub fn export<S: JsonSink>(
    sink: &S,
    records: &RecordSet,
    aggregate: &Aggregate,
    stats_path: &Path,
    history_path: &Path,
) -> Result<(StatsDocument, HistoryDocument)> {
    let (stats, history) = build_documents(records, aggregate);
    sink.write_document(stats_path, &stats)?;
    sink.write_document(history_path, &history)?;
    Ok((stats, history))
}
