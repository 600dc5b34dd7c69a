pub mod pairs;
pub mod position;

use std::collections::BTreeMap;

use lotto_db::models::{NumberStat, PairStat, PositionStat, RecordSet};

use self::pairs::pair_frequencies;
use self::position::position_modes;

/// Les trois tables statistiques calculées sur un ensemble de tirages.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub positions: Vec<PositionStat>,
    pub numbers: Vec<NumberStat>,
    pub pairs: Vec<PairStat>,
}

pub fn aggregate(records: &RecordSet) -> Aggregate {
    if records.is_empty() {
        log::warn!("Aucun tirage : statistiques vides");
    }
    let aggregate = Aggregate {
        positions: position_modes(records),
        numbers: number_frequencies(records),
        pairs: pair_frequencies(records),
    };
    log::debug!(
        "{} tirages, {} numéros distincts, {} paires",
        records.len(),
        aggregate.numbers.len(),
        aggregate.pairs.len()
    );
    aggregate
}

/// Occurrences de chaque numéro toutes positions confondues, par numéro croissant.
pub fn number_frequencies(records: &RecordSet) -> Vec<NumberStat> {
    let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
    for record in records {
        for &n in &record.numbers {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .map(|(number, count)| NumberStat { number, count })
        .collect()
}
