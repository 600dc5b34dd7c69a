use std::collections::BTreeMap;

use lotto_db::models::{NUMBERS_PER_DRAW, PositionStat, RecordSet};

/// Numéro le plus fréquent pour chacune des 6 positions (ordre des colonnes).
///
/// En cas d'égalité, le plus petit numéro l'emporte. Aucun résultat si `records` est vide.
pub fn position_modes(records: &RecordSet) -> Vec<PositionStat> {
    if records.is_empty() {
        return Vec::new();
    }

    (0..NUMBERS_PER_DRAW)
        .filter_map(|pos| {
            let mut counts: BTreeMap<u8, u32> = BTreeMap::new();
            for record in records {
                *counts.entry(record.numbers[pos]).or_insert(0) += 1;
            }

            // Parcours croissant + comparaison stricte : le plus petit numéro garde l'égalité.
            let mut best: Option<(u8, u32)> = None;
            for (number, count) in counts {
                if best.is_none_or(|(_, c)| count > c) {
                    best = Some((number, count));
                }
            }

            best.map(|(number, count)| PositionStat {
                position: (pos + 1) as u8,
                number,
                count,
            })
        })
        .collect()
}
