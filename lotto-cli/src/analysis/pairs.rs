use std::collections::HashMap;

use lotto_db::models::{PairStat, RecordSet};

/// Co-occurrences des 15 paires de chaque tirage, par fréquence décroissante
/// puis `(a, b)` croissant.
pub fn pair_frequencies(records: &RecordSet) -> Vec<PairStat> {
    let mut counts: HashMap<(u8, u8), u32> = HashMap::new();

    for record in records {
        let mut sorted = record.numbers;
        sorted.sort_unstable();
        // Un numéro répété dans un tirage ne forme pas de paire avec lui-même
        // et ne compte qu'une fois par tirage.
        let mut distinct = sorted.to_vec();
        distinct.dedup();

        for (i, &a) in distinct.iter().enumerate() {
            for &b in &distinct[i + 1..] {
                *counts.entry((a, b)).or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<PairStat> = counts
        .into_iter()
        .map(|((a, b), count)| PairStat { a, b, count })
        .collect();
    pairs.sort_by(|x, y| {
        y.count
            .cmp(&x.count)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    pairs
}
