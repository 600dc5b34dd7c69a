use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::path::Path;

use crate::analysis::Aggregate;
use crate::merge::MergeResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_merge_summary(result: &MergeResult) {
    match result.incoming_rows {
        Some(incoming) => {
            println!("📌 Fichier d'ajout fusionné :");
            println!(
                "  Tirages de base   : {} ({} lignes lues)",
                result.base_count, result.base_rows
            );
            println!("  Tirages ajoutés   : {} / {} lignes", result.added, incoming);
            println!("  Doublons ignorés  : {}", result.duplicates);
        }
        None => println!("Aucun fichier d'ajout, base utilisée telle quelle."),
    }
}

pub fn display_stats(aggregate: &Aggregate, total_rounds: usize, top: usize) {
    println!("\n📊 Statistiques sur {} tirages\n", total_rounds);

    if aggregate.positions.is_empty() {
        println!("Aucun tirage à analyser.");
        return;
    }

    println!("── Numéro le plus fréquent par position ──");
    let mut table = new_table(vec!["Position", "Numéro", "Sorties"]);
    for stat in &aggregate.positions {
        table.add_row(vec![
            stat.position.to_string(),
            format!("{:2}", stat.number),
            stat.count.to_string(),
        ]);
    }
    println!("{table}");

    println!("\n── Top {} numéros ──", top);
    let mut sorted = aggregate.numbers.clone();
    sorted.sort_by(|a, b| b.count.cmp(&a.count).then(a.number.cmp(&b.number)));
    let mut table = new_table(vec!["Numéro", "Sorties"]);
    for stat in sorted.iter().take(top) {
        table.add_row(vec![format!("{:2}", stat.number), stat.count.to_string()]);
    }
    println!("{table}");

    println!("\n── Top {} paires ──", top);
    let mut table = new_table(vec!["Paire", "Tirages communs"]);
    for pair in aggregate.pairs.iter().take(top) {
        table.add_row(vec![
            format!("{:2} - {:2}", pair.a, pair.b),
            pair.count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_completion(total_rounds: usize, stats_path: &Path, history_path: &Path) {
    println!("\n✅ Traitement terminé");
    println!("- Nombre total de tirages : {}", total_rounds);
    println!("👉 {} généré", stats_path.display());
    println!("👉 {} généré", history_path.display());
}
