use std::collections::HashSet;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Nombre de boules par tirage (colonnes de position 1 à 6).
pub const NUMBERS_PER_DRAW: usize = 6;

/// Un tirage : numéro de tour optionnel et les 6 boules dans l'ordre des colonnes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawRecord {
    pub round: Option<u32>,
    pub numbers: [u8; NUMBERS_PER_DRAW],
}

impl DrawRecord {
    pub fn new(round: Option<u32>, numbers: [u8; NUMBERS_PER_DRAW]) -> Result<Self> {
        if let Some(pos) = numbers.iter().position(|&n| n == 0) {
            bail!("Boule nulle en position {} (les numéros sont strictement positifs)", pos + 1);
        }
        Ok(Self { round, numbers })
    }
}

/// Valeur brute d'une cellule annexe (date, bonus, gains...), réécrite telle quelle.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Numéro de série Excel.
    DateTime(f64),
}

/// Colonne d'un fichier de tirages, dans l'ordre de la ligne d'en-tête.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableColumn {
    Round,
    /// Position 0..6 dans le tirage.
    Number(usize),
    /// Colonne annexe, identifiée par son en-tête.
    Extra(String),
}

/// Cellules annexes d'une ligne, par nom de colonne.
pub type ExtraCells = Vec<(String, CellValue)>;

/// Tirages ordonnés, sans doublon exact (tour + 6 boules).
///
/// Les cellules annexes de chaque ligne et l'ordre des colonnes du fichier
/// d'origine accompagnent les tirages pour pouvoir réécrire le fichier complet.
/// Elles n'entrent pas dans l'identité d'un tirage.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<DrawRecord>,
    extras: Vec<ExtraCells>,
    columns: Vec<TableColumn>,
    seen: HashSet<DrawRecord>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(columns: Vec<TableColumn>) -> Self {
        Self {
            columns,
            ..Self::default()
        }
    }

    /// Construit l'ensemble en gardant la première occurrence de chaque doublon.
    pub fn from_records<I: IntoIterator<Item = DrawRecord>>(records: I) -> Self {
        let mut set = Self::new();
        set.extend(records);
        set
    }

    /// Ajoute un tirage. Renvoie `false` si un tirage identique est déjà présent.
    pub fn push(&mut self, record: DrawRecord) -> bool {
        self.push_row(record, ExtraCells::new())
    }

    /// Ajoute un tirage avec ses cellules annexes (ignorées si le tirage est un doublon).
    pub fn push_row(&mut self, record: DrawRecord, extras: ExtraCells) -> bool {
        if self.seen.contains(&record) {
            return false;
        }
        self.seen.insert(record.clone());
        self.records.push(record);
        self.extras.push(extras);
        true
    }

    /// Ajoute à la suite et renvoie le nombre de tirages réellement insérés.
    pub fn extend<I: IntoIterator<Item = DrawRecord>>(&mut self, records: I) -> usize {
        let mut added = 0;
        for record in records {
            if self.push(record) {
                added += 1;
            }
        }
        added
    }

    /// Ajoute les lignes de `other` avec leurs cellules annexes.
    ///
    /// L'ordre des colonnes de `self` est conservé ; les colonnes inconnues de
    /// `other` sont ajoutées à la fin.
    pub fn append(&mut self, other: RecordSet) -> usize {
        if self.columns.is_empty() {
            self.columns = other.columns;
        } else {
            for column in other.columns {
                if !self.columns.contains(&column) {
                    self.columns.push(column);
                }
            }
        }

        let mut added = 0;
        for (record, extras) in other.records.into_iter().zip(other.extras) {
            if self.push_row(record, extras) {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawRecord> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[DrawRecord] {
        &self.records
    }

    /// Tirages accompagnés de leurs cellules annexes.
    pub fn rows(&self) -> impl Iterator<Item = (&DrawRecord, &ExtraCells)> {
        self.records.iter().zip(self.extras.iter())
    }

    /// Colonnes du fichier d'origine ; vide pour un ensemble construit en mémoire.
    pub fn columns(&self) -> &[TableColumn] {
        &self.columns
    }

    pub fn has_rounds(&self) -> bool {
        self.records.iter().any(|r| r.round.is_some())
    }
}

impl PartialEq for RecordSet {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for RecordSet {}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a DrawRecord;
    type IntoIter = std::slice::Iter<'a, DrawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl IntoIterator for RecordSet {
    type Item = DrawRecord;
    type IntoIter = std::vec::IntoIter<DrawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionStat {
    pub position: u8,
    pub number: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberStat {
    pub number: u8,
    pub count: u32,
}

/// Paire non ordonnée normalisée (`a < b`) et nombre de tirages où elle apparaît.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairStat {
    pub a: u8,
    pub b: u8,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub total_rounds: usize,
    pub position_stats: Vec<PositionStat>,
    pub number_stats: Vec<NumberStat>,
    pub pair_stats: Vec<PairStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryDocument {
    pub total_rounds: usize,
    pub history: Vec<DrawRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(round: u32, numbers: [u8; 6]) -> DrawRecord {
        DrawRecord::new(Some(round), numbers).unwrap()
    }

    #[test]
    fn test_draw_record_rejects_zero() {
        assert!(DrawRecord::new(Some(1), [1, 2, 0, 4, 5, 6]).is_err());
        assert!(DrawRecord::new(None, [1, 2, 3, 4, 5, 6]).is_ok());
    }

    #[test]
    fn test_record_set_dedup_keeps_first() {
        let set = RecordSet::from_records(vec![
            draw(1, [1, 2, 3, 4, 5, 6]),
            draw(2, [7, 8, 9, 10, 11, 12]),
            draw(1, [1, 2, 3, 4, 5, 6]),
        ]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].round, Some(1));
        assert_eq!(set.as_slice()[1].round, Some(2));
    }

    #[test]
    fn test_record_set_round_is_part_of_identity() {
        let mut set = RecordSet::new();
        assert!(set.push(draw(1, [1, 2, 3, 4, 5, 6])));
        assert!(set.push(draw(2, [1, 2, 3, 4, 5, 6])));
        assert!(!set.push(draw(2, [1, 2, 3, 4, 5, 6])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_record_set_extend_counts_inserted() {
        let mut set = RecordSet::from_records(vec![draw(1, [1, 2, 3, 4, 5, 6])]);
        let added = set.extend(vec![
            draw(1, [1, 2, 3, 4, 5, 6]),
            draw(2, [1, 2, 3, 4, 5, 7]),
        ]);
        assert_eq!(added, 1);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_append_carries_extras_and_columns() {
        let mut base = RecordSet::with_columns(vec![
            TableColumn::Round,
            TableColumn::Extra("추첨일".to_string()),
        ]);
        base.push_row(
            draw(1, [1, 2, 3, 4, 5, 6]),
            vec![("추첨일".to_string(), CellValue::Text("2002-12-07".to_string()))],
        );

        let mut incoming = RecordSet::with_columns(vec![
            TableColumn::Round,
            TableColumn::Extra("보너스".to_string()),
        ]);
        incoming.push_row(
            draw(1, [1, 2, 3, 4, 5, 6]),
            vec![("보너스".to_string(), CellValue::Number(16.0))],
        );
        incoming.push_row(
            draw(2, [9, 13, 21, 25, 32, 42]),
            vec![("보너스".to_string(), CellValue::Number(2.0))],
        );

        assert_eq!(base.append(incoming), 1);
        assert_eq!(
            base.columns(),
            &[
                TableColumn::Round,
                TableColumn::Extra("추첨일".to_string()),
                TableColumn::Extra("보너스".to_string()),
            ]
        );
        let rows: Vec<_> = base.rows().collect();
        // Le doublon garde les cellules de la première occurrence.
        assert_eq!(rows[0].1[0].1, CellValue::Text("2002-12-07".to_string()));
        assert_eq!(rows[1].1[0], ("보너스".to_string(), CellValue::Number(2.0)));
    }

    #[test]
    fn test_history_round_serializes_as_null() {
        let record = DrawRecord::new(None, [1, 2, 3, 4, 5, 6]).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"round":null,"numbers":[1,2,3,4,5,6]}"#);
    }
}
