use anyhow::{Result, bail};

use lotto_db::models::RecordSet;
use lotto_db::table::{LoadedTable, TableSource};

#[derive(Debug, Clone)]
pub struct MergeResult {
    pub records: RecordSet,
    /// Tirages distincts de la base.
    pub base_count: usize,
    /// Lignes lues dans la base, doublons internes compris.
    pub base_rows: usize,
    /// `None` quand aucun fichier d'ajout n'était présent.
    pub incoming_count: Option<usize>,
    pub incoming_rows: Option<usize>,
    pub added: usize,
    /// Lignes du fichier d'ajout non insérées.
    pub duplicates: usize,
}

/// Concatène `base` puis `incoming` en retirant les doublons exacts.
///
/// Les lignes lues sont comptées à partir des tirages distincts ; `absorb`
/// les remplace par les comptes bruts des fichiers.
pub fn merge(base: RecordSet, incoming: Option<RecordSet>) -> MergeResult {
    let base_count = base.len();
    let Some(incoming) = incoming else {
        return MergeResult {
            records: base,
            base_count,
            base_rows: base_count,
            incoming_count: None,
            incoming_rows: None,
            added: 0,
            duplicates: 0,
        };
    };

    let incoming_count = incoming.len();
    let mut records = base;
    let added = records.append(incoming);

    MergeResult {
        records,
        base_count,
        base_rows: base_count,
        incoming_count: Some(incoming_count),
        incoming_rows: Some(incoming_count),
        added,
        duplicates: incoming_count - added,
    }
}

/// Charge la base, absorbe le fichier d'ajout s'il existe, réécrit la base
/// puis supprime le fichier d'ajout.
pub fn absorb<B: TableSource, I: TableSource>(base: &B, incoming: &I) -> Result<MergeResult> {
    if !base.exists() {
        bail!("Fichier de base introuvable : {}", base.describe());
    }
    let LoadedTable {
        records: base_records,
        rows_read: base_rows,
    } = base.load()?;
    log::info!(
        "{} tirages chargés depuis {} ({} lignes)",
        base_records.len(),
        base.describe(),
        base_rows
    );

    let incoming_table = if incoming.exists() {
        log::info!("Fichier d'ajout trouvé : {} → fusion", incoming.describe());
        Some(incoming.load()?)
    } else {
        log::debug!("Pas de fichier d'ajout ({})", incoming.describe());
        None
    };
    let incoming_rows = incoming_table.as_ref().map(|t| t.rows_read);

    let mut result = merge(base_records, incoming_table.map(|t| t.records));
    result.base_rows = base_rows;
    if let Some(rows) = incoming_rows {
        result.incoming_rows = Some(rows);
        result.duplicates = rows - result.added;
    }

    if result.incoming_count.is_some() {
        base.replace(&result.records)?;
        incoming.remove()?;
        log::info!(
            "{} tirages ajoutés, {} doublons ignorés, {} supprimé",
            result.added,
            result.duplicates,
            incoming.describe()
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use lotto_db::models::DrawRecord;

    fn draw(round: u32, numbers: [u8; 6]) -> DrawRecord {
        DrawRecord::new(Some(round), numbers).unwrap()
    }

    fn set(records: &[DrawRecord]) -> RecordSet {
        RecordSet::from_records(records.iter().cloned())
    }

    struct MemorySource {
        name: &'static str,
        records: RefCell<Option<RecordSet>>,
        /// Lignes brutes renvoyées par `load`, doublons compris.
        rows: Vec<DrawRecord>,
        fail_replace: bool,
    }

    impl MemorySource {
        fn new(name: &'static str, records: Option<RecordSet>) -> Self {
            let rows = records.iter().flat_map(|r| r.iter().cloned()).collect();
            Self {
                name,
                records: RefCell::new(records),
                rows,
                fail_replace: false,
            }
        }

        fn with_rows(name: &'static str, rows: &[DrawRecord]) -> Self {
            Self {
                rows: rows.to_vec(),
                ..Self::new(name, Some(set(rows)))
            }
        }

        fn current(&self) -> Option<RecordSet> {
            self.records.borrow().clone()
        }
    }

    impl TableSource for MemorySource {
        fn describe(&self) -> String {
            self.name.to_string()
        }

        fn exists(&self) -> bool {
            self.records.borrow().is_some()
        }

        fn load(&self) -> Result<LoadedTable> {
            match self.current() {
                Some(records) => Ok(LoadedTable {
                    records,
                    rows_read: self.rows.len(),
                }),
                None => bail!("{} absent", self.name),
            }
        }

        fn replace(&self, records: &RecordSet) -> Result<()> {
            if self.fail_replace {
                bail!("disque plein");
            }
            *self.records.borrow_mut() = Some(records.clone());
            Ok(())
        }

        fn remove(&self) -> Result<()> {
            *self.records.borrow_mut() = None;
            Ok(())
        }
    }

    #[test]
    fn test_merge_without_incoming_is_identity() {
        let base = set(&[draw(1, [1, 2, 3, 4, 5, 6]), draw(2, [1, 2, 3, 4, 5, 7])]);
        let result = merge(base.clone(), None);
        assert_eq!(result.records, base);
        assert_eq!(result.incoming_count, None);
        assert_eq!(result.added, 0);
    }

    #[test]
    fn test_merge_disjoint_adds_lengths() {
        let r1 = set(&[draw(1, [1, 2, 3, 4, 5, 6]), draw(2, [7, 8, 9, 10, 11, 12])]);
        let r2 = set(&[draw(3, [13, 14, 15, 16, 17, 18])]);
        let result = merge(r1.clone(), Some(r2.clone()));
        assert_eq!(result.records.len(), r1.len() + r2.len());
        assert_eq!(result.added, 1);
        assert_eq!(result.duplicates, 0);
    }

    #[test]
    fn test_merge_full_overlap_keeps_base() {
        let r1 = set(&[draw(1, [1, 2, 3, 4, 5, 6]), draw(2, [7, 8, 9, 10, 11, 12])]);
        let result = merge(r1.clone(), Some(r1.clone()));
        assert_eq!(result.records, r1);
        assert_eq!(result.duplicates, 2);
    }

    #[test]
    fn test_merge_preserves_first_occurrence_order() {
        let a = draw(1, [1, 2, 3, 4, 5, 6]);
        let b = draw(2, [1, 2, 3, 4, 5, 7]);
        let result = merge(set(&[a.clone()]), Some(set(&[a.clone(), b.clone()])));
        assert_eq!(result.records.as_slice(), &[a, b]);
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn test_absorb_missing_base_is_fatal() {
        let base = MemorySource::new("base", None);
        let incoming = MemorySource::new("ajout", Some(set(&[draw(1, [1, 2, 3, 4, 5, 6])])));
        let err = absorb(&base, &incoming).unwrap_err();
        assert!(err.to_string().contains("base"));
        assert!(incoming.exists());
    }

    #[test]
    fn test_absorb_without_incoming_leaves_base() {
        let records = set(&[draw(1, [1, 2, 3, 4, 5, 6])]);
        let base = MemorySource::new("base", Some(records.clone()));
        let incoming = MemorySource::new("ajout", None);
        let result = absorb(&base, &incoming).unwrap();
        assert_eq!(result.records, records);
        assert_eq!(base.current(), Some(records));
    }

    #[test]
    fn test_absorb_rewrites_base_and_consumes_incoming() {
        let a = draw(1, [1, 2, 3, 4, 5, 6]);
        let b = draw(2, [1, 2, 3, 4, 5, 7]);
        let base = MemorySource::new("base", Some(set(&[a.clone()])));
        let incoming = MemorySource::new("ajout", Some(set(&[a.clone(), b.clone()])));

        let result = absorb(&base, &incoming).unwrap();
        assert_eq!(result.added, 1);
        assert_eq!(result.duplicates, 1);
        assert_eq!(base.current(), Some(set(&[a, b])));
        assert!(!incoming.exists());
    }

    #[test]
    fn test_absorb_counts_duplicate_rows_of_incoming_file() {
        let a = draw(1, [1, 2, 3, 4, 5, 6]);
        let b = draw(2, [1, 2, 3, 4, 5, 7]);
        let base = MemorySource::with_rows("base", &[a.clone(), a.clone()]);
        let incoming = MemorySource::with_rows("ajout", &[a.clone(), b.clone(), b.clone()]);

        let result = absorb(&base, &incoming).unwrap();
        assert_eq!(result.base_count, 1);
        assert_eq!(result.base_rows, 2);
        assert_eq!(result.incoming_count, Some(2));
        assert_eq!(result.incoming_rows, Some(3));
        assert_eq!(result.added, 1);
        assert_eq!(result.duplicates, 2);
        assert_eq!(base.current(), Some(set(&[a, b])));
    }

    #[test]
    fn test_absorb_failed_rewrite_keeps_incoming() {
        let base = MemorySource {
            fail_replace: true,
            ..MemorySource::new("base", Some(set(&[draw(1, [1, 2, 3, 4, 5, 6])])))
        };
        let incoming = MemorySource::new("ajout", Some(set(&[draw(2, [1, 2, 3, 4, 5, 7])])));

        assert!(absorb(&base, &incoming).is_err());
        assert!(incoming.exists());
        assert_eq!(base.current().unwrap().len(), 1);
    }
}
