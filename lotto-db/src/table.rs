use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};

use crate::models::{CellValue, DrawRecord, ExtraCells, NUMBERS_PER_DRAW, RecordSet, TableColumn};
use crate::sink::write_atomically;

pub const DEFAULT_ROUND_HEADER: &str = "회차";
pub const DEFAULT_NUMBERS_HEADER: &str = "당첨번호";

/// Préfixe des colonnes annexes sans en-tête, suivi de l'index de colonne.
const UNNAMED_PREFIX: &str = "Unnamed: ";

static EMPTY_CELL: Data = Data::Empty;

/// Source tabulaire de tirages : lecture, remplacement et suppression.
pub trait TableSource {
    fn describe(&self) -> String;
    fn exists(&self) -> bool;
    fn load(&self) -> Result<LoadedTable>;
    /// Remplace intégralement le contenu persisté, ou laisse l'ancien intact en cas d'échec.
    fn replace(&self, records: &RecordSet) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

/// Tirages distincts lus et nombre de lignes non vides rencontrées.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub records: RecordSet,
    pub rows_read: usize,
}

/// Noms des en-têtes à repérer sur la première ligne.
///
/// Les 6 boules occupent la colonne `numbers_header` et les 5 colonnes suivantes
/// (en-têtes vides dans les fichiers exportés par le site de la loterie).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub round_header: String,
    pub numbers_header: String,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            round_header: DEFAULT_ROUND_HEADER.to_string(),
            numbers_header: DEFAULT_NUMBERS_HEADER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
    /// xls, xlsb, ods : lisibles via calamine, pas de réécriture.
    ReadOnlyWorkbook,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .with_context(|| format!("Extension de fichier absente : {:?}", path))?;
        match ext.as_str() {
            "csv" => Ok(TableFormat::Csv),
            "xlsx" | "xlsm" => Ok(TableFormat::Xlsx),
            "xls" | "xlsb" | "ods" => Ok(TableFormat::ReadOnlyWorkbook),
            other => bail!("Format de fichier non pris en charge : .{}", other),
        }
    }
}

/// Ligne lue avec son numéro de ligne (1-based) dans le fichier.
type GridRow = (usize, Vec<Data>);

#[derive(Debug, Clone)]
struct Columns {
    round: Option<usize>,
    numbers: usize,
    /// Une entrée par colonne du fichier.
    layout: Vec<TableColumn>,
}

/// Fichier tableur (csv, xlsx, xls, xlsb, ods) contenant une ligne par tirage.
///
/// Les colonnes autres que le tour et les 6 boules sont conservées à la réécriture.
#[derive(Debug, Clone)]
pub struct SpreadsheetSource {
    path: PathBuf,
    layout: SheetLayout,
}

impl SpreadsheetSource {
    pub fn new(path: impl Into<PathBuf>, layout: SheetLayout) -> Self {
        Self {
            path: path.into(),
            layout,
        }
    }

    fn read_grid(&self) -> Result<Vec<GridRow>> {
        match TableFormat::from_path(&self.path)? {
            TableFormat::Csv => read_csv_grid(&self.path),
            TableFormat::Xlsx | TableFormat::ReadOnlyWorkbook => read_workbook_grid(&self.path),
        }
    }

    fn resolve_columns(&self, header: &[Data]) -> Result<Columns> {
        let names: Vec<String> = header.iter().map(header_text).collect();
        let numbers = names
            .iter()
            .position(|n| *n == self.layout.numbers_header)
            .with_context(|| {
                format!(
                    "{:?} : en-tête '{}' introuvable (en-têtes lus : {:?})",
                    self.path, self.layout.numbers_header, names
                )
            })?;
        let round = names.iter().position(|n| *n == self.layout.round_header);
        if round.is_none() {
            log::warn!(
                "{:?} : pas de colonne '{}', les tirages n'auront pas de numéro de tour",
                self.path,
                self.layout.round_header
            );
        }

        let width = names.len().max(numbers + NUMBERS_PER_DRAW);
        let mut layout = Vec::with_capacity(width);
        let mut used: Vec<String> = Vec::new();
        for idx in 0..width {
            let column = if Some(idx) == round {
                TableColumn::Round
            } else if (numbers..numbers + NUMBERS_PER_DRAW).contains(&idx) {
                TableColumn::Number(idx - numbers)
            } else {
                let name = names.get(idx).map(String::as_str).unwrap_or("");
                TableColumn::Extra(extra_key(name, idx, &mut used))
            };
            layout.push(column);
        }

        Ok(Columns {
            round,
            numbers,
            layout,
        })
    }

    fn parse_row(&self, row: &[Data], line: usize, columns: &Columns) -> Result<DrawRecord> {
        let cell = |idx: usize| row.get(idx).unwrap_or(&EMPTY_CELL);

        let round = match columns.round {
            Some(idx) => parse_round(cell(idx)).with_context(|| {
                format!(
                    "{:?} : ligne {}, colonne '{}'",
                    self.path, line, self.layout.round_header
                )
            })?,
            None => None,
        };

        let mut numbers = [0u8; NUMBERS_PER_DRAW];
        for (pos, slot) in numbers.iter_mut().enumerate() {
            *slot = parse_number(cell(columns.numbers + pos)).with_context(|| {
                format!("{:?} : ligne {}, position {}", self.path, line, pos + 1)
            })?;
        }

        DrawRecord::new(round, numbers)
            .with_context(|| format!("{:?} : ligne {}", self.path, line))
    }

    fn column_header(&self, column: &TableColumn) -> String {
        match column {
            TableColumn::Round => self.layout.round_header.clone(),
            TableColumn::Number(0) => self.layout.numbers_header.clone(),
            TableColumn::Number(_) => String::new(),
            TableColumn::Extra(name) if name.starts_with(UNNAMED_PREFIX) => String::new(),
            TableColumn::Extra(name) => name.clone(),
        }
    }

    fn write_csv(&self, records: &RecordSet) -> Result<()> {
        let columns = output_columns(records);
        write_atomically(&self.path, |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(columns.iter().map(|c| self.column_header(c)))?;
            for (record, extras) in records.rows() {
                writer.write_record(
                    columns
                        .iter()
                        .map(|c| cell_text(&output_cell(c, record, extras))),
                )?;
            }
            writer.flush()?;
            Ok(())
        })
    }

    fn write_xlsx(&self, records: &RecordSet) -> Result<()> {
        let columns = output_columns(records);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col, column) in columns.iter().enumerate() {
            let name = self.column_header(column);
            if !name.is_empty() {
                worksheet.write_string(0, col as u16, name)?;
            }
        }

        for (i, (record, extras)) in records.rows().enumerate() {
            let row = (i + 1) as u32;
            for (col, column) in columns.iter().enumerate() {
                write_xlsx_cell(worksheet, row, col as u16, &output_cell(column, record, extras))?;
            }
        }

        let buffer = workbook
            .save_to_buffer()
            .context("Échec de la génération du classeur xlsx")?;
        write_atomically(&self.path, |file| {
            std::io::Write::write_all(file, &buffer)?;
            Ok(())
        })
    }
}

impl TableSource for SpreadsheetSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<LoadedTable> {
        let grid = self.read_grid()?;
        let mut rows = grid.iter();
        let Some((_, header)) = rows.next() else {
            bail!("{:?} : fichier vide (aucune ligne d'en-tête)", self.path);
        };
        let columns = self.resolve_columns(header)?;

        let mut records = RecordSet::with_columns(columns.layout.clone());
        let mut rows_read = 0usize;
        for (line, row) in rows {
            if is_blank_row(row) {
                continue;
            }
            let record = self.parse_row(row, *line, &columns)?;
            rows_read += 1;
            records.push_row(record, extra_cells(row, &columns.layout));
        }

        log::debug!(
            "{:?} : {} lignes lues, {} tirages distincts",
            self.path,
            rows_read,
            records.len()
        );
        Ok(LoadedTable { records, rows_read })
    }

    fn replace(&self, records: &RecordSet) -> Result<()> {
        let written = match TableFormat::from_path(&self.path)? {
            TableFormat::Csv => self.write_csv(records),
            TableFormat::Xlsx => self.write_xlsx(records),
            TableFormat::ReadOnlyWorkbook => bail!(
                "{:?} : réécriture impossible dans ce format (utilisez .xlsx ou .csv)",
                self.path
            ),
        };
        written.with_context(|| format!("Impossible de réécrire {:?}", self.path))?;
        log::info!("{} tirages écrits dans {:?}", records.len(), self.path);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        std::fs::remove_file(&self.path)
            .with_context(|| format!("Impossible de supprimer {:?}", self.path))
    }
}

fn read_workbook_grid(path: &Path) -> Result<Vec<GridRow>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("{:?} ne contient aucune feuille", path))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Impossible de lire la feuille '{}' de {:?}", sheet_name, path))?;

    // La plage commence à la première cellule non vide, pas forcément en A1.
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    Ok(range
        .rows()
        .enumerate()
        .map(|(idx, row)| (first_line + idx, row.to_vec()))
        .collect())
}

fn read_csv_grid(path: &Path) -> Result<Vec<GridRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;

    let mut grid = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("{:?} : erreur de lecture ligne {}", path, idx + 1))?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Data::Empty
                } else {
                    Data::String(field.to_string())
                }
            })
            .collect();
        grid.push((line, cells));
    }
    Ok(grid)
}

fn header_text(cell: &Data) -> String {
    match cell {
        // Les CSV enregistrés par Excel commencent par un BOM UTF-8.
        Data::String(s) => s.trim_start_matches('\u{feff}').trim().to_string(),
        _ => String::new(),
    }
}

/// Clé unique d'une colonne annexe : son en-tête, suffixé `.n` s'il est répété.
fn extra_key(name: &str, idx: usize, used: &mut Vec<String>) -> String {
    let base = if name.is_empty() {
        format!("{}{}", UNNAMED_PREFIX, idx)
    } else {
        name.to_string()
    };
    let mut key = base.clone();
    let mut n = 1;
    while used.contains(&key) {
        key = format!("{}.{}", base, n);
        n += 1;
    }
    used.push(key.clone());
    key
}

fn is_blank_row(row: &[Data]) -> bool {
    row.iter().all(|cell| match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    })
}

fn extra_cells(row: &[Data], layout: &[TableColumn]) -> ExtraCells {
    layout
        .iter()
        .enumerate()
        .filter_map(|(idx, column)| match column {
            TableColumn::Extra(name) => Some((
                name.clone(),
                cell_value(row.get(idx).unwrap_or(&EMPTY_CELL)),
            )),
            _ => None,
        })
        .collect()
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(e) => CellValue::Text(e.to_string()),
    }
}

/// Colonnes à écrire : celles du fichier d'origine, complétées au besoin.
fn output_columns(records: &RecordSet) -> Vec<TableColumn> {
    let mut columns = records.columns().to_vec();
    if columns.is_empty() {
        columns.extend((0..NUMBERS_PER_DRAW).map(TableColumn::Number));
    }
    if records.has_rounds() && !columns.contains(&TableColumn::Round) {
        columns.insert(0, TableColumn::Round);
    }
    for (_, extras) in records.rows() {
        for (name, _) in extras {
            let column = TableColumn::Extra(name.clone());
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }
    columns
}

fn output_cell(column: &TableColumn, record: &DrawRecord, extras: &ExtraCells) -> CellValue {
    match column {
        TableColumn::Round => record
            .round
            .map(|r| CellValue::Number(r as f64))
            .unwrap_or(CellValue::Empty),
        TableColumn::Number(pos) => CellValue::Number(record.numbers[*pos] as f64),
        TableColumn::Extra(name) => extras
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value.clone())
            .unwrap_or(CellValue::Empty),
    }
}

fn cell_text(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(f) | CellValue::DateTime(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                (*f as i64).to_string()
            } else {
                f.to_string()
            }
        }
        CellValue::Bool(b) => b.to_string(),
    }
}

fn write_xlsx_cell(worksheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> Result<()> {
    match value {
        CellValue::Empty => {}
        CellValue::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        CellValue::Number(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::DateTime(serial) => {
            let pattern = if serial.fract() == 0.0 { "yyyy-mm-dd" } else { "yyyy-mm-dd hh:mm:ss" };
            let format = Format::new().set_num_format(pattern);
            worksheet.write_number_with_format(row, col, *serial, &format)?;
        }
    }
    Ok(())
}

fn parse_number(cell: &Data) -> Result<u8> {
    let value: i64 = match cell {
        Data::Int(i) => *i,
        Data::Float(f) if f.fract() == 0.0 => *f as i64,
        Data::Float(f) => bail!("{} n'est pas un entier", f),
        Data::String(s) => s
            .trim()
            .parse::<i64>()
            .with_context(|| format!("'{}' n'est pas un entier", s))?,
        Data::Empty => bail!("valeur manquante"),
        other => bail!("valeur non numérique : {:?}", other),
    };
    match u8::try_from(value) {
        Ok(n) if n > 0 => Ok(n),
        _ => bail!("numéro {} hors limites (1-255)", value),
    }
}

fn parse_round(cell: &Data) -> Result<Option<u32>> {
    match cell {
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::Int(i) => u32::try_from(*i)
            .map(Some)
            .with_context(|| format!("tour {} invalide", i)),
        Data::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
            Ok(Some(*f as u32))
        }
        Data::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .with_context(|| format!("tour '{}' invalide", s)),
        other => bail!("tour invalide : {:?}", other),
    }
}
