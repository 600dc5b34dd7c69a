mod analysis;
mod config;
mod display;
mod export;
mod merge;
mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::analysis::aggregate;
use crate::config::{
    DEFAULT_BASE_FILE, DEFAULT_HISTORY_FILE, DEFAULT_INCOMING_FILE, DEFAULT_STATS_FILE,
    PipelineConfig,
};
use crate::display::{display_completion, display_merge_summary, display_stats};
use lotto_db::table::{DEFAULT_NUMBERS_HEADER, DEFAULT_ROUND_HEADER, SheetLayout};

#[derive(Parser)]
#[command(name = "lotto", about = "Statistiques des tirages du loto et export JSON")]
struct Cli {
    #[command(flatten)]
    files: FileArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args)]
struct FileArgs {
    /// Fichier de base des tirages (xlsx, xls, ods, csv)
    #[arg(long, global = true, default_value = DEFAULT_BASE_FILE)]
    base: PathBuf,

    /// Fichier de nouveaux tirages à fusionner puis supprimer
    #[arg(long, global = true, default_value = DEFAULT_INCOMING_FILE)]
    incoming: PathBuf,

    /// Fichier JSON des statistiques
    #[arg(long, global = true, default_value = DEFAULT_STATS_FILE)]
    stats_out: PathBuf,

    /// Fichier JSON de l'historique complet
    #[arg(long, global = true, default_value = DEFAULT_HISTORY_FILE)]
    history_out: PathBuf,

    /// En-tête de la colonne du numéro de tour
    #[arg(long, global = true, default_value = DEFAULT_ROUND_HEADER)]
    round_column: String,

    /// En-tête de la première des 6 colonnes de numéros
    #[arg(long, global = true, default_value = DEFAULT_NUMBERS_HEADER)]
    numbers_column: String,
}

impl FileArgs {
    fn into_config(self) -> PipelineConfig {
        PipelineConfig {
            base: self.base,
            incoming: self.incoming,
            stats_output: self.stats_out,
            history_output: self.history_out,
            layout: SheetLayout {
                round_header: self.round_column,
                numbers_header: self.numbers_column,
            },
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Fusionner, calculer les statistiques et écrire les deux JSON (par défaut)
    Run {
        /// Nombre de numéros et de paires à afficher
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Fusionner uniquement le fichier d'ajout dans la base
    Merge,

    /// Afficher les statistiques de la base sans rien écrire
    Stats {
        /// Nombre de numéros et de paires à afficher
        #[arg(short, long, default_value = "10")]
        top: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = cli.files.into_config();

    match cli.command.unwrap_or(Command::Run { top: 10 }) {
        Command::Run { top } => cmd_run(&config, top),
        Command::Merge => cmd_merge(&config),
        Command::Stats { top } => cmd_stats(&config, top),
    }
}

fn cmd_run(config: &PipelineConfig, top: usize) -> Result<()> {
    let report = pipeline::run(config)?;
    let total = report.merge.records.len();
    display_merge_summary(&report.merge);
    display_stats(&report.aggregate, total, top);
    display_completion(total, &config.stats_output, &config.history_output);
    Ok(())
}

fn cmd_merge(config: &PipelineConfig) -> Result<()> {
    let result = pipeline::merge_only(config)?;
    display_merge_summary(&result);
    println!("- Nombre total de tirages : {}", result.records.len());
    Ok(())
}

fn cmd_stats(config: &PipelineConfig, top: usize) -> Result<()> {
    let records = pipeline::load_base(config)?;
    display_stats(&aggregate(&records), records.len(), top);
    Ok(())
}
