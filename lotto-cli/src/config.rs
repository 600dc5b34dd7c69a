use std::path::PathBuf;

use lotto_db::table::SheetLayout;

pub const DEFAULT_BASE_FILE: &str = "로또당첨번호.xlsx";
pub const DEFAULT_INCOMING_FILE: &str = "로또당첨번호추가.xlsx";
pub const DEFAULT_STATS_FILE: &str = "lotto_stats.json";
pub const DEFAULT_HISTORY_FILE: &str = "lotto_history.json";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base: PathBuf,
    pub incoming: PathBuf,
    pub stats_output: PathBuf,
    pub history_output: PathBuf,
    pub layout: SheetLayout,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            base: PathBuf::from(DEFAULT_BASE_FILE),
            incoming: PathBuf::from(DEFAULT_INCOMING_FILE),
            stats_output: PathBuf::from(DEFAULT_STATS_FILE),
            history_output: PathBuf::from(DEFAULT_HISTORY_FILE),
            layout: SheetLayout::default(),
        }
    }
}
