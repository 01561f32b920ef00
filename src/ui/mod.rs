pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{banner, error, info, section, success, summary_row, warn};
pub use table::{lang_table, stats_table, LangRow};
pub use theme::{theme, Theme};
