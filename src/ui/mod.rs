pub mod icons;
pub mod output;
pub mod progress;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, error, header, info, phase, section, success, summary_row};
pub use progress::Spinner;
pub use table::{severity_table, TableBuilder};
pub use theme::{theme, Theme};
