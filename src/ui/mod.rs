pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{dim, edge_line, header, info, node_line, section, success, warn};
pub use table::{edge_table, node_table, stats_table, EdgeRow, NodeRow, SchemaRow};
pub use theme::{theme, Theme};
