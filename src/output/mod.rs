pub mod formatter;

pub use formatter::{
    format_form_table, format_form_tsv, format_history_table, format_history_tsv, format_net,
    format_projection_table, format_projection_tsv, format_standings_table, format_standings_title,
    format_standings_tsv, format_summary, should_use_colors,
};
