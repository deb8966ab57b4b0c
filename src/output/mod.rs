pub mod formatter;

pub use formatter::{
    format_json, format_questions, format_recommendations, format_reply, format_tsv,
    should_use_colors, wrap_text,
};
