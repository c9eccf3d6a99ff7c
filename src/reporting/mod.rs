pub mod formatter;

pub use formatter::format_summary_markdown;
