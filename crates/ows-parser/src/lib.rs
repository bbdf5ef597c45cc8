mod source;
mod text;

pub use source::{order_fragments, prepare_sources, split_label, LabelLine, PreparedSource};
pub use text::{find_outside_strings, fold_case, split_statements, strip_comment};
