pub mod entry_filter;
pub mod extractor;

pub use entry_filter::{
    is_valid_style_name, style_folder_name, EntryFilter, FilterCriterion, FILTER_FILE_SUFFIX,
};
pub use extractor::{ExtractedFile, FilterExtractor};
