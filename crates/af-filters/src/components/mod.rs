mod boolean;
mod date;
mod date_range;
mod number;
mod select;
mod text;

pub use boolean::BooleanFilter;
pub use date::DateFilter;
pub use date_range::DateRangeFilter;
pub use number::NumberFilter;
pub use select::SelectFilter;
pub use text::{TextFilter, TextMode};
