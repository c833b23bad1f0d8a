mod array;
mod atomic;
mod function;
mod map;
mod sequence;

pub use array::ArrayItem;
pub use atomic::{
    AtomicItem, Date, DateTime, MapKey, Time, format_day_time_duration,
    format_year_month_duration, parse_date, parse_date_time, parse_day_time_duration,
    parse_time, parse_year_month_duration,
};
pub use function::FunctionItem;
pub use map::{DuplicatePolicy, MapItem};
pub use sequence::{Item, Sequence};
