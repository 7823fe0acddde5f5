pub mod constants;
pub mod filename;
pub mod time;

pub use constants::*;
pub use filename::{archive_filename, datatype_dir_name, hour_key};
pub use time::{current_hour, truncate_to_hour};
