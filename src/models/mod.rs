pub mod dataset_file;
pub mod datatype;
pub mod job;
pub mod retention;

pub use dataset_file::DatasetFile;
pub use datatype::DatatypeSpec;
pub use job::{Job, JobInputs, JobStatus};
pub use retention::RetentionWindow;
