pub mod error;
pub mod output_writer;
pub mod reader;
pub mod spa;
pub mod texture;

pub use error::SpaError;
pub use output_writer::OutputWriter;
pub use reader::Reader;
