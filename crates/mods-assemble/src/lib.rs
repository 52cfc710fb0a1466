//! Record assembly: template rendering, per-row conversion, aggregation.

pub mod assembler;
pub mod error;
pub mod template;

pub use assembler::{ContainerResult, ITEM_ID_FIELD, RecordAssembler, SOURCE_ID_FIELD};
pub use error::{AssembleError, FailureKind, RowFailure};
pub use template::Template;
