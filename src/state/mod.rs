pub mod choices;
pub mod step;

pub use choices::{Choices, OperationRecord, Target};
pub use step::Step;
