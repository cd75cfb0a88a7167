mod job;
mod runner;
mod state;

pub use job::{JobReport, TransportJob};
pub use runner::WorkflowRunner;
pub use state::WorkflowState;
