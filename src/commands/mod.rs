//! Write services: set power, set battery, set temperature, set humidity.

pub mod dispatcher;
pub mod operation;
pub mod request;

pub use dispatcher::CommandDispatcher;
pub use operation::{OperationDescriptor, ValueKind, WriteOperation};
pub use request::CommandRequest;
