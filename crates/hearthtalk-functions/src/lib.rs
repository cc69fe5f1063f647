//! Function dispatch for HearthTalk.
//!
//! Maps model-requested actions to hub service calls with authorization
//! checks: every targeted entity must exist in hub state and be a member
//! of the turn's exposed-entity set before any service is invoked.

pub mod descriptor;
pub mod error;
pub mod executor;
pub mod registry;
pub mod service_call;

pub use descriptor::{
    array_property, default_descriptors, object_schema, property, string_property,
    FunctionDescriptor,
};
pub use error::{FunctionError, Result};
pub use executor::{DynExecutor, FunctionContext, FunctionExecutor};
pub use registry::ExecutorRegistry;
pub use service_call::{EntityIds, ServiceCallExecutor, ServiceInvocation, EXECUTE_SERVICES};
