//! Shared data model and error taxonomy for the Cashmere signifier
//! retrieval workspace.

pub mod error;
pub mod operator;
pub mod signifier;
pub mod value;

pub use error::{CashmereError, Result};
pub use operator::Operator;
pub use signifier::{
    ContextFeatures, IntentContext, IntentionDescription, Provenance, Signifier, SignifierStatus,
    StructuredCondition, ValueCondition,
};
pub use value::ScalarValue;
