mod direction;
mod validator;

pub use direction::{AllowedDirection, DIRECTION_THRESHOLD};
pub use validator::{
    CrossingCandidate, CrossingOutcome, CrossingValidator, EntityTag, FinishLineGate, Rejection,
};
