// Request Validation
// Domain constraint checks, run by the host before any state is touched.

use crate::error::ValidationError;
use crate::types::{CreateTokenParams, MAX_NAME_LENGTH, MAX_PURCHASE_MARGIN};

/// Validate a create-token request. Pure function of its input; a failure
/// means the host rejects the transaction outright.
pub fn validate(params: &CreateTokenParams) -> Result<(), ValidationError> {
    // init_value is unsigned, so "non-positive" degenerates to zero
    if params.init_value == 0 {
        return Err(ValidationError::NonPositiveValue);
    }
    if params.min_purchase_margin > MAX_PURCHASE_MARGIN {
        return Err(ValidationError::MarginOutOfRange);
    }
    // Names beyond this bound are not representable in the state encoding
    if params.name.len() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}
