//! Owner-only access control.

use tracing::debug;

use crate::error::{CustodyError, Result};
use crate::principal::Principal;

/// Fail unless `caller` is `owner`.
///
/// # Errors
///
/// Returns [`CustodyError::Unauthorized`] if the principals differ.
pub fn authorize(caller: &Principal, owner: &Principal) -> Result<()> {
    if caller != owner {
        debug!(caller = %caller, "rejected privileged call");
        return Err(CustodyError::Unauthorized {
            caller: caller.clone(),
            owner: owner.clone(),
        });
    }
    Ok(())
}
