//! vCenter attributes of an environment.

use tracing::debug;
use warden_state::VmwareAttributes;

use crate::error::{ValidationError, ValidationResult};
use crate::payload::{VmwareAttributesPayload, validate_json};

/// The `metadata` block is owned by the server and may only be echoed back.
#[derive(Debug, Default, Clone, Copy)]
pub struct VmwareAttributesValidator;

impl VmwareAttributesValidator {
    pub fn validate(
        &self,
        data: &[u8],
        instance: &VmwareAttributes,
    ) -> ValidationResult<VmwareAttributesPayload> {
        let payload: VmwareAttributesPayload = validate_json(data)?;

        if let Some(metadata) = payload.editable.get("metadata") {
            if instance.editable.get("metadata") != Some(metadata) {
                return Err(ValidationError::invalid_data("Metadata shouldn't change").logged());
            }
        }

        debug!(cluster_id = instance.cluster_id, "vmware attributes accepted");
        Ok(payload)
    }
}
