//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::campaign::{SLOT_COUNT, SlotEntry};

/// Validates a slot list: at most three entries, no negative or non-finite discount.
pub fn validate_slot_config(slots: &[SlotEntry]) -> Result<(), ValidationError> {
    if slots.len() > SLOT_COUNT {
        let mut err = ValidationError::new("slot_config_length");
        err.message = Some(
            format!(
                "slot_config accepts at most {SLOT_COUNT} entries (got {})",
                slots.len()
            )
            .into(),
        );
        return Err(err);
    }

    if let Some(index) = slots
        .iter()
        .position(|slot| !slot.discount_value.is_finite() || slot.discount_value < 0.0)
    {
        let mut err = ValidationError::new("discount_value_range");
        err.message =
            Some(format!("slot {index}: discount_value must be a non-negative number").into());
        return Err(err);
    }

    Ok(())
}

/// Rejects names that are empty once trimmed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::campaign::DiscountType;

    fn slot(discount_value: f64) -> SlotEntry {
        SlotEntry {
            product_id: Some(1),
            discount_type: DiscountType::Percentage,
            discount_value,
        }
    }

    #[test]
    fn accepts_up_to_three_slots() {
        assert!(validate_slot_config(&[]).is_ok());
        assert!(validate_slot_config(&[slot(0.0), slot(10.0), slot(99.5)]).is_ok());
    }

    #[test]
    fn rejects_a_fourth_slot() {
        let err = validate_slot_config(&[slot(1.0), slot(1.0), slot(1.0), slot(1.0)]).unwrap_err();
        assert_eq!(err.code, "slot_config_length");
    }

    #[test]
    fn rejects_negative_or_nan_discounts() {
        assert!(validate_slot_config(&[slot(-1.0)]).is_err());
        assert!(validate_slot_config(&[slot(f64::NAN)]).is_err());
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(validate_not_blank("Happy hour").is_ok());
        assert!(validate_not_blank("   ").is_err());
        assert!(validate_not_blank("").is_err());
    }
}
