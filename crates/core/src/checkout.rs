//! Three-step checkout wizard.
//!
//! ```text
//! Shipping --advance--> Payment --advance--> Review --(submit order)
//!    ^                     |  ^                 |
//!    +-------back----------+  +------back-------+
//! ```
//!
//! Moving forward validates the fields of the step being left; moving back
//! never validates and never clears anything the shopper typed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{PaymentKind, PaymentMethod, PhoneError, PhoneNumber};

/// A checkout step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    #[default]
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    /// Every step in order.
    pub const ALL: [Self; 3] = [Self::Shipping, Self::Payment, Self::Review];

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Shipping => Some(Self::Payment),
            Self::Payment => Some(Self::Review),
            Self::Review => None,
        }
    }

    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::Shipping => None,
            Self::Payment => Some(Self::Shipping),
            Self::Review => Some(Self::Payment),
        }
    }

    /// One-based position, for progress indicators.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Shipping => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }
}

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckoutField {
    FullName,
    Phone,
    Email,
    Address,
    City,
    District,
    MobileNumber,
    CardNumber,
    CardExpiry,
    CardCvv,
    CardHolderName,
}

impl CheckoutField {
    /// HTML form field name.
    #[must_use]
    pub const fn form_name(self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Address => "address",
            Self::City => "city",
            Self::District => "district",
            Self::MobileNumber => "mobile_number",
            Self::CardNumber => "card_number",
            Self::CardExpiry => "card_expiry",
            Self::CardCvv => "card_cvv",
            Self::CardHolderName => "card_holder_name",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FullName => "Full name",
            Self::Phone => "Phone number",
            Self::Email => "Email",
            Self::Address => "Address",
            Self::City => "City",
            Self::District => "District",
            Self::MobileNumber => "Mobile money number",
            Self::CardNumber => "Card number",
            Self::CardExpiry => "Expiry date",
            Self::CardCvv => "CVV",
            Self::CardHolderName => "Name on card",
        }
    }
}

/// A single field validation failure.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{} is required", .0.label())]
    Missing(CheckoutField),
    #[error("{}: {reason}", .field.label())]
    InvalidPhone {
        field: CheckoutField,
        reason: PhoneError,
    },
}

impl ValidationError {
    /// The field that failed.
    #[must_use]
    pub const fn field(&self) -> CheckoutField {
        match self {
            Self::Missing(field) | Self::InvalidPhone { field, .. } => *field,
        }
    }
}

/// Errors returned when moving the wizard forward.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    /// The current step's fields did not validate; the step is unchanged.
    #[error("{} field(s) need attention", .0.len())]
    Invalid(Vec<ValidationError>),
    /// Review is the last step; the only way out is submitting the order.
    #[error("review is the final step")]
    NoNextStep,
    /// Fields were posted for a step other than the current one.
    #[error("expected {expected:?} step, wizard is at {actual:?}")]
    WrongStep {
        expected: CheckoutStep,
        actual: CheckoutStep,
    },
}

fn require(value: &str, field: CheckoutField, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::Missing(field));
    }
}

fn require_phone(value: &str, field: CheckoutField, errors: &mut Vec<ValidationError>) {
    match PhoneNumber::parse(value) {
        Ok(_) => {}
        Err(PhoneError::Empty) => errors.push(ValidationError::Missing(field)),
        Err(reason) => errors.push(ValidationError::InvalidPhone { field, reason }),
    }
}

/// Delivery details captured on the first step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub district: String,
    /// Optional; most Ugandan addresses have none.
    pub postal_code: String,
}

impl ShippingDetails {
    /// Check required fields and the phone number format.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        require(&self.full_name, CheckoutField::FullName, &mut errors);
        require_phone(&self.phone, CheckoutField::Phone, &mut errors);
        require(&self.email, CheckoutField::Email, &mut errors);
        require(&self.address, CheckoutField::Address, &mut errors);
        require(&self.city, CheckoutField::City, &mut errors);
        require(&self.district, CheckoutField::District, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Card fields. Only presence is checked.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub holder_name: String,
}

impl CardDetails {
    /// Last four digits of the card number, for display.
    #[must_use]
    pub fn last_four(&self) -> String {
        let digits: Vec<char> = self.number.chars().filter(char::is_ascii_digit).collect();
        digits
            .get(digits.len().saturating_sub(4)..)
            .unwrap_or_default()
            .iter()
            .collect()
    }
}

impl fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &format_args!("**** {}", self.last_four()))
            .field("expiry", &"[REDACTED]")
            .field("cvv", &"[REDACTED]")
            .field("holder_name", &self.holder_name)
            .finish()
    }
}

/// Payment selection captured on the second step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentMethod,
    pub mobile_number: String,
    pub card: CardDetails,
}

impl PaymentDetails {
    /// Check the fields required by the selected method.
    ///
    /// # Errors
    ///
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        match self.method.kind() {
            PaymentKind::MobileMoney => {
                require_phone(&self.mobile_number, CheckoutField::MobileNumber, &mut errors);
            }
            PaymentKind::Card => {
                require(&self.card.number, CheckoutField::CardNumber, &mut errors);
                require(&self.card.expiry, CheckoutField::CardExpiry, &mut errors);
                require(&self.card.cvv, CheckoutField::CardCvv, &mut errors);
                require(&self.card.holder_name, CheckoutField::CardHolderName, &mut errors);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Everything typed during checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub shipping: ShippingDetails,
    pub payment: PaymentDetails,
}

/// The checkout state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutWizard {
    step: CheckoutStep,
    form: CheckoutForm,
}

impl CheckoutWizard {
    /// A wizard at the shipping step with an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    #[must_use]
    pub const fn form(&self) -> &CheckoutForm {
        &self.form
    }

    /// Returns `true` once the shopper has reached the review step.
    #[must_use]
    pub fn is_ready_to_submit(&self) -> bool {
        self.step == CheckoutStep::Review
    }

    /// Validate the current step and move to the next one.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Invalid`] with every failing field, leaving the
    /// step unchanged, or [`StepError::NoNextStep`] at review.
    pub fn advance(&mut self) -> Result<CheckoutStep, StepError> {
        let validation = match self.step {
            CheckoutStep::Shipping => self.form.shipping.validate(),
            CheckoutStep::Payment => self.form.payment.validate(),
            CheckoutStep::Review => return Err(StepError::NoNextStep),
        };
        validation.map_err(StepError::Invalid)?;

        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move to the previous step without validating. No-op at shipping.
    pub fn back(&mut self) -> CheckoutStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Store shipping fields and try to advance to payment.
    ///
    /// The fields are kept even when validation fails so the form can be
    /// shown again with what was typed.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::WrongStep`] when not at shipping, otherwise the
    /// errors of [`Self::advance`].
    pub fn submit_shipping(&mut self, shipping: ShippingDetails) -> Result<CheckoutStep, StepError> {
        self.expect_step(CheckoutStep::Shipping)?;
        self.form.shipping = shipping;
        self.advance()
    }

    /// Store payment fields and try to advance to review.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::WrongStep`] when not at payment, otherwise the
    /// errors of [`Self::advance`].
    pub fn submit_payment(&mut self, payment: PaymentDetails) -> Result<CheckoutStep, StepError> {
        self.expect_step(CheckoutStep::Payment)?;
        self.form.payment = payment;
        self.advance()
    }

    fn expect_step(&self, expected: CheckoutStep) -> Result<(), StepError> {
        if self.step != expected {
            return Err(StepError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn valid_shipping() -> ShippingDetails {
        ShippingDetails {
            full_name: "Nakato Sarah".to_string(),
            phone: "0772 123 456".to_string(),
            email: "nakato@example.ug".to_string(),
            address: "Plot 12, Kampala Road".to_string(),
            city: "Kampala".to_string(),
            district: "Kampala".to_string(),
            postal_code: String::new(),
        }
    }

    pub(crate) fn mobile_payment() -> PaymentDetails {
        PaymentDetails {
            method: PaymentMethod::MtnMobileMoney,
            mobile_number: "0772123456".to_string(),
            card: CardDetails::default(),
        }
    }

    #[test]
    fn test_starts_at_shipping() {
        let wizard = CheckoutWizard::new();
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
        assert!(!wizard.is_ready_to_submit());
    }

    #[test]
    fn test_empty_full_name_blocks_advance() {
        let mut wizard = CheckoutWizard::new();
        let shipping = ShippingDetails {
            full_name: String::new(),
            ..valid_shipping()
        };

        let err = wizard.submit_shipping(shipping).unwrap_err();
        assert_eq!(
            err,
            StepError::Invalid(vec![ValidationError::Missing(CheckoutField::FullName)])
        );
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
        // What was typed is kept for re-display
        assert_eq!(wizard.form().shipping.city, "Kampala");
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let shipping = ShippingDetails {
            address: "   ".to_string(),
            ..valid_shipping()
        };
        let errors = shipping.validate().unwrap_err();
        assert_eq!(errors[0].field(), CheckoutField::Address);
    }

    #[test]
    fn test_invalid_phone_blocks_advance() {
        let mut wizard = CheckoutWizard::new();
        let shipping = ShippingDetails {
            phone: "0414 123 456".to_string(),
            ..valid_shipping()
        };

        let err = wizard.submit_shipping(shipping).unwrap_err();
        assert!(matches!(
            err,
            StepError::Invalid(ref errors) if matches!(
                errors.as_slice(),
                [ValidationError::InvalidPhone { field: CheckoutField::Phone, .. }]
            )
        ));
        assert_eq!(wizard.step(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_reports_every_missing_field() {
        let errors = ShippingDetails::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(ValidationError::field).collect();
        assert_eq!(
            fields,
            vec![
                CheckoutField::FullName,
                CheckoutField::Phone,
                CheckoutField::Email,
                CheckoutField::Address,
                CheckoutField::City,
                CheckoutField::District,
            ]
        );
    }

    #[test]
    fn test_postal_code_is_optional() {
        assert!(valid_shipping().validate().is_ok());
    }

    #[test]
    fn test_mobile_money_requires_valid_number() {
        let missing = PaymentDetails {
            mobile_number: String::new(),
            ..mobile_payment()
        };
        assert_eq!(
            missing.validate().unwrap_err(),
            vec![ValidationError::Missing(CheckoutField::MobileNumber)]
        );

        let bad = PaymentDetails {
            method: PaymentMethod::AirtelMoney,
            mobile_number: "12345".to_string(),
            ..mobile_payment()
        };
        assert!(matches!(
            bad.validate().unwrap_err().as_slice(),
            [ValidationError::InvalidPhone { .. }]
        ));
    }

    #[test]
    fn test_card_requires_all_four_fields() {
        let payment = PaymentDetails {
            method: PaymentMethod::Card,
            mobile_number: String::new(),
            card: CardDetails {
                number: "4111 1111 1111 1111".to_string(),
                expiry: String::new(),
                cvv: String::new(),
                holder_name: "N SARAH".to_string(),
            },
        };
        let fields: Vec<_> = payment
            .validate()
            .unwrap_err()
            .iter()
            .map(ValidationError::field)
            .collect();
        assert_eq!(fields, vec![CheckoutField::CardExpiry, CheckoutField::CardCvv]);
    }

    #[test]
    fn test_card_number_is_not_luhn_checked() {
        let payment = PaymentDetails {
            method: PaymentMethod::Card,
            mobile_number: String::new(),
            card: CardDetails {
                number: "1234".to_string(),
                expiry: "13/99".to_string(),
                cvv: "1".to_string(),
                holder_name: "X".to_string(),
            },
        };
        assert!(payment.validate().is_ok());
    }

    #[test]
    fn test_full_forward_path() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(
            wizard.submit_shipping(valid_shipping()).unwrap(),
            CheckoutStep::Payment
        );
        assert_eq!(
            wizard.submit_payment(mobile_payment()).unwrap(),
            CheckoutStep::Review
        );
        assert!(wizard.is_ready_to_submit());
        assert_eq!(wizard.advance(), Err(StepError::NoNextStep));
    }

    #[test]
    fn test_back_preserves_payment_fields() {
        let mut wizard = CheckoutWizard::new();
        wizard.submit_shipping(valid_shipping()).unwrap();
        wizard.submit_payment(mobile_payment()).unwrap();

        assert_eq!(wizard.back(), CheckoutStep::Payment);
        assert_eq!(wizard.form().payment, mobile_payment());
        assert_eq!(wizard.form().shipping, valid_shipping());
    }

    #[test]
    fn test_back_from_shipping_is_noop() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(wizard.back(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_back_does_not_revalidate() {
        let mut wizard = CheckoutWizard::new();
        wizard.submit_shipping(valid_shipping()).unwrap();
        let invalid = PaymentDetails {
            mobile_number: String::new(),
            ..mobile_payment()
        };
        assert!(wizard.submit_payment(invalid).is_err());
        assert_eq!(wizard.back(), CheckoutStep::Shipping);
    }

    #[test]
    fn test_fields_for_wrong_step_are_rejected() {
        let mut wizard = CheckoutWizard::new();
        assert_eq!(
            wizard.submit_payment(mobile_payment()),
            Err(StepError::WrongStep {
                expected: CheckoutStep::Payment,
                actual: CheckoutStep::Shipping,
            })
        );
        assert_eq!(wizard.form().payment, PaymentDetails::default());
    }

    #[test]
    fn test_card_debug_redacts_secrets() {
        let card = CardDetails {
            number: "4111 1111 1111 1234".to_string(),
            expiry: "12/29".to_string(),
            cvv: "987".to_string(),
            holder_name: "N SARAH".to_string(),
        };
        let debug = format!("{card:?}");
        assert!(debug.contains("**** 1234"));
        assert!(!debug.contains("987"));
        assert!(!debug.contains("12/29"));
        assert!(!debug.contains("4111"));
    }

    #[test]
    fn test_error_messages() {
        let err = ValidationError::Missing(CheckoutField::FullName);
        assert_eq!(err.to_string(), "Full name is required");

        let err = StepError::Invalid(vec![err]);
        assert_eq!(err.to_string(), "1 field(s) need attention");
    }
}
