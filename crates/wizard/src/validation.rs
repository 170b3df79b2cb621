//! Step validation.
//!
//! The wizard consumes a [`ValidationAdapter`] and never inspects field
//! values itself. [`RuleValidator`] is a declarative implementation with
//! default rule sets for each listing type.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::draft::Draft;
use crate::step::{self, ListingKind, Step, StepId};

/// Outcome of validating one step. Empty `errors` means the step passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub errors: BTreeMap<String, String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records a message for a field, keeping the first one reported.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.add(field, message);
        self
    }
}

/// Validates a step against the current draft.
pub trait ValidationAdapter: Send + Sync {
    fn validate(&self, step: &Step, draft: &Draft) -> ValidationResult;
}

impl<F> ValidationAdapter for F
where
    F: Fn(&Step, &Draft) -> ValidationResult + Send + Sync,
{
    fn validate(&self, step: &Step, draft: &Draft) -> ValidationResult {
        self(step, draft)
    }
}

/// A single declarative check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// Field must be present and not blank.
    Required(String),
    /// Field, when present and not blank, must parse as a number.
    Numeric(String),
    /// At least this many photos must be attached.
    MinPhotos(usize),
    /// A pricing selection must be made.
    PricingSelected,
}

pub const PHOTOS_FIELD: &str = "photos";
pub const PRICING_FIELD: &str = "pricing";

impl FieldRule {
    fn check(&self, draft: &Draft, result: &mut ValidationResult) {
        match self {
            FieldRule::Required(field) => {
                if draft.field(field).is_none_or(|v| v.is_blank()) {
                    result.add(field.clone(), "This field is required");
                }
            }
            FieldRule::Numeric(field) => {
                let invalid = draft
                    .field(field)
                    .filter(|v| !v.is_blank())
                    .is_some_and(|v| {
                        v.as_text()
                            .is_none_or(|text| text.trim().parse::<Decimal>().is_err())
                    });
                if invalid {
                    result.add(field.clone(), "Must be a number");
                }
            }
            FieldRule::MinPhotos(min) => {
                if draft.photos().len() < *min {
                    result.add(
                        PHOTOS_FIELD,
                        format!("At least {min} photo(s) required"),
                    );
                }
            }
            FieldRule::PricingSelected => {
                if draft.pricing_selection().is_none() {
                    result.add(PRICING_FIELD, "Choose a listing plan");
                }
            }
        }
    }
}

/// Rule-based [`ValidationAdapter`] keyed by step ID.
///
/// Steps without rules always pass.
#[derive(Debug, Clone, Default)]
pub struct RuleValidator {
    rules: HashMap<StepId, Vec<FieldRule>>,
}

impl RuleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule to a step.
    pub fn rule(mut self, step: impl Into<StepId>, rule: FieldRule) -> Self {
        self.rules.entry(step.into()).or_default().push(rule);
        self
    }

    /// Adds a `Required` rule for each field.
    pub fn required(mut self, step: &str, fields: &[&str]) -> Self {
        for field in fields {
            self = self.rule(step, FieldRule::Required((*field).to_string()));
        }
        self
    }

    /// Adds a `Numeric` rule for each field.
    pub fn numeric(mut self, step: &str, fields: &[&str]) -> Self {
        for field in fields {
            self = self.rule(step, FieldRule::Numeric((*field).to_string()));
        }
        self
    }

    /// Default rules for a listing type.
    pub fn for_kind(kind: ListingKind) -> Self {
        let validator = match kind {
            ListingKind::Job => Self::new()
                .required(step::JOB_DETAILS, &["title", "salon_name", "city"])
                .required(step::REQUIREMENTS, &["positions"])
                .numeric(step::REQUIREMENTS, &["positions", "experience_years"])
                .required(step::COMPENSATION, &["pay_type"])
                .numeric(step::COMPENSATION, &["pay_min", "pay_max"])
                .required(step::CONTACT, &["contact_name", "contact_phone"]),
            ListingKind::Salon => Self::new()
                .required(step::SALON_DETAILS, &["salon_name", "address", "city", "state"])
                .required(step::FINANCIALS, &["asking_price"])
                .numeric(
                    step::FINANCIALS,
                    &["asking_price", "monthly_revenue", "monthly_rent"],
                )
                .rule(step::PHOTOS, FieldRule::MinPhotos(1))
                .required(step::CONTACT, &["contact_name", "contact_email"]),
        };
        validator
            .rule(step::PRICING, FieldRule::PricingSelected)
            .rule(step::PAYMENT, FieldRule::PricingSelected)
    }
}

impl ValidationAdapter for RuleValidator {
    fn validate(&self, step: &Step, draft: &Draft) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in self.rules.get(&step.id).into_iter().flatten() {
            rule.check(draft, &mut result);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::photo::{Photo, PhotoFile};
    use pricing::PricingSelection;

    fn step(id: &str) -> Step {
        Step {
            id: id.into(),
            index: 0,
        }
    }

    #[test]
    fn test_required_rejects_missing_and_blank() {
        let validator = RuleValidator::new().required("s", &["a", "b"]);
        let draft = Draft::from_fields([("b", "  ")]);
        let result = validator.validate(&step("s"), &draft);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.contains_key("a"));
        assert!(result.errors.contains_key("b"));
    }

    #[test]
    fn test_numeric_accepts_numbers_and_skips_absent() {
        let validator = RuleValidator::new().numeric("s", &["price", "rent"]);
        let draft = Draft::from_fields([("price", " 125000.50 ")]);
        assert!(validator.validate(&step("s"), &draft).is_ok());

        let draft = Draft::from_fields([("price", "lots")]);
        let result = validator.validate(&step("s"), &draft);
        assert_eq!(result.errors.get("price").unwrap(), "Must be a number");
    }

    #[test]
    fn test_required_message_wins_over_numeric() {
        let validator = RuleValidator::new()
            .required("s", &["price"])
            .numeric("s", &["price"]);
        let result = validator.validate(&step("s"), &Draft::new());
        assert_eq!(result.errors.get("price").unwrap(), "This field is required");
    }

    #[test]
    fn test_min_photos() {
        let validator = RuleValidator::new().rule("s", FieldRule::MinPhotos(1));
        let mut draft = Draft::new();
        assert!(!validator.validate(&step("s"), &draft).is_ok());

        draft.push_photo(Photo::new(PhotoFile::new("a.jpg", "image/jpeg", vec![1])));
        assert!(validator.validate(&step("s"), &draft).is_ok());
    }

    #[test]
    fn test_pricing_selected() {
        let validator = RuleValidator::for_kind(ListingKind::Job);
        let mut draft = Draft::new();
        let result = validator.validate(&step(step::PRICING), &draft);
        assert!(result.errors.contains_key(PRICING_FIELD));

        draft.set_pricing_selection(PricingSelection::new("free", 1));
        assert!(validator.validate(&step(step::PRICING), &draft).is_ok());
    }

    #[test]
    fn test_steps_without_rules_pass() {
        let validator = RuleValidator::for_kind(ListingKind::Salon);
        assert!(validator.validate(&step(step::AMENITIES), &Draft::new()).is_ok());
    }

    #[test]
    fn test_closures_are_adapters() {
        let adapter = |s: &Step, _: &Draft| {
            if s.index == 0 {
                ValidationResult::ok().with_error("x", "bad")
            } else {
                ValidationResult::ok()
            }
        };
        assert!(!adapter.validate(&step("s"), &Draft::new()).is_ok());
    }
}
