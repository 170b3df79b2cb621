//! Integration tests for the listing wizard with the default rule sets.

use pricing::{PricingEngine, PricingSelection};
use wizard::{
    Draft, FieldPatch, ListingKind, ListingWizard, PhotoFile, RuleValidator, UploadError,
    WizardConfig, WizardError, step,
};

fn patch(pairs: &[(&str, &str)]) -> FieldPatch {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), (*v).into()))
        .collect()
}

fn job_wizard() -> ListingWizard<RuleValidator> {
    ListingWizard::new(
        ListingKind::Job,
        RuleValidator::for_kind(ListingKind::Job),
        WizardConfig::for_kind(ListingKind::Job),
    )
}

fn salon_wizard() -> ListingWizard<RuleValidator> {
    ListingWizard::new(
        ListingKind::Salon,
        RuleValidator::for_kind(ListingKind::Salon),
        WizardConfig::for_kind(ListingKind::Salon),
    )
}

fn jpeg(name: &str) -> PhotoFile {
    PhotoFile::new(name, "image/jpeg", vec![0u8; 128])
}

/// Fills every job step and walks to the payment step.
fn complete_job_steps(w: &mut ListingWizard<RuleValidator>) {
    w.update_draft(patch(&[
        ("title", "Senior Stylist"),
        ("salon_name", "Shear Bliss"),
        ("city", "Austin"),
    ]))
    .unwrap();
    w.advance().unwrap();
    w.update_draft(patch(&[("positions", "2"), ("experience_years", "3")]))
        .unwrap();
    w.advance().unwrap();
    w.update_draft(patch(&[("pay_type", "hourly"), ("pay_min", "22.50")]))
        .unwrap();
    w.advance().unwrap();
    w.update_draft(patch(&[("contact_name", "Dana"), ("contact_phone", "555-0100")]))
        .unwrap();
    w.advance().unwrap();
    w.advance().unwrap();
    w.set_pricing_selection(PricingSelection::new("standard", 3).with_add_on("featured"))
        .unwrap();
    w.advance().unwrap();
}

#[test]
fn test_job_flow_reaches_payment_step() {
    let mut w = job_wizard();
    complete_job_steps(&mut w);

    assert_eq!(w.current_step().unwrap().id.as_str(), step::PAYMENT);
    assert!(w.is_last_step());
    assert!(w.validate_all().is_ok());
}

#[test]
fn test_missing_required_fields_block_advance() {
    let mut w = job_wizard();
    w.update_draft(patch(&[("title", "Barber")])).unwrap();

    let err = w.advance().unwrap_err();

    match err {
        WizardError::Validation(v) => {
            assert_eq!(v.step.as_str(), step::JOB_DETAILS);
            assert!(v.errors.contains_key("salon_name"));
            assert!(v.errors.contains_key("city"));
            assert!(!v.errors.contains_key("title"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(w.current_index(), Some(0));
    assert_eq!(w.field_errors().len(), 2);
}

#[test]
fn test_numeric_rule_on_compensation() {
    let mut w = job_wizard();
    w.update_draft(patch(&[
        ("title", "Barber"),
        ("salon_name", "Fade Co"),
        ("city", "Denver"),
        ("positions", "1"),
        ("pay_type", "salary"),
        ("pay_max", "a lot"),
    ]))
    .unwrap();
    w.advance().unwrap();
    w.advance().unwrap();

    let err = w.advance().unwrap_err();
    assert!(matches!(err, WizardError::Validation(ref v) if v.errors.contains_key("pay_max")));
}

#[test]
fn test_edit_earlier_step_after_jump_back() {
    let mut w = job_wizard();
    complete_job_steps(&mut w);

    w.jump_to(&step::JOB_DETAILS.into()).unwrap();
    w.update_draft(patch(&[("city", " ")])).unwrap();

    assert_eq!(w.furthest_reached(), 6);
    let err = w.validate_all().unwrap_err();
    assert_eq!(err.step.as_str(), step::JOB_DETAILS);
    assert!(err.errors.contains_key("city"));

    assert!(matches!(
        w.jump_to(&step::PAYMENT.into()),
        Err(WizardError::InvalidJump { .. })
    ));
}

#[test]
fn test_back_navigation_preserves_values() {
    let mut w = job_wizard();
    complete_job_steps(&mut w);

    for _ in 0..10 {
        w.retreat().unwrap();
    }

    assert_eq!(w.current_index(), Some(0));
    assert_eq!(w.draft().field("title").unwrap().as_text(), Some("Senior Stylist"));
    assert!(w.draft().pricing_selection().is_some());
}

#[test]
fn test_salon_photos_step_requires_one_photo() {
    let mut w = salon_wizard();
    w.update_draft(patch(&[
        ("salon_name", "Glow"),
        ("address", "1 Main St"),
        ("city", "Reno"),
        ("state", "NV"),
    ]))
    .unwrap();
    w.advance().unwrap();
    w.update_draft(patch(&[("asking_price", "125000"), ("monthly_rent", "3200")]))
        .unwrap();
    w.advance().unwrap();
    w.advance().unwrap();

    assert_eq!(w.current_step().unwrap().id.as_str(), step::PHOTOS);
    assert!(w.advance().is_err());

    w.attach_photos(vec![jpeg("front.jpg")]).unwrap();
    assert_eq!(w.advance().unwrap(), 4);
}

#[test]
fn test_job_photo_limit_is_five() {
    let mut w = job_wizard();
    let files = (0..7).map(|i| jpeg(&format!("{i}.jpg"))).collect();

    let report = w.attach_photos(files).unwrap();

    assert_eq!(report.accepted_count(), 5);
    assert_eq!(report.rejected_count(), 2);
    assert_eq!(
        report.rejected[0].error,
        UploadError::CountExceeded { max: 5 }
    );
}

#[test]
fn test_quote_from_selection() {
    let mut w = job_wizard();
    let engine = PricingEngine::new(ListingKind::Job.catalog());
    assert!(w.quote(&engine).is_none());

    w.set_pricing_selection(
        PricingSelection::new("standard", 6)
            .with_add_on("auto-renew")
            .with_add_on("nationwide"),
    )
    .unwrap();

    let quote = w.quote(&engine).unwrap().unwrap();
    assert_eq!(quote.amount_cents(), 24720);
}

#[test]
fn test_resume_from_template() {
    let draft = Draft::from_fields([
        ("title", "Nail Tech"),
        ("salon_name", "Polished"),
        ("city", "Tampa"),
    ]);
    let (mut w, report) = ListingWizard::resume(
        ListingKind::Job,
        draft,
        RuleValidator::for_kind(ListingKind::Job),
        WizardConfig::for_kind(ListingKind::Job),
    );

    assert_eq!(report.rejected_count(), 0);
    assert_eq!(w.advance().unwrap(), 1);
}

#[test]
fn test_free_listing_submits_after_waiver() {
    let mut w = job_wizard();
    complete_job_steps(&mut w);
    w.set_pricing_selection(PricingSelection::new("free", 1)).unwrap();

    let engine = PricingEngine::new(ListingKind::Job.catalog());
    let quote = w.quote(&engine).unwrap().unwrap();
    w.waive_payment(&quote).unwrap();
    w.complete_submission("JOB-1".into()).unwrap();

    assert!(w.is_submitted());
    assert_eq!(w.retreat(), Err(WizardError::AlreadySubmitted));
}
