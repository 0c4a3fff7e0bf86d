use std::sync::Arc;

use super::common::*;
use crate::workflows::intake::domain::{CityId, CriteriaPatch, DoctorId, Gender, SpecialtyId};
use crate::workflows::intake::session::{apply_event, IntakeError, IntakeEvent, IntakeSession};

fn session() -> IntakeSession {
    IntakeSession::with_today(Arc::new(catalogs()), Arc::new(engine()), today())
}

#[test]
fn new_session_lists_the_whole_roster() {
    let session = session();

    assert_eq!(session.doctors().len(), roster().len());
    assert!(session.criteria().is_unconstrained());
    assert!(session.selected_doctor().is_none());
}

#[test]
fn selecting_a_doctor_derives_city_and_specialty() {
    let mut session = session();

    let outcome = session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("5"))))
        .expect("doctor selectable");

    assert_eq!(
        outcome.patch,
        Some(CriteriaPatch {
            city_id: CityId::new("5"),
            speciality_id: SpecialtyId::new("3"),
        })
    );
    assert_eq!(outcome.criteria.city_id, Some(CityId::new("5")));
    assert_eq!(outcome.criteria.speciality_id, Some(SpecialtyId::new("3")));
    assert_eq!(outcome.criteria.selected_doctor_id, Some(DoctorId::new("5")));
    assert!(ids(&outcome.doctors).contains(&"5"));
    assert_eq!(session.selected_doctor().map(|doctor| doctor.id.as_str()), Some("5"));
}

#[test]
fn reselecting_the_same_doctor_does_not_patch_again() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("5"))))
        .expect("first selection");

    let outcome = session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("5"))))
        .expect("second selection");

    assert!(outcome.patch.is_none());
    assert_eq!(outcome.criteria.selected_doctor_id, Some(DoctorId::new("5")));
}

#[test]
fn user_city_edit_clears_the_selection() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("6"))))
        .expect("doctor selectable");

    let outcome = session
        .dispatch(IntakeEvent::CityEdited(Some(CityId::new("2"))))
        .expect("city edit");

    assert_eq!(outcome.criteria.selected_doctor_id, None);
    assert_eq!(outcome.criteria.city_id, Some(CityId::new("2")));
    assert!(outcome.patch.is_none());
}

#[test]
fn every_user_edit_clears_the_selection() {
    let edits = vec![
        IntakeEvent::BirthDateEdited(Some(date(1990, 1, 1))),
        IntakeEvent::GenderEdited(Some(Gender::Female)),
        IntakeEvent::CityEdited(None),
        IntakeEvent::SpecialtyEdited(Some(SpecialtyId::new("4"))),
    ];

    for edit in edits {
        let mut session = session();
        session
            .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("1"))))
            .expect("doctor selectable");

        let outcome = session.dispatch(edit.clone()).expect("edit applies");

        assert_eq!(outcome.criteria.selected_doctor_id, None, "{edit:?} kept selection");
    }
}

#[test]
fn criteria_patch_keeps_the_selection() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("6"))))
        .expect("doctor selectable");

    let outcome = session
        .dispatch(IntakeEvent::CriteriaPatched(CriteriaPatch {
            city_id: CityId::new("2"),
            speciality_id: SpecialtyId::new("12"),
        }))
        .expect("patch applies");

    assert_eq!(outcome.criteria.selected_doctor_id, Some(DoctorId::new("6")));
    assert_eq!(ids(&outcome.doctors), vec!["3"]);
}

#[test]
fn stale_selection_is_rejected_without_touching_state() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::GenderEdited(Some(Gender::Male)))
        .expect("gender edit");
    let before = session.criteria().clone();

    let err = session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("404"))))
        .expect_err("unknown doctor rejected");

    assert!(matches!(err, IntakeError::UnknownDoctor(id) if id.as_str() == "404"));
    assert_eq!(session.criteria(), &before);
}

#[test]
fn clearing_the_selection_keeps_derived_criteria() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("3"))))
        .expect("doctor selectable");

    let outcome = session
        .dispatch(IntakeEvent::DoctorSelected(None))
        .expect("clear selection");

    assert_eq!(outcome.criteria.selected_doctor_id, None);
    assert_eq!(outcome.criteria.city_id, Some(CityId::new("2")));
    assert_eq!(outcome.criteria.speciality_id, Some(SpecialtyId::new("12")));
}

#[test]
fn incomplete_doctor_selection_leaves_criteria_alone() {
    let mut session = session();

    let outcome = session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("9"))))
        .expect("doctor selectable");

    assert!(outcome.patch.is_none());
    assert_eq!(outcome.criteria.city_id, None);
    assert_eq!(outcome.criteria.selected_doctor_id, Some(DoctorId::new("9")));
    assert_eq!(outcome.doctors.len(), roster().len());
}

#[test]
fn engine_does_not_clear_selection_outside_new_roster() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("3"))))
        .expect("doctor selectable");

    let outcome = session
        .dispatch(IntakeEvent::CriteriaPatched(CriteriaPatch {
            city_id: CityId::new("1"),
            speciality_id: SpecialtyId::new("4"),
        }))
        .expect("patch applies");

    assert_eq!(outcome.criteria.selected_doctor_id, Some(DoctorId::new("3")));
    assert!(!ids(&outcome.doctors).contains(&"3"));
}

#[test]
fn stateless_apply_matches_session_dispatch() {
    let catalogs = catalogs();
    let engine = engine();
    let mut session = session();
    session
        .dispatch(IntakeEvent::BirthDateEdited(Some(date(1995, 1, 1))))
        .expect("birth date edit");

    let event = IntakeEvent::DoctorSelected(Some(DoctorId::new("2")));
    let stateless = apply_event(&catalogs, &engine, session.criteria().clone(), event.clone(), today())
        .expect("stateless apply");
    let stateful = session.dispatch(event).expect("session dispatch");

    assert_eq!(stateless, stateful);
}

#[test]
fn empty_catalogs_still_accept_edits() {
    let mut session = IntakeSession::with_today(
        Arc::new(Default::default()),
        Arc::new(engine()),
        today(),
    );

    let outcome = session
        .dispatch(IntakeEvent::GenderEdited(Some(Gender::Female)))
        .expect("edit applies");

    assert!(outcome.doctors.is_empty());
    assert!(session
        .dispatch(IntakeEvent::DoctorSelected(Some(DoctorId::new("1"))))
        .is_err());
}

#[test]
fn events_round_trip_through_tagged_json() {
    let event: IntakeEvent = serde_json::from_value(serde_json::json!({
        "type": "doctor_selected",
        "value": "5",
    }))
    .expect("event decodes");

    assert_eq!(event, IntakeEvent::DoctorSelected(Some(DoctorId::new("5"))));

    let patch: IntakeEvent = serde_json::from_value(serde_json::json!({
        "type": "criteria_patched",
        "value": { "cityId": 5, "specialityId": "3" },
    }))
    .expect("patch decodes");

    assert_eq!(
        patch,
        IntakeEvent::CriteriaPatched(CriteriaPatch {
            city_id: CityId::new("5"),
            speciality_id: SpecialtyId::new("3"),
        })
    );
}

#[test]
fn blank_event_values_clear_the_field() {
    let cases = [
        ("birth_date_edited", IntakeEvent::BirthDateEdited(None)),
        ("gender_edited", IntakeEvent::GenderEdited(None)),
        ("city_edited", IntakeEvent::CityEdited(None)),
        ("specialty_edited", IntakeEvent::SpecialtyEdited(None)),
        ("doctor_selected", IntakeEvent::DoctorSelected(None)),
    ];

    for (tag, expected) in cases {
        for blank in [serde_json::json!(""), serde_json::Value::Null] {
            let event: IntakeEvent =
                serde_json::from_value(serde_json::json!({ "type": tag, "value": blank }))
                    .unwrap_or_else(|err| panic!("{tag} with {blank} failed: {err}"));
            assert_eq!(event, expected);
        }
    }
}

#[test]
fn clearing_birth_date_over_the_wire_restores_the_roster() {
    let mut session = session();
    session
        .dispatch(IntakeEvent::BirthDateEdited(Some(date(2015, 6, 15))))
        .expect("birth date edit");

    let cleared: IntakeEvent = serde_json::from_value(serde_json::json!({
        "type": "birth_date_edited",
        "value": "",
    }))
    .expect("blank date decodes");
    let outcome = session.dispatch(cleared).expect("clear applies");

    assert_eq!(outcome.criteria.birth_date, None);
    assert_eq!(outcome.doctors.len(), roster().len());
}
