use crate::infra::{load_intake, parse_date, parse_gender, InMemorySubmissionSink};
use appointment_intake::error::AppError;
use appointment_intake::workflows::intake::{
    AppointmentIntakeService, AppointmentRequest, CityId, Doctor, Gender, IntakeEvent,
    IntakeSession, PatientCriteria, ReferenceCatalogs, SpecialtyId, SubmissionServiceError,
};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DoctorLookupArgs {
    /// Patient birth date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) birth_date: Option<NaiveDate>,
    /// Patient gender (male or female)
    #[arg(long, value_parser = parse_gender)]
    pub(crate) gender: Option<Gender>,
    /// City identifier to restrict the roster to
    #[arg(long)]
    pub(crate) city: Option<String>,
    /// Specialty identifier to restrict the roster to
    #[arg(long)]
    pub(crate) specialty: Option<String>,
    /// Evaluation date for the age calculation (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Directory holding cities.json, specialties.json and doctors.json
    #[arg(long)]
    pub(crate) catalog_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date for the session (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Directory holding cities.json, specialties.json and doctors.json
    #[arg(long)]
    pub(crate) catalog_dir: Option<PathBuf>,
    /// Contact email used for the submitted request
    #[arg(long, default_value = "olena.kovalenko@example.org")]
    pub(crate) email: String,
}

pub(crate) async fn run_doctor_lookup(args: DoctorLookupArgs) -> Result<(), AppError> {
    let DoctorLookupArgs {
        birth_date,
        gender,
        city,
        specialty,
        today,
        catalog_dir,
    } = args;

    let (catalogs, engine) = load_intake(catalog_dir).await?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let criteria = PatientCriteria {
        birth_date,
        gender,
        city_id: non_blank(city).map(CityId::new),
        speciality_id: non_blank(specialty).map(SpecialtyId::new),
        selected_doctor_id: None,
    };

    let outcome = engine.evaluate(&catalogs.doctors, &criteria, today);

    println!("Eligible doctors as of {today}");
    if let Some(age) = outcome.age {
        println!("  patient age: {age}");
    }
    for trace in &outcome.applied {
        println!("  {:<12} -> {} remaining", trace.rule.label(), trace.remaining);
    }
    render_roster(&catalogs, &outcome.doctors);
    Ok(())
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        catalog_dir,
        email,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let (catalogs, engine) = load_intake(catalog_dir).await?;
    let engine = Arc::new(engine);
    let mut session = IntakeSession::with_today(catalogs.clone(), engine.clone(), today);

    println!("Appointment intake demo ({today})");
    println!(
        "Loaded {} cities, {} specialties, {} doctors",
        catalogs.cities.len(),
        catalogs.specialties.len(),
        catalogs.doctors.len()
    );

    let birth_date = today
        .checked_sub_months(chrono::Months::new(30 * 12))
        .unwrap_or(today);
    let script = vec![
        IntakeEvent::BirthDateEdited(Some(birth_date)),
        IntakeEvent::GenderEdited(Some(Gender::Female)),
        IntakeEvent::CityEdited(catalogs.cities.first().map(|city| city.id.clone())),
    ];
    for event in script {
        let label = event.label();
        let outcome = session.dispatch(event)?;
        println!("\n{label}: {} doctor(s) eligible", outcome.doctors.len());
        render_roster(&catalogs, &outcome.doctors);
    }

    let Some(choice) = session
        .doctors()
        .iter()
        .find(|doctor| doctor.city_id.is_some() && doctor.speciality_id.is_some())
        .map(|doctor| doctor.id.clone())
    else {
        println!("\nNo doctor available for the scripted patient; nothing to submit.");
        return Ok(());
    };

    let outcome = session.dispatch(IntakeEvent::DoctorSelected(Some(choice)))?;
    if let Some(patch) = &outcome.patch {
        println!(
            "\nSelected doctor fixes city {} and specialty {}",
            catalogs.city_name(&patch.city_id).unwrap_or(patch.city_id.as_str()),
            catalogs
                .specialty_name(&patch.speciality_id)
                .unwrap_or(patch.speciality_id.as_str()),
        );
    }

    let criteria = session.criteria().clone();
    let request = AppointmentRequest {
        name: "Olena Kovalenko".to_string(),
        birth_date: criteria.birth_date,
        gender: criteria.gender,
        city_id: criteria.city_id,
        speciality_id: criteria.speciality_id,
        doctor_id: criteria.selected_doctor_id,
        email: Some(email),
        phone: None,
    };

    let sink = Arc::new(InMemorySubmissionSink::default());
    let service = AppointmentIntakeService::new(catalogs.clone(), (*engine).clone(), sink.clone());
    match service.submit_on(request, today) {
        Ok(submitted) => {
            println!(
                "\nSubmitted {} for {}",
                submitted.request_id.0,
                catalogs.doctor_label(&submitted.doctor)
            );
        }
        Err(SubmissionServiceError::Validation(error)) => {
            println!("\nRequest rejected: {error}");
            for violation in &error.violations {
                println!("  {}: {:?}", violation.field, violation.rule);
            }
        }
        Err(other) => println!("\nRequest not delivered: {other}"),
    }
    println!("Requests held in memory: {}", sink.submissions().len());

    Ok(())
}

/// An empty `--city ""` means "any city", the same as leaving the flag out.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.trim().is_empty())
}

fn render_roster(catalogs: &ReferenceCatalogs, doctors: &[Doctor]) {
    if doctors.is_empty() {
        println!("  (no eligible doctors)");
        return;
    }
    for doctor in doctors {
        let city = doctor
            .city_id
            .as_ref()
            .and_then(|id| catalogs.city_name(id))
            .unwrap_or("unknown city");
        println!("  [{}] {} - {}", doctor.id, catalogs.doctor_label(doctor), city);
    }
}
