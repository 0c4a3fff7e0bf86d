use tracing::debug;

use super::domain::{CriteriaPatch, Doctor, DoctorId};

/// Derive city and specialty criteria from a directly selected doctor.
///
/// Returns `None` for a stale id or for a roster entry missing either field, in
/// which case the criteria are left as they are.
pub fn derive_patch(roster: &[Doctor], selected: &DoctorId) -> Option<CriteriaPatch> {
    let doctor = roster.iter().find(|doctor| &doctor.id == selected)?;

    match (&doctor.city_id, &doctor.speciality_id) {
        (Some(city_id), Some(speciality_id)) => {
            debug!(doctor = %doctor.id, city = %city_id, speciality = %speciality_id, "selection derived criteria");
            Some(CriteriaPatch {
                city_id: city_id.clone(),
                speciality_id: speciality_id.clone(),
            })
        }
        _ => None,
    }
}
