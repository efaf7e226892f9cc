use std::sync::Arc;

use molti_orm::{Field, Fields, FindOptions, MemoryBackend, ModelDefinition, Record, Registry, Schema};
use serde_json::json;

/// Hospital-level queries over loaded relationships
trait HospitalRecord {
    fn patient_count(&self) -> usize;
}

impl HospitalRecord for Record {
    fn patient_count(&self) -> usize {
        self.related_many("doctors")
            .unwrap_or_default()
            .iter()
            .map(|doctor| doctor.related_many("patients").map_or(0, |patients| patients.len()))
            .sum()
    }
}

async fn hospital_registry() -> (Arc<MemoryBackend>, Registry) {
    let backend = Arc::new(MemoryBackend::new());
    backend
        .seed("Hospitals", vec![json!({ "name": "St. Elsewhere" }), json!({ "name": "County" })])
        .unwrap();
    backend
        .seed(
            "Doctors",
            vec![
                json!({ "name": "Westphall", "hospitalId": 1 }),
                json!({ "name": "Craig", "hospitalId": 1 }),
                json!({ "name": "Greene", "hospitalId": 2 }),
            ],
        )
        .unwrap();
    backend
        .seed(
            "Patients",
            vec![
                json!({ "name": "P1" }),
                json!({ "name": "P2" }),
                json!({ "name": "P3" }),
                json!({ "name": "P4" }),
                json!({ "name": "P5" }),
            ],
        )
        .unwrap();
    backend
        .seed(
            "DoctorPatients",
            vec![
                json!({ "doctorId": 1, "patientId": 1 }),
                json!({ "doctorId": 1, "patientId": 2 }),
                json!({ "doctorId": 2, "patientId": 3 }),
                json!({ "doctorId": 2, "patientId": 4 }),
                json!({ "doctorId": 3, "patientId": 5 }),
            ],
        )
        .unwrap();

    let registry = Registry::new(backend.clone());
    registry
        .register(ModelDefinition::new(
            "Hospital",
            Schema::new(
                Fields::new()
                    .field("name", Field::string().required())
                    .field("doctors", Field::models().foreign_field("hospitalId")),
            )
            .unwrap(),
        ))
        .unwrap();
    registry
        .register(ModelDefinition::new(
            "Doctor",
            Schema::new(
                Fields::new()
                    .field("name", Field::string())
                    .field("hospital", Field::model().local_field("hospitalId"))
                    .field("patients", Field::models().through("DoctorPatients")),
            )
            .unwrap(),
        ))
        .unwrap();
    registry
        .register(ModelDefinition::new(
            "Patient",
            Schema::new(
                Fields::new()
                    .field("name", Field::string())
                    .field("doctors", Field::models().through("DoctorPatients")),
            )
            .unwrap(),
        ))
        .unwrap();

    (backend, registry)
}

#[tokio::test]
async fn test_hospital_doctors_patients() {
    let (backend, registry) = hospital_registry().await;
    let hospitals = registry.model("Hospital").unwrap();
    backend.reset_query_count();

    let hospital = hospitals
        .find_by_id(1, FindOptions::with(["doctors.patients"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(backend.query_count(), 3);

    let doctors = hospital.related_many("doctors").unwrap();
    assert_eq!(doctors.len(), 2);

    assert_eq!(hospital.patient_count(), 4);

    for doctor in &doctors {
        assert!(doctor.related_one("hospital").unwrap().same(&hospital));
        for patient in doctor.related_many("patients").unwrap() {
            let attending = patient.related_many("doctors").unwrap();
            assert_eq!(attending.len(), 1);
            assert!(attending[0].same(doctor));
        }
    }
}

#[tokio::test]
async fn test_hospital_serializes_without_cycles() {
    let (_, registry) = hospital_registry().await;
    let hospital = registry
        .model("Hospital")
        .unwrap()
        .find_by_id(2, FindOptions::with(["doctors.patients"]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        hospital.to_json(),
        json!({
            "id": 2,
            "name": "County",
            "doctors": [{
                "id": 3,
                "name": "Greene",
                "hospitalId": 2,
                "patients": [{ "id": 5, "name": "P5", "doctors": [] }]
            }]
        })
    );
}
