use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{medications, patients, users, Id};

pub mod error;
pub mod medication;
pub mod patient;
pub mod user;

/// Populates an empty database with a demo user, a handful of medications and
/// a few patients prescribed those medications.
pub async fn seed_database(db: &DatabaseConnection) -> Result<(), error::Error> {
    let now = Utc::now();

    let admin = users::ActiveModel {
        name: Set("Admin User".to_owned()),
        email: Set("admin@medrecord.local".to_owned()),
        hashed_password: Set(user::generate_hash("admin1234".to_owned())),
        created_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    users::ActiveModel {
        name: Set("Other User".to_owned()),
        email: Set("other@medrecord.local".to_owned()),
        hashed_password: Set(user::generate_hash("other1234".to_owned())),
        created_at: Set(now.into()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for name in ["Aspirin", "Ibuprofen", "Metformin", "Insulin"] {
        medication::create(db, name.to_owned(), admin.id).await?;
    }

    let seeded_patients = [
        ("7501011234", "Ivan", "Petrov", "+359888111222", 181, 84, "Aspirin"),
        ("8202024321", "Elena", "Georgieva", "+359888333444", 165, 58, "Metformin"),
        ("9003035678", "Georgi", "Dimitrov", "+359888555666", 175, 92, "Insulin"),
    ];

    for (days_ago, (ucn, first, last, phone, height, weight, medication)) in
        seeded_patients.into_iter().enumerate()
    {
        patients::ActiveModel {
            ucn: Set(ucn.to_owned()),
            first_name: Set(first.to_owned()),
            last_name: Set(last.to_owned()),
            phone_number: Set(phone.to_owned()),
            height: Set(height),
            weight: Set(weight),
            medication: Set(medication.to_owned()),
            note: Set("Seeded record".to_owned()),
            approved: Set(days_ago % 2 == 0),
            first_continuation: Set(false),
            user_id: Set(admin.id),
            created_at: Set((now - Duration::days(days_ago as i64)).into()),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(())
}
