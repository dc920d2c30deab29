use opsdesk::utils::password::hash_password;
#[allow(unused_imports)]
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

#[allow(dead_code)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
}

/// Look up a seeded role by its hierarchy level (1 = Owner .. 5 = Accountant).
pub async fn role_id_for_level(tx: &mut Transaction<'_, Postgres>, level: i16) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM roles WHERE level = $1")
        .bind(level)
        .fetch_one(&mut **tx)
        .await
        .unwrap()
}

/// Create a test user with the role at the given hierarchy level.
pub async fn create_test_user(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
    password: &str,
    level: i16,
) -> TestUser {
    let hashed = hash_password(password).unwrap();
    let role_id = role_id_for_level(tx, level).await;

    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO users (email, password_hash, role_id, is_active, is_owner)
        VALUES ($1, $2, $3, true, $4)
        RETURNING id
        "#,
    )
    .bind(email)
    .bind(&hashed)
    .bind(role_id)
    .bind(level == 1)
    .fetch_one(&mut **tx)
    .await
    .unwrap();

    TestUser {
        id,
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[allow(dead_code)]
pub async fn create_test_department(tx: &mut Transaction<'_, Postgres>, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO departments (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(&mut **tx)
        .await
        .unwrap()
}

#[allow(dead_code)]
pub async fn create_test_employee(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    department_id: Option<Uuid>,
) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO employees (user_id, employee_number, full_name, department_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(format!("EMP-{}", Uuid::new_v4()))
    .bind("Test Employee")
    .bind(department_id)
    .fetch_one(&mut **tx)
    .await
    .unwrap()
}

pub fn generate_unique_email() -> String {
    format!("test-{}@test.com", Uuid::new_v4())
}
