//! Repository for `users` and `user_roles`, as far as the presence board
//! needs them.

use sqlx::PgPool;
use staffboard_core::roles::Actor;
use staffboard_core::types::DbId;

use crate::models::staff::{CreateStaffUser, StaffUser};

/// Users joined with their default office name.
const SELECT: &str = "\
    SELECT u.id, u.email, u.display_name, o.name AS default_location \
    FROM users u \
    LEFT JOIN office_locations o ON o.id = u.default_office_location_id";

pub struct StaffRepo;

impl StaffRepo {
    /// Active users holding a staff role, ordered by display name.
    pub async fn roster(pool: &PgPool) -> Result<Vec<StaffUser>, sqlx::Error> {
        let query = format!(
            "{SELECT} \
             WHERE u.is_active AND EXISTS ( \
                 SELECT 1 FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
                 WHERE ur.user_id = u.id AND r.name <> 'requester') \
             ORDER BY u.display_name ASC, u.id ASC"
        );
        sqlx::query_as::<_, StaffUser>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StaffUser>, sqlx::Error> {
        let query = format!("{SELECT} WHERE u.id = $1");
        sqlx::query_as::<_, StaffUser>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn role_names(pool: &PgPool, user_id: DbId) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT r.name FROM user_roles ur JOIN roles r ON r.id = ur.role_id \
             WHERE ur.user_id = $1 ORDER BY r.name ASC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Load an active user as an [`Actor`] with roles normalized into a set.
    pub async fn find_actor(pool: &PgPool, user_id: DbId) -> Result<Option<Actor>, sqlx::Error> {
        let email = sqlx::query_scalar::<_, String>(
            "SELECT email FROM users WHERE id = $1 AND is_active",
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

        let Some(email) = email else {
            return Ok(None);
        };
        let roles = Self::role_names(pool, user_id).await?;
        Ok(Some(Actor::new(
            user_id,
            email,
            roles.into_iter().map(|r| r.trim().to_lowercase()),
        )))
    }

    /// Insert a user and attach the named roles in one transaction.
    pub async fn create(pool: &PgPool, input: &CreateStaffUser) -> Result<StaffUser, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let id = sqlx::query_scalar::<_, DbId>(
            "INSERT INTO users (email, display_name, default_office_location_id) \
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(&input.email)
        .bind(&input.display_name)
        .bind(input.default_office_location_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) \
             SELECT $1, id FROM roles WHERE name = ANY($2)",
        )
        .bind(id)
        .bind(&input.roles)
        .execute(&mut *tx)
        .await?;

        let query = format!("{SELECT} WHERE u.id = $1");
        let user = sqlx::query_as::<_, StaffUser>(&query)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(user)
    }
}
