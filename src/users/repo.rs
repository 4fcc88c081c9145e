use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::users::repo_types::{NewUser, User, UserChanges, UserFilters};

#[derive(Debug, thiserror::Error)]
pub enum CreateUserError {
    #[error("email or document already exists")]
    Conflict,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lastname, email, password_hash, document, phone,
                   lang, role, reset_token, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_document(db: &PgPool, document: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lastname, email, password_hash, document, phone,
                   lang, role, reset_token, created_at, updated_at
            FROM users
            WHERE document = $1
            "#,
        )
        .bind(document)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_phone(db: &PgPool, phone: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lastname, email, password_hash, document, phone,
                   lang, role, reset_token, created_at, updated_at
            FROM users
            WHERE phone = $1
            "#,
        )
        .bind(phone)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, lastname, email, password_hash, document, phone,
                   lang, role, reset_token, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// A unique-constraint rejection from the store maps to `Conflict` so
    /// racing registrations fail the same way as a pre-checked duplicate.
    pub async fn create(db: &PgPool, candidate: &NewUser) -> Result<User, CreateUserError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, lastname, email, password_hash, document, phone, lang, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, lastname, email, password_hash, document, phone,
                      lang, role, reset_token, created_at, updated_at
            "#,
        )
        .bind(&candidate.name)
        .bind(&candidate.lastname)
        .bind(&candidate.email)
        .bind(&candidate.password_hash)
        .bind(&candidate.document)
        .bind(&candidate.phone)
        .bind(candidate.lang.map(|l| l.as_str()))
        .bind(candidate.role.as_str())
        .fetch_one(db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                CreateUserError::Conflict
            } else {
                CreateUserError::Db(e)
            }
        })?;
        Ok(user)
    }

    /// Applies only the fields present in `changes`.
    pub async fn update(db: &PgPool, id: Uuid, changes: &UserChanges) -> anyhow::Result<User> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(name) = &changes.name {
            qb.push(", name = ").push_bind(name);
        }
        if let Some(lastname) = &changes.lastname {
            qb.push(", lastname = ").push_bind(lastname);
        }
        if let Some(document) = &changes.document {
            qb.push(", document = ").push_bind(document);
        }
        if let Some(phone) = &changes.phone {
            qb.push(", phone = ").push_bind(phone);
        }
        if let Some(lang) = changes.lang {
            qb.push(", lang = ").push_bind(lang.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(
            " RETURNING id, name, lastname, email, password_hash, document, phone, \
             lang, role, reset_token, created_at, updated_at",
        );
        let user = qb.build_query_as::<User>().fetch_one(db).await?;
        Ok(user)
    }

    pub async fn set_reset_token(db: &PgPool, id: Uuid, token: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = $1, updated_at = now() WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn clear_reset_token(db: &PgPool, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET reset_token = '', updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// One page of the user listing. Ordered by (created_at, id) so pages
    /// stay stable under identical filters.
    pub async fn list_page(
        db: &PgPool,
        skip: i64,
        take: i64,
        filters: &UserFilters,
    ) -> anyhow::Result<Vec<User>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT id, name, lastname, email, password_hash, document, phone, \
             lang, role, reset_token, created_at, updated_at FROM users",
        );
        push_filters(&mut qb, filters);
        qb.push(" ORDER BY created_at, id");
        qb.push(" LIMIT ").push_bind(take);
        qb.push(" OFFSET ").push_bind(skip);
        let rows = qb.build_query_as::<User>().fetch_all(db).await?;
        Ok(rows)
    }

    pub async fn count(db: &PgPool, filters: &UserFilters) -> anyhow::Result<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut qb, filters);
        let (count,): (i64,) = qb.build_query_as().fetch_one(db).await?;
        Ok(count)
    }
}

/// Name matches either name or lastname (case-insensitive substring);
/// document and phone are AND'd substring matches on top of that.
fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &UserFilters) {
    let mut sep = " WHERE ";
    if let Some(name) = &filters.name {
        qb.push(sep)
            .push("(name ILIKE ")
            .push_bind(format!("%{name}%"))
            .push(" OR lastname ILIKE ")
            .push_bind(format!("%{name}%"))
            .push(")");
        sep = " AND ";
    }
    if let Some(document) = &filters.document {
        qb.push(sep)
            .push("document LIKE ")
            .push_bind(format!("%{document}%"));
        sep = " AND ";
    }
    if let Some(phone) = &filters.phone {
        qb.push(sep)
            .push("phone LIKE ")
            .push_bind(format!("%{phone}%"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    #[derive(Debug)]
    struct FakeDbError(&'static str);

    impl std::fmt::Display for FakeDbError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "database error {}", self.0)
        }
    }

    impl std::error::Error for FakeDbError {}

    impl sqlx::error::DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violations_are_recognized_by_their_code() {
        let dup = sqlx::Error::Database(Box::new(FakeDbError("23505")));
        assert!(is_unique_violation(&dup));

        let other = sqlx::Error::Database(Box::new(FakeDbError("42P01")));
        assert!(!is_unique_violation(&other));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    fn rendered_sql(filters: &UserFilters) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut qb, filters);
        qb.sql().to_string()
    }

    #[test]
    fn no_filters_means_no_where_clause() {
        assert_eq!(rendered_sql(&UserFilters::default()), "SELECT COUNT(*) FROM users");
    }

    #[test]
    fn name_filter_matches_name_or_lastname() {
        let sql = rendered_sql(&UserFilters {
            name: Some("ana".into()),
            ..Default::default()
        });
        assert!(sql.contains("name ILIKE"));
        assert!(sql.contains("OR lastname ILIKE"));
    }

    #[test]
    fn document_and_phone_filters_are_anded() {
        let sql = rendered_sql(&UserFilters {
            name: Some("ana".into()),
            document: Some("123".into()),
            phone: Some("555".into()),
        });
        assert!(sql.contains("WHERE (name ILIKE"));
        assert!(sql.contains("AND document LIKE"));
        assert!(sql.contains("AND phone LIKE"));
    }
}
