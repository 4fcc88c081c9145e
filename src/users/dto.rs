use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;
use crate::i18n::Lang;
use crate::users::repo_types::{Role, User, UserChanges, UserFilters};
use crate::validation::{is_digits_between, len_between};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Outward representation of a user. Built from the row by dropping the
/// password hash and the reset token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub name: String,
    pub lastname: String,
    pub email: String,
    pub document: String,
    pub phone: String,
    pub lang: Option<String>,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            lastname: user.lastname,
            email: user.email,
            document: user.document,
            phone: user.phone,
            lang: user.lang,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Body of GET /users/me.
#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub user: UserDto,
}

/// Body of PUT /users/me.
#[derive(Debug, Deserialize)]
pub struct UpdateMeRequest {
    pub user: UpdateMeUser,
}

/// Allow-listed profile fields. Unknown keys are rejected outright, so
/// role, id and the password hash can never arrive through this path.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateMeUser {
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
    pub lang: Option<Lang>,
}

impl UpdateMeUser {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.lastname.is_none()
            && self.document.is_none()
            && self.phone.is_none()
            && self.lang.is_none()
    }

    /// Trims the supplied fields and drops empty strings, then checks the
    /// remaining values against the profile rules.
    pub fn into_changes(self, lang: Lang) -> Result<UserChanges, ApiError> {
        let non_empty =
            |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        let changes = UserChanges {
            name: non_empty(self.name),
            lastname: non_empty(self.lastname),
            document: non_empty(self.document),
            phone: non_empty(self.phone),
            lang: self.lang,
        };

        let ok = changes.name.as_deref().map_or(true, |v| len_between(v, 2, 25))
            && changes
                .lastname
                .as_deref()
                .map_or(true, |v| len_between(v, 2, 25))
            && changes
                .document
                .as_deref()
                .map_or(true, |v| is_digits_between(v, 7, 15))
            && changes
                .phone
                .as_deref()
                .map_or(true, |v| is_digits_between(v, 7, 15));
        if !ok {
            return Err(ApiError::invalid_payload(lang));
        }
        Ok(changes)
    }
}

/// Raw query params of GET /users. Page and pageSize are clamped to sane
/// values rather than rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub name: Option<String>,
    pub document: Option<String>,
    pub phone: Option<String>,
}

impl ListUsersQuery {
    pub fn page(&self) -> i64 {
        match self.page.as_deref().map(str::parse::<i64>) {
            Some(Ok(page)) if page >= 1 => page,
            _ => 1,
        }
    }

    pub fn page_size(&self) -> i64 {
        match self.page_size.as_deref().map(str::parse::<i64>) {
            Some(Ok(size)) if (1..=MAX_PAGE_SIZE).contains(&size) => size,
            _ => DEFAULT_PAGE_SIZE,
        }
    }

    pub fn filters(&self, lang: Lang) -> Result<UserFilters, ApiError> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(name) = name {
            if !len_between(name, 2, 100) {
                return Err(ApiError::invalid_payload(lang));
            }
        }
        if let Some(document) = self.document.as_deref() {
            if !is_digits_between(document, 1, 15) {
                return Err(ApiError::invalid_payload(lang));
            }
        }
        if let Some(phone) = self.phone.as_deref() {
            if !is_digits_between(phone, 1, 15) {
                return Err(ApiError::invalid_payload(lang));
            }
        }
        Ok(UserFilters {
            name: name.map(str::to_string),
            document: self.document.clone(),
            phone: self.phone.clone(),
        })
    }
}

/// Body of GET /users. `nextPage`/`prevPage` are omitted entirely when
/// there is no such page; callers must treat absence as "no page".
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<UserDto>,
    pub items_total: i64,
    pub page: i64,
    pub total_page: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_page: Option<i64>,
}

impl ListUsersResponse {
    pub fn new(users: Vec<UserDto>, items_total: i64, page: i64, page_size: i64) -> Self {
        let total_page = if items_total == 0 {
            0
        } else {
            (items_total + page_size - 1) / page_size
        };
        Self {
            users,
            items_total,
            page,
            total_page,
            next_page: (page < total_page).then_some(page + 1),
            prev_page: (page > 1).then_some(page - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, page_size: Option<&str>) -> ListUsersQuery {
        ListUsersQuery {
            page: page.map(str::to_string),
            page_size: page_size.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn invalid_page_and_page_size_fall_back_to_defaults() {
        assert_eq!(query(Some("NaN"), Some("-1")).page(), 1);
        assert_eq!(query(Some("NaN"), Some("-1")).page_size(), 10);
        assert_eq!(query(Some("0"), None).page(), 1);
        assert_eq!(query(None, Some("0")).page_size(), 10);
        assert_eq!(query(None, Some("101")).page_size(), 10);
        assert_eq!(query(None, None).page(), 1);
        assert_eq!(query(None, None).page_size(), 10);
    }

    #[test]
    fn valid_page_and_page_size_pass_through() {
        assert_eq!(query(Some("3"), Some("25")).page(), 3);
        assert_eq!(query(Some("3"), Some("25")).page_size(), 25);
        assert_eq!(query(None, Some("100")).page_size(), 100);
    }

    #[test]
    fn middle_page_links_both_neighbours() {
        let res = ListUsersResponse::new(Vec::new(), 25, 2, 10);
        assert_eq!(res.items_total, 25);
        assert_eq!(res.total_page, 3);
        assert_eq!(res.prev_page, Some(1));
        assert_eq!(res.next_page, Some(3));
    }

    #[test]
    fn first_and_last_pages_omit_missing_neighbours() {
        let first = ListUsersResponse::new(Vec::new(), 25, 1, 10);
        assert_eq!(first.prev_page, None);
        assert_eq!(first.next_page, Some(2));

        let last = ListUsersResponse::new(Vec::new(), 25, 3, 10);
        assert_eq!(last.prev_page, Some(2));
        assert_eq!(last.next_page, None);
    }

    #[test]
    fn empty_listing_has_zero_pages_and_no_links() {
        let res = ListUsersResponse::new(Vec::new(), 0, 1, 10);
        assert_eq!(res.total_page, 0);
        assert_eq!(res.prev_page, None);
        assert_eq!(res.next_page, None);
    }

    #[test]
    fn absent_page_links_are_omitted_from_the_json() {
        let res = ListUsersResponse::new(Vec::new(), 5, 1, 10);
        let value = serde_json::to_value(&res).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("nextPage"));
        assert!(!obj.contains_key("prevPage"));
        assert_eq!(obj["itemsTotal"], 5);
        assert_eq!(obj["totalPage"], 1);
    }

    #[test]
    fn update_me_rejects_unknown_fields() {
        let err = serde_json::from_value::<UpdateMeUser>(serde_json::json!({
            "name": "Ana",
            "role": "ADMIN"
        }));
        assert!(err.is_err());

        let err = serde_json::from_value::<UpdateMeUser>(serde_json::json!({
            "passwordHash": "boom"
        }));
        assert!(err.is_err());
    }

    #[test]
    fn update_me_drops_empty_strings_and_keeps_the_rest() {
        let user = UpdateMeUser {
            name: Some("Ana".into()),
            lastname: Some("".into()),
            document: None,
            phone: Some(" 155512345 ".into()),
            lang: None,
        };
        let changes = user.into_changes(Lang::En).unwrap();
        assert_eq!(changes.name.as_deref(), Some("Ana"));
        assert_eq!(changes.lastname, None);
        assert_eq!(changes.document, None);
        assert_eq!(changes.phone.as_deref(), Some("155512345"));
    }

    #[test]
    fn update_me_validates_remaining_fields() {
        let user = UpdateMeUser {
            name: Some("A".into()),
            lastname: None,
            document: None,
            phone: None,
            lang: None,
        };
        assert!(user.into_changes(Lang::En).is_err());

        let user = UpdateMeUser {
            name: None,
            lastname: None,
            document: Some("12a".into()),
            phone: None,
            lang: None,
        };
        assert!(user.into_changes(Lang::En).is_err());
    }

    #[test]
    fn listing_filters_reject_non_numeric_document() {
        let q = ListUsersQuery {
            document: Some("12a".into()),
            ..Default::default()
        };
        assert!(q.filters(Lang::En).is_err());

        let q = ListUsersQuery {
            name: Some("an".into()),
            document: Some("123".into()),
            phone: Some("555".into()),
            ..Default::default()
        };
        let filters = q.filters(Lang::En).unwrap();
        assert_eq!(filters.name.as_deref(), Some("an"));
        assert_eq!(filters.document.as_deref(), Some("123"));
        assert_eq!(filters.phone.as_deref(), Some("555"));
    }

    #[test]
    fn user_dto_never_exposes_hash_or_reset_token() {
        let dto = UserDto {
            id: Uuid::new_v4(),
            name: "Ana".into(),
            lastname: "García".into(),
            email: "ana@example.com".into(),
            document: "12345678".into(),
            phone: "155512345".into(),
            lang: Some("es".into()),
            role: Role::User,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("reset"));
        assert!(json.contains("createdAt"));
    }
}
