/// 사용자 레코드와 연락처 조회
/// 연락처가 없어도 파이프라인을 막지 않도록 기본값을 채운다.
// region:    --- Imports
use crate::store::{collections, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

/// 이메일이 없는 사용자에게 사용하는 대체 주소
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";

// region:    --- User Model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    /// 빈 문자열은 없는 값으로 취급
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|e| !e.trim().is_empty())
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.trim().is_empty())
    }
}

/// 메일 본문에 들어가는 이름 + 이메일
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub name: String,
    pub email: String,
}

impl Contact {
    pub fn resolve(user: Option<&User>, default_name: &str) -> Self {
        Self {
            name: user
                .and_then(User::name)
                .unwrap_or(default_name)
                .to_string(),
            email: user
                .and_then(User::email)
                .unwrap_or(UNKNOWN_EMAIL)
                .to_string(),
        }
    }
}
// endregion: --- User Model

// region:    --- Queries
/// 사용자 조회
pub async fn find_user(store: &dyn DocumentStore, user_id: &str) -> Result<Option<User>, StoreError> {
    match store.get(collections::USERS, user_id).await? {
        Some(doc) => Ok(Some(doc.decode()?)),
        None => Ok(None),
    }
}
// endregion: --- Queries

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_gets_defaults() {
        let contact = Contact::resolve(None, "Seller");
        assert_eq!(contact.name, "Seller");
        assert_eq!(contact.email, UNKNOWN_EMAIL);
    }

    #[test]
    fn blank_fields_fall_back_to_defaults() {
        let user = User {
            name: Some("  ".to_string()),
            email: Some(String::new()),
        };
        let contact = Contact::resolve(Some(&user), "Bidder");
        assert_eq!(contact.name, "Bidder");
        assert_eq!(contact.email, UNKNOWN_EMAIL);
    }

    #[test]
    fn present_fields_are_kept() {
        let user = User {
            name: Some("Sam".to_string()),
            email: Some("s@x.com".to_string()),
        };
        assert_eq!(
            Contact::resolve(Some(&user), "Seller"),
            Contact {
                name: "Sam".to_string(),
                email: "s@x.com".to_string(),
            }
        );
    }
}
