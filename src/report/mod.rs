/// 신고/리포트 메일 요청
// region:    --- Imports
use crate::mail::{templates, EmailMessage};
use serde::Deserialize;

// endregion: --- Imports

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: recipient, category, flag, or bodyText.";

/// 요청 본문. 모든 필드가 필요하며 빈 문자열은 누락으로 본다.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEmailRequest {
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub body_text: Option<String>,
}

impl ReportEmailRequest {
    /// 검증 후 메일 생성. 실패 시 누락된 필드 이름 목록을 반환한다.
    pub fn into_message(self, from: &str) -> Result<EmailMessage, Vec<&'static str>> {
        let fields = [
            ("recipient", self.recipient),
            ("category", self.category),
            ("flag", self.flag),
            ("bodyText", self.body_text),
        ];

        let mut missing = Vec::new();
        let mut values = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            match value.filter(|v| !v.is_empty()) {
                Some(v) => values.push(v),
                None => missing.push(name),
            }
        }

        match values.as_slice() {
            [recipient, category, flag, body] if missing.is_empty() => Ok(templates::report(
                from, recipient, category, flag, body,
            )),
            _ => Err(missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> ReportEmailRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn complete_request_builds_message() {
        let message = request(json!({
            "recipient": "ops@x.com",
            "category": "Listing",
            "flag": "Spam",
            "bodyText": "Listing L1 looks like spam",
        }))
        .into_message("noreply@x.com")
        .unwrap();

        assert_eq!(message.to, "ops@x.com");
        assert_eq!(message.subject, "Listing - Spam");
        assert_eq!(message.from, "noreply@x.com");
    }

    #[test]
    fn whitespace_only_field_is_present() {
        let message = request(json!({
            "recipient": "ops@x.com",
            "category": "Listing",
            "flag": " ",
            "bodyText": "see attached",
        }))
        .into_message("noreply@x.com")
        .unwrap();

        assert_eq!(message.subject, "Listing -  ");
    }

    #[test]
    fn blank_and_absent_fields_are_reported() {
        let missing = request(json!({
            "recipient": "ops@x.com",
            "category": "",
            "flag": "Spam",
        }))
        .into_message("noreply@x.com")
        .unwrap_err();

        assert_eq!(missing, vec!["category", "bodyText"]);
    }
}
