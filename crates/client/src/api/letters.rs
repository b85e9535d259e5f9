//! Letter generation and outgoing email.

use std::collections::BTreeMap;

use reqwest::Method;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap};
use reqwest::multipart::Form;
use tracing::{info, instrument};

use agent_portal_core::Email;

use super::types::{Letter, LetterRequest, LetterText};
use super::{ApiClient, ApiError};

const DEFAULT_DOCUMENT_NAME: &str = "letter.docx";

impl ApiClient<'_> {
    /// Fill a letter template.
    ///
    /// Text templates come back as [`Letter::Text`]; document templates
    /// (offer and confirmation letters) as [`Letter::Document`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, a template field is missing
    /// (400 from the API), or the session is rejected.
    #[instrument(skip(self, template_fields), fields(field_count = template_fields.len()))]
    pub async fn generate_letter(
        &self,
        template_type: &str,
        template_fields: &BTreeMap<String, String>,
    ) -> Result<Letter, ApiError> {
        if template_type.trim().is_empty() {
            return Err(ApiError::InvalidInput("template type is required".to_string()));
        }

        let request = LetterRequest {
            template_type,
            fields: template_fields,
        };
        let response = self
            .execute(
                self.request(Method::POST, "/letters/generate")?
                    .json(&request),
            )
            .await?;

        if is_json(response.headers()) {
            let body = response.bytes().await?;
            let text: LetterText = serde_json::from_slice(&body)
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            return Ok(Letter::Text(text.content));
        }

        let filename = attachment_filename(response.headers())
            .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string());
        let bytes = response.bytes().await?.to_vec();
        info!(%filename, size = bytes.len(), "Letter document generated");
        Ok(Letter::Document { filename, bytes })
    }

    /// Send an email through the API's mail account.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidInput` for a malformed recipient or empty
    /// subject, or an error if the request fails or the session is rejected.
    #[instrument(skip(self, body), fields(subject = %subject))]
    pub async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), ApiError> {
        let to = Email::parse(to).map_err(|e| ApiError::InvalidInput(format!("recipient: {e}")))?;
        if subject.trim().is_empty() {
            return Err(ApiError::InvalidInput("subject is required".to_string()));
        }

        let form = Form::new()
            .text("to", to.into_inner())
            .text("subject", subject.to_string())
            .text("body", body.to_string());

        self.execute(self.request(Method::POST, "/send-email")?.multipart(form))
            .await?;
        info!("Email sent");
        Ok(())
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

/// File name from `Content-Disposition: attachment; filename=...`.
fn attachment_filename(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_DISPOSITION)?.to_str().ok()?;
    value
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        // Final path component only.
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn headers(pairs: &[(reqwest::header::HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_attachment_filename() {
        let map = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename=offer_letter.docx",
        )]);
        assert_eq!(attachment_filename(&map).as_deref(), Some("offer_letter.docx"));

        let map = headers(&[(
            CONTENT_DISPOSITION,
            "attachment; filename=\"../../etc/confirmation_letter.docx\"",
        )]);
        assert_eq!(
            attachment_filename(&map).as_deref(),
            Some("confirmation_letter.docx")
        );

        assert_eq!(attachment_filename(&HeaderMap::new()), None);
    }

    #[test]
    fn test_json_detection() {
        assert!(is_json(&headers(&[(
            CONTENT_TYPE,
            "application/json; charset=utf-8"
        )])));
        assert!(!is_json(&headers(&[(
            CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        )])));
    }
}
