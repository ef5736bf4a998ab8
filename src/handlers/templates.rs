//! Raw passthrough: send any template with caller-supplied data.
use serde_json::{Value, json};

use crate::context::AppContext;
use crate::error::NotifyError;
use crate::http::get_value_in_json;

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRequest {
    pub template: String,
    pub destination: String,
    pub data: Value,
}

/// Accepts `{ "template": ..., "data": ... }` where `data` is an object or a JSON-encoded
/// object string. The destination is `data.email`.
pub fn parse_template_request(body: &Value) -> Result<TemplateRequest, NotifyError> {
    let template: String = get_value_in_json(body, "template")?;
    if template.trim().is_empty() {
        return Err(NotifyError::InvalidRequest("template is required".to_string()));
    }

    let data = match body.get("data") {
        Some(Value::String(encoded)) => serde_json::from_str::<Value>(encoded)
            .map_err(|_| NotifyError::InvalidRequest("data is not valid JSON".to_string()))?,
        Some(value) => value.clone(),
        None => return Err(NotifyError::InvalidRequest("data is required".to_string())),
    };
    if !data.is_object() {
        return Err(NotifyError::InvalidRequest("data must be an object".to_string()));
    }

    let destination = data
        .get("email")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| NotifyError::InvalidRequest("data.email is required".to_string()))?
        .to_string();

    Ok(TemplateRequest {
        template,
        destination,
        data,
    })
}

pub async fn handle_send_template(body: &Value, ctx: &AppContext) -> Result<Value, NotifyError> {
    let request = parse_template_request(body)?;
    let sent = ctx
        .mailer
        .send_template(&request.template, &request.destination, &request.data)
        .await?;
    Ok(json!({ "sent": [sent] }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_encoded_data() {
        let body = json!({
            "template": "contact-us",
            "data": "{\"email\":\"someone@example.com\",\"name\":\"Sam\"}"
        });
        let request = parse_template_request(&body).unwrap();
        assert_eq!(request.template, "contact-us");
        assert_eq!(request.destination, "someone@example.com");
        assert_eq!(request.data["name"], "Sam");
    }

    #[test]
    fn test_parse_object_data() {
        let body = json!({ "template": "contact-us", "data": { "email": "a@example.com" } });
        assert_eq!(parse_template_request(&body).unwrap().destination, "a@example.com");
    }

    #[test]
    fn test_rejects_bad_requests() {
        for body in [
            json!({ "data": { "email": "a@example.com" } }),
            json!({ "template": "t" }),
            json!({ "template": "t", "data": "{not json" }),
            json!({ "template": "t", "data": [1, 2] }),
            json!({ "template": "t", "data": { "name": "no email" } }),
            json!({ "template": " ", "data": { "email": "a@example.com" } }),
        ] {
            let err = parse_template_request(&body).unwrap_err();
            assert_eq!(err.status(), 400, "{}", body);
        }
    }
}
