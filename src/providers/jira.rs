use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{CreatedIssue, IssueTracker, TrackerError};
use crate::config::{ApiVersion, FieldKeys};
use crate::model::credentials::Credentials;
use crate::model::issue::IssuePayload;
use crate::util::adf::text_to_adf;

pub struct JiraTracker {
    base_url: String,
    auth_header: String,
    api_version: ApiVersion,
    fields: FieldKeys,
    client: reqwest::Client,
}

impl JiraTracker {
    pub fn new(
        server: &str,
        credentials: &Credentials,
        api_version: ApiVersion,
        fields: FieldKeys,
    ) -> Self {
        let creds = format!("{}:{}", credentials.username, credentials.secret.expose());
        let encoded = base64::engine::general_purpose::STANDARD.encode(creds);
        Self {
            base_url: server.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {encoded}"),
            api_version,
            fields,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, resource: &str) -> String {
        format!(
            "{}/rest/api/{}/{resource}",
            self.base_url,
            self.api_version.path_segment()
        )
    }
}

/// Build the `fields` object of a create-issue request.
///
/// Custom fields are keyed by the configured ids. Missing row values stay `null`, including
/// inside the reference objects.
pub fn encode_fields(payload: &IssuePayload, keys: &FieldKeys, api_version: ApiVersion) -> Value {
    let description = match (api_version, &payload.description) {
        (ApiVersion::V3, Some(text)) => text_to_adf(text),
        (_, description) => json!(description),
    };

    let mut fields = Map::new();
    fields.insert("project".into(), json!({ "key": payload.project_key }));
    fields.insert("issuetype".into(), json!({ "id": payload.issue_type_id }));
    fields.insert(keys.product_owner.clone(), json!({ "key": payload.product_owner }));
    fields.insert(keys.team.clone(), json!({ "id": payload.team_id }));
    fields.insert(keys.epic.clone(), json!(payload.epic));
    fields.insert("summary".into(), json!(payload.summary));
    fields.insert("description".into(), description);
    fields.insert(keys.acceptance_criteria.clone(), json!(payload.checklist));
    Value::Object(fields)
}

#[derive(Deserialize)]
struct CreateResponse {
    id: String,
    key: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: Map<String, Value>,
}

/// Flatten Jira's `{"errorMessages": [...], "errors": {...}}` body into one line.
fn error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let mut parts = parsed.error_messages;
    parts.extend(parsed.errors.iter().map(|(field, msg)| match msg.as_str() {
        Some(text) => format!("{field}: {text}"),
        None => format!("{field}: {msg}"),
    }));

    if parts.is_empty() {
        body.chars().take(200).collect()
    } else {
        parts.join("; ")
    }
}

/// Which statuses mean the credentials themselves were refused.
#[derive(Clone, Copy)]
enum AuthScope {
    /// `/myself` only answers 401 or 403 for bad credentials.
    Session,
    /// On a create, 403 is a per-project permission refusal and stays a row-level rejection.
    Request,
}

impl AuthScope {
    fn is_unauthorized(self, status: reqwest::StatusCode) -> bool {
        match self {
            AuthScope::Session => {
                status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
            }
            AuthScope::Request => status == reqwest::StatusCode::UNAUTHORIZED,
        }
    }
}

async fn check_status(
    resp: reqwest::Response,
    scope: AuthScope,
) -> Result<reqwest::Response, TrackerError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if scope.is_unauthorized(status) {
        return Err(TrackerError::Unauthorized {
            status: status.as_u16(),
        });
    }
    let body = resp.text().await.unwrap_or_default();
    Err(TrackerError::Rejected {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

fn transport(e: reqwest::Error) -> TrackerError {
    TrackerError::Transport(e.to_string())
}

#[async_trait]
impl IssueTracker for JiraTracker {
    fn name(&self) -> &str {
        "Jira"
    }

    async fn verify(&self) -> Result<(), TrackerError> {
        let resp = self
            .client
            .get(self.api_url("myself"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport)?;
        check_status(resp, AuthScope::Session).await?;
        Ok(())
    }

    async fn create_issue(&self, payload: &IssuePayload) -> Result<CreatedIssue, TrackerError> {
        let body = json!({
            "fields": encode_fields(payload, &self.fields, self.api_version)
        });

        let resp = self
            .client
            .post(self.api_url("issue"))
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let created: CreateResponse = check_status(resp, AuthScope::Request)
            .await?
            .json()
            .await
            .map_err(|e| TrackerError::Decode(e.to_string()))?;

        Ok(CreatedIssue {
            id: created.id,
            key: created.key,
        })
    }
}
