//! Minimal client for the Gemini REST API. Only the two calls this
//! service needs are implemented: generating content and listing
//! models.

use anyhow::{Error, Result, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::ai::models::{GenerationRequest, Part};

pub const DEFAULT_API_HOSTNAME: &str = "https://generativelanguage.googleapis.com";

const API_VERSION: &str = "v1beta";

// Largest page the models endpoint allows
const PAGE_SIZE: &str = "1000";

// {
//   "candidates": [
//     {
//       "content": {
//         "parts": [{"text": "{\"actions\": []}"}],
//         "role": "model"
//       },
//       "finishReason": "STOP"
//     }
//   ]
// }
#[derive(Deserialize, Debug, Default)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
pub struct ResponsePart {
    pub text: Option<String>,
    // Set on reasoning parts that aren't part of the answer
    #[serde(default)]
    pub thought: bool,
}

impl GenerateContentResponse {
    /// Text of the first candidate with all of its answer parts
    /// joined. Empty when the model returned no text at all.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|part| !part.thought)
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn supports_generate_content(&self) -> bool {
        self.supported_generation_methods
            .iter()
            .any(|method| method == "generateContent")
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize, Debug)]
struct ApiErrorDetail {
    message: String,
}

/// Model names in URLs are always `models/<id>`, accept either form.
pub fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

fn request_payload(request: &GenerationRequest) -> Value {
    let parts: Vec<Value> = request
        .parts
        .iter()
        .map(|part| match part {
            Part::Text(text) => json!({ "text": text }),
            Part::InlineData(image) => json!({
                "inlineData": {
                    "mimeType": image.mime_type,
                    "data": image.to_base64(),
                }
            }),
        })
        .collect();

    json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
        "generationConfig": {
            "temperature": request.temperature,
            "responseMimeType": request.response_mime_type,
        },
    })
}

async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        // Prefer the API's own error message over the raw body
        let message = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|resp| resp.error.message)
            .unwrap_or(body);
        bail!("Gemini API returned {}: {}", status, message);
    }
    Ok(response.json().await?)
}

/// Send a single `generateContent` request and return the reply text.
pub async fn generate_content(
    client: &reqwest::Client,
    api_hostname: &str,
    api_key: &str,
    model: &str,
    request: &GenerationRequest,
) -> Result<String, Error> {
    let url = format!(
        "{}/{}/{}:generateContent",
        api_hostname.trim_end_matches("/"),
        API_VERSION,
        model_path(model)
    );
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(&request_payload(request))
        .send()
        .await?;

    let resp: GenerateContentResponse = parse_response(response).await?;
    if let Some(reason) = resp.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
        tracing::debug!("Gemini finish reason: {}", reason);
    }

    Ok(resp.text())
}

/// List every model available to the API key, following pagination.
pub async fn list_models(
    client: &reqwest::Client,
    api_hostname: &str,
    api_key: &str,
) -> Result<Vec<ModelInfo>, Error> {
    let url = format!("{}/{}/models", api_hostname.trim_end_matches("/"), API_VERSION);
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let mut req = client
            .get(&url)
            .header("x-goog-api-key", api_key)
            .query(&[("pageSize", PAGE_SIZE)]);
        if let Some(token) = &page_token {
            req = req.query(&[("pageToken", token)]);
        }
        let page: ListModelsResponse = parse_response(req.send().await?).await?;
        models.extend(page.models);

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::models::{JSON_MIME_TYPE, TEMPERATURE, UserImage};
    use mockito::Matcher;

    fn request(parts: Vec<Part>) -> GenerationRequest {
        GenerationRequest {
            parts,
            temperature: TEMPERATURE,
            response_mime_type: JSON_MIME_TYPE.to_string(),
        }
    }

    #[test]
    fn it_normalizes_model_paths() {
        assert_eq!(model_path("gemini-2.5-flash"), "models/gemini-2.5-flash");
        assert_eq!(
            model_path("models/gemini-flash-latest"),
            "models/gemini-flash-latest"
        );
    }

    #[test]
    fn it_joins_answer_parts_of_the_first_candidate() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                {"content": {"parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "{\"actions\":"},
                    {"text": "[]}"}
                ]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(resp.text(), "{\"actions\":[]}");

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), "");
    }

    #[tokio::test]
    async fn it_generates_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "test-key")
            .match_body(Matcher::PartialJson(json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"text": "hello"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "AQID"}}
                    ]
                }],
                "generationConfig": {"responseMimeType": "application/json"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"{\"actions\":[]}"}],"role":"model"},"finishReason":"STOP"}]}"#)
            .create_async()
            .await;

        let req = request(vec![
            Part::Text(String::from("hello")),
            Part::InlineData(UserImage::jpeg(vec![1, 2, 3])),
        ]);
        let text = generate_content(
            &reqwest::Client::new(),
            &server.url(),
            "test-key",
            "gemini-2.5-flash",
            &req,
        )
        .await
        .unwrap();

        assert_eq!(text, "{\"actions\":[]}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn it_reports_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#)
            .create_async()
            .await;

        let err = generate_content(
            &reqwest::Client::new(),
            &server.url(),
            "test-key",
            "gemini-2.5-flash",
            &request(vec![Part::Text(String::from("hello"))]),
        )
        .await
        .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("429"), "{}", msg);
        assert!(msg.contains("Resource has been exhausted"), "{}", msg);
    }

    #[tokio::test]
    async fn it_lists_models_across_pages() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", "/v1beta/models")
            .match_query(Matcher::Regex("^pageSize=1000$".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "models": [
                        {"name": "models/gemini-2.5-flash", "displayName": "Gemini 2.5 Flash", "supportedGenerationMethods": ["generateContent", "countTokens"]},
                        {"name": "models/text-embedding-004", "supportedGenerationMethods": ["embedContent"]}
                    ],
                    "nextPageToken": "page-2"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/v1beta/models")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageSize".into(), "1000".into()),
                Matcher::UrlEncoded("pageToken".into(), "page-2".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "models": [
                        {"name": "models/gemini-flash-latest", "supportedGenerationMethods": ["generateContent"]}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let models = list_models(&reqwest::Client::new(), &server.url(), "test-key")
            .await
            .unwrap();

        let names: Vec<&str> = models
            .iter()
            .filter(|m| m.supports_generate_content())
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(models.len(), 3);
        assert_eq!(
            names,
            vec!["models/gemini-2.5-flash", "models/gemini-flash-latest"]
        );
        first.assert_async().await;
        second.assert_async().await;
    }
}
