//! OmniParser HTTP client.
//!
//! Sends a PNG screenshot (base64 in a JSON body) to an OmniParser server
//! and turns the response into an ordered element list. The server replies
//! with `parsed_content_list` as either plain strings or structured objects;
//! when it is plain strings, per-index coordinates may arrive separately in
//! `label_coordinates` keyed by the stringified index.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::capture::Screenshot;
use crate::element::{BoundingBox, Element};
use crate::error::ParseError;

/// Parser collaborator contract: screenshot in, ordered element list out.
#[async_trait]
pub trait ScreenParser: Send + Sync {
    async fn parse(&self, shot: &Screenshot) -> Result<Vec<Element>, ParseError>;
}

#[derive(Debug, Serialize)]
struct ParseRequest {
    base64_image: String,
}

/// Raw response body from `POST /parse/`.
#[derive(Debug, Deserialize)]
struct ParseResponse {
    parsed_content_list: Vec<ContentEntry>,
    #[serde(default)]
    label_coordinates: HashMap<String, Vec<f64>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentEntry {
    Text(String),
    Structured {
        content: String,
        #[serde(default)]
        bbox: Option<Vec<f64>>,
    },
}

/// Merge content entries and indexed coordinates into elements with
/// zero-based ids in arrival order. A structured entry carries its own
/// bbox; a plain string looks its coordinates up by index. Missing or
/// malformed coordinates leave the bounding box unset, they are not an
/// error.
fn into_elements(response: ParseResponse) -> Vec<Element> {
    let ParseResponse {
        parsed_content_list,
        label_coordinates,
    } = response;

    parsed_content_list
        .into_iter()
        .enumerate()
        .map(|(id, entry)| match entry {
            ContentEntry::Text(content) => Element {
                id,
                content,
                bounding_box: label_coordinates
                    .get(&id.to_string())
                    .and_then(|coords| BoundingBox::from_coords(coords)),
            },
            ContentEntry::Structured { content, bbox } => Element {
                id,
                content,
                bounding_box: bbox.as_deref().and_then(BoundingBox::from_coords),
            },
        })
        .collect()
}

/// OmniParser API client
#[derive(Debug, Clone)]
pub struct OmniParserClient {
    base_url: String,
    client: reqwest::Client,
}

impl OmniParserClient {
    /// Create a new client with the given total request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Check if the OmniParser server is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/probe/", self.base_url);

        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ScreenParser for OmniParserClient {
    async fn parse(&self, shot: &Screenshot) -> Result<Vec<Element>, ParseError> {
        let url = format!("{}/parse/", self.base_url);
        let request = ParseRequest {
            base64_image: shot.to_base64(),
        };

        let resp = self.client.post(&url).json(&request).send().await?;
        if !resp.status().is_success() {
            return Err(ParseError::Status {
                status: resp.status().as_u16(),
            });
        }

        let body: ParseResponse = resp.json().await?;
        let elements = into_elements(body);
        info!(count = elements.len(), "parsed screen elements");
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn response_from(value: serde_json::Value) -> ParseResponse {
        serde_json::from_value(value).unwrap()
    }

    fn test_screenshot() -> Screenshot {
        Screenshot {
            png: vec![1, 2, 3],
            width: 1920,
            height: 1080,
        }
    }

    #[test]
    fn test_string_entries_merge_indexed_coordinates() {
        let response = response_from(json!({
            "parsed_content_list": ["Back", "Forward", "Settings icon"],
            "label_coordinates": { "2": [0.1, 0.2, 0.3, 0.4] }
        }));

        let elements = into_elements(response);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].id, 0);
        assert!(elements[0].bounding_box.is_none());
        assert!(elements[1].bounding_box.is_none());
        assert_eq!(elements[2].id, 2);
        assert_eq!(elements[2].content, "Settings icon");
        assert_eq!(
            elements[2].bounding_box,
            Some(BoundingBox([0.1, 0.2, 0.3, 0.4]))
        );
    }

    #[test]
    fn test_structured_entries_carry_their_own_bbox() {
        let response = response_from(json!({
            "parsed_content_list": [
                { "content": "OK button", "bbox": [0.4, 0.4, 0.6, 0.5], "type": "icon" },
                { "content": "label only" }
            ]
        }));

        let elements = into_elements(response);
        assert_eq!(elements.len(), 2);
        assert_eq!(
            elements[0].bounding_box,
            Some(BoundingBox([0.4, 0.4, 0.6, 0.5]))
        );
        assert!(elements[1].bounding_box.is_none());
    }

    #[test]
    fn test_malformed_coordinates_are_skipped() {
        let response = response_from(json!({
            "parsed_content_list": ["a", "b"],
            "label_coordinates": { "0": [0.1, 0.2], "1": [0.1, 0.2, 0.3, 0.4, 0.5] }
        }));

        let elements = into_elements(response);
        assert!(elements[0].bounding_box.is_none());
        assert!(elements[1].bounding_box.is_none());
    }

    #[tokio::test]
    async fn test_parse_success() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/parse/")
                .json_body_partial(r#"{"base64_image": "AQID"}"#);
            then.status(200).json_body(json!({
                "parsed_content_list": ["Settings icon"],
                "label_coordinates": { "0": [0.1, 0.1, 0.2, 0.2] }
            }));
        });

        let client = OmniParserClient::new(server.base_url(), Duration::from_secs(5));
        let elements = client.parse(&test_screenshot()).await.unwrap();

        mock.assert();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].content, "Settings icon");
        assert_eq!(
            elements[0].bounding_box,
            Some(BoundingBox([0.1, 0.1, 0.2, 0.2]))
        );
    }

    #[tokio::test]
    async fn test_parse_server_error_maps_to_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/parse/");
            then.status(500);
        });

        let client = OmniParserClient::new(server.base_url(), Duration::from_secs(5));
        let err = client.parse(&test_screenshot()).await.unwrap_err();

        match err {
            ParseError::Status { status } => assert_eq!(status, 500),
            other => panic!("expected status error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/probe/");
            then.status(200).json_body(json!({"message": "ready"}));
        });

        let client = OmniParserClient::new(server.base_url(), Duration::from_secs(5));
        assert!(client.health_check().await);
    }
}
