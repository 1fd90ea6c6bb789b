//! DBpedia Spotlight annotate client and response handling.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::debug;
use url::Url;

use coursegraph_shared::{CourseGraphError, Result, SpotlightConfig, TopicLink};

/// User-Agent string for annotation requests.
const USER_AGENT: &str = concat!("CourseGraph/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What one annotation request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationOutcome {
    /// At least one resource was linked.
    Topics(Vec<TopicLink>),
    /// A valid response that linked nothing.
    NoTopics,
    /// The response could not be decoded.
    Malformed { status: u16, reason: String },
}

/// Anything that turns free text into topic links.
pub trait Annotator {
    /// Annotate `text`. `Err` is reserved for transport failures.
    fn annotate(&self, text: &str) -> impl Future<Output = Result<AnnotationOutcome>>;
}

// ---------------------------------------------------------------------------
// Response schema
// ---------------------------------------------------------------------------

#[derive(Debug, serde::Deserialize)]
struct SpotlightResponse {
    #[serde(rename = "Resources")]
    resources: Option<Vec<SpotlightResource>>,
}

#[derive(Debug, serde::Deserialize)]
struct SpotlightResource {
    #[serde(rename = "@surfaceForm")]
    surface_form: serde_json::Value,
    #[serde(rename = "@URI")]
    uri: String,
}

/// Decode a Spotlight response body.
///
/// Surface forms are lower-cased. A body that is not JSON, or a non-success
/// status, is `Malformed`; a JSON object without `Resources` is `NoTopics`.
pub fn parse_response(status: u16, body: &str) -> AnnotationOutcome {
    if !(200..300).contains(&status) {
        return AnnotationOutcome::Malformed {
            status,
            reason: format!("HTTP {status}"),
        };
    }

    let response: SpotlightResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => {
            return AnnotationOutcome::Malformed {
                status,
                reason: e.to_string(),
            };
        }
    };

    let links: Vec<TopicLink> = response
        .resources
        .unwrap_or_default()
        .into_iter()
        .map(|r| {
            // Numeric surface forms ("2010") arrive as JSON numbers.
            let term = match r.surface_form {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            TopicLink {
                term: term.to_lowercase(),
                uri: r.uri,
            }
        })
        .collect();

    if links.is_empty() {
        AnnotationOutcome::NoTopics
    } else {
        AnnotationOutcome::Topics(links)
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the Spotlight `annotate` endpoint.
#[derive(Debug, Clone)]
pub struct SpotlightClient {
    client: Client,
    endpoint: Url,
}

impl SpotlightClient {
    pub fn new(config: &SpotlightConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            CourseGraphError::config(format!(
                "invalid spotlight endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourseGraphError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Request URL for `text`; the text is URL-encoded into the `text` parameter.
    pub fn request_url(&self, text: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("text", text);
        url
    }
}

impl Annotator for SpotlightClient {
    async fn annotate(&self, text: &str) -> Result<AnnotationOutcome> {
        let url = self.request_url(text);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| CourseGraphError::Network(format!("{}: {e}", self.endpoint)))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            CourseGraphError::Network(format!("{}: body read failed: {e}", self.endpoint))
        })?;

        debug!(status, bytes = body.len(), "spotlight response");
        Ok(parse_response(status, &body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resources_and_lowercases_terms() {
        let body = r#"{"@text":"Cloud","Resources":[{
            "@URI":"http://dbpedia.org/resource/Cloud_computing",
            "@surfaceForm":"Cloud",
            "@similarityScore":"0.99"}]}"#;
        let outcome = parse_response(200, body);
        assert_eq!(
            outcome,
            AnnotationOutcome::Topics(vec![TopicLink {
                term: "cloud".into(),
                uri: "http://dbpedia.org/resource/Cloud_computing".into(),
            }])
        );
    }

    #[test]
    fn missing_resources_key_means_no_topics() {
        let outcome = parse_response(200, r#"{"@text":"nothing to see","@confidence":"0.5"}"#);
        assert_eq!(outcome, AnnotationOutcome::NoTopics);
    }

    #[test]
    fn undecodable_body_is_malformed() {
        let outcome = parse_response(200, "<html>Forbidden</html>");
        assert!(matches!(outcome, AnnotationOutcome::Malformed { status: 200, .. }));
    }

    #[test]
    fn forbidden_status_is_malformed() {
        let outcome = parse_response(403, "");
        assert_eq!(
            outcome,
            AnnotationOutcome::Malformed {
                status: 403,
                reason: "HTTP 403".into()
            }
        );
    }

    #[test]
    fn numeric_surface_form_is_kept() {
        let body =
            r#"{"Resources":[{"@URI":"http://dbpedia.org/resource/2010","@surfaceForm":2010}]}"#;
        match parse_response(200, body) {
            AnnotationOutcome::Topics(links) => assert_eq!(links[0].term, "2010"),
            other => panic!("expected topics, got {other:?}"),
        }
    }

    #[test]
    fn request_url_encodes_text() {
        let client = SpotlightClient::new(&SpotlightConfig::default()).unwrap();
        let url = client.request_url("cloud & grid computing");
        assert!(url.as_str().starts_with("https://api.dbpedia-spotlight.org/en/annotate?text="));
        assert!(!url.as_str().contains(' '));
        let (key, value) = url.query_pairs().next().unwrap();
        assert_eq!(key, "text");
        assert_eq!(value, "cloud & grid computing");
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let config = SpotlightConfig {
            endpoint: "not a url".into(),
            timeout_secs: 5,
        };
        let err = SpotlightClient::new(&config).unwrap_err();
        assert!(matches!(err, CourseGraphError::Config { .. }));
    }

    #[tokio::test]
    async fn annotate_against_mock_server() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/rest/annotate"))
            .and(wiremock::matchers::query_param("text", "Scalability of services"))
            .and(wiremock::matchers::header("accept", "application/json"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"Resources":[{
                    "@URI":"http://dbpedia.org/resource/Scalability",
                    "@surfaceForm":"Scalability"}]}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let config = SpotlightConfig {
            endpoint: format!("{}/rest/annotate", server.uri()),
            timeout_secs: 5,
        };
        let client = SpotlightClient::new(&config).unwrap();
        let outcome = client.annotate("Scalability of services").await.unwrap();

        match outcome {
            AnnotationOutcome::Topics(links) => {
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].term, "scalability");
            }
            other => panic!("expected topics, got {other:?}"),
        }
    }
}
