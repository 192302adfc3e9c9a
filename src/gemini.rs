/// Gemini chat provider
///
/// Streams replies from the `streamGenerateContent` endpoint as server-sent
/// events. Each `data:` line is one JSON chunk carrying a piece of text.
use std::io::{BufRead, BufReader, Read};
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::pages::{ChatMessage, ChatProvider, FragmentStream, Role};

pub struct GeminiClient {
    endpoint: String,
    model: String,
    api_key: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: String,
}

impl GeminiClient {
    pub fn new(config: &ChatConfig, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Build a client with the key from the configured environment variable
    pub fn from_env(config: &ChatConfig) -> Result<Self, ChatError> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(config, key.trim())),
            _ => Err(ChatError::MissingApiKey {
                var: config.api_key_env.clone(),
            }),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.endpoint, self.model
        )
    }
}

/// Request body for one turn
fn request_body(
    history: &[ChatMessage],
    message: &str,
    system_instruction: &str,
) -> serde_json::Value {
    let mut contents: Vec<serde_json::Value> = history
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Model => "model",
            };
            json!({ "role": role, "parts": [{ "text": m.text }] })
        })
        .collect();
    contents.push(json!({ "role": "user", "parts": [{ "text": message }] }));

    json!({
        "system_instruction": { "parts": [{ "text": system_instruction }] },
        "contents": contents,
    })
}

/// Extract the text of one SSE line.
///
/// Returns `None` for lines that carry no data (comments, blank separators,
/// other fields).
pub fn parse_sse_line(line: &str) -> Option<Result<String, ChatError>> {
    let data = line.strip_prefix("data:")?.trim();
    if data.is_empty() || data == "[DONE]" {
        return None;
    }

    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => return Some(Err(ChatError::Decode(e))),
    };

    if let Some(error) = chunk.error {
        return Some(Err(ChatError::Service(error.message)));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    Some(Ok(text))
}

/// Iterator over the text fragments of a streaming response.
///
/// The first chunk is always yielded, even without text, so the reply is
/// announced as soon as the service answers. Later empty chunks are skipped.
struct SseFragments<R: Read> {
    lines: std::io::Lines<BufReader<R>>,
    started: bool,
    done: bool,
}

impl<R: Read> SseFragments<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            started: false,
            done: false,
        }
    }
}

impl<R: Read> Iterator for SseFragments<R> {
    type Item = Result<String, ChatError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for line in self.lines.by_ref() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(ChatError::Stream(e)));
                }
            };

            match parse_sse_line(&line) {
                // Chunks with only metadata carry no text
                Some(Ok(text)) if text.is_empty() && self.started => continue,
                Some(Ok(text)) => {
                    self.started = true;
                    return Some(Ok(text));
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => continue,
            }
        }

        self.done = true;
        None
    }
}

impl ChatProvider for GeminiClient {
    fn send_message_stream(
        &self,
        history: &[ChatMessage],
        message: &str,
        system_instruction: &str,
    ) -> Result<FragmentStream, ChatError> {
        tracing::debug!(
            "[gemini] Sending turn to {} ({} prior messages)",
            self.model,
            history.len()
        );

        let response = ureq::post(&self.url())
            .set("x-goog-api-key", &self.api_key)
            .set("Content-Type", "application/json")
            .timeout(self.timeout)
            .send_json(request_body(history, message, system_instruction));

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                tracing::error!("[gemini] Status {}: {}", code, body);
                return Err(ChatError::Status { code, body });
            }
            Err(e) => {
                tracing::error!("[gemini] Network error: {}", e);
                return Err(ChatError::Request(e.to_string()));
            }
        };

        Ok(Box::new(SseFragments::new(response.into_reader())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_chunk() {
        let line = r#"data: {"candidates":[{"content":{"parts":[{"text":"Are you"},{"text":" a doctor?"}],"role":"model"}}]}"#;
        let text = parse_sse_line(line).unwrap().unwrap();
        assert_eq!(text, "Are you a doctor?");
    }

    #[test]
    fn test_non_data_lines_are_skipped() {
        assert!(parse_sse_line("").is_none());
        assert!(parse_sse_line(": keep-alive").is_none());
        assert!(parse_sse_line("event: message").is_none());
        assert!(parse_sse_line("data: [DONE]").is_none());
    }

    #[test]
    fn test_error_chunk_is_reported() {
        let line = r#"data: {"error":{"code":429,"message":"quota exceeded"}}"#;
        match parse_sse_line(line) {
            Some(Err(ChatError::Service(message))) => assert_eq!(message, "quota exceeded"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_chunk_is_decode_error() {
        assert!(matches!(
            parse_sse_line("data: {not json"),
            Some(Err(ChatError::Decode(_)))
        ));
    }

    #[test]
    fn test_stream_yields_fragments_in_order() {
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Call\"}]}}]}\n",
            "\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\n",
            "\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" the judge\"}]}}]}\n",
        );
        let fragments: Vec<String> = SseFragments::new(body.as_bytes())
            .map(|f| f.unwrap())
            .collect();

        assert_eq!(fragments, vec!["Call", " the judge"]);
    }

    #[test]
    fn test_first_chunk_is_yielded_without_text() {
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"role\":\"model\"}}]}\n",
            "\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Nope.\"}]}}]}\n",
            "\n",
            "data: {\"candidates\":[{\"finishReason\":\"STOP\"}]}\n",
        );
        let fragments: Vec<String> = SseFragments::new(body.as_bytes())
            .map(|f| f.unwrap())
            .collect();

        assert_eq!(fragments, vec!["", "Nope."]);
    }

    #[test]
    fn test_request_body_shape() {
        let history = vec![ChatMessage::user("hi"), ChatMessage::model("fudge")];
        let body = request_body(&history, "more", "be the judge");

        assert_eq!(body["system_instruction"]["parts"][0]["text"], "be the judge");
        assert_eq!(body["contents"].as_array().unwrap().len(), 3);
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "more");
    }

    #[test]
    fn test_url() {
        let client = GeminiClient::new(&ChatConfig::default(), "key");
        assert_eq!(
            client.url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
    }

    #[test]
    fn test_missing_key() {
        let config = ChatConfig {
            api_key_env: "FUDGE_JUDGE_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..ChatConfig::default()
        };
        assert!(matches!(
            GeminiClient::from_env(&config),
            Err(ChatError::MissingApiKey { .. })
        ));
    }
}
