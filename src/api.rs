use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    conversation_id: &'a str,
    message: &'a str,
}

/// Success payload of the answering service.
///
/// The service also returns `sources` and `trace` fields; they are ignored
/// here. A missing or null `answer` decodes as an empty string rather than
/// a transport error; deciding what an empty answer means is the caller's
/// job.
#[derive(Debug, Deserialize)]
pub struct ChatAnswer {
    #[serde(default)]
    pub answer: String,
}

/// HTTP client for the answering service.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Sends one user utterance and returns the service's answer.
    ///
    /// One-shot request/response: no retry, no state held here. Non-2xx
    /// statuses and unparsable bodies come back as errors carrying the
    /// status and whatever body text the service produced.
    pub async fn send(&self, conversation_id: &str, message: &str) -> Result<ChatAnswer> {
        let url = format!("{}/chat", self.base_url);
        let request = ChatRequest {
            conversation_id,
            message,
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if body.trim().is_empty() {
                return Err(anyhow!("assistant service returned HTTP {status}"));
            }
            return Err(anyhow!("assistant service returned HTTP {status}: {body}"));
        }

        let answer: ChatAnswer = response.json().await?;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_matches_the_wire_contract() {
        let request = ChatRequest {
            conversation_id: "abc-123",
            message: "Que faire à Lyon ?",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["conversation_id"], "abc-123");
        assert_eq!(json["message"], "Que faire à Lyon ?");
    }

    #[test]
    fn answer_field_is_extracted() {
        let answer: ChatAnswer =
            serde_json::from_str(r#"{"answer": "Bonjour", "sources": [], "trace": {}}"#).unwrap();
        assert_eq!(answer.answer, "Bonjour");
    }

    #[test]
    fn missing_answer_decodes_as_empty() {
        let answer: ChatAnswer = serde_json::from_str(r#"{"sources": []}"#).unwrap();
        assert_eq!(answer.answer, "");
    }

    #[test]
    fn trailing_slash_in_base_url_is_tolerated() {
        let client = ChatClient::new("http://localhost:8000/");
        assert_eq!(client.base_url, "http://localhost:8000");
    }
}
