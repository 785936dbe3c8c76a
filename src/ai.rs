//! Language model collaborators / 大模型协作组件
//!
//! Two seams around the search core:
//! - [`QueryParser`]: free text -> [`FilterCriteria`]
//! - [`Summarizer`]: matched properties -> short prose
//!
//! [`LlmClient`] talks to an OpenAI-compatible chat completions API (Groq by
//! default). [`StaticAssistant`] is the offline fallback used when no API key
//! is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::models::Property;
use crate::search::FilterCriteria;

pub const NO_MATCH_SUMMARY: &str = "No properties matched your criteria. You could try expanding \
    your search, for example, by increasing your budget or looking in a nearby locality.";

pub const SUMMARY_FALLBACK: &str =
    "I found some properties for you, but I'm having trouble summarizing them at the moment.";

const PARSE_TEMPERATURE: f32 = 0.1;
const SUMMARY_TEMPERATURE: f32 = 0.5;

/// Turns a user message into filter criteria / 将用户消息解析为过滤条件
///
/// Never fails: anything unparseable becomes empty criteria.
#[async_trait]
pub trait QueryParser: Send + Sync {
    async fn parse_query(&self, message: &str) -> FilterCriteria;
}

/// Produces a synopsis of the matched properties / 生成结果摘要
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, message: &str, properties: &[&Property]) -> String;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Projection of a property sent to the summarizer / 发送给摘要模型的精简字段
#[derive(Debug, Serialize, PartialEq)]
pub struct SummaryItem<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub bhk: &'a str,
    pub price: u64,
    pub status: &'a str,
}

pub fn summary_items<'a>(properties: &[&'a Property]) -> Vec<SummaryItem<'a>> {
    properties
        .iter()
        .map(|p| SummaryItem {
            name: &p.project_name,
            address: &p.full_address,
            bhk: &p.unit_type,
            price: p.price,
            status: &p.status,
        })
        .collect()
}

fn parse_prompt(message: &str) -> String {
    format!(
        r#"You extract real estate search filters from a user query and answer with one JSON object.

User query: "{message}"

Fields:
- city (string): the city name.
- bhk (number): bedroom count, e.g. 2BHK -> 2.
- budget (number): the budget as a single integer in Indian Rupees.
  '1.2 Cr' -> 12000000, '50 L' -> 5000000, '90 Lakhs' -> 9000000.
- possessionStatus (string): 'Ready' or 'Under Construction', inferred from phrases
  like 'ready to move' or 'under construction'.
- locality (string): any neighbourhood or area mentioned.

Rules:
1. Include a field only if the user explicitly mentions it.
2. Never fill in default values for fields the user did not mention.
3. Output exactly one valid JSON object.
4. If nothing applies, output {{}}."#
    )
}

fn summary_prompt(message: &str, items_json: &str) -> String {
    format!(
        r#"You are a real estate assistant. A user asked: "{message}"
These properties matched (JSON array):
{items_json}
Write a short summary of 2 to 4 sentences.
Rules:
1. Stay professional and helpful.
2. Use only the data above; do not invent properties or details.
3. Point out one notable trend, such as the most common locality or price band."#
    )
}

/// Decode the parser model's JSON answer / 解析模型返回的JSON
///
/// Only a reply that is not a JSON object at all yields empty criteria;
/// inside an object each field is decoded on its own.
pub fn criteria_from_completion(text: &str) -> FilterCriteria {
    let text = text.trim();
    if text.is_empty() {
        return FilterCriteria::default();
    }
    match serde_json::from_str(text) {
        Ok(criteria) => criteria,
        Err(e) => {
            tracing::error!("Failed to parse filter JSON from model: {} ({})", e, text);
            FilterCriteria::default()
        }
    }
}

/// OpenAI-compatible chat completions client / 大模型客户端
pub struct LlmClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(config: &LlmConfig, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
        })
    }

    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        json_mode: bool,
    ) -> anyhow::Result<Option<String>> {
        let request = CompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system",
                content: prompt,
            }],
            temperature,
            response_format: json_mode.then_some(ResponseFormat { kind: "json_object" }),
        };

        let response: CompletionResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty()))
    }
}

#[async_trait]
impl QueryParser for LlmClient {
    async fn parse_query(&self, message: &str) -> FilterCriteria {
        match self.complete(&parse_prompt(message), PARSE_TEMPERATURE, true).await {
            Ok(Some(text)) => {
                tracing::debug!("Model parse response: {}", text);
                criteria_from_completion(&text)
            }
            Ok(None) => FilterCriteria::default(),
            Err(e) => {
                tracing::error!("Error parsing query with model: {}", e);
                FilterCriteria::default()
            }
        }
    }
}

#[async_trait]
impl Summarizer for LlmClient {
    async fn summarize(&self, message: &str, properties: &[&Property]) -> String {
        if properties.is_empty() {
            return NO_MATCH_SUMMARY.to_string();
        }

        let items_json = match serde_json::to_string(&summary_items(properties)) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize summary payload: {}", e);
                return SUMMARY_FALLBACK.to_string();
            }
        };

        match self
            .complete(&summary_prompt(message, &items_json), SUMMARY_TEMPERATURE, false)
            .await
        {
            Ok(Some(text)) => text.trim().to_string(),
            Ok(None) => SUMMARY_FALLBACK.to_string(),
            Err(e) => {
                tracing::error!("Error generating summary with model: {}", e);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

/// Offline assistant: fixed criteria, count-based summary / 离线助手
#[derive(Debug, Clone, Default)]
pub struct StaticAssistant {
    criteria: FilterCriteria,
}

impl StaticAssistant {
    pub fn new(criteria: FilterCriteria) -> Self {
        Self { criteria }
    }
}

#[async_trait]
impl QueryParser for StaticAssistant {
    async fn parse_query(&self, _message: &str) -> FilterCriteria {
        self.criteria.clone()
    }
}

#[async_trait]
impl Summarizer for StaticAssistant {
    async fn summarize(&self, _message: &str, properties: &[&Property]) -> String {
        match properties.len() {
            0 => NO_MATCH_SUMMARY.to_string(),
            1 => format!("I found 1 property: {}.", properties[0].project_name),
            n => format!("I found {} properties matching your search.", n),
        }
    }
}
