//! Chat assistant over the demo data set.

use crate::adapters::OpenAiClient;
use crate::core::status::StatusReport;
use crate::domain::model::{ChatMessage, DataSummary, ServiceKind};
use crate::utils::error::Result;

pub const SAMPLE_QUESTIONS: &[&str] = &[
    "Redisに保存されているセッション数を教えて",
    "PostgreSQLの顧客テーブルから東京在住の顧客を検索して",
    "Elasticsearchで「Python」に関する記事を検索して",
    "Qdrantの商品ベクトルから類似商品を見つけて",
    "今日の売上データを分析して",
];

const DATA_SETS: &[(ServiceKind, &str)] = &[
    (ServiceKind::Redis, "セッション管理、カウンタ、検索履歴"),
    (ServiceKind::Postgres, "顧客情報、注文データ、商品カタログ"),
    (ServiceKind::Elasticsearch, "ブログ記事、全文検索"),
    (ServiceKind::Qdrant, "商品ベクトル、推薦システム"),
];

/// One line typed into the chat REPL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatInput {
    Empty,
    Clear,
    Exit,
    Prompt(String),
}

pub fn parse_input(line: &str) -> ChatInput {
    match line.trim() {
        "" => ChatInput::Empty,
        "/clear" => ChatInput::Clear,
        "/exit" | "/quit" => ChatInput::Exit,
        prompt => ChatInput::Prompt(prompt.to_string()),
    }
}

/// Refuses to answer until every service is up, unless `force` is set.
pub fn readiness_gate(status: &StatusReport, force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    status.require(&ServiceKind::ALL)
}

/// Describes the available data to the model, with live figures where known.
pub fn system_prompt(summaries: &[DataSummary]) -> String {
    let data_sets: Vec<String> = DATA_SETS
        .iter()
        .map(|(service, description)| {
            let figures: Vec<String> = summaries
                .iter()
                .find(|s| s.service == *service)
                .map(|summary| {
                    summary
                        .metrics
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect()
                })
                .unwrap_or_default();
            if figures.is_empty() {
                format!("- {}: {}\n", service, description)
            } else {
                format!("- {}: {} ({})\n", service, description, figures.join(", "))
            }
        })
        .collect();

    format!(
        "You are an assistant for a local MCP demo stack. Answer in the language of the question. \
         The following data sets are available:\n{}",
        data_sets.concat()
    )
}

/// Canned answer used when no API key is configured or `--offline` is set.
pub fn demo_response(prompt: &str) -> String {
    let data_sets: String = DATA_SETS
        .iter()
        .map(|(service, description)| format!("- {}: {}\n", service, description))
        .collect();
    format!(
        "🤖 AI Assistant Response\n\n質問: \"{}\"\n\n\
         現在はオフラインモードのため、利用可能なデータについて説明いたします：\n\n📊 利用可能なデータ:\n\
         {}\n💡 現在できること:\n\
         - `mcp-devstack query` で各データベースに直接アクセス\n\
         - `mcp-devstack summary --detailed` でテストデータの確認\n",
        prompt, data_sets
    )
}

pub enum Responder {
    Online(OpenAiClient),
    Offline,
}

pub struct ChatSession {
    responder: Responder,
    system_prompt: String,
    history: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(responder: Responder, system_prompt: String) -> Self {
        Self {
            responder,
            system_prompt,
            history: Vec::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Answers `prompt` in the context of the history; a failed call leaves the history unchanged.
    pub async fn ask(&mut self, prompt: &str) -> Result<String> {
        self.history.push(ChatMessage::user(prompt));

        let answer = match &self.responder {
            Responder::Offline => Ok(demo_response(prompt)),
            Responder::Online(client) => {
                let mut messages = Vec::with_capacity(self.history.len() + 1);
                messages.push(ChatMessage::system(self.system_prompt.clone()));
                messages.extend(self.history.iter().cloned());
                client.complete(&messages).await
            }
        };

        match answer {
            Ok(text) => {
                self.history.push(ChatMessage::assistant(text.clone()));
                Ok(text)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::OpenAiSettings;
    use crate::domain::model::{Role, ServiceStatus};
    use chrono::Local;
    use httpmock::prelude::*;
    use std::time::Duration;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), ChatInput::Empty);
        assert_eq!(parse_input("/clear"), ChatInput::Clear);
        assert_eq!(parse_input("/exit\n"), ChatInput::Exit);
        assert_eq!(
            parse_input(" 売上は？ "),
            ChatInput::Prompt("売上は？".to_string())
        );
    }

    #[test]
    fn test_readiness_gate() {
        let report = StatusReport {
            checked_at: Local::now(),
            statuses: vec![
                ServiceStatus::healthy(ServiceKind::Redis, 1),
                ServiceStatus::healthy(ServiceKind::Postgres, 1),
                ServiceStatus::healthy(ServiceKind::Elasticsearch, 1),
                ServiceStatus::unhealthy(ServiceKind::Qdrant, "Status: 503", 1),
            ],
        };
        assert!(readiness_gate(&report, false).is_err());
        assert!(readiness_gate(&report, true).is_ok());
    }

    #[test]
    fn test_system_prompt_includes_figures() {
        let summaries = vec![DataSummary::new(ServiceKind::Elasticsearch).with("document_count", 5)];
        let prompt = system_prompt(&summaries);
        assert!(prompt.contains("Elasticsearch: ブログ記事、全文検索 (document_count=5)"));
        assert!(prompt.contains("- Qdrant: 商品ベクトル、推薦システム\n"));
    }

    #[tokio::test]
    async fn test_offline_session_keeps_history() {
        let mut session = ChatSession::new(Responder::Offline, String::new());
        let answer = session.ask("セッション数は？").await.unwrap();
        assert!(answer.contains("質問: \"セッション数は？\""));
        assert!(answer.contains("PostgreSQL"));
        assert!(answer.contains("📊 利用可能なデータ:\n- Redis: "));
        assert!(answer.contains("- Qdrant: 商品ベクトル、推薦システム\n\n💡 現在できること"));
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[1].role, Role::Assistant);

        session.clear();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_online_session_sends_system_prompt_and_history() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(
                    r#"{"messages":[{"role":"system","content":"ctx"},{"role":"user","content":"hello"}]}"#,
                );
            then.status(200).json_body(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "hi there"}}]
            }));
        });
        let settings = OpenAiSettings {
            api_key: None,
            base_url: server.url("/v1"),
            model: "gpt-4o-mini".to_string(),
        };
        let client = OpenAiClient::new(&settings, "sk-test", Duration::from_secs(2)).unwrap();

        let mut session = ChatSession::new(Responder::Online(client), "ctx".to_string());
        assert_eq!(session.ask("hello").await.unwrap(), "hi there");
        mock.assert();
    }

    #[tokio::test]
    async fn test_failed_call_does_not_grow_history() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(500).body("boom");
        });
        let settings = OpenAiSettings {
            api_key: None,
            base_url: server.url("/v1"),
            model: "gpt-4o-mini".to_string(),
        };
        let client = OpenAiClient::new(&settings, "sk-test", Duration::from_secs(2)).unwrap();

        let mut session = ChatSession::new(Responder::Online(client), String::new());
        assert!(session.ask("hello").await.is_err());
        assert!(session.history().is_empty());
    }
}
