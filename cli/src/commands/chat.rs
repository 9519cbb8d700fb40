use clap::Args;
use mi_coach_core::conversation::ConversationMessage;
use mi_coach_core::health::HealthData;
use serde_json::json;

use crate::util::{api_request, exit_error};

#[derive(Args)]
pub struct ChatArgs {
    /// User message to send (repeat for a multi-turn history, oldest first)
    #[arg(long = "message", short, required = true)]
    messages: Vec<String>,
    /// Skip the self-harm guardrail
    #[arg(long)]
    no_harm_guardrail: bool,
    /// Skip the on-topic guardrail
    #[arg(long)]
    no_mi_check_guardrail: bool,
    /// Give the counsellor the sensing expert tool
    #[arg(long)]
    sensing: bool,
    /// Replace the sensing expert's instructions for this request
    #[arg(long, requires = "sensing")]
    sensing_prompt: Option<String>,
    /// JSON file with device health metrics to attach
    #[arg(long)]
    health_data: Option<String>,
}

pub async fn run(api_url: &str, args: ChatArgs) -> i32 {
    let health = args.health_data.as_deref().map(|path| {
        read_health_data(path).unwrap_or_else(|e| {
            exit_error(
                &e,
                Some("Expected an object like {\"step_count\": 8421, \"sleep_hours\": 6.5}"),
            )
        })
    });

    let body = chat_body(&args, health.as_ref());
    api_request(api_url, reqwest::Method::POST, "/v1/chat", Some(body)).await
}

fn read_health_data(path: &str) -> Result<HealthData, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{path}': {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid health data in '{path}': {e}"))
}

fn chat_body(args: &ChatArgs, health: Option<&HealthData>) -> serde_json::Value {
    let messages: Vec<ConversationMessage> = args
        .messages
        .iter()
        .map(|content| ConversationMessage::user(content.as_str()))
        .collect();

    let mut body = json!({
        "messages": messages,
        "use_harm_guardrail": !args.no_harm_guardrail,
        "use_mi_check_guardrail": !args.no_mi_check_guardrail,
        "use_sensing_agent": args.sensing,
    });
    if let Some(health) = health {
        body["health_data"] = json!(health);
    }
    if let Some(prompt) = &args.sensing_prompt {
        body["sensing_prompt"] = json!(prompt);
    }
    body
}
