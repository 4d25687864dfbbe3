use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use tokio_retry::{strategy::FixedInterval, Retry};

lazy_static::lazy_static! {
    pub static ref OpenAIClient: async_openai::Client<OpenAIConfig> = async_openai::Client::build(
        Default::default(),
        OpenAIConfig::new()
            .with_api_key(
                dotenvy::var("OPENAI_API_KEY")
                .expect("Could not find OPENAI_API_KEY in the environment.")
            ),
        Default::default());
}

/// System role for every recipe request; the model answers as a chef.
const SYSTEM_PROMPT: &str =
    "You are a professional chef and nutritionist who creates delicious, healthy recipes.";

fn chat_request(prompt: &str) -> Result<CreateChatCompletionRequest, OpenAIError> {
    CreateChatCompletionRequestArgs::default()
        .model("gpt-4o-mini")
        .messages([
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ])
        .temperature(0.7)
        .max_tokens(1500u32)
        .build()
}

/// Calls the LLM one-shot API with a given prompt.
///
/// Returns the raw message content, or `None` when the completion carried
/// no text; the parse stage decides what that means. Transient transport
/// failures are retried a couple of times with a fixed backoff.
pub async fn call_llm(prompt: &str) -> Result<Option<String>, OpenAIError> {
    let request = chat_request(prompt)?;
    let strategy = FixedInterval::from_millis(500).take(2);
    let response = Retry::start(strategy, move || {
        let request = request.clone();
        async move { OpenAIClient.chat().create(request).await }
    })
    .await?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content))
}
