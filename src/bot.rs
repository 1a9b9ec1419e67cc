use crate::error::PhishguardError;
use crate::features::FeatureExtractor;
use crate::model::{PhishingModel, Verdict};
use crate::system;
use std::sync::Arc;
use teloxide::prelude::*;

const WELCOME: &str = "Hi, how are you doing?";

/// Everything a message handler needs, constructed once in main and shared
/// read-only across handlers.
pub struct BotDeps {
    pub model: PhishingModel,
    pub extractor: FeatureExtractor,
}

/// Long-poll for messages until the process is killed. Each message is
/// handled statelessly; handler failures are logged and never fatal.
pub async fn run(bot: Bot, deps: Arc<BotDeps>) {
    teloxide::repl(bot, move |bot: Bot, msg: Message| {
        let deps = Arc::clone(&deps);
        async move {
            if let Err(e) = handle_message(&bot, &msg, &deps).await {
                log::error!("message handler failed: {e:#}");
            }
            respond(())
        }
    })
    .await;
}

/// Three independent predicates, no session state, no conversation context.
async fn handle_message(bot: &Bot, msg: &Message, deps: &BotDeps) -> anyhow::Result<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    if text == "/start" || text == "/hello" {
        bot.send_message(msg.chat.id, WELCOME).await?;
    } else if text.eq_ignore_ascii_case("system info") {
        bot.send_message(msg.chat.id, system::system_report().await)
            .await?;
    } else if text.starts_with("http") {
        bot.send_message(msg.chat.id, classify_url(deps, text).await)
            .await?;
    }

    Ok(())
}

/// Build the verdict (or error) reply for a URL-looking message.
pub async fn classify_url(deps: &BotDeps, url: &str) -> String {
    match check_url(deps, url).await {
        Ok(Verdict::Phishing) => {
            format!("🚨 Warning: The URL appears to be a phishing link!\n{url}")
        }
        Ok(Verdict::Safe) => format!("✅ The URL seems safe.\n{url}"),
        Err(e @ PhishguardError::InvalidUrl(_)) => format!("Error: {e}"),
        Err(e) => format!("Error: Unable to process the URL. Details: {e}"),
    }
}

async fn check_url(deps: &BotDeps, url: &str) -> Result<Verdict, PhishguardError> {
    let features = deps.extractor.extract(url).await?;
    deps.model.predict(&features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_age::DomainAgeChecker;
    use crate::features::FEATURE_COLUMNS;

    /// Deps with a hand-weighted model: verdict decided by the bias sign.
    fn deps_with_bias(bias: f64) -> BotDeps {
        let mut model =
            PhishingModel::initial(FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect());
        model.bias = bias;
        BotDeps {
            model,
            extractor: FeatureExtractor::new(DomainAgeChecker::new(10, true)),
        }
    }

    #[tokio::test]
    async fn test_phishing_reply() {
        let deps = deps_with_bias(-50.0);
        let reply = classify_url(&deps, "https://example.com/login").await;
        assert!(reply.contains("phishing"), "reply: {reply}");
        assert!(reply.contains("https://example.com/login"));
    }

    #[tokio::test]
    async fn test_safe_reply() {
        let deps = deps_with_bias(50.0);
        let reply = classify_url(&deps, "https://example.com/login").await;
        assert!(reply.contains("seems safe"), "reply: {reply}");
        assert!(reply.contains("https://example.com/login"));
    }

    #[tokio::test]
    async fn test_invalid_url_reply() {
        let deps = deps_with_bias(0.0);
        let reply = classify_url(&deps, "http://").await;
        assert!(reply.starts_with("Error:"), "reply: {reply}");
        assert!(reply.contains("Invalid URL"), "reply: {reply}");
    }

    #[tokio::test]
    async fn test_schema_mismatch_is_generic_error() {
        let mut deps = deps_with_bias(0.0);
        deps.model.feature_names = vec!["NotARealColumn".to_string()];
        deps.model.weights = vec![0.0];
        let reply = classify_url(&deps, "https://example.com/x").await;
        assert!(reply.contains("Unable to process the URL"), "reply: {reply}");
    }
}
