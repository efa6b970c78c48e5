//! Per-event orchestration: classify, extract, render, compose, deliver.

use std::future::Future;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::InlineQuery;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::compose::{self, Rendered};
use crate::deeplink;
use crate::event::{BotIdentity, InboundEvent, classify_message};
use crate::extract;
use crate::render::RenderClient;
use crate::transport::Transport;

/// Shared per-process context; no per-event state survives dispatch.
pub struct BotState {
    pub me: BotIdentity,
    pub render: RenderClient,
}

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let Some(event) = classify_message(&msg, &state.me) else {
        return Ok(());
    };
    debug!("Classified update: {:?}", event);

    let candidates = extract::candidates(&event);
    let transport = Transport::new(bot);

    match event {
        InboundEvent::Start {
            chat_id,
            payload: Some(payload),
        } => match deeplink::decode(&payload).filter(|f| !f.is_empty()) {
            Some(formula) => {
                info!("Echoing deep-linked formula ({} chars)", formula.len());
                transport.deliver(chat_id, compose::start_echo(&formula)).await.ok();
            }
            None => warn!("Dropping undecodable /start payload: {payload}"),
        },
        InboundEvent::Start {
            chat_id,
            payload: None,
        } => {
            transport.deliver(chat_id, compose::welcome()).await.ok();
        }
        InboundEvent::Help { chat_id } => {
            transport.deliver(chat_id, compose::help(&state.me)).await.ok();
        }
        InboundEvent::PrivateText {
            chat_id,
            message_id,
            ..
        } => {
            let Some(formula) = candidates.into_iter().next() else {
                return Ok(());
            };
            let rendered = render_one(&state.render, formula).await;
            transport
                .deliver(chat_id, compose::private(message_id, &rendered))
                .await
                .ok();
        }
        InboundEvent::GroupText {
            chat_id,
            message_id,
            ..
        } => {
            if candidates.is_empty() {
                return Ok(());
            }
            info!("Rendering {} group formula(s)", candidates.len());
            let rendered = render_all(&state.render, candidates).await;
            if let Some(reply) = compose::group(message_id, &rendered, &state.me) {
                transport.deliver(chat_id, reply).await.ok();
            }
        }
        // Inline queries arrive through their own dispatcher branch
        InboundEvent::InlineQuery { .. } => {}
    }

    Ok(())
}

pub async fn handle_inline_query(
    bot: Bot,
    query: InlineQuery,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let event = InboundEvent::InlineQuery {
        query: query.query.clone(),
    };
    let transport = Transport::new(bot);

    let rendered = match extract::candidates(&event).into_iter().next() {
        Some(formula) => Some(render_one(&state.render, formula).await),
        None => None,
    };

    let items = compose::inline(rendered.as_ref(), &state.me);
    transport.answer_inline(&query, items).await.ok();
    Ok(())
}

/// A transport or decoding error counts as a failed render.
async fn render_one(client: &RenderClient, formula: String) -> Rendered {
    let image_url = match client.render(&formula).await {
        Ok(url) => url,
        Err(e) => {
            warn!("Render call failed: {e}");
            None
        }
    };
    Rendered { formula, image_url }
}

async fn render_all(client: &RenderClient, formulas: Vec<String>) -> Vec<Rendered> {
    fan_out(formulas, |formula| {
        let client = client.clone();
        async move { render_one(&client, formula).await }
    })
    .await
}

/// Render every candidate concurrently. Results are index-tagged and
/// re-sorted so the output follows the input's span order, whatever order
/// the tasks complete in.
async fn fan_out<F, Fut>(formulas: Vec<String>, render: F) -> Vec<Rendered>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Rendered> + Send + 'static,
{
    let count = formulas.len();
    let mut set = JoinSet::new();
    for (index, formula) in formulas.into_iter().enumerate() {
        let task = render(formula);
        set.spawn(async move { (index, task.await) });
    }

    let mut slots: Vec<Option<Rendered>> = (0..count).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, rendered)) => slots[index] = Some(rendered),
            Err(e) => warn!("Render task failed to join: {e}"),
        }
    }
    slots.into_iter().flatten().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fan_out_keeps_span_order_under_reversed_completion() {
        let formulas: Vec<String> = (0..5).map(|i| format!("f{i}")).collect();

        // Earlier spans sleep longest, so tasks complete in reverse
        let rendered = fan_out(formulas, |formula| async move {
            let index: u64 = formula[1..].parse().unwrap();
            tokio::time::sleep(Duration::from_millis(10 * (5 - index))).await;
            Rendered {
                image_url: Some(format!("https://img.example/{formula}.jpg")),
                formula,
            }
        })
        .await;

        let order: Vec<&str> = rendered.iter().map(|r| r.formula.as_str()).collect();
        assert_eq!(order, ["f0", "f1", "f2", "f3", "f4"]);
    }

    #[tokio::test]
    async fn test_fan_out_keeps_failures_in_position() {
        let formulas: Vec<String> = (0..4).map(|i| format!("f{i}")).collect();

        let rendered = fan_out(formulas, |formula| async move {
            let index: u64 = formula[1..].parse().unwrap();
            tokio::time::sleep(Duration::from_millis(10 * (4 - index))).await;
            let image_url = (index % 2 == 0).then(|| format!("https://img.example/{formula}.jpg"));
            Rendered { formula, image_url }
        })
        .await;

        assert_eq!(rendered.len(), 4);
        assert!(rendered[0].image_url.is_some());
        assert!(rendered[1].image_url.is_none());
        assert!(rendered[2].image_url.is_some());
        assert!(rendered[3].image_url.is_none());
        assert_eq!(rendered[3].formula, "f3");
    }
}
