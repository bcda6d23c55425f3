use anyhow::Result;

use litper_agents::NovedadesService;
use litper_assistant::{BrainChat, ChatContext};

use crate::state::CliState;

/// Handle the `ask` command: one question to the chat assistant.
pub async fn handle(state: &CliState, message: &str, no_llm: bool) -> Result<()> {
    let shipments = state.load_book().await?.to_vec();
    let novedades = NovedadesService::load(state.store()).await?;

    let assistant = (!no_llm).then(|| state.assistant());
    let mut brain = BrainChat::new(assistant, state.config.max_chat_messages);
    let context = ChatContext {
        shipments: &shipments,
        open_novedades: novedades.open_count(),
        sla_days: state.config.sla_days,
    };

    let reply = brain.respond(message, &context).await;
    println!("{}", reply.reply);
    Ok(())
}
