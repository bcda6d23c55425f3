use std::sync::Arc;

use serde::{Deserialize, Serialize};

use litper_analytics::{DashboardSummary, classify, critical_alerts, delivery_rate};
use litper_parsing::{detect_carrier, fold_accents, is_guide};
use litper_types::Shipment;

use crate::Assistant;
use crate::session::ChatSession;

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatIntent {
    Greeting,
    Help,
    DeliveryRate,
    Critical,
    Carriers,
    GuideLookup,
    Novedades,
    /// Nothing matched; answered by the LLM or a canned reply.
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub intent: ChatIntent,
}

/// Data the chat answers from.
#[derive(Debug, Clone, Copy)]
pub struct ChatContext<'a> {
    pub shipments: &'a [Shipment],
    pub open_novedades: usize,
    pub sla_days: u32,
}

const FALLBACK_REPLY: &str = "No tengo una respuesta para eso todavía. Puedes preguntarme por \
     la tasa de entrega, los envíos críticos, las transportadoras, las novedades \
     o escribir un número de guía.";

const HELP_REPLY: &str = "Puedo ayudarte con:\n\
     • Tasa de entrega y OTIF\n\
     • Envíos críticos y alertas\n\
     • Resumen por transportadora\n\
     • Estado y riesgo de una guía (escribe el número)\n\
     • Novedades abiertas";

/// First token in `message` that looks like a guía.
pub fn find_guide(message: &str) -> Option<String> {
    message
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find(|t| t.chars().any(|c| c.is_ascii_digit()) && is_guide(t))
        .map(str::to_ascii_uppercase)
}

/// Keyword intent detection. Order matters: specific questions win over
/// the greeting that often precedes them.
pub fn classify_intent(message: &str) -> ChatIntent {
    let folded = fold_accents(message);
    let words: Vec<&str> = folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    // Single keywords match word prefixes so "SERVIENTREGA" isn't "ENTREGA".
    let has = |keys: &[&str]| {
        keys.iter().any(|k| {
            if k.contains(' ') {
                folded.contains(*k)
            } else {
                words.iter().any(|w| w.starts_with(*k))
            }
        })
    };

    if find_guide(message).is_some() {
        ChatIntent::GuideLookup
    } else if has(&["NOVEDAD", "INCIDENCIA"]) {
        ChatIntent::Novedades
    } else if has(&["CRITIC", "URGENT", "ALERTA", "RIESGO", "ATRASAD", "RETRASAD"]) {
        ChatIntent::Critical
    } else if has(&["TASA", "EFECTIVIDAD", "PORCENTAJE", "OTIF", "ENTREGAD", "ENTREGA"]) {
        ChatIntent::DeliveryRate
    } else if has(&["TRANSPORTADORA", "CARRIER"]) || detect_carrier(message).is_known() {
        ChatIntent::Carriers
    } else if has(&["AYUDA", "HELP", "QUE PUEDES", "COMANDOS"]) {
        ChatIntent::Help
    } else if has(&["HOLA", "BUENOS DIAS", "BUENAS", "SALUDOS", "HEY"]) {
        ChatIntent::Greeting
    } else {
        ChatIntent::Open
    }
}

/// Rules-first chat over the shipment book, with an optional LLM for
/// questions the rules don't cover.
pub struct BrainChat {
    assistant: Option<Arc<dyn Assistant>>,
    session: ChatSession,
}

impl BrainChat {
    pub fn new(assistant: Option<Arc<dyn Assistant>>, max_messages: usize) -> Self {
        Self {
            assistant,
            session: ChatSession::new(max_messages),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub async fn respond(&mut self, message: &str, ctx: &ChatContext<'_>) -> ChatReply {
        let intent = classify_intent(message);
        let reply = match intent {
            ChatIntent::Greeting => format!(
                "¡Hola! Tengo {} envíos cargados. ¿En qué te ayudo?",
                ctx.shipments.len()
            ),
            ChatIntent::Help => HELP_REPLY.to_string(),
            ChatIntent::DeliveryRate => delivery_rate_reply(ctx),
            ChatIntent::Critical => critical_reply(ctx),
            ChatIntent::Carriers => carriers_reply(ctx),
            ChatIntent::GuideLookup => guide_reply(message, ctx),
            ChatIntent::Novedades => match ctx.open_novedades {
                0 => "No hay novedades abiertas.".to_string(),
                1 => "Hay 1 novedad abierta por gestionar.".to_string(),
                n => format!("Hay {n} novedades abiertas por gestionar."),
            },
            ChatIntent::Open => self.open_reply(message, ctx).await,
        };

        self.session.push_user(message);
        self.session.push_assistant(&reply);
        tracing::debug!(?intent, "chat reply");
        ChatReply { reply, intent }
    }

    async fn open_reply(&self, message: &str, ctx: &ChatContext<'_>) -> String {
        let Some(assistant) = &self.assistant else {
            return FALLBACK_REPLY.to_string();
        };

        let summary = DashboardSummary::compute(ctx.shipments, ctx.sla_days);
        let prompt = format!(
            "Eres el asistente de operaciones logísticas de Litper. Responde en español, \
             breve y concreto.\n\n\
             Datos actuales: {} envíos, tasa de entrega {}%, OTIF {}%, {} críticos, \
             {} con novedad, {} novedades abiertas.\n\n\
             {}\n\
             Pregunta: {message}",
            summary.total,
            summary.delivery_rate,
            summary.otif_rate,
            summary.critical_count,
            summary.issue_count,
            ctx.open_novedades,
            self.session.format_for_prompt(),
        );

        match assistant.ask(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => FALLBACK_REPLY.to_string(),
            Err(e) => {
                tracing::warn!(assistant = assistant.name(), "assistant unavailable: {e}");
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

fn delivery_rate_reply(ctx: &ChatContext<'_>) -> String {
    if ctx.shipments.is_empty() {
        return "Aún no hay envíos cargados.".to_string();
    }
    let summary = DashboardSummary::compute(ctx.shipments, ctx.sla_days);
    format!(
        "La tasa de entrega es {}% ({} de {} envíos). OTIF a {} días: {}%.",
        delivery_rate(ctx.shipments),
        summary.by_status.delivered,
        summary.total,
        ctx.sla_days,
        summary.otif_rate,
    )
}

fn critical_reply(ctx: &ChatContext<'_>) -> String {
    let critical: Vec<_> = critical_alerts(ctx.shipments)
        .into_iter()
        .filter(|a| a.level().is_critical())
        .collect();
    if critical.is_empty() {
        return "No hay envíos críticos en este momento.".to_string();
    }

    let mut out = format!("Hay {} envíos críticos:\n", critical.len());
    for alert in critical.iter().take(5) {
        out.push_str(&format!(
            "• {} ({}) {}\n",
            alert.guide,
            alert.carrier.display_name(),
            alert.risk.reason
        ));
    }
    if critical.len() > 5 {
        out.push_str(&format!("… y {} más.", critical.len() - 5));
    }
    out.trim_end().to_string()
}

fn carriers_reply(ctx: &ChatContext<'_>) -> String {
    let summary = DashboardSummary::compute(ctx.shipments, ctx.sla_days);
    if summary.carriers.is_empty() {
        return "Aún no hay envíos cargados.".to_string();
    }
    let mut out = String::from("Resumen por transportadora:\n");
    for c in &summary.carriers {
        out.push_str(&format!(
            "• {}: {} envíos, {}% entregados, {} críticos\n",
            c.carrier.display_name(),
            c.stats.total,
            c.stats.delivery_rate,
            c.stats.critical
        ));
    }
    out.trim_end().to_string()
}

fn guide_reply(message: &str, ctx: &ChatContext<'_>) -> String {
    let Some(guide) = find_guide(message) else {
        return FALLBACK_REPLY.to_string();
    };
    let Some(shipment) = ctx.shipments.iter().find(|s| s.id == guide) else {
        return format!("No encontré la guía {guide} entre los envíos cargados.");
    };

    let risk = classify(shipment);
    let days = shipment
        .days_in_transit()
        .map(|d| format!(", {d} días en tránsito"))
        .unwrap_or_default();
    format!(
        "Guía {} ({}): {}{}. Riesgo {}: {}. Acción: {}.",
        shipment.id,
        shipment.carrier.display_name(),
        shipment.status,
        days,
        risk.level,
        risk.reason,
        risk.action
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use litper_types::{Carrier, LitperError, Result, ShipmentStatus};

    struct FixedAssistant(Option<&'static str>);

    #[async_trait]
    impl Assistant for FixedAssistant {
        async fn ask(&self, _prompt: &str) -> Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| LitperError::Assistant("offline".into()))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(self.0.is_some())
        }

        fn name(&self) -> &str {
            "FixedAssistant"
        }
    }

    fn shipments() -> Vec<Shipment> {
        vec![
            Shipment::new("240000000001", Carrier::Envia, ShipmentStatus::Delivered),
            Shipment::new("240000000002", Carrier::Tcc, ShipmentStatus::InTransit)
                .with_days_in_transit(10),
        ]
    }

    fn ctx(list: &[Shipment]) -> ChatContext<'_> {
        ChatContext {
            shipments: list,
            open_novedades: 2,
            sla_days: 3,
        }
    }

    #[test]
    fn test_classify_intent() {
        assert_eq!(classify_intent("Hola!"), ChatIntent::Greeting);
        assert_eq!(classify_intent("hola, ¿cuál es la tasa de entrega?"), ChatIntent::DeliveryRate);
        assert_eq!(classify_intent("envíos críticos"), ChatIntent::Critical);
        assert_eq!(classify_intent("¿cómo va Servientrega?"), ChatIntent::Carriers);
        assert_eq!(classify_intent("estado de la guía 240000000002"), ChatIntent::GuideLookup);
        assert_eq!(classify_intent("novedades abiertas"), ChatIntent::Novedades);
        assert_eq!(classify_intent("ayuda"), ChatIntent::Help);
        assert_eq!(classify_intent("qué clima hace"), ChatIntent::Open);
    }

    #[tokio::test]
    async fn test_rule_replies() {
        let list = shipments();
        let mut chat = BrainChat::new(None, 10);

        let reply = chat.respond("tasa de entrega", &ctx(&list)).await;
        assert!(reply.reply.contains("50%"));

        let reply = chat.respond("críticos", &ctx(&list)).await;
        assert!(reply.reply.contains("240000000002"));

        let reply = chat.respond("guía 240000000002", &ctx(&list)).await;
        assert_eq!(reply.intent, ChatIntent::GuideLookup);
        assert!(reply.reply.contains("URGENT"));

        let reply = chat.respond("guía 999999999", &ctx(&list)).await;
        assert!(reply.reply.contains("No encontré"));

        let reply = chat.respond("novedades", &ctx(&list)).await;
        assert!(reply.reply.contains("2 novedades"));
        assert_eq!(chat.session().messages().len(), 10);
    }

    #[tokio::test]
    async fn test_open_question_uses_assistant() {
        let list = shipments();
        let mut chat = BrainChat::new(Some(Arc::new(FixedAssistant(Some("Respuesta del modelo")))), 10);
        let reply = chat.respond("qué clima hace", &ctx(&list)).await;
        assert_eq!(reply.intent, ChatIntent::Open);
        assert_eq!(reply.reply, "Respuesta del modelo");
    }

    #[tokio::test]
    async fn test_open_question_falls_back() {
        let list = shipments();
        let mut offline = BrainChat::new(Some(Arc::new(FixedAssistant(None))), 10);
        assert_eq!(offline.respond("qué clima hace", &ctx(&list)).await.reply, FALLBACK_REPLY);

        let mut none = BrainChat::new(None, 10);
        assert_eq!(none.respond("qué clima hace", &ctx(&list)).await.reply, FALLBACK_REPLY);
    }
}
