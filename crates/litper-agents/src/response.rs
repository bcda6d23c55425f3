use serde::{Deserialize, Serialize};

use litper_types::Carrier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactChannel {
    Whatsapp,
    Call,
    Sms,
}

/// A step the novedades agent takes to clear an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseAction {
    /// Reach the customer with a prepared message.
    ContactCustomer {
        guide: String,
        channel: ContactChannel,
        message: String,
    },
    /// Confirm the delivery address with the customer.
    VerifyAddress { guide: String },
    /// Ask the carrier for a new delivery attempt.
    Reschedule { guide: String },
    /// Open a review ticket with the carrier.
    RequestCarrierReview { guide: String, carrier: Carrier },
    /// Accept the return and close the order.
    ReturnToSender { guide: String },
    /// Hand the case to a human operator.
    Escalate { guide: String, reason: String },
}

/// An ordered plan of response actions with a justification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePlan {
    pub actions: Vec<ResponseAction>,
    pub justification: String,
}

impl ResponsePlan {
    pub fn new(justification: impl Into<String>) -> Self {
        Self {
            actions: Vec::new(),
            justification: justification.into(),
        }
    }

    pub fn with_action(mut self, action: ResponseAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn add_action(&mut self, action: ResponseAction) {
        self.actions.push(action);
    }

    pub fn escalates(&self) -> bool {
        self.actions
            .iter()
            .any(|a| matches!(a, ResponseAction::Escalate { .. }))
    }
}
