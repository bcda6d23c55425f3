use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::carrier::Country;

/// What a simulated agent works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Tracking,
    Novedades,
    Orders,
    Support,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Working,
    Offline,
}

/// A simulated worker in the agent city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agente {
    pub id: Uuid,
    pub name: String,
    pub role: AgentRole,
    pub district_id: Uuid,
    pub status: AgentStatus,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    pub last_active_at: DateTime<Utc>,
}

impl Agente {
    pub fn new(name: impl Into<String>, role: AgentRole, district_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            role,
            district_id,
            status: AgentStatus::Idle,
            tasks_completed: 0,
            tasks_failed: 0,
            last_active_at: Utc::now(),
        }
    }

    /// Share of finished tasks that succeeded, 1.0 before any work.
    pub fn success_rate(&self) -> f64 {
        let total = self.tasks_completed + self.tasks_failed;
        if total == 0 {
            1.0
        } else {
            self.tasks_completed as f64 / total as f64
        }
    }
}

/// A district groups agents serving one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distrito {
    pub id: Uuid,
    pub name: String,
    pub country: Country,
    pub agent_ids: Vec<Uuid>,
    pub processed: u64,
    /// Rolling efficiency in [0, 1].
    pub efficiency: f64,
    pub created_at: DateTime<Utc>,
}

impl Distrito {
    pub fn new(name: impl Into<String>, country: Country) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            country,
            agent_ids: Vec::new(),
            processed: 0,
            efficiency: 1.0,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut agent = Agente::new("rastreador-1", AgentRole::Tracking, Uuid::new_v4());
        assert!((agent.success_rate() - 1.0).abs() < f64::EPSILON);
        agent.tasks_completed = 3;
        agent.tasks_failed = 1;
        assert!((agent.success_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distrito_roundtrip_keeps_dates() {
        let distrito = Distrito::new("Bogotá Norte", Country::Colombia);
        let json = serde_json::to_string(&distrito).unwrap();
        let back: Distrito = serde_json::from_str(&json).unwrap();
        assert_eq!(back, distrito);
        assert_eq!(back.created_at, distrito.created_at);
    }
}
