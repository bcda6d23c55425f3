use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use litper_store::{AGENT_CITY_KEY, KeyValueStore, load_json, save_json};
use litper_types::{AgentRole, AgentStatus, Agente, Country, Distrito, LitperError, Result};

/// Work an agent did during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSample {
    pub completed: u64,
    pub failed: u64,
    pub status: AgentStatus,
}

/// Where the city's synthetic activity comes from.
pub trait MetricsSource: Send + Sync {
    fn sample(&mut self, agent: &Agente) -> TaskSample;
}

/// Random activity from a seedable generator.
pub struct RandomMetrics {
    rng: StdRng,
}

impl RandomMetrics {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl MetricsSource for RandomMetrics {
    fn sample(&mut self, _agent: &Agente) -> TaskSample {
        if self.rng.gen_bool(0.05) {
            return TaskSample {
                status: AgentStatus::Offline,
                ..TaskSample::default()
            };
        }
        let completed = self.rng.gen_range(0..=6);
        let failed = if self.rng.gen_bool(0.2) { self.rng.gen_range(1..=2) } else { 0 };
        let status = if completed + failed > 0 {
            AgentStatus::Working
        } else {
            AgentStatus::Idle
        };
        TaskSample {
            completed,
            failed,
            status,
        }
    }
}

/// Persisted shape of the city.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentCityState {
    pub districts: Vec<Distrito>,
    pub agents: Vec<Agente>,
    pub ticks: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentCityStats {
    pub districts: usize,
    pub agents: usize,
    pub working: usize,
    pub idle: usize,
    pub offline: usize,
    pub tasks_completed: u64,
    pub tasks_failed: u64,
    /// Completed over finished tasks, 1.0 before any work.
    pub success_rate: f64,
    /// Mean district efficiency.
    pub efficiency: f64,
    pub ticks: u64,
}

const DEFAULT_DISTRICTS: [(&str, Country); 4] = [
    ("Bogotá", Country::Colombia),
    ("Medellín", Country::Colombia),
    ("Santiago", Country::Chile),
    ("Quito", Country::Ecuador),
];

const ROLES: [AgentRole; 4] = [
    AgentRole::Tracking,
    AgentRole::Novedades,
    AgentRole::Orders,
    AgentRole::Support,
];

/// Districts of simulated agents whose metrics advance on every tick.
pub struct AgentCity {
    store: Arc<dyn KeyValueStore>,
    metrics: Box<dyn MetricsSource>,
    state: AgentCityState,
}

impl AgentCity {
    /// Load the saved city, or seed a default one with an agent per role
    /// in each district.
    pub async fn load_or_seed(
        store: Arc<dyn KeyValueStore>,
        metrics: Box<dyn MetricsSource>,
    ) -> Result<Self> {
        let state = match load_json::<AgentCityState>(store.as_ref(), AGENT_CITY_KEY).await? {
            Some(state) => state,
            None => {
                let mut state = AgentCityState::default();
                for (name, country) in DEFAULT_DISTRICTS {
                    let mut district = Distrito::new(name, country);
                    for role in ROLES {
                        let agent = Agente::new(format!("{name}-{role:?}").to_lowercase(), role, district.id);
                        district.agent_ids.push(agent.id);
                        state.agents.push(agent);
                    }
                    state.districts.push(district);
                }
                tracing::info!(districts = state.districts.len(), "seeded agent city");
                state
            }
        };

        let city = Self {
            store,
            metrics,
            state,
        };
        city.persist().await?;
        Ok(city)
    }

    pub fn state(&self) -> &AgentCityState {
        &self.state
    }

    pub async fn add_district(&mut self, name: &str, country: Country) -> Result<Distrito> {
        let district = Distrito::new(name.trim(), country);
        self.state.districts.push(district.clone());
        self.persist().await?;
        Ok(district)
    }

    pub async fn add_agent(
        &mut self,
        district_id: Uuid,
        name: &str,
        role: AgentRole,
    ) -> Result<Agente> {
        let district = self
            .state
            .districts
            .iter_mut()
            .find(|d| d.id == district_id)
            .ok_or_else(|| LitperError::InvalidInput(format!("Unknown district {district_id}")))?;
        let agent = Agente::new(name.trim(), role, district_id);
        district.agent_ids.push(agent.id);
        self.state.agents.push(agent.clone());
        self.persist().await?;
        Ok(agent)
    }

    /// Advance every agent by one sample and recompute district efficiency.
    pub async fn tick(&mut self) -> Result<AgentCityStats> {
        let now = Utc::now();
        for agent in &mut self.state.agents {
            let sample = self.metrics.sample(agent);
            agent.status = sample.status;
            agent.tasks_completed += sample.completed;
            agent.tasks_failed += sample.failed;
            if sample.status != AgentStatus::Offline {
                agent.last_active_at = now;
            }
            if let Some(district) = self
                .state
                .districts
                .iter_mut()
                .find(|d| d.id == agent.district_id)
            {
                district.processed += sample.completed + sample.failed;
            }
        }

        for district in &mut self.state.districts {
            let members: Vec<&Agente> = self
                .state
                .agents
                .iter()
                .filter(|a| a.district_id == district.id)
                .collect();
            if !members.is_empty() {
                district.efficiency =
                    members.iter().map(|a| a.success_rate()).sum::<f64>() / members.len() as f64;
            }
        }

        self.state.ticks += 1;
        self.state.updated_at = Some(now);
        self.persist().await?;
        let stats = self.stats();
        tracing::debug!(tick = stats.ticks, working = stats.working, "agent city tick");
        Ok(stats)
    }

    pub fn stats(&self) -> AgentCityStats {
        let mut stats = AgentCityStats {
            districts: self.state.districts.len(),
            agents: self.state.agents.len(),
            ticks: self.state.ticks,
            ..AgentCityStats::default()
        };
        for agent in &self.state.agents {
            match agent.status {
                AgentStatus::Working => stats.working += 1,
                AgentStatus::Idle => stats.idle += 1,
                AgentStatus::Offline => stats.offline += 1,
            }
            stats.tasks_completed += agent.tasks_completed;
            stats.tasks_failed += agent.tasks_failed;
        }
        let finished = stats.tasks_completed + stats.tasks_failed;
        stats.success_rate = if finished == 0 {
            1.0
        } else {
            stats.tasks_completed as f64 / finished as f64
        };
        if !self.state.districts.is_empty() {
            stats.efficiency = self.state.districts.iter().map(|d| d.efficiency).sum::<f64>()
                / self.state.districts.len() as f64;
        }
        stats
    }

    async fn persist(&self) -> Result<()> {
        save_json(self.store.as_ref(), AGENT_CITY_KEY, &self.state).await
    }
}
