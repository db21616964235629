use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type AgentId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    /// Role label shown by the renderer.
    pub position: String,
    pub activities: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster must contain at least one agent")]
    Empty,
    #[error("duplicate agent id {id}")]
    DuplicateId { id: AgentId },
    #[error("agent {id} ('{name}') has no activities")]
    NoActivities { id: AgentId, name: String },
    #[error("failed to parse roster json at {path}: {message}")]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    agents: Vec<Agent>,
}

impl Roster {
    pub fn new(agents: Vec<Agent>) -> Result<Self, RosterError> {
        if agents.is_empty() {
            return Err(RosterError::Empty);
        }
        let mut seen = HashSet::with_capacity(agents.len());
        for agent in &agents {
            if !seen.insert(agent.id) {
                return Err(RosterError::DuplicateId { id: agent.id });
            }
            if agent.activities.is_empty() {
                return Err(RosterError::NoActivities {
                    id: agent.id,
                    name: agent.name.clone(),
                });
            }
        }
        Ok(Self { agents })
    }

    /// Parses a JSON array of agents and validates it.
    pub fn from_json_str(raw: &str) -> Result<Self, RosterError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let agents = serde_path_to_error::deserialize::<_, Vec<Agent>>(&mut deserializer)
            .map_err(|error| RosterError::Parse {
                path: error.path().to_string(),
                message: error.into_inner().to_string(),
            })?;
        Self::new(agents)
    }

    /// The four bank employees of the default scene.
    pub fn bank_staff() -> Self {
        let agents = BANK_STAFF
            .iter()
            .map(|(id, name, position, activities, phrases)| Agent {
                id: *id,
                name: name.to_string(),
                position: position.to_string(),
                activities: activities.iter().map(|text| text.to_string()).collect(),
                phrases: phrases.iter().map(|text| text.to_string()).collect(),
            })
            .collect();
        Self::new(agents).expect("built-in bank staff roster is valid")
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::bank_staff()
    }
}

type StaffRow = (
    AgentId,
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [&'static str],
);

const BANK_STAFF: &[StaffRow] = &[
    (
        1,
        "Don Roberto",
        "Branch Manager",
        &[
            "Approving loan",
            "Denying credit",
            "Reviewing collateral",
            "Counting cash",
            "Sighing dramatically",
            "Checking documents",
        ],
        &["¡Ay, Dios mío!", "¡Por favor!", "Processing...", "¡Increíble!"],
    ),
    (
        2,
        "Doña Carmen",
        "Head Teller",
        &[
            "Serving customer",
            "Counting coins",
            "Stamping forms",
            "Tidying cash drawer",
            "Checking banknotes",
            "Typing figures",
        ],
        &["¡Corazón mío!", "Calculating...", "¡Mi amor!"],
    ),
    (
        3,
        "Panchito",
        "Junior Assistant",
        &[
            "Filing records",
            "Typing reports",
            "Scanning documents",
            "Sending emails",
            "Running backup",
            "Updating system",
        ],
        &["Almost done...", "¡Trabajando!", "¡Vamos!"],
    ),
    (
        4,
        "La Jefa",
        "Director",
        &[
            "Supervising team",
            "Reviewing reports",
            "Making decisions",
            "Checking numbers",
            "Planning strategy",
            "Assessing risk",
        ],
        &["Supervising...", "¡Perfecto!", "¡Excelente!"],
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: AgentId, activities: &[&str]) -> Agent {
        Agent {
            id,
            name: format!("agent {id}"),
            position: "Teller".to_string(),
            activities: activities.iter().map(|text| text.to_string()).collect(),
            phrases: Vec::new(),
        }
    }

    #[test]
    fn bank_staff_has_four_agents_in_id_order() {
        let roster = Roster::bank_staff();
        let ids = roster.agents().iter().map(|agent| agent.id).collect::<Vec<_>>();
        assert_eq!(ids, [1, 2, 3, 4]);
        assert!(roster.agents().iter().all(|agent| agent.activities.len() == 6));
        assert_eq!(roster.get(4).map(|agent| agent.name.as_str()), Some("La Jefa"));
        assert!(roster.get(9).is_none());
    }

    #[test]
    fn rejects_invalid_rosters() {
        assert_eq!(Roster::new(Vec::new()), Err(RosterError::Empty));
        assert_eq!(
            Roster::new(vec![agent(1, &["a"]), agent(1, &["b"])]),
            Err(RosterError::DuplicateId { id: 1 })
        );
        assert!(matches!(
            Roster::new(vec![agent(7, &[])]),
            Err(RosterError::NoActivities { id: 7, .. })
        ));
    }

    #[test]
    fn agents_deserialize_without_phrases() {
        let raw = r#"[{"id": 9, "name": "Lupita", "position": "Guard", "activities": ["Patrolling"]}]"#;
        let roster = Roster::from_json_str(raw).expect("valid roster");
        assert_eq!(roster.len(), 1);
        assert!(roster.agents()[0].phrases.is_empty());
    }

    #[test]
    fn parse_error_names_offending_field() {
        let raw = r#"[{"id": "nine", "name": "x", "position": "y", "activities": ["a"]}]"#;
        match Roster::from_json_str(raw) {
            Err(RosterError::Parse { path, .. }) => assert_eq!(path, "[0].id"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
