// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Pathway Graph
//!
//! Directed communication edges between mesh endpoints, derived from every
//! agent's declared `pathways_in` and `pathways_out`.
//!
//! The graph may contain cycles and self-loops. The wildcard endpoint `"*"`
//! is never materialized: it is expanded on demand to "every registered agent
//! other than the declaring one", so registry changes never invalidate it.
//!
//! Declarations that reference an unregistered agent are reported as
//! [`GraphIntegrityWarning`]s and excluded from effective edges; they never
//! fail a snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::agent::{Agent, AgentEndpoint, AgentId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Inbound => f.write_str("inbound"),
            Direction::Outbound => f.write_str("outbound"),
        }
    }
}

/// A pathway declaration referencing an agent id that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GraphIntegrityWarning {
    /// Agent that declared the pathway.
    pub agent: AgentId,
    pub direction: Direction,
    /// The unresolved endpoint.
    pub endpoint: AgentId,
}

impl fmt::Display for GraphIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} declares an {} pathway to unregistered agent {}",
            self.agent, self.direction, self.endpoint
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: AgentEndpoint,
    pub to: AgentEndpoint,
}

impl Edge {
    pub fn new(from: impl Into<AgentEndpoint>, to: impl Into<AgentEndpoint>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(AgentId),

    #[error("Invalid pathway: {from} -> {to}")]
    NotDeclared { from: AgentId, to: AgentId },

    #[error("Target {to} does not accept input from {from}")]
    NotAccepted { from: AgentId, to: AgentId },
}

#[derive(Debug, Clone, Default)]
struct Declared {
    inbound: Vec<AgentEndpoint>,
    outbound: Vec<AgentEndpoint>,
}

/// Read-only view over the pathways declared by a set of agents.
#[derive(Debug, Clone, Default)]
pub struct PathwayGraph {
    declared: BTreeMap<AgentId, Declared>,
}

impl PathwayGraph {
    pub fn build<'a, I>(agents: I) -> Self
    where
        I: IntoIterator<Item = &'a Agent>,
    {
        let declared = agents
            .into_iter()
            .map(|agent| {
                (
                    agent.id.clone(),
                    Declared {
                        inbound: agent.pathways_in.clone(),
                        outbound: agent.pathways_out.clone(),
                    },
                )
            })
            .collect();
        Self { declared }
    }

    pub fn contains(&self, id: &AgentId) -> bool {
        self.declared.contains_key(id)
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &AgentId> {
        self.declared.keys()
    }

    /// Every declared endpoint that names an unregistered agent, in
    /// identifier order.
    pub fn validate(&self) -> Vec<GraphIntegrityWarning> {
        let mut warnings = Vec::new();
        for (agent, declared) in &self.declared {
            let sides = [
                (Direction::Inbound, &declared.inbound),
                (Direction::Outbound, &declared.outbound),
            ];
            for (direction, endpoints) in sides {
                for endpoint in endpoints.iter().filter_map(AgentEndpoint::agent_id) {
                    if !self.contains(endpoint) {
                        warnings.push(GraphIntegrityWarning {
                            agent: agent.clone(),
                            direction,
                            endpoint: endpoint.clone(),
                        });
                    }
                }
            }
        }
        warnings
    }

    /// Sources that may send to `target`, with `"*"` expanded to every other
    /// registered agent. Unregistered agent sources are dropped.
    pub fn effective_inbound(&self, target: &AgentId) -> Vec<AgentEndpoint> {
        self.declared
            .get(target)
            .map(|declared| self.expand(target, &declared.inbound))
            .unwrap_or_default()
    }

    /// Destinations `source` may send to, with `"*"` expanded the same way.
    pub fn effective_outbound(&self, source: &AgentId) -> Vec<AgentEndpoint> {
        self.declared
            .get(source)
            .map(|declared| self.expand(source, &declared.outbound))
            .unwrap_or_default()
    }

    /// Whether `target` accepts input from `source`.
    pub fn accepts(&self, source: &AgentEndpoint, target: &AgentId) -> bool {
        self.effective_inbound(target).contains(source)
    }

    /// Check that a task may travel from `source` to `target`: the source
    /// must declare the target as a destination and the target must accept
    /// the source.
    pub fn validate_route(&self, source: &AgentId, target: &AgentId) -> Result<(), RouteError> {
        for id in [source, target] {
            if !self.contains(id) {
                return Err(RouteError::UnknownAgent(id.clone()));
            }
        }

        let to_target = AgentEndpoint::Agent(target.clone());
        if !self.effective_outbound(source).contains(&to_target) {
            return Err(RouteError::NotDeclared {
                from: source.clone(),
                to: target.clone(),
            });
        }

        let from_source = AgentEndpoint::Agent(source.clone());
        if !self.accepts(&from_source, target) {
            return Err(RouteError::NotAccepted {
                from: source.clone(),
                to: target.clone(),
            });
        }

        Ok(())
    }

    /// All effective edges, sorted and de-duplicated.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for id in self.declared.keys() {
            let this = AgentEndpoint::Agent(id.clone());
            for from in self.effective_inbound(id) {
                edges.push(Edge::new(from, this.clone()));
            }
            for to in self.effective_outbound(id) {
                edges.push(Edge::new(this.clone(), to));
            }
        }
        edges.sort();
        edges.dedup();
        edges
    }

    fn expand(&self, owner: &AgentId, endpoints: &[AgentEndpoint]) -> Vec<AgentEndpoint> {
        let mut out: Vec<AgentEndpoint> = Vec::new();
        let mut push = |endpoint: AgentEndpoint| {
            if !out.contains(&endpoint) {
                out.push(endpoint);
            }
        };

        for endpoint in endpoints {
            match endpoint {
                AgentEndpoint::Wildcard => {
                    self.declared
                        .keys()
                        .filter(|id| *id != owner)
                        .for_each(|id| push(AgentEndpoint::Agent(id.clone())));
                }
                AgentEndpoint::Agent(id) if !self.contains(id) => {}
                other => push(other.clone()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::AgentKind;

    fn agent(id: &str) -> Agent {
        Agent::new(id, AgentKind::Worker)
    }

    #[test]
    fn test_wildcard_expands_to_every_other_agent() {
        let agents = vec![
            agent("A").with_pathways_out(["S"]),
            agent("B"),
            agent("S").with_pathways_in(["*"]),
        ];
        let graph = PathwayGraph::build(&agents);

        let inbound = graph.effective_inbound(&AgentId::from("S"));
        assert_eq!(inbound, vec![AgentEndpoint::agent("A"), AgentEndpoint::agent("B")]);

        let edges = graph.edges();
        assert!(edges.contains(&Edge::new("A", "S")));
        assert!(edges.contains(&Edge::new("B", "S")));
        assert!(!edges.contains(&Edge::new("S", "S")));
    }

    #[test]
    fn test_wildcard_tracks_registry_membership() {
        let mut agents = vec![agent("A"), agent("S").with_pathways_in(["*"])];
        assert_eq!(PathwayGraph::build(&agents).effective_inbound(&"S".into()).len(), 1);

        agents.push(agent("C"));
        assert_eq!(PathwayGraph::build(&agents).effective_inbound(&"S".into()).len(), 2);
    }

    #[test]
    fn test_unknown_endpoint_is_reported() {
        let agents = vec![
            agent("A").with_pathways_out(["Ghost.v9", "User"]),
            agent("B").with_pathways_in(["A", "*"]),
        ];
        let graph = PathwayGraph::build(&agents);
        let warnings = graph.validate();

        assert_eq!(
            warnings,
            vec![GraphIntegrityWarning {
                agent: "A".into(),
                direction: Direction::Outbound,
                endpoint: "Ghost.v9".into(),
            }]
        );
        assert!(!graph
            .edges()
            .iter()
            .any(|e| e.to == AgentEndpoint::agent("Ghost.v9")));
    }

    #[test]
    fn test_cycles_and_self_loops_are_allowed() {
        let agents = vec![
            agent("A").with_pathways_out(["B", "A"]).with_pathways_in(["B", "A"]),
            agent("B").with_pathways_out(["A"]).with_pathways_in(["A"]),
        ];
        let graph = PathwayGraph::build(&agents);
        assert!(graph.validate().is_empty());
        assert!(graph.validate_route(&"A".into(), &"B".into()).is_ok());
        assert!(graph.validate_route(&"B".into(), &"A".into()).is_ok());
        assert!(graph.validate_route(&"A".into(), &"A".into()).is_ok());
    }

    #[test]
    fn test_route_validation() {
        let agents = vec![
            agent("Planner").with_pathways_out(["Coder", "Memory"]),
            agent("Coder").with_pathways_in(["Planner"]),
            agent("Memory").with_pathways_in(["Coder"]),
            agent("Safety").with_pathways_in(["*"]),
        ];
        let graph = PathwayGraph::build(&agents);

        assert!(graph.validate_route(&"Planner".into(), &"Coder".into()).is_ok());
        assert_eq!(
            graph.validate_route(&"Coder".into(), &"Planner".into()),
            Err(RouteError::NotDeclared { from: "Coder".into(), to: "Planner".into() })
        );
        assert_eq!(
            graph.validate_route(&"Planner".into(), &"Memory".into()),
            Err(RouteError::NotAccepted { from: "Planner".into(), to: "Memory".into() })
        );
        assert_eq!(
            graph.validate_route(&"Ghost".into(), &"Coder".into()),
            Err(RouteError::UnknownAgent("Ghost".into()))
        );
        assert!(graph.accepts(&AgentEndpoint::agent("Coder"), &"Safety".into()));
        assert!(!graph.accepts(&AgentEndpoint::ExternalUser, &"Safety".into()));
    }
}
