// SPDX-License-Identifier: MIT OR Apache-2.0
//! Effect runner: wires a sandbox host and an evaluator around one graph.

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::loader;
use spellgraph_graph::{
    create_effect_registry, Diagnostic, EvaluationError, Evaluator, Graph, HostEvent,
    NodeRegistry, SandboxHost, StatType, TargetSelector, Variable,
};
use std::path::Path;
use std::sync::Arc;

/// Outcome of running one effect
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Graph name
    pub graph: String,
    /// Final variable values
    pub variables: Vec<Variable>,
    /// Final player stats
    pub player: Vec<(StatType, f32)>,
    /// Final target stats
    pub target: Vec<(StatType, f32)>,
    /// Branch failures observed during the run
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    /// Log the report
    pub fn log(&self) {
        tracing::info!(graph = %self.graph, "effect finished");
        for variable in &self.variables {
            tracing::info!(name = %variable.name, value = %variable.value, "variable");
        }
        for (stat, value) in &self.player {
            tracing::info!(?stat, value, "player stat");
        }
        for (stat, value) in &self.target {
            tracing::info!(?stat, value, "target stat");
        }
        for diagnostic in &self.diagnostics {
            tracing::warn!(run = diagnostic.run, node = %diagnostic.node, error = %diagnostic.error, "diagnostic");
        }
    }
}

/// Loads and runs effect graphs
pub struct EffectRunner {
    config: RunnerConfig,
    registry: Arc<NodeRegistry>,
}

impl EffectRunner {
    /// Create a runner with the built-in node library
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            registry: Arc::new(create_effect_registry()),
        }
    }

    /// Load a graph from disk
    pub fn load(&self, path: &Path) -> Result<Graph, RunnerError> {
        loader::load_graph(path, &self.registry)
    }

    /// Structural problems in a graph
    pub fn check(&self, graph: &Graph) -> Vec<EvaluationError> {
        graph.validate(&self.registry)
    }

    /// Sandbox host seeded with the configured stats
    pub fn host(&self) -> SandboxHost {
        let seeded = self
            .config
            .player_stats
            .iter()
            .map(|(stat, value)| (TargetSelector::Player, *stat, *value))
            .chain(
                self.config
                    .target_stats
                    .iter()
                    .map(|(stat, value)| (TargetSelector::Target, *stat, *value)),
            );
        seeded.fold(SandboxHost::new(), |host, (who, stat, value)| {
            host.with_stat(who, stat, value)
        })
    }

    /// Run a graph: subscribe events, execute from the root, then simulate
    /// `auto_attacks` auto attacks
    pub async fn run(&self, graph: Graph, auto_attacks: u32) -> Result<RunReport, RunnerError> {
        let name = graph.name.clone();
        let host = Arc::new(self.host());
        let evaluator = Evaluator::with_host(
            Arc::new(graph),
            Arc::clone(&self.registry),
            host.clone(),
            self.config.evaluator.clone(),
        )?;

        if self.config.subscribe_events {
            evaluator.subscribe_events().await;
        }

        tracing::info!(graph = %name, nodes = evaluator.graph().node_count(), "running effect");
        evaluator.start_execution().await;

        for attack in 1..=auto_attacks {
            tracing::info!(attack, "auto attack");
            host.emit(HostEvent::AutoAttack).await;
        }

        Ok(RunReport {
            graph: name,
            variables: evaluator.variables().snapshot(),
            player: host.sheet(TargetSelector::Player),
            target: host.sheet(TargetSelector::Target),
            diagnostics: evaluator.diagnostics(),
        })
    }
}
