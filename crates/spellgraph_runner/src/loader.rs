// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph description loading.

use crate::error::RunnerError;
use spellgraph_graph::{Graph, GraphDescription, NodeRegistry};
use std::path::Path;

/// On-disk description formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionFormat {
    /// `.ron`
    Ron,
    /// `.json`
    Json,
}

impl DescriptionFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "ron" => Some(Self::Ron),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse a description from text
pub fn parse_description(
    text: &str,
    format: DescriptionFormat,
    path: &Path,
) -> Result<GraphDescription, RunnerError> {
    match format {
        DescriptionFormat::Ron => ron::from_str(text).map_err(|source| RunnerError::Ron {
            path: path.to_path_buf(),
            source,
        }),
        DescriptionFormat::Json => serde_json::from_str(text).map_err(|source| RunnerError::Json {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read a description file
pub fn load_description(path: &Path) -> Result<GraphDescription, RunnerError> {
    let format = DescriptionFormat::from_path(path)
        .ok_or_else(|| RunnerError::UnsupportedFormat(path.to_path_buf()))?;
    let text = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_description(&text, format, path)
}

/// Read a description file and build the graph, filling in declared ports
pub fn load_graph(path: &Path, registry: &NodeRegistry) -> Result<Graph, RunnerError> {
    let mut description = load_description(path)?;
    description.fill_declared_ports(registry);
    tracing::debug!(
        path = %path.display(),
        nodes = description.nodes.len(),
        links = description.links.len(),
        "loaded graph description"
    );
    Ok(Graph::from_description(description)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spellgraph_graph::create_effect_registry;
    use std::path::PathBuf;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            DescriptionFormat::from_path(Path::new("a/fireball.RON")),
            Some(DescriptionFormat::Ron)
        );
        assert_eq!(
            DescriptionFormat::from_path(Path::new("b.json")),
            Some(DescriptionFormat::Json)
        );
        assert_eq!(DescriptionFormat::from_path(Path::new("c.txt")), None);
        assert_eq!(DescriptionFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_json_description() {
        let text = r#"{
            "name": "json",
            "nodes": [
                {"id": "root", "runtime_type": "root"},
                {"id": "dbg", "runtime_type": "general_debug"}
            ],
            "links": [
                {"source_node": "root", "source_port": "Out", "target_node": "dbg", "target_port": "In"}
            ]
        }"#;
        let desc = parse_description(text, DescriptionFormat::Json, Path::new("x.json")).unwrap();
        assert_eq!(desc.nodes.len(), 2);
        assert!(desc.variables.is_empty());
    }

    #[test]
    fn test_errors_carry_path() {
        let err = parse_description("(", DescriptionFormat::Ron, Path::new("broken.ron")).unwrap_err();
        assert!(err.to_string().starts_with("broken.ron"));

        let missing = PathBuf::from("does/not/exist.ron");
        assert!(matches!(
            load_graph(&missing, &create_effect_registry()),
            Err(RunnerError::Io { .. })
        ));
        assert!(matches!(
            load_description(Path::new("effect.yaml")),
            Err(RunnerError::UnsupportedFormat(_))
        ));
    }
}
