//! Projection of requested attribute names onto one edge
//!
//! Requested names are validated against the graph's attribute schema.
//! Unknown names and names containing the transport field delimiter are
//! dropped without error; malformed requests degrade gracefully. The
//! edge's free-form name is always projected as `name`.

use tracing::debug;

use crate::graph::{AttributeValue, EdgeView, GraphStore};

/// Field delimiter of the bulk-export encoding; attribute names
/// containing it cannot be represented and are rejected.
pub const FIELD_DELIMITER: char = ',';

/// Attribute key under which the edge's free-form name is projected.
pub const NAME_KEY: &str = "name";

/// Whether a requested name can be projected at all: well-formed and
/// present in the graph's attribute schema.
pub fn is_projectable<G: GraphStore + ?Sized>(store: &G, name: &str) -> bool {
    !name.contains(FIELD_DELIMITER) && store.has_attribute(name)
}

/// Ordered attribute set for one edge: `name` first, then every valid
/// requested attribute in request order.
pub fn project<G: GraphStore + ?Sized>(
    store: &G,
    edge: &EdgeView,
    requested: &[String],
) -> Vec<(String, AttributeValue)> {
    let mut out = Vec::with_capacity(requested.len() + 1);
    out.push((
        NAME_KEY.to_string(),
        AttributeValue::Categorical(edge.name.clone()),
    ));
    for name in requested {
        if !is_projectable(store, name) {
            debug!(attribute = %name, "dropping unresolvable attribute");
            continue;
        }
        if let Some(value) = store.edge_attribute(edge.id, name) {
            out.push((name.clone(), value));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{AttributeKind, RoadClass};
    use crate::test_support::MemoryGraph;

    fn edge() -> EdgeView {
        EdgeView {
            id: 7,
            base_node: 1,
            adj_node: 2,
            geometry: vec![(4.35, 50.84), (4.36, 50.85)],
            road_class: RoadClass::Primary,
            name: "Chaussée de Gand".into(),
            distance_m: 1200.0,
        }
    }

    fn graph() -> MemoryGraph {
        let mut graph = MemoryGraph::with_edges(vec![edge()]);
        graph.declare_attribute("max_speed", AttributeKind::Decimal);
        graph.set_attribute(7, "max_speed", AttributeValue::Decimal(50.0));
        graph.declare_attribute("toll", AttributeKind::Boolean);
        graph.set_attribute(7, "toll", AttributeValue::Boolean(false));
        graph
    }

    #[test]
    fn test_name_always_present() {
        let attrs = project(&graph(), &edge(), &[]);
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].0, NAME_KEY);
        assert_eq!(
            attrs[0].1,
            AttributeValue::Categorical("Chaussée de Gand".into())
        );
    }

    #[test]
    fn test_valid_attributes_projected_in_request_order() {
        let requested = vec!["toll".to_string(), "max_speed".to_string()];
        let attrs = project(&graph(), &edge(), &requested);
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[1], ("toll".into(), AttributeValue::Boolean(false)));
        assert_eq!(attrs[2], ("max_speed".into(), AttributeValue::Decimal(50.0)));
    }

    #[test]
    fn test_unknown_names_silently_dropped() {
        let requested = vec!["surface".to_string(), "max_speed".to_string()];
        let attrs = project(&graph(), &edge(), &requested);
        assert!(attrs.iter().all(|(k, _)| k != "surface"));
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn test_delimiter_names_silently_dropped() {
        let requested = vec!["max_speed,toll".to_string()];
        let attrs = project(&graph(), &edge(), &requested);
        assert_eq!(attrs.len(), 1); // only `name`
    }

    #[test]
    fn test_road_class_projects_as_categorical() {
        let requested = vec!["road_class".to_string()];
        let attrs = project(&graph(), &edge(), &requested);
        assert_eq!(
            attrs[1],
            (
                "road_class".into(),
                AttributeValue::Categorical("primary".into())
            )
        );
    }
}
