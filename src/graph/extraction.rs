//! Node/edge extraction from model records.

use super::{Edge, Graph, Node};
use crate::error::Result;
use crate::model::{require_id, ActivityRecord, ModelRecord, ACTIVITY_CATEGORY};

/// Extract nodes and edges from `models`.
///
/// Objects become nodes, activities become nodes plus one edge per
/// association that carries a term. A missing `id` anywhere is an error;
/// every other absent field falls back to its default.
pub fn extract(models: &[ModelRecord]) -> Result<Graph> {
    let mut graph = Graph::default();
    for (idx, model) in models.iter().enumerate() {
        extract_model(model, idx, &mut graph)?;
    }
    log::debug!(
        "Extracted {} nodes and {} edges from {} model(s)",
        graph.nodes.len(),
        graph.edges.len(),
        models.len()
    );
    Ok(graph)
}

/// [`extract`] over the first `row_limit` models (all of them when `None`).
pub fn transform(models: &[ModelRecord], row_limit: Option<usize>) -> Result<Graph> {
    let limit = row_limit.map_or(models.len(), |n| n.min(models.len()));
    if limit < models.len() {
        log::info!("Row limit {}: processing {} of {} model(s)", limit, limit, models.len());
    }
    extract(&models[..limit])
}

fn extract_model(model: &ModelRecord, idx: usize, graph: &mut Graph) -> Result<()> {
    let model_id = require_id(&model.id, || format!("models[{}]", idx))?;
    let taxon = model.taxon();

    for (obj_idx, object) in model.objects.iter().enumerate() {
        let id = require_id(&object.id, || {
            format!("models[{}] ({}).objects[{}]", idx, model_id, obj_idx)
        })?;
        graph.nodes.push(Node {
            id: id.to_string(),
            name: object.label().to_string(),
            category: object.category().to_string(),
            taxon: taxon.to_string(),
        });
    }

    for (act_idx, activity) in model.activities.iter().enumerate() {
        let id = require_id(&activity.id, || {
            format!("models[{}] ({}).activities[{}]", idx, model_id, act_idx)
        })?;
        graph.nodes.push(Node {
            id: id.to_string(),
            name: String::new(),
            category: ACTIVITY_CATEGORY.to_string(),
            taxon: taxon.to_string(),
        });
        graph.edges.extend(edges_for(id, activity, model_id));
    }

    Ok(())
}

fn edges_for<'a>(
    activity_id: &'a str,
    activity: &'a ActivityRecord,
    model_id: &'a str,
) -> impl Iterator<Item = Edge> + 'a {
    activity
        .association_terms()
        .map(move |(relation, term)| Edge {
            subject: activity_id.to_string(),
            predicate: relation.to_string(),
            object: term.to_string(),
            relation: relation.to_string(),
            provided_by: model_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GocamError;
    use crate::model::DEFAULT_OBJECT_CATEGORY;
    use serde_json::{json, Value};

    fn models(value: Value) -> Vec<ModelRecord> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_object_node_from_model() {
        let input = models(json!([{
            "id": "gomodel:1",
            "taxon": "NCBITaxon:9606",
            "objects": [{"id": "obj1", "label": "L", "type": "T"}],
            "activities": []
        }]));
        let graph = extract(&input).unwrap();
        assert_eq!(
            graph.nodes,
            vec![Node {
                id: "obj1".into(),
                name: "L".into(),
                category: "T".into(),
                taxon: "NCBITaxon:9606".into(),
            }]
        );
        assert!(graph.edges.is_empty());
    }

    #[test]
    fn test_edges_skip_entries_without_term() {
        let input = models(json!([{
            "id": "gomodel:2",
            "activities": [{
                "id": "act1",
                "associations": {"enabled_by": {"term": "GO:001"}, "occurs_in": {}}
            }]
        }]));
        let graph = extract(&input).unwrap();
        assert_eq!(
            graph.edges,
            vec![Edge {
                subject: "act1".into(),
                predicate: "enabled_by".into(),
                object: "GO:001".into(),
                relation: "enabled_by".into(),
                provided_by: "gomodel:2".into(),
            }]
        );
        assert_eq!(
            graph.nodes,
            vec![Node {
                id: "act1".into(),
                name: String::new(),
                category: ACTIVITY_CATEGORY.into(),
                taxon: String::new(),
            }]
        );
    }

    #[test]
    fn test_object_defaults() {
        let input = models(json!([{"id": "m", "objects": [{"id": "o"}]}]));
        let graph = extract(&input).unwrap();
        assert_eq!(graph.nodes[0].name, "");
        assert_eq!(graph.nodes[0].category, DEFAULT_OBJECT_CATEGORY);
        assert_eq!(graph.nodes[0].taxon, "");
    }

    #[test]
    fn test_edge_count_matches_terms() {
        let cases = vec![
            (json!({}), 0),
            (json!({"a": {"term": "X"}}), 1),
            (json!({"a": {"term": "X"}, "b": {"term": "Y"}, "c": {"term": "Z"}}), 3),
            (json!({"a": null, "b": {"term": ""}, "c": {"other": 1}}), 0),
            (json!({"a": {"term": "X"}, "b": null, "c": {"term": "Y"}}), 2),
        ];
        for (associations, expected) in cases {
            let input = models(json!([{
                "id": "m",
                "activities": [{"id": "act", "associations": associations.clone()}]
            }]));
            let graph = extract(&input).unwrap();
            assert_eq!(graph.edges.len(), expected, "associations: {}", associations);
        }
    }

    #[test]
    fn test_order_follows_input() {
        let input = models(json!([
            {
                "id": "m1",
                "objects": [{"id": "o1"}, {"id": "o2"}],
                "activities": [
                    {
                        "id": "a1",
                        "associations": {"enabled_by": {"term": "T1"}, "part_of": {"term": "T2"}}
                    },
                    {"id": "a2", "associations": {"occurs_in": {"term": "T3"}}}
                ]
            },
            {"id": "m2", "objects": [{"id": "o3"}]}
        ]));
        let graph = extract(&input).unwrap();

        let node_ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(node_ids, vec!["o1", "o2", "a1", "a2", "o3"]);

        let edges: Vec<(&str, &str)> = graph
            .edges
            .iter()
            .map(|e| (e.subject.as_str(), e.object.as_str()))
            .collect();
        assert_eq!(edges, vec![("a1", "T1"), ("a1", "T2"), ("a2", "T3")]);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let input = models(json!([{
            "id": "m",
            "taxon": "NCBITaxon:7955",
            "objects": [{"id": "o", "label": "x"}],
            "activities": [{"id": "a", "associations": {"enabled_by": {"term": "T"}}}]
        }]));
        let before = input.clone();
        let first = extract(&input).unwrap();
        let second = extract(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(input, before);
    }

    #[test]
    fn test_upstream_activity_shape() {
        let input = models(json!([{
            "id": "gomodel:568b0f9600000284",
            "taxon": "NCBITaxon:9606",
            "activities": [{
                "id": "gomodel:568b0f9600000284/a1",
                "enabled_by": {"term": "UniProtKB:Q9Y6K9"},
                "molecular_function": {"term": "GO:0004672"},
                "occurs_in": {"term": "GO:0005737"}
            }]
        }]));
        let graph = extract(&input).unwrap();
        let predicates: Vec<&str> = graph.edges.iter().map(|e| e.predicate.as_str()).collect();
        assert_eq!(predicates, vec!["enabled_by", "molecular_function", "occurs_in"]);
        assert!(graph
            .edges
            .iter()
            .all(|e| e.provided_by == "gomodel:568b0f9600000284"));
    }

    #[test]
    fn test_missing_model_id_is_fatal() {
        let input = models(json!([{"id": "ok"}, {"taxon": "NCBITaxon:9606"}]));
        let err = extract(&input).unwrap_err();
        match err {
            GocamError::MissingField { field, path } => {
                assert_eq!(field, "id");
                assert_eq!(path, "models[1]");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_object_id_is_fatal() {
        let input = models(json!([{"id": "m", "objects": [{"label": "no id"}]}]));
        let err = extract(&input).unwrap_err();
        assert!(err.to_string().contains("models[0] (m).objects[0]"));
    }

    #[test]
    fn test_missing_activity_id_is_fatal() {
        let input = models(json!([{"id": "m", "activities": [{"associations": {}}]}]));
        let err = extract(&input).unwrap_err();
        assert!(err.to_string().contains("activities[0]"));
    }

    fn numbered_models(count: usize) -> Vec<ModelRecord> {
        (0..count)
            .map(|i| {
                serde_json::from_value(json!({
                    "id": format!("gomodel:{}", i),
                    "objects": [{"id": format!("obj{}", i)}]
                }))
                .unwrap()
            })
            .collect()
    }

    fn node_ids(graph: &Graph) -> Vec<&str> {
        graph.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_transform_row_limit_below_len() {
        let input = numbered_models(3);
        let graph = transform(&input, Some(2)).unwrap();
        assert_eq!(node_ids(&graph), vec!["obj0", "obj1"]);
    }

    #[test]
    fn test_transform_row_limit_above_len_takes_all() {
        let input = numbered_models(3);
        let graph = transform(&input, Some(10)).unwrap();
        assert_eq!(node_ids(&graph), vec!["obj0", "obj1", "obj2"]);
        assert_eq!(graph, transform(&input, None).unwrap());
    }

    #[test]
    fn test_transform_row_limit_zero_is_empty() {
        let input = numbered_models(3);
        assert_eq!(transform(&input, Some(0)).unwrap(), Graph::default());
    }

    #[test]
    fn test_transform_row_limit_skips_bad_models_past_limit() {
        let mut input = numbered_models(2);
        input.push(ModelRecord::default());
        assert!(transform(&input, None).is_err());
        assert_eq!(node_ids(&transform(&input, Some(2)).unwrap()), vec!["obj0", "obj1"]);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(extract(&[]).unwrap(), Graph::default());
    }
}
