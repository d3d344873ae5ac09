mod common;

use std::collections::BTreeMap;
use std::fs;

use graph_ingest::config::ImportConfig;
use graph_ingest::ingestion::csv::read_table_from_str;
use graph_ingest::ingestion::SourceFormat;
use graph_ingest::loader::{
    run_import, verify, GraphLoader, ImportReport, LoadOptions, PostLoad, ReferentialGap, SampleQuery, TableKind,
    TableSources,
};
use graph_ingest::IngestionError;

use common::{fixture, wrap_in_rtf, MemoryGraph, Props};

const SEGMENTS: &str = "segment_id,segment_name,description,version,node_type\n";
const TASKS: &str = "node_id,node_type,segment_id,role,workflow_name,characteristic,prompt,pain_point_need,\
artifacts,keywords_phrases,outcomes,prompt_flexibility,instruction_with_example,example_straightforward,\
example_complex,example_enterprise\n";
const WORKFLOWS: &str =
    "workflow_id,node_type,segment_id,workflow_name,description,business_value,total_tasks,involved_roles,complexity_level\n";
const USED_IN: &str =
    "source_node_id,target_node_id,relationship_type,sequence_position,priority_score,notification_trigger,visibility_roles\n";

fn load<'a>(
    graph: &'a mut MemoryGraph,
    options: LoadOptions,
    tables: &[(TableKind, String)],
) -> GraphLoader<&'a mut MemoryGraph> {
    let mut loader = GraphLoader::new(graph, options);
    for (kind, csv) in tables {
        let table = read_table_from_str(csv).unwrap();
        loader.load_table(*kind, &table, None).unwrap();
    }
    loader
}

fn minimal_tables() -> Vec<(TableKind, String)> {
    vec![
        (TableKind::BusinessSegments, format!("{SEGMENTS}SEG1,Retail,Shops,1,BUSINESS_SEGMENT")),
        (
            TableKind::TaskTemplates,
            format!("{TASKS}T1,TASK_TEMPLATE,SEG1,PRODM,Plan,Scoping,Prompt,Pain,Doc,kw,Out,High,Inst,A,B,C"),
        ),
        (
            TableKind::WorkflowTemplates,
            format!("{WORKFLOWS}W1,WORKFLOW_TEMPLATE,SEG1,Launch,Desc,Value,1,PRODM,Low"),
        ),
        (TableKind::UsedIn, format!("{USED_IN}T1,W1,USED_IN,1,5,on_start,PRODM")),
    ]
}

fn fixture_config() -> ImportConfig {
    ImportConfig {
        data_dir: fixture(""),
        ..ImportConfig::default()
    }
}

fn import_with(graph: &mut MemoryGraph, cfg: &ImportConfig) -> ImportReport {
    run_import(
        graph,
        &cfg.resolve_sources().unwrap(),
        cfg.load_options(None),
        &cfg.post_load(),
    )
    .unwrap()
}

fn without_timestamp(props: &Props) -> Props {
    props
        .iter()
        .filter(|(k, _)| k.as_str() != "created_at")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[test]
fn minimal_graph_counts_one_of_each() {
    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &minimal_tables()).stats().clone();

    assert_eq!(stats.business_segments, 1);
    assert_eq!(stats.task_templates, 1);
    assert_eq!(stats.workflow_templates, 1);
    assert_eq!(stats.used_in_relationships, 1);
    assert_eq!(stats.depends_on_relationships, 0);
    assert!(stats.errors.is_empty());

    let report = verify(&mut graph, "default_db", None);
    assert_eq!(
        report.label_counts,
        BTreeMap::from([
            ("BUSINESS_SEGMENT".to_owned(), 1),
            ("TASK_TEMPLATE".to_owned(), 1),
            ("WORKFLOW_TEMPLATE".to_owned(), 1),
        ])
    );
    assert_eq!(report.type_counts["USED_IN"], 1);
    assert_eq!(report.type_counts["DEPENDS_ON"], 0);
    assert!(report.failures.is_empty());
}

#[test]
fn dangling_edge_is_counted_but_not_stored() {
    let mut tables = minimal_tables();
    tables[3].1 = format!("{USED_IN}T1,W_MISSING,USED_IN,1,5,on_start,PRODM");

    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &tables).stats().clone();
    assert_eq!(stats.used_in_relationships, 1);
    assert!(stats.errors.is_empty());
    assert!(graph.edges.is_empty());

    let report = verify(&mut graph, "default_db", None);
    assert_eq!(
        report.referential_gaps(&stats),
        vec![ReferentialGap {
            rel_type: "USED_IN".into(),
            attempted: 1,
            stored: 0,
        }]
    );
}

#[test]
fn strict_edges_records_dangling_edge() {
    let mut tables = minimal_tables();
    tables[3].1 = format!("{USED_IN}T1,W_MISSING,USED_IN,1,5,on_start,PRODM");

    let mut graph = MemoryGraph::new();
    let options = LoadOptions {
        strict_edges: true,
        ..LoadOptions::default()
    };
    let stats = load(&mut graph, options, &tables).stats().clone();

    assert_eq!(stats.used_in_relationships, 1);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].table, TableKind::UsedIn);
    assert!(stats.errors[0].message.contains("T1 -> W_MISSING"));
}

#[test]
fn edges_loaded_before_their_nodes_create_nothing() {
    let tables = minimal_tables();
    let reordered = vec![tables[3].clone(), tables[1].clone(), tables[2].clone()];

    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &reordered).stats().clone();

    assert_eq!(stats.used_in_relationships, 1);
    assert!(stats.errors.is_empty());
    assert!(graph.edges.is_empty());
    assert_eq!(graph.nodes.len(), 2);
}

#[test]
fn rejected_row_does_not_stop_the_table() {
    let csv = format!(
        "{SEGMENTS}SEG1,One,d,1,BUSINESS_SEGMENT\nSEG2,Two,d,1,BUSINESS_SEGMENT\nSEG3,Three,d,1,BUSINESS_SEGMENT"
    );
    let mut graph = MemoryGraph::rejecting(r#"segment_id: "SEG2""#);
    let stats = load(&mut graph, LoadOptions::default(), &[(TableKind::BusinessSegments, csv)])
        .stats()
        .clone();

    assert_eq!(stats.business_segments, 3);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].row, Some(2));
    assert!(stats.errors[0].message.starts_with("Query error: "));
    assert!(stats.errors[0].message.ends_with("rejected by test graph"));
    assert_eq!(graph.log.len(), 3);
    assert_eq!(graph.nodes_with_label("BUSINESS_SEGMENT").len(), 2);
}

#[test]
fn non_numeric_integer_column_skips_only_that_row() {
    let csv = format!(
        "{WORKFLOWS}W1,WORKFLOW_TEMPLATE,S,A,d,v,3,R,Low\nW2,WORKFLOW_TEMPLATE,S,B,d,v,three,R,Low\nW3,WORKFLOW_TEMPLATE,S,C,d,v,1,R,Low"
    );
    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &[(TableKind::WorkflowTemplates, csv)])
        .stats()
        .clone();

    assert_eq!(stats.workflow_templates, 2);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].row, Some(2));
    assert!(stats.errors[0].message.contains("total_tasks"));
    assert_eq!(graph.log.len(), 2);
}

#[test]
fn bad_priority_score_does_not_block_later_edges() {
    let mut tables = minimal_tables();
    tables[3].1 = format!(
        "{USED_IN}T1,W1,USED_IN,1,5,on_start,PRODM\nT1,W1,USED_IN,2,abc,on_start,PRODM\nT1,W1,USED_IN,3,7,on_start,PRODM"
    );

    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &tables).stats().clone();

    assert_eq!(stats.used_in_relationships, 2);
    assert_eq!(stats.errors.len(), 1);
    assert_eq!(stats.errors[0].row, Some(2));
    assert!(stats.errors[0].message.contains("priority_score"));
    let positions: Vec<_> = graph
        .edges_of_type("USED_IN")
        .iter()
        .map(|e| e.props["sequence_position"].clone())
        .collect();
    assert_eq!(positions, vec![1, 3]);
}

#[test]
fn short_row_is_skipped_with_missing_field_error() {
    let csv = format!("{SEGMENTS}SEG1,One,d,1,BUSINESS_SEGMENT\nSEG2,Two\nSEG3,Three,d,1,BUSINESS_SEGMENT");
    let mut graph = MemoryGraph::new();
    let stats = load(&mut graph, LoadOptions::default(), &[(TableKind::BusinessSegments, csv)])
        .stats()
        .clone();

    assert_eq!(stats.business_segments, 2);
    assert_eq!(stats.errors.len(), 1);
    assert!(stats.errors[0].message.contains("description"));
}

#[test]
fn header_without_required_column_is_fatal() {
    let csv = "segment_id,segment_name\nSEG1,One\n";
    let table = read_table_from_str(csv).unwrap();
    let mut graph = MemoryGraph::new();
    let mut loader = GraphLoader::new(&mut graph, LoadOptions::default());

    let err = loader.load_table(TableKind::BusinessSegments, &table, None).unwrap_err();
    assert!(matches!(err, IngestionError::SchemaMismatch { .. }));
    assert_eq!(loader.stats().business_segments, 0);
}

#[test]
fn fixture_import_end_to_end() {
    let mut graph = MemoryGraph::new();
    let report = import_with(&mut graph, &fixture_config());
    let stats = &report.stats;

    assert_eq!(stats.business_segments, 1);
    assert_eq!(stats.task_templates, 3);
    assert_eq!(stats.workflow_templates, 2);
    assert_eq!(stats.used_in_relationships, 5);
    assert_eq!(stats.depends_on_relationships, 2);
    assert!(stats.errors.is_empty(), "{:?}", stats.errors);

    let indexes = report.indexes.as_ref().unwrap();
    assert_eq!(indexes.created.len(), 10);
    assert!(indexes.failed.is_empty());

    let verification = report.verification.as_ref().unwrap();
    assert_eq!(verification.label_counts["TASK_TEMPLATE"], 3);
    assert_eq!(verification.type_counts["USED_IN"], 4);
    assert_eq!(verification.type_counts["DEPENDS_ON"], 2);
    assert_eq!(verification.node_counts["WORKFLOW_TEMPLATE"], 2);

    let sample = verification.sample.as_ref().unwrap();
    assert_eq!(sample.task_ids, vec!["PRODM_001", "PRODM_002"]);

    assert_eq!(
        report.referential_gaps(),
        vec![ReferentialGap {
            rel_type: "USED_IN".into(),
            attempted: 5,
            stored: 4,
        }]
    );
}

#[test]
fn stored_values_keep_their_types_and_text() {
    let mut graph = MemoryGraph::new();
    import_with(&mut graph, &fixture_config());

    let task = graph
        .nodes_with_label("TASK_TEMPLATE")
        .into_iter()
        .find(|n| n.props["node_id"] == "PRODM_001")
        .unwrap();
    assert_eq!(task.props["prompt"], r#"Draft the "launch scope" as $role"#);
    assert_eq!(task.props["keywords_phrases"], "scope, launch");
    assert!(task.props["created_at"].is_string());

    let workflow = graph
        .nodes_with_label("WORKFLOW_TEMPLATE")
        .into_iter()
        .find(|n| n.props["workflow_id"] == "LAUNCH_001")
        .unwrap();
    assert_eq!(workflow.props["total_tasks"], 3);
    assert_eq!(workflow.props["involved_roles"], "PRODM,BA");

    let edge = graph
        .edges_of_type("USED_IN")
        .into_iter()
        .find(|e| graph.nodes[e.from].props["node_id"] == "PRODM_001")
        .unwrap();
    assert_eq!(edge.props["sequence_position"], 1);
    assert_eq!(edge.props["priority_score"], 9);
}

#[test]
fn rtf_sources_load_the_same_graph_as_csv() {
    let dir = tempfile::tempdir().unwrap();
    for kind in TableKind::LOAD_ORDER {
        let stem = kind.default_stem();
        let text = fs::read_to_string(fixture(&format!("{stem}.csv"))).unwrap();
        fs::write(dir.path().join(format!("{stem}.rtf")), wrap_in_rtf(&text)).unwrap();
    }

    let mut from_csv = MemoryGraph::new();
    let csv_report = import_with(&mut from_csv, &fixture_config());

    let mut from_rtf = MemoryGraph::new();
    let rtf_cfg = ImportConfig {
        data_dir: dir.path().to_path_buf(),
        format: SourceFormat::Rtf,
        ..ImportConfig::default()
    };
    let rtf_report = import_with(&mut from_rtf, &rtf_cfg);

    assert_eq!(rtf_report.stats, csv_report.stats);
    let strip = |g: &MemoryGraph| -> Vec<(String, Props)> {
        g.nodes
            .iter()
            .map(|n| (n.label.clone(), without_timestamp(&n.props)))
            .collect()
    };
    assert_eq!(strip(&from_rtf), strip(&from_csv));
    assert_eq!(from_rtf.edges.len(), from_csv.edges.len());
}

#[test]
fn rtf_without_payload_loads_as_empty_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("business_segments_v2.rtf");
    fs::copy(fixture("no_payload.rtf"), &path).unwrap();

    let mut graph = MemoryGraph::new();
    let sources = TableSources::new().with(TableKind::BusinessSegments, &path);
    let options = LoadOptions {
        read: graph_ingest::ingestion::ReadOptions {
            format: Some(SourceFormat::Rtf),
            ..Default::default()
        },
        ..LoadOptions::default()
    };
    let post = PostLoad {
        create_indexes: false,
        verify: false,
        sample: None,
    };
    let report = run_import(&mut graph, &sources, options, &post).unwrap();

    assert_eq!(report.stats.business_segments, 0);
    assert_eq!(report.stats.errors.len(), 1);
    assert_eq!(report.stats.errors[0].row, None);
    assert!(graph.log.is_empty());
    assert!(report.indexes.is_none());
}

#[test]
fn summary_lists_counts_and_first_errors() {
    let csv = format!("{SEGMENTS}SEG1,One,d,1,BUSINESS_SEGMENT");
    let mut graph = MemoryGraph::rejecting("SEG1");
    let stats = load(&mut graph, LoadOptions::default(), &[(TableKind::BusinessSegments, csv)])
        .stats()
        .clone();
    let summary = ImportReport {
        stats,
        ..ImportReport::default()
    }
    .to_string();

    assert!(summary.contains("IMPORT COMPLETE"));
    assert!(summary.contains("Business Segments: 1"));
    assert!(summary.contains("Errors: 1"));
    assert!(summary.contains("[business_segments row 1] Query error: "));
}

#[test]
fn sample_query_targets_requested_role_and_workflow() {
    let mut graph = MemoryGraph::new();
    import_with(&mut graph, &fixture_config());

    let sample = SampleQuery {
        role: "BA".into(),
        workflow_id: "DISC_001".into(),
    };
    let report = verify(&mut graph, "default_db", Some(&sample));
    assert_eq!(report.sample.unwrap().task_ids, vec!["BA_001"]);
}
