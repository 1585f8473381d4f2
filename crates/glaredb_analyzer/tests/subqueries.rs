use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glaredb_analyzer::analyzer::passthrough::strip_passthrough_nodes;
use glaredb_analyzer::analyzer::rule::RuleSelector;
use glaredb_analyzer::analyzer::scope::Scope;
use glaredb_analyzer::analyzer::{Analyzer, DEFAULT_RULES};
use glaredb_analyzer::catalog::MemoryCatalog;
use glaredb_analyzer::config::AnalyzerConfig;
use glaredb_analyzer::context::AnalysisContext;
use glaredb_analyzer::errors::AnalyzerError;
use glaredb_analyzer::explain::node::ExplainNode;
use glaredb_analyzer::expr::scalar::{DataType, ScalarValue};
use glaredb_analyzer::expr::subquery_expr::SubqueryExpr;
use glaredb_analyzer::expr::{
    Expression,
    alias,
    col,
    eq,
    lit,
    qualified_col,
    subquery,
    volatile_function,
};
use glaredb_analyzer::logical::builder::PlanBuilder;
use glaredb_analyzer::logical::logical_join::JoinType;
use glaredb_analyzer::logical::operator::LogicalOperator;
use glaredb_analyzer::logical::schema::ColumnSchema;
use glaredb_analyzer::transform::inspect::{
    Recursion,
    find_plan,
    inspect_plan_expressions,
    subqueries_in_plan,
};

fn analyzer() -> Analyzer {
    logutil::init_test();

    let catalog = MemoryCatalog::new();
    catalog.create_table("t1", [("a", DataType::Int64), ("b", DataType::Utf8)]);
    catalog.create_table("t2", [("c", DataType::Int64), ("d", DataType::Utf8)]);
    Analyzer::new(Arc::new(catalog), AnalyzerConfig::default())
}

/// SELECT b FROM t1 WHERE a = (<query>)
fn where_a_equals(query: LogicalOperator) -> LogicalOperator {
    PlanBuilder::unresolved_table("t1")
        .filter(eq(col("a"), subquery(query)))
        .project([col("b")])
        .build()
}

/// (SELECT <column> FROM <table>) AS <alias> (<column>)
fn derived(alias: &str, table: &str, column: &str) -> LogicalOperator {
    PlanBuilder::unresolved_table(table)
        .project([col(column)])
        .subquery_alias(alias, [column])
        .build()
}

fn only_subquery(plan: &LogicalOperator) -> &SubqueryExpr {
    let subqueries = subqueries_in_plan(plan);
    assert_eq!(1, subqueries.len(), "expected a single subquery");
    subqueries[0]
}

fn first_derived_table(plan: &LogicalOperator) -> &LogicalOperator {
    find_plan(plan, &mut |n| matches!(n, LogicalOperator::SubqueryAlias(_)))
        .expect("plan to contain a derived table")
}

/// Index of the first resolved reference to `name` in the plan.
fn column_index(plan: &LogicalOperator, name: &str) -> Option<usize> {
    let mut found = None;
    inspect_plan_expressions(plan, &mut |expr| match expr {
        Expression::Column(column) if column.name == name => {
            found = Some(column.index);
            Recursion::Stop
        }
        _ => Recursion::Continue,
    });
    found
}

#[test]
fn correlated_subquery_not_cacheable() {
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(col("d"), col("b")))
        .project([col("c")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    assert!(plan.resolved());
    assert!(matches!(plan, LogicalOperator::QueryProcess(_)));

    let sq = only_subquery(&plan);
    assert!(!sq.cacheable);
    // Layout inside the subquery is t1.a, t1.b, t2.c, t2.d.
    assert_eq!(Some(1), column_index(&sq.query, "b"));
    assert_eq!(Some(3), column_index(&sq.query, "d"));
    assert!(matches!(*sq.query, LogicalOperator::Project(_)));
}

#[test]
fn uncorrelated_subquery_cacheable() {
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(col("c"), lit(1)))
        .project([col("c")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    let sq = only_subquery(&plan);
    assert!(sq.cacheable);

    let calls = AtomicUsize::new(0);
    for _ in 0..2 {
        let results = sq
            .results(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![ScalarValue::Int64(1)])
            })
            .unwrap();
        assert_eq!(&[ScalarValue::Int64(1)], results.as_slice());
    }
    assert_eq!(1, calls.load(Ordering::SeqCst));
}

#[test]
fn non_deterministic_subquery_not_cacheable() {
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(
            col("c"),
            volatile_function("rand", Vec::new(), DataType::Int64),
        ))
        .project([col("c")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    assert!(plan.resolved());
    assert!(!only_subquery(&plan).cacheable);
}

#[test]
fn missing_column_fails_only_after_finalize() {
    let inner = PlanBuilder::unresolved_table("t2")
        .project([col("missing")])
        .build();
    let analyzer = analyzer();

    let tentative = analyzer
        .analyze_through_batch(
            &AnalysisContext::new(),
            where_a_equals(inner.clone()),
            &Scope::empty(),
            DEFAULT_RULES,
            &RuleSelector::all(),
        )
        .unwrap();
    assert!(!tentative.data.resolved());

    let err = analyzer.analyze(where_a_equals(inner)).unwrap_err();
    assert!(
        matches!(&err, AnalyzerError::ColumnNotFound { column } if column == "missing"),
        "{err}"
    );
}

#[test]
fn derived_table_column_count_mismatch() {
    let plan = PlanBuilder::unresolved_table("t1")
        .project([col("a")])
        .subquery_alias("sq", ["x", "y"])
        .project([col("x")])
        .build();

    let err = analyzer().analyze(plan).unwrap_err();
    assert!(
        matches!(
            &err,
            AnalyzerError::ColumnCountMismatch {
                alias,
                declared: 2,
                produced: 1,
            } if alias == "sq"
        ),
        "{err}"
    );
}

#[test]
fn top_level_derived_table() {
    let plan = PlanBuilder::from(derived("sq", "t1", "a"))
        .project([col("a")])
        .build();

    let plan = analyzer().analyze(plan).unwrap();
    assert!(plan.resolved());

    let LogicalOperator::SubqueryAlias(sqa) = first_derived_table(&plan) else {
        unreachable!()
    };
    assert!(!sqa.node.outer_scope_visibility);
    assert_eq!(Some(0), column_index(&plan, "a"));
}

#[test]
fn derived_table_in_subquery_sees_outer_tables() {
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(col("c"), col("a")))
        .project([col("c")])
        .subquery_alias("sq", ["x"])
        .project([col("x")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    assert!(plan.resolved());

    let sq = only_subquery(&plan);
    assert!(!sq.cacheable);

    let LogicalOperator::SubqueryAlias(sqa) = first_derived_table(&sq.query) else {
        unreachable!()
    };
    assert!(sqa.node.outer_scope_visibility);
    // t1.a is still the first column of the layout two levels down.
    assert_eq!(Some(0), column_index(&sq.query, "a"));
    assert_eq!(Some(2), column_index(&sq.query, "x"));
}

#[test]
fn aliases_hidden_from_nested_derived_tables() {
    // SELECT a, b AS bee, (SELECT x FROM (SELECT c FROM t2 WHERE d = bee) sq (x)) FROM t1
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(col("d"), col("bee")))
        .project([col("c")])
        .subquery_alias("sq", ["x"])
        .project([col("x")])
        .build();
    let plan = PlanBuilder::unresolved_table("t1")
        .project([
            col("a"),
            alias(col("b"), "bee"),
            subquery(inner),
        ])
        .build();

    let err = analyzer().analyze(plan).unwrap_err();
    assert!(
        matches!(&err, AnalyzerError::ColumnNotFound { column } if column == "bee"),
        "{err}"
    );
}

#[test]
fn top_level_join_caches_non_primary_side() {
    let plan = PlanBuilder::from(derived("l", "t1", "a"))
        .join(
            derived("r", "t2", "c"),
            JoinType::Inner,
            Some(eq(col("a"), col("c"))),
        )
        .project([col("a")])
        .build();

    let plan = strip_passthrough_nodes(analyzer().analyze(plan).unwrap());
    let LogicalOperator::Project(project) = &plan else {
        panic!("expected project, got {}", plan.name());
    };
    let LogicalOperator::Join(join) = &project.children[0] else {
        panic!("expected join");
    };

    assert_eq!(0, join.node.scope_len);
    assert!(matches!(join.children[0], LogicalOperator::SubqueryAlias(_)));
    let LogicalOperator::CachedResults(cached) = &join.children[1] else {
        panic!("expected cached results, got {}", join.children[1].name());
    };
    assert!(matches!(cached.children[0], LogicalOperator::SubqueryAlias(_)));
}

#[test]
fn join_in_subquery_caches_both_sides() {
    let inner = PlanBuilder::from(derived("l", "t2", "c"))
        .join(derived("r", "t2", "c"), JoinType::Inner, None)
        .project([qualified_col("l", "c")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    assert!(plan.resolved());

    let sq = only_subquery(&plan);
    let LogicalOperator::Project(project) = &*sq.query else {
        panic!("expected project, got {}", sq.query.name());
    };
    let LogicalOperator::Join(join) = &project.children[0] else {
        panic!("expected join");
    };

    // Outer t1 contributes two columns to every row.
    assert_eq!(2, join.node.scope_len);
    for child in &join.children {
        let LogicalOperator::StripRow(strip) = child else {
            panic!("expected strip row, got {}", child.name());
        };
        assert_eq!(2, strip.node.num_columns);
        assert!(matches!(strip.children[0], LogicalOperator::CachedResults(_)));
    }
    assert_eq!(Some(2), column_index(&sq.query, "c"));
}

#[test]
fn show_columns_for_view() {
    let plan = PlanBuilder::unresolved_table("t1")
        .project([col("b")])
        .subquery_alias("v", ["name"])
        .show_columns()
        .build();

    let plan = strip_passthrough_nodes(analyzer().analyze(plan).unwrap());
    let LogicalOperator::ShowColumns(show) = &plan else {
        panic!("expected show columns, got {}", plan.name());
    };
    assert_eq!(
        vec![ColumnSchema::new("name", "v", DataType::Utf8)],
        show.described_schema()
    );
}

#[test]
fn explain_analyzed_plan() {
    let inner = PlanBuilder::unresolved_table("t2")
        .filter(eq(col("c"), lit(1)))
        .project([col("c")])
        .build();

    let plan = analyzer().analyze(where_a_equals(inner)).unwrap();
    let rendered = ExplainNode::new_from_logical_plan(false, &plan).render();

    let expected = [
        "QueryProcess",
        "  Project (projections = [t1.b#1])",
        "    Filter (predicate = t1.a#0 = (subquery cacheable))",
        "      Scan (table = t1)",
        "      Subquery (cacheable = true)",
        "        Project (projections = [t2.c#2])",
        "          Filter (predicate = t2.c#2 = 1)",
        "            Scan (table = t2)",
    ];
    assert_eq!(expected.join("\n") + "\n", rendered);
}

#[test]
fn settings_change_analysis() {
    logutil::init_test();

    let catalog = Arc::new(MemoryCatalog::new());
    catalog.create_table("t1", [("a", DataType::Int64)]);

    let mut config = AnalyzerConfig::default();
    config.set_from_str("log_plan_changes", "true").unwrap();
    let analyzer = Analyzer::new(catalog.clone(), config.clone());
    let plan = PlanBuilder::unresolved_table("t1").project([col("a")]).build();
    assert!(analyzer.analyze(plan.clone()).unwrap().resolved());

    // Resolving the table takes a pass, confirming nothing changes takes
    // another.
    config.set_from_str("max_iterations", "1").unwrap();
    let analyzer = Analyzer::new(catalog, config);
    let err = analyzer.analyze(plan).unwrap_err();
    assert!(
        matches!(
            err,
            AnalyzerError::MaxIterations {
                batch: DEFAULT_RULES,
                iterations: 1
            }
        ),
        "{err}"
    );
}
