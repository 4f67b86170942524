//! Tests for ForestBuilder and cost aggregation

use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use costtree::domain::{
    group_by_company_id, CompanyId, CompanyRecord, CostState, DomainError, ExpenseTotals, Forest,
    ForestBuilder, TravelRecord,
};
use costtree::util::testing;

fn company(id: &str, parent: Option<&str>) -> CompanyRecord {
    CompanyRecord::new(
        id,
        "2021-02-26T00:55:36.632Z",
        format!("Company {id}"),
        parent.map(CompanyId::from),
    )
}

fn expenses(pairs: &[(&str, &str)]) -> ExpenseTotals {
    let travels: Vec<TravelRecord> = pairs
        .iter()
        .map(|(id, price)| TravelRecord::new(*id, *price))
        .collect();
    group_by_company_id(&travels).unwrap()
}

/// Root 1 with cost 10, child 2 with cost 5, grandchild 3 with cost 2
fn chain() -> Vec<CompanyRecord> {
    vec![
        company("1", None),
        company("2", Some("1")),
        company("3", Some("2")),
    ]
}

fn chain_expenses() -> ExpenseTotals {
    expenses(&[("1", "10"), ("2", "5"), ("3", "2")])
}

/// Checks `cost = internal + Σ child cost` on every node of the forest.
fn assert_recurrence(forest: &mut Forest) {
    let roots = forest.roots().to_vec();
    for root in roots {
        let indices: Vec<_> = forest.iter(root).map(|(idx, _)| idx).collect();
        for idx in indices {
            let children = forest.get_node(idx).unwrap().children.clone();
            let internal = forest.get_node(idx).unwrap().internal_cost();
            let mut expected = internal;
            for child in children {
                expected += forest.effective_cost(child).unwrap();
            }
            assert_eq!(forest.effective_cost(idx).unwrap(), expected);
        }
    }
}

// ============================================================
// Cost aggregation
// ============================================================

#[test]
fn given_three_level_chain_when_computing_costs_then_subtrees_are_folded_in() {
    testing::init_test_setup();
    let mut forest = ForestBuilder::new(chain_expenses()).build(&chain()).unwrap();

    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.root_nodes().next().unwrap().id, CompanyId::from("1"));
    assert_eq!(forest.effective_cost_of(&"3".into()).unwrap(), dec!(2));
    assert_eq!(forest.effective_cost_of(&"2".into()).unwrap(), dec!(7));
    assert_eq!(forest.effective_cost_of(&"1".into()).unwrap(), dec!(17));
}

#[test]
fn given_company_without_travels_when_building_then_internal_cost_is_zero() {
    let mut forest = ForestBuilder::new(expenses(&[("2", "4")]))
        .build(&[company("1", None), company("2", Some("1"))])
        .unwrap();

    assert_eq!(
        forest.node_by_id(&"1".into()).unwrap().internal_cost(),
        Decimal::ZERO
    );
    assert_eq!(forest.effective_cost_of(&"1".into()).unwrap(), dec!(4));
}

#[test]
fn given_branching_forest_when_computing_then_recurrence_holds_on_every_node() {
    let companies = vec![
        company("a", None),
        company("b", Some("a")),
        company("c", Some("a")),
        company("d", Some("b")),
        company("e", Some("b")),
        company("f", None),
        company("g", Some("f")),
    ];
    let costs = expenses(&[
        ("a", "1.10"),
        ("b", "2.20"),
        ("c", "3.30"),
        ("d", "4.40"),
        ("e", "5.50"),
        ("g", "0.01"),
    ]);
    let mut forest = ForestBuilder::new(costs).build(&companies).unwrap();

    assert_recurrence(&mut forest);
    assert_eq!(forest.compute_all().unwrap(), dec!(16.51));
}

#[test]
fn given_computed_cost_when_queried_again_then_value_is_identical() {
    let mut forest = ForestBuilder::new(chain_expenses()).build(&chain()).unwrap();

    let first = forest.effective_cost_of(&"1".into()).unwrap();
    let second = forest.effective_cost_of(&"1".into()).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        forest.node_by_id(&"1".into()).unwrap().cost_state(),
        CostState::Computed(dec!(17))
    );
}

#[test]
fn given_leaf_query_when_computing_then_other_branches_stay_uncomputed() {
    let mut forest = ForestBuilder::new(chain_expenses())
        .build(&[
            company("1", None),
            company("2", Some("1")),
            company("3", Some("1")),
        ])
        .unwrap();

    forest.effective_cost_of(&"2".into()).unwrap();

    assert_eq!(forest.node_by_id(&"2".into()).unwrap().cached_cost(), Some(dec!(5)));
    assert_eq!(forest.node_by_id(&"3".into()).unwrap().cached_cost(), None);
    assert_eq!(forest.node_by_id(&"1".into()).unwrap().cached_cost(), None);
}

#[test]
fn given_empty_input_when_building_then_forest_is_empty() {
    let mut forest = ForestBuilder::default().build(&[]).unwrap();

    assert!(forest.is_empty());
    assert_eq!(forest.compute_all().unwrap(), Decimal::ZERO);
    assert!(forest.to_views().unwrap().is_empty());
}

// ============================================================
// Ordering
// ============================================================

#[rstest]
#[case(vec![0, 1, 2, 3, 4])]
#[case(vec![4, 3, 2, 1, 0])]
#[case(vec![2, 4, 0, 3, 1])]
#[case(vec![1, 3, 0, 4, 2])]
fn given_permuted_companies_when_building_then_shape_and_costs_are_identical(
    #[case] order: Vec<usize>,
) {
    let base = vec![
        company("r1", None),
        company("c1", Some("r1")),
        company("r2", None),
        company("c2", Some("c1")),
        company("c3", Some("r2")),
    ];
    let costs = expenses(&[("r1", "1"), ("c1", "2"), ("r2", "3"), ("c2", "4"), ("c3", "5")]);
    let permuted: Vec<CompanyRecord> = order.iter().map(|&i| base[i].clone()).collect();

    let mut forest = ForestBuilder::new(costs).build(&permuted).unwrap();

    // Roots follow the permuted input order
    let expected_roots: Vec<CompanyId> = permuted
        .iter()
        .filter(|c| c.is_root())
        .map(|c| c.id.clone())
        .collect();
    let roots: Vec<CompanyId> = forest.root_nodes().map(|n| n.id.clone()).collect();
    assert_eq!(roots, expected_roots);

    assert_eq!(forest.effective_cost_of(&"r1".into()).unwrap(), dec!(7));
    assert_eq!(forest.effective_cost_of(&"r2".into()).unwrap(), dec!(8));
    let r1 = forest.index_of(&"r1".into()).unwrap();
    assert_eq!(forest.depth(r1), 3);
    assert_eq!(forest.leaf_ids(r1), vec![CompanyId::from("c2")]);
}

#[test]
fn given_shuffled_travels_when_grouping_then_totals_are_identical() {
    let travels = vec![
        TravelRecord::new("1", "10.5"),
        TravelRecord::new("2", "3"),
        TravelRecord::new("1", "0.25"),
        TravelRecord::new("3", "7"),
        TravelRecord::new("2", "1.75"),
    ];
    let mut reversed = travels.clone();
    reversed.reverse();

    assert_eq!(
        group_by_company_id(&travels).unwrap(),
        group_by_company_id(&reversed).unwrap()
    );
}

#[test]
fn given_children_when_building_then_keep_input_order_under_parent() {
    let forest = ForestBuilder::default()
        .build(&[
            company("kid-b", Some("root")),
            company("root", None),
            company("kid-a", Some("root")),
        ])
        .unwrap();

    let root = forest.index_of(&"root".into()).unwrap();
    let children: Vec<String> = forest
        .get_node(root)
        .unwrap()
        .children
        .iter()
        .map(|&idx| forest.get_node(idx).unwrap().id.to_string())
        .collect();
    assert_eq!(children, vec!["kid-b", "kid-a"]);
}

// ============================================================
// Structural errors
// ============================================================

#[test]
fn given_unknown_parent_when_building_then_dangling_reference_error() {
    let result = ForestBuilder::default().build(&[company("1", None), company("2", Some("404"))]);

    assert_eq!(
        result.unwrap_err(),
        DomainError::DanglingParent {
            child: "2".into(),
            parent: "404".into(),
        }
    );
}

#[test]
fn given_self_parent_when_building_then_cyclic_ancestry_error() {
    let result = ForestBuilder::default().build(&[company("1", None), company("2", Some("2"))]);

    assert_eq!(result.unwrap_err(), DomainError::CyclicAncestry("2".into()));
}

#[test]
fn given_three_node_loop_when_building_then_cyclic_ancestry_error() {
    let result = ForestBuilder::default().build(&[
        company("x", Some("z")),
        company("y", Some("x")),
        company("z", Some("y")),
    ]);

    assert!(matches!(result, Err(DomainError::CyclicAncestry(_))));
}

#[test]
fn given_duplicate_ids_when_building_then_duplicate_error() {
    let result = ForestBuilder::default().build(&[company("1", None), company("1", None)]);

    assert_eq!(result.unwrap_err(), DomainError::DuplicateCompany("1".into()));
}
