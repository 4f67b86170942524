//! Nested, serializable shape of a computed forest

use std::collections::HashMap;

use generational_arena::Index;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::Forest;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::CompanyId;

/// One company with its effective cost and its children, recursively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
    pub id: CompanyId,
    pub created_at: String,
    pub name: String,
    pub parent_id: Option<CompanyId>,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub cost: Decimal,
    pub children: Vec<CompanyView>,
}

impl CompanyView {
    /// Number of companies in this subtree, including itself.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(CompanyView::subtree_len).sum::<usize>()
    }

    /// Depth-first search for a company in this subtree.
    pub fn find(&self, id: &CompanyId) -> Option<&CompanyView> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

impl Forest {
    /// Views of all roots in input order, computing costs where still missing.
    #[instrument(level = "debug", skip(self))]
    pub fn to_views(&mut self) -> DomainResult<Vec<CompanyView>> {
        let roots = self.roots().to_vec();
        roots.into_iter().map(|root| self.view_of(root)).collect()
    }

    /// View of the subtree under `idx`.
    ///
    /// Children are assembled before their parents, so arbitrarily deep
    /// chains do not grow the call stack.
    pub fn view_of(&mut self, idx: Index) -> DomainResult<CompanyView> {
        self.effective_cost(idx)?;
        let order: Vec<Index> = self.iter_postorder(idx).map(|(i, _)| i).collect();

        let mut built: HashMap<Index, CompanyView> = HashMap::with_capacity(order.len());
        for current in order {
            let node = self.get_node(current).ok_or(DomainError::NodeNotFound)?;
            let cost = node.cached_cost().ok_or(DomainError::NodeNotFound)?;
            let children = node
                .children
                .iter()
                .map(|child| built.remove(child).ok_or(DomainError::NodeNotFound))
                .collect::<DomainResult<Vec<_>>>()?;

            let view = CompanyView {
                id: node.id.clone(),
                created_at: node.created_at.clone(),
                name: node.name.clone(),
                parent_id: node.parent_id.clone(),
                cost,
                children,
            };
            built.insert(current, view);
        }

        built.remove(&idx).ok_or(DomainError::NodeNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyRecord, ForestBuilder, TravelRecord, group_by_company_id};
    use rust_decimal_macros::dec;

    fn forest() -> Forest {
        let expenses = group_by_company_id(&[
            TravelRecord::new("1", "10"),
            TravelRecord::new("2", "5"),
            TravelRecord::new("3", "2"),
        ])
        .unwrap();
        ForestBuilder::new(expenses)
            .build(&[
                CompanyRecord::new("3", "2020-01-03", "Grandchild", Some("2".into())),
                CompanyRecord::new("1", "2020-01-01", "Root", None),
                CompanyRecord::new("2", "2020-01-02", "Child", Some("1".into())),
            ])
            .unwrap()
    }

    #[test]
    fn given_forest_when_viewing_then_nests_children_with_costs() {
        let views = forest().to_views().unwrap();

        assert_eq!(views.len(), 1);
        let root = &views[0];
        assert_eq!(root.cost, dec!(17));
        assert_eq!(root.subtree_len(), 3);
        assert_eq!(root.find(&"2".into()).unwrap().cost, dec!(7));
        assert_eq!(root.find(&"3".into()).unwrap().cost, dec!(2));
        assert!(root.find(&"4".into()).is_none());
    }

    #[test]
    fn given_long_chain_when_viewing_then_every_level_carries_its_subtree_cost() {
        const DEPTH: usize = 1_000;
        let companies: Vec<CompanyRecord> = (0..DEPTH)
            .map(|i| {
                let parent = i.checked_sub(1).map(|p| CompanyId::new(p.to_string()));
                CompanyRecord::new(i.to_string(), "2020-01-01", format!("Level {i}"), parent)
            })
            .collect();
        let travels: Vec<TravelRecord> = (0..DEPTH)
            .map(|i| TravelRecord::new(i.to_string(), "1"))
            .collect();
        let mut forest = ForestBuilder::new(group_by_company_id(&travels).unwrap())
            .build(&companies)
            .unwrap();

        let views = forest.to_views().unwrap();

        let mut current = &views[0];
        let mut level = 0;
        loop {
            assert_eq!(current.id, CompanyId::new(level.to_string()));
            assert_eq!(current.cost, Decimal::from(DEPTH - level));
            match current.children.first() {
                Some(child) => current = child,
                None => break,
            }
            level += 1;
        }
        assert_eq!(level, DEPTH - 1);
    }

    #[test]
    fn given_view_when_serialized_then_uses_camel_case_and_numeric_cost() {
        let views = forest().to_views().unwrap();

        let json = serde_json::to_value(&views).unwrap();

        let root = &json[0];
        assert_eq!(root["id"], "1");
        assert_eq!(root["createdAt"], "2020-01-01");
        assert!(root["parentId"].is_null());
        assert!(root["cost"].is_number());
        assert_eq!(root["children"][0]["parentId"], "1");
    }
}
