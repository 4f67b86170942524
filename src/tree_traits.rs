/*
Rendering of computed company trees as terminal trees.
 */
use termtree::Tree;
use tracing::instrument;

use crate::domain::CompanyView;

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for CompanyView {
    #[instrument(level = "trace", skip(self), fields(id = %self.id))]
    fn to_tree_string(&self) -> Tree<String> {
        // Label carries the effective cost, i.e. the whole subtree
        let root = format!("{} [{}] cost={}", self.name, self.id, self.cost);

        // Recursively construct the children
        let leaves: Vec<_> = self
            .children
            .iter()
            .map(|c| c.to_tree_string())
            .collect();

        Tree::new(root).with_leaves(leaves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn view(id: &str, cost: rust_decimal::Decimal, children: Vec<CompanyView>) -> CompanyView {
        CompanyView {
            id: id.into(),
            created_at: "2020-01-01".into(),
            name: format!("Company {id}"),
            parent_id: None,
            cost,
            children,
        }
    }

    #[test]
    fn given_nested_view_when_rendering_then_lists_every_company_with_cost() {
        let tree = view("1", dec!(17), vec![view("2", dec!(7), vec![view("3", dec!(2), vec![])])]);

        let rendered = tree.to_tree_string().to_string();

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Company 1 [1] cost=17");
        assert!(lines[1].ends_with("Company 2 [2] cost=7"));
        assert!(lines[2].ends_with("Company 3 [3] cost=2"));
    }
}
