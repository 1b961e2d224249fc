//! Menu tree assembly
//!
//! Arranges a flat list of menu records into nested [`MenuNode`]s. Pure, no I/O.

use shared::models::{MenuNode, MenuTreeItem};
use std::collections::{HashMap, HashSet};

/// Deepest nesting the tree supports; a root sits at depth 1
pub const MAX_MENU_DEPTH: usize = 10;

/// Build the nested menu tree from a flat list
///
/// - records without `parent_id` become roots
/// - records whose parent is not in `items` are dropped
/// - siblings are ordered by `menu_order`; ties keep input order
/// - records on a parent cycle are unreachable from any root and are dropped
/// - records below [`MAX_MENU_DEPTH`] are dropped
pub fn build_menu_hierarchy<T: MenuTreeItem>(items: Vec<T>) -> Vec<MenuNode<T>> {
    let present: HashSet<i64> = items.iter().map(MenuTreeItem::id).collect();

    let mut roots = Vec::new();
    let mut children: HashMap<i64, Vec<T>> = HashMap::new();
    let mut orphans = 0usize;

    for item in items {
        match item.parent_id() {
            None => roots.push(item),
            Some(parent_id) if present.contains(&parent_id) => {
                children.entry(parent_id).or_default().push(item);
            }
            Some(_) => orphans += 1,
        }
    }

    let mut tree = attach_children(roots, &mut children, 1);

    if orphans > 0 || !children.is_empty() {
        let unreachable: usize = children.values().map(Vec::len).sum();
        tracing::debug!(orphans, unreachable, "Dropped menus outside the tree");
    }

    tree.sort_by_key(|node| node.item.menu_order());
    tree
}

/// Each child list is removed from `pending` when attached, so a record is
/// visited at most once. Recursion stops at [`MAX_MENU_DEPTH`].
fn attach_children<T: MenuTreeItem>(
    items: Vec<T>,
    pending: &mut HashMap<i64, Vec<T>>,
    depth: usize,
) -> Vec<MenuNode<T>> {
    items
        .into_iter()
        .map(|item| {
            let kids = if depth < MAX_MENU_DEPTH {
                pending.remove(&item.id())
            } else {
                None
            };
            let mut nested = match kids {
                Some(kids) => attach_children(kids, pending, depth + 1),
                None => Vec::new(),
            };
            nested.sort_by_key(|node| node.item.menu_order());
            MenuNode {
                item,
                children: nested,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Item {
        id: i64,
        parent_id: Option<i64>,
        order: i32,
    }

    impl MenuTreeItem for Item {
        fn id(&self) -> i64 {
            self.id
        }

        fn parent_id(&self) -> Option<i64> {
            self.parent_id
        }

        fn menu_order(&self) -> i32 {
            self.order
        }
    }

    fn item(id: i64, parent_id: Option<i64>, order: i32) -> Item {
        Item {
            id,
            parent_id,
            order,
        }
    }

    fn ids<T: MenuTreeItem>(nodes: &[MenuNode<T>]) -> Vec<i64> {
        nodes.iter().map(|n| n.item.id()).collect()
    }

    fn count<T>(nodes: &[MenuNode<T>]) -> usize {
        nodes.iter().map(|n| 1 + count(&n.children)).sum()
    }

    #[test]
    fn test_empty_input() {
        assert!(build_menu_hierarchy(Vec::<Item>::new()).is_empty());
    }

    #[test]
    fn test_nests_and_orders_children() {
        let tree = build_menu_hierarchy(vec![
            item(1, None, 0),
            item(2, Some(1), 2),
            item(3, Some(1), 1),
            item(4, Some(3), 0),
            item(5, None, 1),
        ]);

        assert_eq!(ids(&tree), vec![1, 5]);
        assert_eq!(ids(&tree[0].children), vec![3, 2]);
        assert_eq!(ids(&tree[0].children[0].children), vec![4]);
        assert!(tree[1].children.is_empty());
    }

    #[test]
    fn test_children_arriving_before_parent() {
        let tree = build_menu_hierarchy(vec![item(2, Some(1), 0), item(1, None, 0)]);
        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(ids(&tree[0].children), vec![2]);
    }

    #[test]
    fn test_equal_order_keeps_arrival_order() {
        let tree = build_menu_hierarchy(vec![
            item(1, None, 0),
            item(9, Some(1), 5),
            item(3, Some(1), 5),
            item(7, Some(1), 5),
        ]);
        assert_eq!(ids(&tree[0].children), vec![9, 3, 7]);
    }

    #[test]
    fn test_orphans_are_dropped() {
        let tree = build_menu_hierarchy(vec![
            item(1, None, 0),
            item(2, Some(99), 0),
            item(3, Some(2), 0),
        ]);
        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(count(&tree), 1);
    }

    #[test]
    fn test_cycle_is_dropped_without_looping() {
        let tree = build_menu_hierarchy(vec![
            item(1, None, 0),
            item(2, Some(3), 0),
            item(3, Some(2), 0),
            item(4, Some(4), 0),
        ]);
        assert_eq!(ids(&tree), vec![1]);
        assert_eq!(count(&tree), 1);
    }

    fn chain(len: i64) -> Vec<Item> {
        (1..=len)
            .map(|id| item(id, if id == 1 { None } else { Some(id - 1) }, 0))
            .collect()
    }

    fn depth<T>(nodes: &[MenuNode<T>]) -> usize {
        nodes.iter().map(|n| 1 + depth(&n.children)).max().unwrap_or(0)
    }

    #[test]
    fn test_chain_at_max_depth_is_complete() {
        let tree = build_menu_hierarchy(chain(MAX_MENU_DEPTH as i64));
        assert_eq!(count(&tree), MAX_MENU_DEPTH);
        assert_eq!(depth(&tree), MAX_MENU_DEPTH);
    }

    #[test]
    fn test_long_chain_is_cut_at_max_depth() {
        let tree = build_menu_hierarchy(chain(5000));
        assert_eq!(count(&tree), MAX_MENU_DEPTH);
        assert_eq!(depth(&tree), MAX_MENU_DEPTH);
    }

    #[test]
    fn test_every_reachable_record_appears_once() {
        let input: Vec<Item> = (1..=20)
            .map(|id| item(id, if id == 1 { None } else { Some(id / 2) }, (id % 3) as i32))
            .collect();
        let tree = build_menu_hierarchy(input);
        assert_eq!(count(&tree), 20);
    }
}
