//! Single-feature CART regression tree with minimal cost-complexity pruning.
//!
//! Growth is exhaustive (one sample per leaf at most, squared-error
//! criterion) and deterministic: among equally good splits the leftmost
//! wins. Pruning then repeatedly collapses the weakest link while its
//! effective alpha does not exceed the complexity parameter.

use crate::error::{Result, invalid};

/// Consecutive feature values closer than this are not split between.
const FEATURE_THRESHOLD: f64 = 1e-7;

#[derive(Debug, Clone)]
struct TreeNode {
    parent: Option<usize>,
    /// `(threshold, left, right)`; `None` for a leaf.
    split: Option<(f64, usize, usize)>,
    value: f64,
    /// Mean squared deviation of the node's samples around `value`.
    impurity: f64,
    n_samples: usize,
}

/// A fitted regression tree over one feature.
#[derive(Debug, Clone)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Grow a full tree on `(x, y)` and prune it with `ccp_alpha`.
    pub fn fit(x: &[f64], y: &[f64], ccp_alpha: f64) -> Result<Self> {
        if x.len() != y.len() {
            return Err(invalid(format!(
                "tree fit: x has {} values but y has {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(invalid("tree fit: no samples"));
        }
        if !ccp_alpha.is_finite() || ccp_alpha < 0.0 {
            return Err(invalid(format!("ccp_alpha must be non-negative, got {ccp_alpha}")));
        }

        let mut order: Vec<usize> = (0..x.len()).collect();
        order.sort_by(|&a, &b| x[a].total_cmp(&x[b]));
        let xs: Vec<f64> = order.iter().map(|&i| x[i]).collect();
        let ys: Vec<f64> = order.iter().map(|&i| y[i]).collect();

        let mut tree = Self::grow(&xs, &ys);
        if ccp_alpha > 0.0 {
            tree.prune(ccp_alpha);
        }
        Ok(tree)
    }

    /// Depth-first growth; node ids come out in pre-order, left child first.
    fn grow(xs: &[f64], ys: &[f64]) -> Self {
        let mut nodes: Vec<TreeNode> = Vec::new();
        // (start, end, parent, is_left)
        let mut stack: Vec<(usize, usize, Option<usize>, bool)> = vec![(0, xs.len(), None, false)];

        while let Some((start, end, parent, is_left)) = stack.pop() {
            let (value, impurity) = mean_and_mse(&ys[start..end]);
            let id = nodes.len();
            nodes.push(TreeNode {
                parent,
                split: None,
                value,
                impurity,
                n_samples: end - start,
            });
            if let Some(p) = parent {
                link_child(&mut nodes[p], id, is_left);
            }

            if end - start < 2 || impurity <= f64::EPSILON {
                continue;
            }
            let Some((pos, threshold)) = best_split(&xs[start..end], &ys[start..end]) else {
                continue;
            };
            // Placeholder children, patched by `link_child` as they are created.
            nodes[id].split = Some((threshold, usize::MAX, usize::MAX));
            stack.push((start + pos, end, Some(id), false));
            stack.push((start, start + pos, Some(id), true));
        }

        RegressionTree { nodes }
    }

    /// Weakest-link pruning: collapse the internal node with the smallest
    /// effective alpha until that alpha exceeds `ccp_alpha`.
    fn prune(&mut self, ccp_alpha: f64) {
        let n = self.nodes.len();
        let total = self.nodes[0].n_samples as f64;
        let r_node: Vec<f64> = self
            .nodes
            .iter()
            .map(|t| t.n_samples as f64 / total * t.impurity)
            .collect();

        // Pre-order ids: every child id is larger than its parent's, so a
        // reverse sweep visits children first.
        let mut n_leaves = vec![0usize; n];
        let mut r_branch = vec![0.0f64; n];
        for id in (0..n).rev() {
            match self.nodes[id].split {
                None => {
                    n_leaves[id] = 1;
                    r_branch[id] = r_node[id];
                }
                Some((_, l, r)) => {
                    n_leaves[id] = n_leaves[l] + n_leaves[r];
                    r_branch[id] = r_branch[l] + r_branch[r];
                }
            }
        }

        let mut in_tree = vec![true; n];
        loop {
            let mut weakest: Option<(usize, f64)> = None;
            for id in 0..n {
                if !in_tree[id] || self.nodes[id].split.is_none() {
                    continue;
                }
                let alpha = (r_node[id] - r_branch[id]) / (n_leaves[id] - 1) as f64;
                if weakest.map_or(true, |(_, best)| alpha < best) {
                    weakest = Some((id, alpha));
                }
            }
            let Some((id, alpha)) = weakest else { break };
            if alpha > ccp_alpha {
                break;
            }

            let removed_leaves = n_leaves[id] - 1;
            let removed_risk = r_branch[id] - r_node[id];
            self.collapse(id, &mut in_tree);
            n_leaves[id] = 1;
            r_branch[id] = r_node[id];

            let mut ancestor = self.nodes[id].parent;
            while let Some(a) = ancestor {
                n_leaves[a] -= removed_leaves;
                r_branch[a] -= removed_risk;
                ancestor = self.nodes[a].parent;
            }
        }
    }

    /// Turn `id` into a leaf and drop its descendants from the live tree.
    fn collapse(&mut self, id: usize, in_tree: &mut [bool]) {
        let mut stack = match self.nodes[id].split.take() {
            Some((_, l, r)) => vec![l, r],
            None => return,
        };
        while let Some(d) = stack.pop() {
            in_tree[d] = false;
            if let Some((_, l, r)) = self.nodes[d].split {
                stack.push(l);
                stack.push(r);
            }
        }
    }

    /// Evaluate the step function at `x` (`x <= threshold` goes left).
    pub fn predict(&self, x: f64) -> f64 {
        let mut id = 0;
        while let Some((threshold, l, r)) = self.nodes[id].split {
            id = if x <= threshold { l } else { r };
        }
        self.nodes[id].value
    }

    /// Number of leaves reachable from the root.
    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![0usize];
        while let Some(id) = stack.pop() {
            match self.nodes[id].split {
                Some((_, l, r)) => {
                    stack.push(l);
                    stack.push(r);
                }
                None => count += 1,
            }
        }
        count
    }

    /// Split thresholds of the live tree in ascending order.
    pub fn thresholds(&self) -> Vec<f64> {
        let mut out = Vec::new();
        let mut stack = vec![0usize];
        while let Some(id) = stack.pop() {
            if let Some((t, l, r)) = self.nodes[id].split {
                out.push(t);
                stack.push(l);
                stack.push(r);
            }
        }
        out.sort_by(f64::total_cmp);
        out
    }
}

fn link_child(parent: &mut TreeNode, child: usize, is_left: bool) {
    if let Some((_, l, r)) = parent.split.as_mut() {
        if is_left {
            *l = child;
        } else {
            *r = child;
        }
    }
}

fn mean_and_mse(ys: &[f64]) -> (f64, f64) {
    let n = ys.len() as f64;
    let mean = ys.iter().sum::<f64>() / n;
    let mse = ys.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n;
    (mean, mse)
}

/// Best squared-error split of a sorted slice: `(position, threshold)` where
/// the left child takes `[0, position)`.
///
/// Maximising `S_l²/n_l + S_r²/n_r` is equivalent to minimising the summed
/// child squared error. Only strictly better candidates replace the current
/// best, so ties resolve to the leftmost position.
fn best_split(xs: &[f64], ys: &[f64]) -> Option<(usize, f64)> {
    let n = xs.len();
    let sum_total: f64 = ys.iter().sum();
    let mut sum_left = 0.0;
    let mut best: Option<(usize, f64)> = None;
    let mut best_proxy = f64::NEG_INFINITY;

    for pos in 1..n {
        sum_left += ys[pos - 1];
        if xs[pos] <= xs[pos - 1] + FEATURE_THRESHOLD {
            continue;
        }
        let n_left = pos as f64;
        let n_right = (n - pos) as f64;
        let sum_right = sum_total - sum_left;
        let proxy = sum_left * sum_left / n_left + sum_right * sum_right / n_right;
        if proxy > best_proxy {
            best_proxy = proxy;
            let mut threshold = (xs[pos - 1] + xs[pos]) / 2.0;
            if threshold == xs[pos] || !threshold.is_finite() {
                threshold = xs[pos - 1];
            }
            best = Some((pos, threshold));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_target_is_single_leaf() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let tree = RegressionTree::fit(&x, &[0.5; 4], 0.0).unwrap();
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict(2.5), 0.5);
    }

    #[test]
    fn unpruned_tree_interpolates_training_points() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.0, 1.0, 4.0, 9.0, 16.0];
        let tree = RegressionTree::fit(&x, &y, 0.0).unwrap();
        assert_eq!(tree.leaf_count(), 5);
        for (&xi, &yi) in x.iter().zip(&y) {
            assert_eq!(tree.predict(xi), yi);
        }
    }

    #[test]
    fn step_target_splits_at_midpoint() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        let tree = RegressionTree::fit(&x, &y, 0.0).unwrap();
        assert_eq!(tree.thresholds(), vec![2.5]);
        assert_eq!(tree.predict(2.5), 0.0);
        assert_eq!(tree.predict(2.6), 1.0);
    }

    #[test]
    fn pruning_removes_weak_splits_first() {
        // A big step at 3.5 and a small wiggle inside the right half.
        let x = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = [0.0, 0.0, 0.0, 10.0, 10.2, 10.0];
        let full = RegressionTree::fit(&x, &y, 0.0).unwrap();
        assert!(full.leaf_count() > 2);

        // Weakest-link alpha of the wiggle is ~0.002, of the step ~25.
        let pruned = RegressionTree::fit(&x, &y, 0.01).unwrap();
        assert_eq!(pruned.leaf_count(), 2);
        assert_eq!(pruned.thresholds(), vec![3.5]);

        let stump = RegressionTree::fit(&x, &y, 100.0).unwrap();
        assert_eq!(stump.leaf_count(), 1);
    }

    #[test]
    fn unsorted_input_is_handled() {
        let x = [3.0, 1.0, 4.0, 2.0];
        let y = [1.0, 0.0, 1.0, 0.0];
        let tree = RegressionTree::fit(&x, &y, 0.0).unwrap();
        assert_eq!(tree.thresholds(), vec![2.5]);
    }

    #[test]
    fn ties_in_split_quality_take_leftmost() {
        // Symmetric spike: splitting left or right of it is equally good.
        let x = [1.0, 2.0, 3.0];
        let y = [0.0, 1.0, 0.0];
        let tree = RegressionTree::fit(&x, &y, 0.0).unwrap();
        let again = RegressionTree::fit(&x, &y, 0.0).unwrap();
        assert_eq!(tree.thresholds(), again.thresholds());
        assert_eq!(tree.thresholds(), vec![1.5, 2.5]);
        assert_eq!(tree.predict(2.0), 1.0);
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(RegressionTree::fit(&[1.0], &[1.0, 2.0], 0.0).is_err());
        assert!(RegressionTree::fit(&[], &[], 0.0).is_err());
        assert!(RegressionTree::fit(&[1.0], &[1.0], -0.1).is_err());
    }
}
