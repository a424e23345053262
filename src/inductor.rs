//! Induction: turns freshly observed non-FD agreement masks into tree
//! specializations.

use crate::fd_tree::FdTree;
use crate::non_fd_set::NonFdSet;

/// Drains every unread mask from `non_fds` and specializes `fds` against
/// each: bits set in the mask become the LHS, the unset bits become the
/// RHSs ruled out for that LHS.
///
/// On the very first call `fds` is expected to already hold the maximal
/// conjecture `[] -> every attribute`, seeded by the engine before the
/// first sampling pass.
pub fn induce(fds: &mut FdTree, non_fds: &mut NonFdSet) {
    for mask in non_fds.drain_unread() {
        let lhs: Vec<usize> = mask.iter().enumerate().filter_map(|(i, &b)| b.then_some(i)).collect();
        let rhss: Vec<usize> = mask.iter().enumerate().filter_map(|(i, &b)| (!b).then_some(i)).collect();
        fds.specialize(&lhs, &rhss);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_splits_into_lhs_and_rhs() {
        let mut fds = FdTree::new(4);
        fds.add(&[], &[0, 1, 2, 3]);
        let mut non_fds = NonFdSet::new();
        non_fds.append(vec![true, true, false, false]);

        induce(&mut fds, &mut non_fds);

        let read: std::collections::HashSet<_> = fds.read_fds().into_iter().collect();
        assert!(!read.contains(&(vec![], 0)));
        assert!(!read.contains(&(vec![], 1)));
        assert!(read.contains(&(vec![], 2)));
        assert!(read.contains(&(vec![], 3)));
    }

    #[test]
    fn already_read_masks_are_not_reprocessed() {
        let mut fds = FdTree::new(2);
        fds.add(&[], &[0, 1]);
        let mut non_fds = NonFdSet::new();
        non_fds.append(vec![true, false]);
        induce(&mut fds, &mut non_fds);
        // second call with nothing new appended is a no-op
        induce(&mut fds, &mut non_fds);
        assert_eq!(non_fds.n_new_elements(), 0);
    }
}
