use crate::catalog::{contains_ignore_case, BranchRef};

/// How a remote-tracking branch maps onto the local branch namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteBranchMapping {
    /// Empty when no configured remote prefixes the branch.
    pub remote_name: String,
    pub local_name: String,
    /// Never equal (ignoring case) to an existing local branch.
    pub proposed_name: String,
}

/// Longest configured remote that prefixes `branch` followed by a `/`.
pub fn remote_name_of<'a>(branch: &str, remotes: &'a [String]) -> Option<&'a str> {
    remotes
        .iter()
        .filter(|remote| !remote.is_empty())
        .filter(|remote| {
            branch
                .strip_prefix(remote.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
        })
        .max_by_key(|remote| remote.len())
        .map(String::as_str)
}

pub fn resolve(branch: &str, remotes: &[String], locals: &[BranchRef]) -> RemoteBranchMapping {
    if branch.trim().is_empty() {
        return RemoteBranchMapping::default();
    }

    let remote_name = remote_name_of(branch, remotes).unwrap_or_default();
    let local_name = if remote_name.is_empty() {
        branch
    } else {
        &branch[remote_name.len() + 1..]
    };

    let base = format!("{remote_name}_{local_name}");
    let mut proposed_name = base.clone();
    let mut n = 2;

    while contains_ignore_case(locals, &proposed_name) {
        proposed_name = format!("{base}_{n}");
        n += 1;
    }

    tracing::debug!(
        branch,
        remote = remote_name,
        local = local_name,
        proposed = proposed_name.as_str(),
        "resolved remote branch"
    );

    RemoteBranchMapping {
        remote_name: remote_name.to_string(),
        local_name: local_name.to_string(),
        proposed_name,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::RefKind;

    fn locals(names: &[&str]) -> Vec<BranchRef> {
        names
            .iter()
            .map(|name| BranchRef::new(*name, RefKind::Local))
            .collect()
    }

    fn remotes(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_collision_suffix() {
        let mapping = resolve("origin/dev", &remotes(&["origin"]), &locals(&["origin_dev"]));

        assert_eq!(mapping.remote_name, "origin");
        assert_eq!(mapping.local_name, "dev");
        assert_eq!(mapping.proposed_name, "origin_dev_2");
    }

    #[test]
    fn test_collision_suffix_increments() {
        let mapping = resolve(
            "origin/dev",
            &remotes(&["origin"]),
            &locals(&["origin_dev", "origin_dev_2", "ORIGIN_DEV_3"]),
        );

        assert_eq!(mapping.proposed_name, "origin_dev_4");
    }

    #[test]
    fn test_longest_remote_wins() {
        let mapping = resolve(
            "origin/fork/feature/x",
            &remotes(&["origin", "origin/fork"]),
            &[],
        );

        assert_eq!(mapping.remote_name, "origin/fork");
        assert_eq!(mapping.local_name, "feature/x");
        assert_eq!(mapping.proposed_name, "origin/fork_feature/x");
    }

    #[test]
    fn test_remote_needs_separator() {
        let mapping = resolve("originals/dev", &remotes(&["origin"]), &[]);

        assert_eq!(mapping.remote_name, "");
        assert_eq!(mapping.local_name, "originals/dev");
        assert_eq!(mapping.proposed_name, "_originals/dev");
    }

    #[test]
    fn test_empty() {
        assert_eq!(
            resolve("", &remotes(&["origin"]), &locals(&["_"])),
            RemoteBranchMapping::default()
        );
        assert_eq!(resolve("  ", &[], &[]), RemoteBranchMapping::default());
    }

    proptest! {
        #[test]
        fn proposed_never_collides(
            local in "[a-z]{1,6}",
            existing in prop::collection::vec("origin_[a-z]{1,6}(_[2-5])?", 0..12),
        ) {
            let locals = existing.iter().map(|n| BranchRef::new(n.as_str(), RefKind::Local)).collect::<Vec<_>>();
            let mapping = resolve(&format!("origin/{local}"), &remotes(&["origin"]), &locals);

            prop_assert!(!contains_ignore_case(&locals, &mapping.proposed_name));
            prop_assert_eq!(mapping.local_name, local);
        }

        #[test]
        fn unknown_remote_keeps_name(branch in "[a-z]{1,8}(/[a-z]{1,8})?") {
            let mapping = resolve(&branch, &remotes(&["zzzzzzzzzz"]), &[]);

            prop_assert_eq!(mapping.remote_name, "");
            prop_assert_eq!(mapping.local_name, branch);
        }
    }
}
