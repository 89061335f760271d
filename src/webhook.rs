//! Webhook related structures

use serde::Serialize;

/// State of a branch as reported by the hosting provider
#[derive(Debug, Clone, PartialEq)]
pub struct BranchSnapshot {
    pub branch: String,
    pub commit_sha: String,
    pub commit_message: String,
    pub tree_sha: String,
    pub author_name: String,
    /// `None` when the commit author has no linked account
    pub author_login: Option<String>,
    pub repository_full_name: String,
    pub repository_private: bool,
    pub clone_url: String,
}

/// Synthetic GitHub `push` event sent to LambCI.
///
/// Field order is the serialized key order and must stay stable, since the
/// signature is computed over the exact bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub after: String,
    pub created: bool,
    pub deleted: bool,
    pub forced: bool,
    pub before: String,
    pub clone_url: String,
    pub head_commit: HeadCommit,
    pub pusher: Pusher,
    pub repository: PayloadRepository,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadCommit {
    pub id: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pusher {
    pub name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadRepository {
    pub full_name: String,
    pub private: bool,
}

impl PushPayload {
    pub fn from_snapshot(snapshot: &BranchSnapshot) -> Self {
        Self {
            git_ref: format!("refs/heads/{}", snapshot.branch),
            after: snapshot.commit_sha.clone(),
            created: false,
            deleted: false,
            forced: false,
            // Tree sha, not the parent commit. Receivers depend on this value.
            before: snapshot.tree_sha.clone(),
            clone_url: snapshot.clone_url.clone(),
            head_commit: HeadCommit {
                id: snapshot.commit_sha.clone(),
                message: snapshot.commit_message.clone(),
            },
            pusher: Pusher {
                name: snapshot.author_name.clone(),
                username: snapshot.author_login.clone(),
            },
            repository: PayloadRepository {
                full_name: snapshot.repository_full_name.clone(),
                private: snapshot.repository_private,
            },
        }
    }

    /// Compact UTF-8 JSON in declaration order
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acme_site() -> BranchSnapshot {
        BranchSnapshot {
            branch: "master".to_string(),
            commit_sha: "abc123".to_string(),
            commit_message: "fix typo".to_string(),
            tree_sha: "def456".to_string(),
            author_name: "Jane Doe".to_string(),
            author_login: Some("janedoe".to_string()),
            repository_full_name: "acme/site".to_string(),
            repository_private: false,
            clone_url: "https://github.com/acme/site.git".to_string(),
        }
    }

    #[test]
    fn payload_matches_expected_bytes() {
        let payload = PushPayload::from_snapshot(&acme_site());
        let bytes = payload.to_bytes().unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"ref":"refs/heads/master","after":"abc123","created":false,"deleted":false,"forced":false,"before":"def456","clone_url":"https://github.com/acme/site.git","head_commit":{"id":"abc123","message":"fix typo"},"pusher":{"name":"Jane Doe","username":"janedoe"},"repository":{"full_name":"acme/site","private":false}}"#
        );
    }

    #[test]
    fn before_is_the_tree_sha() {
        let payload = PushPayload::from_snapshot(&acme_site());
        assert_eq!(payload.before, "def456");
        assert_ne!(payload.before, payload.after);
    }

    #[test]
    fn ref_uses_branch_name_verbatim() {
        let mut snapshot = acme_site();
        snapshot.branch = "feature/preview".to_string();
        let payload = PushPayload::from_snapshot(&snapshot);
        assert_eq!(payload.git_ref, "refs/heads/feature/preview");
    }

    #[test]
    fn missing_author_login_serializes_as_null() {
        let mut snapshot = acme_site();
        snapshot.author_login = None;
        let bytes = PushPayload::from_snapshot(&snapshot).to_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains(r#""pusher":{"name":"Jane Doe","username":null}"#));
    }

    #[test]
    fn same_snapshot_gives_identical_bytes() {
        let first = PushPayload::from_snapshot(&acme_site()).to_bytes().unwrap();
        let second = PushPayload::from_snapshot(&acme_site()).to_bytes().unwrap();
        assert_eq!(first, second);
    }
}
