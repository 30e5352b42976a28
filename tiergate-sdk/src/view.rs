//! Presentation-neutral view of a session
//!
//! Everything a host needs to draw the screen, computed from the session
//! state on demand. Hosts never read grants directly.

use chrono::Local;
use std::fmt;
use tiergate_client::Task;

use crate::paywall::PaywallNotice;
use crate::session::Session;

pub const UPGRADE_ACTION: &str = "UPGRADE NOW";
pub const CLOSE_ACTION: &str = "Close";

/// Live `n/limit characters` counter for the description input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptionCounter {
    pub length: u64,
    pub limit: u64,
}

impl DescriptionCounter {
    /// Flagged once the input reaches the limit
    pub fn at_limit(&self) -> bool {
        self.length >= self.limit
    }
}

impl fmt::Display for DescriptionCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} characters", self.length, self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeText {
    pub title: String,
    pub lines: Vec<String>,
    pub actions: [&'static str; 2],
}

impl NoticeText {
    pub fn for_notice(notice: &PaywallNotice) -> Self {
        let (title, lines) = match notice {
            PaywallNotice::Hourly {
                current,
                limit,
                resets_at,
            } => {
                let reset = resets_at
                    .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "next reset".to_string());
                (
                    "Hourly Limit Reached!",
                    vec![
                        format!("You've created {}/{} tasks this hour.", current, limit),
                        format!("Wait until {} for a reset", reset),
                    ],
                )
            }
            PaywallNotice::Total { current, limit } => (
                "Total Limit Reached!",
                vec![
                    format!("You've created {}/{} total tasks.", current, limit),
                    "This limit does not reset. You'll need to upgrade to create more tasks."
                        .to_string(),
                ],
            ),
            PaywallNotice::Revoked {
                quota,
                current,
                limit,
            } => (
                "Access Revoked",
                vec![
                    format!(
                        "Task creation was revoked on your {} quota ({}/{} used).",
                        quota, current, limit
                    ),
                    "Upgrade your plan or contact support to restore access.".to_string(),
                ],
            ),
        };

        Self {
            title: title.to_string(),
            lines,
            actions: [UPGRADE_ACTION, CLOSE_ACTION],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub tasks: Vec<Task>,
    pub description_counter: DescriptionCounter,
    pub hourly_line: String,
    pub total_line: String,
    /// Label of the display toggle; `None` when the toggle is not offered
    pub display_toggle: Option<&'static str>,
    pub dark_mode: bool,
    pub submit_enabled: bool,
    pub notice: Option<NoticeText>,
}

impl SessionView {
    /// Render `session` with the description currently being typed
    pub fn render(session: &Session, draft_description: &str, submitting: bool) -> Self {
        let snapshot = session.snapshot();
        let ledger = session.ledger();
        let dark_mode = session.dark_mode();

        let display_toggle = snapshot.display_toggle().has_access.then_some(if dark_mode {
            "Switch to light mode"
        } else {
            "Switch to dark mode"
        });

        Self {
            tasks: session.tasks().to_vec(),
            description_counter: DescriptionCounter {
                length: draft_description.chars().count() as u64,
                limit: snapshot.description_limit().value,
            },
            hourly_line: format!(
                "Hourly Task Limit: {}/{}",
                ledger.hourly_count,
                snapshot.hourly_quota().usage_limit
            ),
            total_line: format!(
                "Total Task Limit: {}/{}",
                ledger.lifetime_count,
                snapshot.lifetime_quota().usage_limit
            ),
            display_toggle,
            dark_mode,
            submit_enabled: !submitting,
            notice: session.paywall().notice().map(NoticeText::for_notice),
        }
    }
}

/// Truncate keystroke input to the current description limit
pub fn clamp_description(input: &str, limit: u64) -> String {
    let limit = usize::try_from(limit).unwrap_or(usize::MAX);
    input.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockEntitlementSource, MockTaskStore};
    use crate::gate::QuotaKind;
    use crate::grant::{RawMeteredGrant, UsageLimit};
    use crate::session::SessionConfig;
    use std::sync::Arc;

    #[test]
    fn test_counter_flags_at_limit() {
        let counter = DescriptionCounter {
            length: 50,
            limit: 50,
        };
        assert_eq!(counter.to_string(), "50/50 characters");
        assert!(counter.at_limit());
    }

    #[test]
    fn test_clamp_description() {
        assert_eq!(clamp_description("abcdef", 3), "abc");
        assert_eq!(clamp_description("ééé", 2), "éé");
        assert_eq!(clamp_description("ab", 50), "ab");
    }

    #[test]
    fn test_hourly_notice_without_reset_time() {
        let text = NoticeText::for_notice(&PaywallNotice::Hourly {
            current: 5,
            limit: UsageLimit::Limited(5),
            resets_at: None,
        });

        assert_eq!(text.title, "Hourly Limit Reached!");
        assert_eq!(text.lines[0], "You've created 5/5 tasks this hour.");
        assert_eq!(text.lines[1], "Wait until next reset for a reset");
        assert_eq!(text.actions, [UPGRADE_ACTION, CLOSE_ACTION]);
    }

    #[test]
    fn test_total_notice_does_not_promise_reset() {
        let text = NoticeText::for_notice(&PaywallNotice::Total {
            current: 10,
            limit: UsageLimit::Limited(10),
        });
        assert!(text.lines[1].starts_with("This limit does not reset."));
    }

    #[test]
    fn test_revoked_notice_shows_counts() {
        let text = NoticeText::for_notice(&PaywallNotice::Revoked {
            quota: QuotaKind::Lifetime,
            current: 3,
            limit: UsageLimit::Limited(10),
        });
        assert_eq!(text.title, "Access Revoked");
        assert_eq!(
            text.lines[0],
            "Task creation was revoked on your total quota (3/10 used)."
        );
    }

    #[tokio::test]
    async fn test_render_fallback_session() {
        let source = Arc::new(
            MockEntitlementSource::new()
                .with_metered("feature-task-hourly-limit", RawMeteredGrant::limited(5, 2)),
        );
        let store = Arc::new(MockTaskStore::new());
        let session = Session::start(SessionConfig::default(), source, store).await;

        let view = SessionView::render(&session, "hello", true);

        assert_eq!(view.hourly_line, "Hourly Task Limit: 2/5");
        assert_eq!(view.total_line, "Total Task Limit: 0/10");
        assert_eq!(view.description_counter.to_string(), "5/50 characters");
        assert!(view.display_toggle.is_none());
        assert!(!view.submit_enabled);
        assert!(view.notice.is_none());
    }
}
