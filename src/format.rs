//! Text and color mappings for a single event.
//!
//! The sentence table and the badge palette both branch on [`Action`]; they
//! live side by side so a new action gets both arms at once.

use crate::event::{Action, Event};
use ratatui::style::Color;

/// One human-readable sentence describing `event`.
pub fn format_event(event: &Event) -> String {
    let from = event.from_branch.as_deref().unwrap_or("");
    match &event.action {
        Action::Push => format!(
            "{} pushed to {} on {}",
            event.author, event.to_branch, event.timestamp
        ),
        Action::PullRequest => format!(
            "{} submitted a pull request from {} to {} on {}",
            event.author, from, event.to_branch, event.timestamp
        ),
        Action::Merge => format!(
            "{} merged branch {} to {} on {}",
            event.author, from, event.to_branch, event.timestamp
        ),
        Action::Unknown(_) => format!("Unknown event by {} on {}", event.author, event.timestamp),
    }
}

pub fn badge_color(action: &Action) -> Color {
    match action {
        Action::Push => Color::Green,
        Action::PullRequest => Color::Blue,
        Action::Merge => Color::Magenta,
        Action::Unknown(_) => Color::Gray,
    }
}

/// `from → to` for everything except pushes.
pub fn branch_transition(event: &Event) -> Option<String> {
    if event.action == Action::Push {
        return None;
    }

    Some(format!(
        "{} → {}",
        event.from_branch.as_deref().unwrap_or(""),
        event.to_branch
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: Action, from: Option<&str>) -> Event {
        Event {
            request_id: "1".to_string(),
            author: "alice".to_string(),
            action,
            from_branch: from.map(str::to_string),
            to_branch: "main".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_push_sentence_has_no_source_branch() {
        let e = event(Action::Push, Some("feature"));
        let sentence = format_event(&e);
        assert_eq!(sentence, "alice pushed to main on 2024-01-01T00:00:00Z");
        assert!(!sentence.contains("feature"));
        assert!(!sentence.contains("from"));
    }

    #[test]
    fn test_pull_request_sentence() {
        let e = event(Action::PullRequest, Some("feature"));
        assert_eq!(
            format_event(&e),
            "alice submitted a pull request from feature to main on 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_merge_sentence() {
        let e = event(Action::Merge, Some("dev"));
        assert_eq!(
            format_event(&e),
            "alice merged branch dev to main on 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn test_unknown_action_falls_back() {
        let e = event(Action::Unknown("TAG".to_string()), Some("dev"));
        assert_eq!(
            format_event(&e),
            "Unknown event by alice on 2024-01-01T00:00:00Z"
        );
        assert_eq!(badge_color(&e.action), Color::Gray);
        assert_eq!(branch_transition(&e), Some("dev → main".to_string()));
    }

    #[test]
    fn test_missing_source_branch_does_not_panic() {
        let e = event(Action::Merge, None);
        assert_eq!(
            format_event(&e),
            "alice merged branch  to main on 2024-01-01T00:00:00Z"
        );
        assert_eq!(branch_transition(&e), Some(" → main".to_string()));
    }

    #[test]
    fn test_badge_palette() {
        assert_eq!(badge_color(&Action::Push), Color::Green);
        assert_eq!(badge_color(&Action::PullRequest), Color::Blue);
        assert_eq!(badge_color(&Action::Merge), Color::Magenta);
    }

    #[test]
    fn test_branch_transition_only_for_non_push() {
        assert_eq!(branch_transition(&event(Action::Push, Some("dev"))), None);
        assert_eq!(
            branch_transition(&event(Action::PullRequest, Some("feature"))),
            Some("feature → main".to_string())
        );
    }
}
