use chrono::{Local, LocalResult, TimeZone};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Server-originated notice about an incident near the user. Created and
/// marked read by external processes; the core only observes it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub target_user_id: String,
    pub title: String,
    pub description: String,
    /// Server-assigned creation time, seconds since the epoch. Absent until
    /// the server stamps the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(default)]
    pub read: bool,
}

impl Notification {
    /// Human-readable date for display; an unstamped document renders as
    /// "Date inconnue".
    pub fn date_label(&self) -> String {
        match self.date {
            Some(secs) => match Local.timestamp_opt(secs, 0) {
                LocalResult::Single(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
                _ => "Date inconnue".to_string(),
            },
            None => "Date inconnue".to_string(),
        }
    }
}

/// Unread notifications in exactly this snapshot. Always recomputed from
/// the latest delivery, never incremented out of band.
pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

/// Dated entries newest first; entries the server never dated follow the
/// dated block in unaltered delivery order.
pub fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by_key(|n| (n.date.is_none(), Reverse(n.date)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notif(id: &str, date: Option<i64>, read: bool) -> Notification {
        Notification {
            id: id.to_string(),
            target_user_id: "user-1".to_string(),
            title: format!("titre {id}"),
            description: "incident signalé près de chez vous".to_string(),
            date,
            read,
        }
    }

    #[test]
    fn unread_counts_only_this_snapshot() {
        let snapshot = vec![
            notif("a", Some(100), false),
            notif("b", Some(90), true),
            notif("c", None, false),
        ];
        assert_eq!(unread_count(&snapshot), 2);
        assert_eq!(unread_count(&[]), 0);
    }

    #[test]
    fn dated_entries_sort_newest_first() {
        let mut items = vec![
            notif("old", Some(100), false),
            notif("new", Some(300), false),
            notif("mid", Some(200), false),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<&str> = items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn undated_entries_keep_delivery_order_after_dated_block() {
        let mut items = vec![
            notif("u1", None, false),
            notif("old", Some(100), false),
            notif("u2", None, false),
            notif("new", Some(200), false),
        ];
        sort_newest_first(&mut items);
        let ids: Vec<&str> = items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old", "u1", "u2"]);
    }

    #[test]
    fn missing_date_renders_placeholder() {
        assert_eq!(notif("a", None, false).date_label(), "Date inconnue");
        assert_ne!(notif("b", Some(1_700_000_000), false).date_label(), "Date inconnue");
    }

    #[test]
    fn read_defaults_to_false_on_the_wire() {
        let json = r#"{
            "id": "n1",
            "targetUserId": "user-1",
            "title": "Alerte",
            "description": "Vol signalé"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert!(!n.read);
        assert!(n.date.is_none());
    }
}
