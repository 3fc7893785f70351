//! Who may talk to the bot.
//!
//! Deny-by-default: an empty list admits no one, `"*"` admits everyone.
//! Entries are either numeric user ids or usernames with or without `@`.

#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    everyone: bool,
    user_ids: Vec<u64>,
    /// Lower-cased, without `@`; Telegram usernames are case-insensitive.
    usernames: Vec<String>,
}

impl Allowlist {
    pub fn new(entries: &[String]) -> Self {
        let mut list = Self::default();
        for entry in entries.iter().map(|e| e.trim()).filter(|e| !e.is_empty()) {
            if entry == "*" {
                list.everyone = true;
            } else if let Ok(id) = entry.parse::<u64>() {
                list.user_ids.push(id);
            } else {
                list.usernames
                    .push(entry.trim_start_matches('@').to_ascii_lowercase());
            }
        }
        list
    }

    pub fn permits(&self, username: Option<&str>, user_id: u64) -> bool {
        self.everyone
            || self.user_ids.contains(&user_id)
            || username.is_some_and(|name| {
                let name = name.to_ascii_lowercase();
                self.usernames.iter().any(|allowed| *allowed == name)
            })
    }

    pub fn is_empty(&self) -> bool {
        !self.everyone && self.user_ids.is_empty() && self.usernames.is_empty()
    }
}
