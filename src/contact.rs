//! Values derived from a person for cards and list rows.

use crate::types::OrgUser;

const CHAT_LINK_PREFIX: &str = "https://teams.microsoft.com/l/chat/0/0?users=";

/// First character of each word, uppercased. "Anna maria Verdi" -> "AMV".
pub fn initials(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn mail_link(user: &OrgUser) -> Option<String> {
    user.mail
        .as_deref()
        .filter(|m| !m.is_empty())
        .map(|m| format!("mailto:{}", m))
}

pub fn chat_link(user: &OrgUser) -> Option<String> {
    user.user_principal_name
        .as_deref()
        .filter(|upn| !upn.is_empty())
        .map(|upn| format!("{}{}", CHAT_LINK_PREFIX, upn))
}

/// Office location, or `default` when the directory has none.
pub fn office_label<'a>(user: &'a OrgUser, default: &'a str) -> &'a str {
    match user.office_location.as_deref() {
        Some(office) if !office.trim().is_empty() => office,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::tests::node;

    #[test]
    fn test_initials() {
        assert_eq!(initials("Anna maria Verdi"), "AMV");
        assert_eq!(initials("  élodie   martin "), "ÉM");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_links() {
        let user = node("b", vec![]).to_user();
        assert_eq!(mail_link(&user).as_deref(), Some("mailto:b@acme.com"));
        assert_eq!(
            chat_link(&user).as_deref(),
            Some("https://teams.microsoft.com/l/chat/0/0?users=b@acme.com")
        );

        let mut bare = user.clone();
        bare.mail = None;
        bare.user_principal_name = Some(String::new());
        assert_eq!(mail_link(&bare), None);
        assert_eq!(chat_link(&bare), None);
    }

    #[test]
    fn test_office_label_falls_back() {
        let mut user = node("b", vec![]).to_user();
        assert_eq!(office_label(&user, "Head Office"), "Head Office");
        user.office_location = Some("  ".into());
        assert_eq!(office_label(&user, "Head Office"), "Head Office");
        user.office_location = Some("Rome".into());
        assert_eq!(office_label(&user, "Head Office"), "Rome");
    }
}
