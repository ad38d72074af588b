use crate::api::path;

pub const HOME: &str = "/";
pub const CHATS: &str = "/chats";
pub const CHAT: &str = "/chats/:chat_id";
pub const LOGIN: &str = "/login";
pub const REGISTRATION: &str = "/registration";
pub const PROFILE: &str = "/profile";
pub const NOT_FOUND: &str = "/error/404";
pub const ANY: &str = "/*any";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Needs a token.
    Authenticated,
    /// Only makes sense without a token (login, registration).
    Anonymous,
}

/// Access of every routed path. The 404 page is for signed in users; anyone
/// else lands on the login form.
pub const TABLE: &[(&str, Access)] = &[
    (HOME, Access::Public),
    (CHATS, Access::Authenticated),
    (CHAT, Access::Authenticated),
    (PROFILE, Access::Authenticated),
    (LOGIN, Access::Anonymous),
    (REGISTRATION, Access::Anonymous),
    (NOT_FOUND, Access::Authenticated),
];

/// Access of a routed path, [`Access::Authenticated`] for anything unlisted.
pub fn access(route: &str) -> Access {
    TABLE
        .iter()
        .find(|(path, _)| *path == route)
        .map_or(Access::Authenticated, |(_, access)| *access)
}

pub fn chat(chat_id: &str) -> String {
    path(&["chats", chat_id])
}

/// Where to send someone who may not see a route, if anywhere.
pub fn redirect(access: Access, logged_in: bool) -> Option<&'static str> {
    match (access, logged_in) {
        (Access::Authenticated, false) => Some(LOGIN),
        (Access::Anonymous, true) => Some(CHATS),
        _ => None,
    }
}

/// Target of the catch-all route.
pub fn fallback(logged_in: bool) -> &'static str {
    if logged_in {
        NOT_FOUND
    } else {
        LOGIN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logged_out_only_reaches_public_and_anonymous_routes() {
        for (route, access) in TABLE {
            let target = redirect(*access, false);
            match access {
                Access::Authenticated => assert_eq!(target, Some(LOGIN), "{route}"),
                _ => assert_eq!(target, None, "{route}"),
            }
        }
        assert_eq!(fallback(false), LOGIN);
        assert_eq!(redirect(access(NOT_FOUND), false), Some(LOGIN));
        assert_eq!(redirect(access(HOME), false), None);
    }

    #[test]
    fn access_comes_from_the_table() {
        assert_eq!(access(HOME), Access::Public);
        assert_eq!(access(CHAT), Access::Authenticated);
        assert_eq!(access(REGISTRATION), Access::Anonymous);
        assert_eq!(access("/nowhere"), Access::Authenticated);
    }

    #[test]
    fn logged_in_skips_the_login_forms() {
        assert_eq!(redirect(Access::Anonymous, true), Some(CHATS));
        assert_eq!(redirect(Access::Authenticated, true), None);
        assert_eq!(redirect(Access::Public, true), None);
        assert_eq!(fallback(true), NOT_FOUND);
        assert_eq!(redirect(access(NOT_FOUND), true), None);
    }

    #[test]
    fn chat_links() {
        assert_eq!(chat("42"), "/chats/42");
        assert_eq!(chat("a b"), "/chats/a%20b");
    }
}
