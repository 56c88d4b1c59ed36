//! Static navigation model: the fixed page list, active-link matching, and
//! the mobile menu state machine.
//!
//! Navigation is fully decided at build time. Active-link matching takes the
//! current route path as an explicit argument; there is no ambient "current
//! location" anywhere in the crate. [`MenuState`] decides which CSS class and
//! ARIA state the mobile overlay markup carries; the published `nav.js` only
//! flips between the two forms rendered from these states and holds no state
//! of its own.

/// Route prefix for project detail pages. These routes are generated per
/// project and are not in the static menu; for highlighting purposes they
/// count as the root listing.
pub const SPOTLIGHT_PREFIX: &str = "/spotlight";

/// A fixed navigation entry. The page set never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SitePage {
    pub label: &'static str,
    pub route: &'static str,
}

/// Ordered navigation entries. Order matters: the desktop header places the
/// first half left of the site title and the remainder right of it.
pub const SITE_PAGES: [SitePage; 4] = [
    SitePage { label: "Resume", route: "/resume" },
    SitePage { label: "Work", route: "/" },
    SitePage { label: "About", route: "/about" },
    SitePage { label: "Contact", route: "/contact" },
];

/// Entries rendered left of the site title in the desktop header.
pub fn left_pages() -> &'static [SitePage] {
    &SITE_PAGES[..SITE_PAGES.len() / 2]
}

/// Entries rendered right of the site title in the desktop header.
pub fn right_pages() -> &'static [SitePage] {
    &SITE_PAGES[SITE_PAGES.len() / 2..]
}

/// Normalize a current path for active-link matching.
///
/// Any path under the spotlight prefix maps to `/`, so detail pages keep the
/// Work entry highlighted. The check is a bare prefix test, matching routes
/// like `/spotlight/dawn/` and the prefix itself.
pub fn match_path(current_path: &str) -> &str {
    if current_path.starts_with(SPOTLIGHT_PREFIX) {
        "/"
    } else {
        current_path
    }
}

/// Whether `page` is the active entry for `current_path`.
///
/// Matching is exact string equality against the normalized path, so at most
/// one entry is active for any given path.
pub fn is_active(page: &SitePage, current_path: &str) -> bool {
    page.route == match_path(current_path)
}

/// The route of the active entry for `current_path`, if any.
pub fn active_route(current_path: &str) -> Option<&'static str> {
    let matched = match_path(current_path);
    SITE_PAGES
        .iter()
        .find(|page| page.route == matched)
        .map(|page| page.route)
}

/// Open/closed state of the mobile menu overlay.
///
/// Each rendered page owns one instance, starting closed. Transitions model
/// the two user interactions: activating the menu toggle opens the overlay,
/// activating the backdrop closes it. Following a link also ends in `Closed`
/// because the next page renders a fresh menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

impl MenuState {
    /// Menu toggle activation. The toggle sits under the overlay while it is
    /// open, so `Open` can only transition via the backdrop.
    pub fn on_toggle(self) -> MenuState {
        MenuState::Open
    }

    /// Backdrop activation (a click anywhere on the open overlay).
    pub fn on_backdrop(self) -> MenuState {
        MenuState::Closed
    }

    /// CSS class the overlay element carries in this state.
    pub fn overlay_class(self) -> Option<&'static str> {
        match self {
            MenuState::Open => Some("open"),
            MenuState::Closed => None,
        }
    }

    /// Value of the toggle button's `aria-expanded` attribute.
    pub fn aria_expanded(self) -> &'static str {
        match self {
            MenuState::Open => "true",
            MenuState::Closed => "false",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ===== Page list =====

    #[test]
    fn four_fixed_pages_in_order() {
        let labels: Vec<&str> = SITE_PAGES.iter().map(|p| p.label).collect();
        assert_eq!(labels, ["Resume", "Work", "About", "Contact"]);
        let routes: Vec<&str> = SITE_PAGES.iter().map(|p| p.route).collect();
        assert_eq!(routes, ["/resume", "/", "/about", "/contact"]);
    }

    #[test]
    fn desktop_split_puts_half_left_of_title() {
        let left: Vec<&str> = left_pages().iter().map(|p| p.label).collect();
        let right: Vec<&str> = right_pages().iter().map(|p| p.label).collect();
        assert_eq!(left, ["Resume", "Work"]);
        assert_eq!(right, ["About", "Contact"]);
    }

    // ===== Active-link matching =====

    #[test]
    fn exact_match_marks_that_entry_and_no_other() {
        for page in &SITE_PAGES {
            let active: Vec<&str> = SITE_PAGES
                .iter()
                .filter(|p| is_active(p, page.route))
                .map(|p| p.route)
                .collect();
            assert_eq!(active, [page.route]);
        }
    }

    #[test]
    fn root_path_activates_work() {
        assert_eq!(active_route("/"), Some("/"));
    }

    #[test]
    fn resume_path_activates_resume() {
        assert_eq!(active_route("/resume"), Some("/resume"));
    }

    #[test]
    fn unknown_path_activates_nothing() {
        assert_eq!(active_route("/elsewhere"), None);
    }

    #[test]
    fn trailing_slash_is_not_an_exact_match() {
        assert_eq!(active_route("/resume/"), None);
    }

    // ===== Spotlight normalization =====

    #[test]
    fn spotlight_detail_activates_work() {
        assert_eq!(active_route("/spotlight/anything"), Some("/"));
        assert!(is_active(&SITE_PAGES[1], "/spotlight/anything"));
    }

    #[test]
    fn spotlight_detail_activates_nothing_else() {
        let active: Vec<&str> = SITE_PAGES
            .iter()
            .filter(|p| is_active(p, "/spotlight/dawn/"))
            .map(|p| p.route)
            .collect();
        assert_eq!(active, ["/"]);
    }

    #[test]
    fn spotlight_prefix_itself_activates_work() {
        assert_eq!(active_route("/spotlight"), Some("/"));
    }

    #[test]
    fn spotlight_rule_is_a_bare_prefix_test() {
        // No separator required after the prefix; "/spotlight-archive"
        // normalizes too. Matches the deployed behavior.
        assert_eq!(match_path("/spotlight-archive"), "/");
    }

    #[test]
    fn non_spotlight_paths_pass_through_unchanged() {
        assert_eq!(match_path("/about"), "/about");
        assert_eq!(match_path("/"), "/");
    }

    // ===== Menu state machine =====

    #[test]
    fn menu_starts_closed() {
        assert_eq!(MenuState::default(), MenuState::Closed);
    }

    #[test]
    fn toggle_opens_then_backdrop_closes() {
        let menu = MenuState::default();
        let menu = menu.on_toggle();
        assert_eq!(menu, MenuState::Open);
        let menu = menu.on_backdrop();
        assert_eq!(menu, MenuState::Closed);
    }

    #[test]
    fn toggle_when_open_stays_open() {
        assert_eq!(MenuState::Open.on_toggle(), MenuState::Open);
    }

    #[test]
    fn backdrop_when_closed_stays_closed() {
        assert_eq!(MenuState::Closed.on_backdrop(), MenuState::Closed);
    }

    #[test]
    fn overlay_class_present_only_when_open() {
        assert_eq!(MenuState::Closed.overlay_class(), None);
        assert_eq!(MenuState::Open.overlay_class(), Some("open"));
    }

    #[test]
    fn aria_expanded_tracks_state() {
        assert_eq!(MenuState::Closed.aria_expanded(), "false");
        assert_eq!(MenuState::Open.aria_expanded(), "true");
    }
}
