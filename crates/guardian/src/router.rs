//! Top-level navigation state.
//!
//! [`Router`] is an explicit value holding the current [`View`], the selected
//! guide and the search/filter inputs. Renderers read it; nothing else holds
//! navigation state.

use crate::catalog::{Catalog, Category, EmergencyGuide};

/// Guides shown on the home screen when no search is active.
pub const HOME_GUIDE_LIMIT: usize = 6;

/// Sub-tab of the plan screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlanTab {
    /// The annotated floor plan.
    #[default]
    Plan,
    /// Recurring drills.
    Drills,
}

/// Sub-tab of the kit screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KitTab {
    /// Supply inventory.
    #[default]
    Inventory,
    /// Family members and contacts.
    Family,
}

/// A screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// Dashboard with search and the most common guides.
    #[default]
    Home,
    /// Every guide, filterable by category.
    GuideList,
    /// One guide. Which one is [`Router::selected_guide_id`].
    GuideDetail,
    /// Sensor and signalling tools.
    Tools,
    /// Escape plan and drills.
    Plan(PlanTab),
    /// Supplies and family.
    Kit(KitTab),
}

/// Navigation and search state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Router {
    view: View,
    selected_guide: Option<&'static str>,
    search: String,
    category: Option<Category>,
}

impl Router {
    /// Start on the home screen with no search.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current screen.
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Switch to `view`.
    ///
    /// Switching to [`View::GuideDetail`] without a selected guide is ignored.
    pub fn navigate(&mut self, view: View) {
        if view == View::GuideDetail && self.selected_guide.is_none() {
            return;
        }
        self.view = view;
    }

    /// Select guide `id` and show it. Unknown ids are ignored.
    pub fn open_guide(&mut self, catalog: &Catalog, id: &str) -> bool {
        let Some(guide) = catalog.get(id) else {
            return false;
        };
        self.selected_guide = Some(guide.id);
        self.view = View::GuideDetail;
        true
    }

    /// Leave the current screen for home.
    ///
    /// Returns `false` if already home.
    pub fn back(&mut self) -> bool {
        if self.view == View::Home {
            return false;
        }
        self.view = View::Home;
        true
    }

    /// Id of the selected guide.
    #[must_use]
    pub fn selected_guide_id(&self) -> Option<&'static str> {
        self.selected_guide
    }

    /// The selected guide.
    #[must_use]
    pub fn selected_guide(&self, catalog: &Catalog) -> Option<&'static EmergencyGuide> {
        self.selected_guide.and_then(|id| catalog.get(id))
    }

    /// Current search text.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Replace the search text.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
    }

    /// Current category filter; `None` means all categories.
    #[must_use]
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Replace the category filter.
    pub fn set_category(&mut self, category: Option<Category>) {
        self.category = category;
    }

    /// Whether a search is active.
    #[must_use]
    pub fn is_searching(&self) -> bool {
        !self.search.trim().is_empty()
    }

    /// Guides to list on the current screen.
    ///
    /// Home without a search shows only the first few guides; everywhere else
    /// the full filtered list is shown.
    #[must_use]
    pub fn visible_guides(&self, catalog: &Catalog) -> Vec<&'static EmergencyGuide> {
        let mut guides = catalog.filter(&self.search, self.category);
        if self.view == View::Home && !self.is_searching() {
            guides.truncate(HOME_GUIDE_LIMIT);
        }
        guides
    }

    /// Whether the home screen shows its shortcut buttons.
    #[must_use]
    pub fn shows_quick_actions(&self) -> bool {
        self.view == View::Home && !self.is_searching()
    }

    /// Whether the bottom tab bar is shown.
    #[must_use]
    pub fn shows_tab_bar(&self) -> bool {
        self.view != View::GuideDetail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_home() {
        let router = Router::new();
        assert_eq!(router.view(), View::Home);
        assert!(router.shows_tab_bar());
        assert!(router.shows_quick_actions());
    }

    #[test]
    fn test_open_guide_and_back() {
        let catalog = Catalog::builtin();
        let mut router = Router::new();
        router.navigate(View::GuideList);

        assert!(router.open_guide(&catalog, "fire"));
        assert_eq!(router.view(), View::GuideDetail);
        assert_eq!(router.selected_guide(&catalog).unwrap().id, "fire");
        assert!(!router.shows_tab_bar());

        assert!(router.back());
        assert_eq!(router.view(), View::Home);
        assert!(!router.back());
    }

    #[test]
    fn test_unknown_guide_is_ignored() {
        let catalog = Catalog::builtin();
        let mut router = Router::new();
        assert!(!router.open_guide(&catalog, "zombies"));
        assert_eq!(router.view(), View::Home);
        assert!(router.selected_guide_id().is_none());
    }

    #[test]
    fn test_detail_needs_selection() {
        let mut router = Router::new();
        router.navigate(View::GuideDetail);
        assert_eq!(router.view(), View::Home);
    }

    #[test]
    fn test_home_limits_guides_without_search() {
        let catalog = Catalog::builtin();
        let mut router = Router::new();
        assert_eq!(router.visible_guides(&catalog).len(), HOME_GUIDE_LIMIT);

        router.navigate(View::GuideList);
        assert_eq!(router.visible_guides(&catalog).len(), catalog.len());
    }

    #[test]
    fn test_search_lifts_home_limit() {
        let catalog = Catalog::builtin();
        let mut router = Router::new();
        router.set_search("e");

        assert!(router.is_searching());
        assert!(!router.shows_quick_actions());
        assert_eq!(
            router.visible_guides(&catalog).len(),
            catalog.filter("e", None).len()
        );
    }

    #[test]
    fn test_category_filter() {
        let catalog = Catalog::builtin();
        let mut router = Router::new();
        router.navigate(View::GuideList);
        router.set_category(Some(Category::Survival));

        let ids: Vec<_> = router.visible_guides(&catalog).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["snake"]);
    }

    #[test]
    fn test_sub_tabs() {
        let mut router = Router::new();
        router.navigate(View::Plan(PlanTab::Drills));
        assert_eq!(router.view(), View::Plan(PlanTab::Drills));
        router.navigate(View::Kit(KitTab::default()));
        assert_eq!(router.view(), View::Kit(KitTab::Inventory));
        assert!(router.shows_tab_bar());
    }
}
