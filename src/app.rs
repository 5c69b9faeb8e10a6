// App state and main event loop.
// Manages the search query, category filter, selection, and live star updates.

use std::io;
use std::sync::Arc;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::ListState;
use tracing::warn;

use crate::catalog::{self, Benefit, Category};
use crate::github::{GitHubClient, RateLimit};
use crate::stars::{Resolution, StarsCache, StarsSnapshot};
use crate::ui;

/// Category filters in tab order. `None` is "All".
pub fn category_filters() -> Vec<Option<Category>> {
    std::iter::once(None)
        .chain(Category::ALL.into_iter().map(Some))
        .collect()
}

/// Tab title for a category filter.
pub fn filter_title(filter: Option<Category>) -> &'static str {
    filter.map(|category| category.title()).unwrap_or("All")
}

/// Main application state.
pub struct App {
    pub benefits: Vec<Benefit>,
    /// Active category filter.
    pub category: Option<Category>,
    pub query: String,
    /// Whether keystrokes go to the search box.
    pub search_active: bool,
    pub list_state: ListState,
    /// Latest known star counts.
    pub stars: StarsSnapshot,
    pub show_help: bool,
    /// Transient message for the status bar.
    pub status_message: Option<String>,
    /// Whether the app should exit.
    pub should_quit: bool,
    cache: StarsCache,
    resolution: Resolution,
    github_client: Option<Arc<GitHubClient>>,
}

impl App {
    /// Create the app and start resolving star counts for the catalog.
    pub fn new(
        benefits: Vec<Benefit>,
        cache: StarsCache,
        github_client: Option<Arc<GitHubClient>>,
    ) -> Self {
        let resolution = cache.resolve(catalog::repo_ids(&benefits).iter().map(|r| r.as_str()));
        let stars = resolution.snapshot();

        let mut app = Self {
            benefits,
            category: None,
            query: String::new(),
            search_active: false,
            list_state: ListState::default(),
            stars,
            show_help: false,
            status_message: None,
            should_quit: false,
            cache,
            resolution,
            github_client,
        };
        app.reset_selection();
        app
    }

    /// Set the initial filters.
    pub fn with_filters(mut self, category: Option<Category>, query: &str) -> Self {
        self.category = category;
        self.query = query.to_string();
        self.reset_selection();
        self
    }

    /// Benefits matching the current filters, ranked.
    pub fn visible(&self) -> Vec<&Benefit> {
        catalog::rank(&self.benefits, self.category, &self.query, &self.stars)
    }

    pub fn selected_benefit(&self) -> Option<&Benefit> {
        let index = self.list_state.selected()?;
        self.visible().get(index).copied()
    }

    /// Number of star lookups still running.
    pub fn pending_lookups(&self) -> usize {
        self.cache.pending()
    }

    pub fn rate_limit(&self) -> Option<RateLimit> {
        self.github_client
            .as_ref()
            .map(|client| client.rate_limit())
            .filter(RateLimit::is_known)
    }

    /// Main event loop.
    pub fn run(&mut self, terminal: &mut Terminal<impl Backend>) -> io::Result<()> {
        while !self.should_quit {
            self.refresh_stars();
            terminal.draw(|frame| ui::draw(frame, self))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// Pick up star counts that arrived since the last frame.
    pub fn refresh_stars(&mut self) {
        if let Some(stars) = self.resolution.poll_update() {
            // Keep the same benefit selected across re-ranking
            let selected_id = self.selected_benefit().map(|b| b.id.clone());
            self.stars = stars;
            let index = selected_id
                .and_then(|id| self.visible().iter().position(|b| b.id == id))
                .or(self.list_state.selected());
            self.list_state.select(index);
        }
    }

    /// Handle keyboard and other events.
    #[allow(clippy::collapsible_if)]
    fn handle_events(&mut self) -> io::Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    /// Apply a single key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        self.status_message = None;

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        if ctrl && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
                self.show_help = false;
            }
            return;
        }

        match key.code {
            KeyCode::Char('u') if ctrl => self.set_query(String::new()),
            KeyCode::Esc => {
                if self.search_active {
                    self.search_active = false;
                } else if !self.query.is_empty() {
                    self.set_query(String::new());
                } else {
                    self.should_quit = true;
                }
            }
            KeyCode::Tab => self.cycle_category(1),
            KeyCode::BackTab => self.cycle_category(-1),
            KeyCode::Up => self.select_prev(),
            KeyCode::Down => self.select_next(),
            KeyCode::Home => self.select_first(),
            KeyCode::End => self.select_last(),
            KeyCode::Enter => self.open_selected(),
            KeyCode::Backspace if self.search_active => {
                let mut query = self.query.clone();
                query.pop();
                self.set_query(query);
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                if self.search_active {
                    self.push_query_char(c);
                } else if c.is_ascii_alphanumeric() {
                    // Typing anywhere jumps into the search box
                    self.search_active = true;
                    self.push_query_char(c);
                } else if c == '/' {
                    self.search_active = true;
                } else if c == '?' {
                    self.show_help = true;
                }
            }
            _ => {}
        }
    }

    fn push_query_char(&mut self, c: char) {
        let mut query = self.query.clone();
        query.push(c);
        self.set_query(query);
    }

    fn set_query(&mut self, query: String) {
        if query != self.query {
            self.query = query;
            self.reset_selection();
        }
    }

    fn cycle_category(&mut self, step: isize) {
        let filters = category_filters();
        let current = filters
            .iter()
            .position(|f| *f == self.category)
            .unwrap_or(0) as isize;
        let next = (current + step).rem_euclid(filters.len() as isize) as usize;
        self.category = filters[next];
        self.reset_selection();
    }

    fn reset_selection(&mut self) {
        let index = if self.visible().is_empty() {
            None
        } else {
            Some(0)
        };
        self.list_state.select(index);
    }

    /// Select the next item in the list.
    pub fn select_next(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            Some(i) => i, // Stay at end
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    /// Select the previous item in the list.
    pub fn select_prev(&mut self) {
        if self.visible().is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_first(&mut self) {
        self.reset_selection();
    }

    fn select_last(&mut self) {
        let len = self.visible().len();
        self.list_state.select(len.checked_sub(1));
    }

    fn open_selected(&mut self) {
        let Some(link) = self.selected_benefit().map(|b| b.link.clone()) else {
            return;
        };
        self.status_message = match open::that_detached(&link) {
            Ok(()) => Some(format!("Opened {}", link)),
            Err(e) => {
                warn!(link = %link, error = %e, "failed to open link");
                Some(format!("Could not open {}", link))
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stars::testing::{ManualClock, StubLookup};
    use crate::stars::{MemoryStore, RepoId};
    use chrono::Utc;

    fn benefit(id: &str, category: Category, popularity: u32, repo: Option<&str>) -> Benefit {
        Benefit {
            id: id.to_string(),
            name: id.to_string(),
            category,
            description: format!("{} description", id),
            link: format!("https://example.com/{}", id),
            tags: Vec::new(),
            popularity,
            repo: repo.and_then(RepoId::parse),
        }
    }

    fn app_with(lookup: StubLookup) -> App {
        let cache = StarsCache::new(
            Arc::new(MemoryStore::new()),
            Arc::new(lookup),
            Arc::new(ManualClock::new(Utc::now())),
        );
        let benefits = vec![
            benefit("alpha", Category::Design, 9, None),
            benefit("beta", Category::Learning, 5, Some("octo/beta")),
            benefit("gamma", Category::Design, 1, Some("octo/gamma")),
        ];
        App::new(benefits, cache, None)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn visible_ids(app: &App) -> Vec<String> {
        app.visible().iter().map(|b| b.id.clone()).collect()
    }

    #[test]
    fn test_category_filters_start_with_all() {
        let filters = category_filters();
        assert_eq!(filters[0], None);
        assert_eq!(filters.len(), Category::ALL.len() + 1);
        assert_eq!(filter_title(None), "All");
        assert_eq!(filter_title(Some(Category::Design)), "Design");
    }

    #[tokio::test]
    async fn test_typing_focuses_search() {
        let mut app = app_with(StubLookup::new());
        assert!(!app.search_active);

        press(&mut app, KeyCode::Char('g'));
        assert!(app.search_active);
        assert_eq!(app.query, "g");

        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(visible_ids(&app), vec!["gamma"]);

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.query, "ga");
    }

    #[tokio::test]
    async fn test_escape_leaves_search_then_clears_then_quits() {
        let mut app = app_with(StubLookup::new());

        press(&mut app, KeyCode::Char('b'));
        press(&mut app, KeyCode::Esc);
        assert!(!app.search_active);
        assert_eq!(app.query, "b");

        press(&mut app, KeyCode::Esc);
        assert!(app.query.is_empty());
        assert!(!app.should_quit);

        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_ctrl_u_clears_and_ctrl_c_quits() {
        let mut app = app_with(StubLookup::new()).with_filters(None, "alpha");
        assert_eq!(visible_ids(&app), vec!["alpha"]);

        app.handle_key(KeyEvent::new(KeyCode::Char('u'), KeyModifiers::CONTROL));
        assert!(app.query.is_empty());

        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_tab_cycles_categories() {
        let mut app = app_with(StubLookup::new());
        assert_eq!(app.category, None);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.category, Some(Category::AiDevTools));
        assert!(app.visible().is_empty());
        assert_eq!(app.list_state.selected(), None);

        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.category, Some(Category::Other));

        let mut app = app.with_filters(Some(Category::Design), "");
        assert_eq!(visible_ids(&app), vec!["alpha", "gamma"]);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_benefit().map(|b| b.id.as_str()), Some("gamma"));
    }

    #[tokio::test]
    async fn test_help_overlay_swallows_keys() {
        let mut app = app_with(StubLookup::new());

        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);

        press(&mut app, KeyCode::Char('x'));
        assert!(app.query.is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_status_message_cleared_on_next_key() {
        let mut app = app_with(StubLookup::new());
        app.status_message = Some("Opened https://example.com/alpha".to_string());

        press(&mut app, KeyCode::Down);
        assert!(app.status_message.is_none());
    }

    #[tokio::test]
    async fn test_selection_bounds() {
        let mut app = app_with(StubLookup::new());
        assert_eq!(app.list_state.selected(), Some(0));

        press(&mut app, KeyCode::Up);
        assert_eq!(app.list_state.selected(), Some(0));

        press(&mut app, KeyCode::End);
        assert_eq!(app.list_state.selected(), Some(2));
        press(&mut app, KeyCode::Down);
        assert_eq!(app.list_state.selected(), Some(2));

        press(&mut app, KeyCode::Home);
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[tokio::test]
    async fn test_star_updates_rerank_and_keep_selection() {
        let mut app = app_with(
            StubLookup::new()
                .with_stars("octo/beta", 10)
                .with_stars("octo/gamma", 500),
        );
        // Before any stars arrive, popularity decides
        assert_eq!(visible_ids(&app), vec!["alpha", "beta", "gamma"]);
        assert_eq!(app.pending_lookups(), 2);
        assert!(app.rate_limit().is_none());

        app.resolution.clone().settled().await;
        app.refresh_stars();

        assert_eq!(app.stars.get_str("octo/gamma"), Some(500));
        assert_eq!(visible_ids(&app), vec!["gamma", "beta", "alpha"]);
        // "alpha" was selected and stays selected after re-ranking
        assert_eq!(app.selected_benefit().map(|b| b.id.as_str()), Some("alpha"));
        assert_eq!(app.pending_lookups(), 0);
    }
}
