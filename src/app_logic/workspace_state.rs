/*
 * Holds the open tool tabs of the shell and which one is active. Each tab owns
 * its widget instance; closing the tab drops it.
 */
use crate::core::ToolWidget;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct OpenTab {
    pub id: TabId,
    pub plugin_name: String,
    pub title: String,
    pub widget: Box<dyn ToolWidget>,
}

/* Read-only view of a tab for listings. */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSummary {
    pub id: TabId,
    pub plugin_name: String,
    pub title: String,
    pub active: bool,
}

pub struct WorkspaceState {
    tabs: Vec<OpenTab>,
    active: Option<TabId>,
    next_tab_id: u64,
}

impl Default for WorkspaceState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceState {
    pub fn new() -> Self {
        WorkspaceState {
            tabs: Vec::new(),
            active: None,
            next_tab_id: 1,
        }
    }

    /*
     * Adds a tab for `widget` and makes it active.
     */
    pub fn open(&mut self, plugin_name: &str, widget: Box<dyn ToolWidget>) -> TabId {
        let id = TabId(self.next_tab_id);
        self.next_tab_id += 1;
        let title = widget.title();
        log::debug!("WorkspaceState: Opening tab {id} for '{plugin_name}' ({title}).");
        self.tabs.push(OpenTab {
            id,
            plugin_name: plugin_name.to_string(),
            title,
            widget,
        });
        self.active = Some(id);
        id
    }

    /* The first open tab of a plugin, if any. */
    pub fn find_by_plugin(&self, plugin_name: &str) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.plugin_name == plugin_name)
            .map(|t| t.id)
    }

    pub fn activate(&mut self, id: TabId) -> bool {
        if self.tabs.iter().any(|t| t.id == id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<TabId> {
        self.active
    }

    /*
     * Removes a tab. If it was active, its right neighbour (or the new last
     * tab) becomes active.
     */
    pub fn close(&mut self, id: TabId) -> bool {
        let Some(index) = self.tabs.iter().position(|t| t.id == id) else {
            return false;
        };
        self.tabs.remove(index);
        if self.active == Some(id) {
            self.active = self
                .tabs
                .get(index)
                .or_else(|| self.tabs.last())
                .map(|t| t.id);
        }
        true
    }

    pub fn tab_mut(&mut self, id: TabId) -> Option<&mut OpenTab> {
        self.tabs.iter_mut().find(|t| t.id == id)
    }

    pub fn summaries(&self) -> Vec<TabSummary> {
        self.tabs
            .iter()
            .map(|t| TabSummary {
                id: t.id,
                plugin_name: t.plugin_name.clone(),
                title: t.title.clone(),
                active: self.active == Some(t.id),
            })
            .collect()
    }
}
