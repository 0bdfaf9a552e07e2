//! Table configuration.

use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::query::BasicFilter;
use crate::query::Pagination;
use crate::query::SortOrder;
use crate::selection::SelectionMode;

/// Where a header's sort icon is drawn relative to its label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortIconPosition {
    /// Before the label.
    Before,
    /// After the label.
    #[default]
    After,
}

/// Presentation settings.
///
/// The store keeps these alongside its state so a renderer can read them
/// from one place, but never interprets them.
///
/// # Example
///
/// ```
/// use vtable_lib::TableOptions;
///
/// let options = TableOptions::default()
///     .with_selected_class("is-active")
///     .with_hide_sort_icons(true);
///
/// assert!(options.select_on_click);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableOptions {
    /// Class applied to selected rows.
    ///
    /// Default: `"vt-selected"`
    pub selected_class: String,

    /// Whether clicking a row toggles its selection.
    ///
    /// Default: `true`
    pub select_on_click: bool,

    /// Whether sortable headers hide their sort icons.
    ///
    /// Default: `false`
    pub hide_sort_icons: bool,

    /// Sort icon placement.
    ///
    /// Default: after the label
    pub sort_icon_position: SortIconPosition,

    /// Extra class applied to sortable headers.
    ///
    /// Default: empty
    pub sort_header_class: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            selected_class: "vt-selected".to_string(),
            select_on_click: true,
            hide_sort_icons: false,
            sort_icon_position: SortIconPosition::After,
            sort_header_class: String::new(),
        }
    }
}

impl TableOptions {
    /// Creates options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the selected row class.
    pub fn with_selected_class(mut self, class: impl Into<String>) -> Self {
        self.selected_class = class.into();
        self
    }

    /// Sets whether row clicks toggle selection.
    pub fn with_select_on_click(mut self, select_on_click: bool) -> Self {
        self.select_on_click = select_on_click;
        self
    }

    /// Sets whether sort icons are hidden.
    pub fn with_hide_sort_icons(mut self, hide: bool) -> Self {
        self.hide_sort_icons = hide;
        self
    }

    /// Sets the sort icon position.
    pub fn with_sort_icon_position(mut self, position: SortIconPosition) -> Self {
        self.sort_icon_position = position;
        self
    }

    /// Sets the sortable header class.
    pub fn with_sort_header_class(mut self, class: impl Into<String>) -> Self {
        self.sort_header_class = class.into();
        self
    }
}

/// Initial sort in a serialized configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    /// Field path to sort by.
    pub key: String,
    /// Sort direction.
    #[serde(default = "default_sort_order")]
    pub order: SortOrder,
}

fn default_sort_order() -> SortOrder {
    SortOrder::Asc
}

/// Serializable description of a table's initial inputs.
///
/// Only basic filters can be expressed here; custom predicates are attached
/// in code after the store is built.
///
/// # Example
///
/// ```
/// use vtable_lib::{SelectionMode, TableConfig};
///
/// let config = TableConfig::from_json_str(r#"{
///     "selectionMode": "multiple",
///     "pageSize": 10,
///     "filters": { "search": { "value": "an", "keys": ["name"] } },
///     "sort": { "key": "name", "order": "desc" }
/// }"#).unwrap();
///
/// assert_eq!(config.selection_mode, SelectionMode::Multiple);
/// assert_eq!(config.page_size, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableConfig {
    /// Selection policy.
    pub selection_mode: SelectionMode,
    /// Requested 1-based page.
    pub current_page: Option<usize>,
    /// Rows per page; unset or zero disables pagination.
    pub page_size: Option<usize>,
    /// Named text filters.
    pub filters: HashMap<String, BasicFilter>,
    /// Initial sort.
    pub sort: Option<SortConfig>,
    /// Presentation settings.
    pub options: TableOptions,
}

impl TableConfig {
    /// Creates a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;
        Self::from_json_str(&json)
    }

    /// Sets the selection mode.
    pub fn with_selection_mode(mut self, mode: SelectionMode) -> Self {
        self.selection_mode = mode;
        self
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the current page.
    pub fn with_current_page(mut self, current_page: usize) -> Self {
        self.current_page = Some(current_page);
        self
    }

    /// Adds a named text filter.
    pub fn with_filter(mut self, name: impl Into<String>, filter: BasicFilter) -> Self {
        self.filters.insert(name.into(), filter);
        self
    }

    /// Sets the initial sort.
    pub fn with_sort(mut self, key: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some(SortConfig {
            key: key.into(),
            order,
        });
        self
    }

    /// Sets the presentation settings.
    pub fn with_options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Pagination part of this config.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            current_page: self.current_page,
            page_size: self.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_component_defaults() {
        let config = TableConfig::from_json_str("{}").unwrap();
        assert_eq!(config.selection_mode, SelectionMode::Single);
        assert_eq!(config.options.selected_class, "vt-selected");
        assert!(config.options.select_on_click);
        assert!(!config.options.hide_sort_icons);
        assert_eq!(config.options.sort_icon_position, SortIconPosition::After);
        assert_eq!(config.options.sort_header_class, "");
        assert!(config.filters.is_empty());
        assert_eq!(config.pagination(), Pagination::default());
    }

    #[test]
    fn test_invalid_selection_mode_rejected() {
        let err = TableConfig::from_json_str(r#"{"selectionMode": "none"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid selection mode 'none'"));
    }

    #[test]
    fn test_sort_order_defaults_to_asc() {
        let config = TableConfig::from_json_str(r#"{"sort": {"key": "name"}}"#).unwrap();
        assert_eq!(
            config.sort,
            Some(SortConfig {
                key: "name".to_string(),
                order: SortOrder::Asc,
            })
        );
    }

    #[test]
    fn test_from_reader() {
        let json = br#"{"pageSize": 2, "currentPage": 3}"#;
        let config = TableConfig::from_reader(&json[..]).unwrap();
        assert_eq!(config.page_size, Some(2));
        assert_eq!(config.current_page, Some(3));
    }
}
