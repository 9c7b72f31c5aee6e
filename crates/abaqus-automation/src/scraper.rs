//! Heuristic extraction of the Abaqus message/log area.
//!
//! Nothing identifies the message area reliably: the filter is size, class
//! and visibility based, so a large non-log pane can win (a known false
//! positive the original tooling shares). The scrape is read-only and never
//! cached; both the log content and the control's identity can change
//! between calls.

use tracing::debug;

use crate::backend::{ControlRole, UiNode};
use crate::config::GuiConfig;
use crate::errors::AutomationError;

/// Scrapes the message area under the main window.
///
/// Heuristic 1 looks for a large visible pane of Abaqus's custom content
/// class; only if no pane qualifies does heuristic 2 consider large
/// read-only edit controls. The first candidate with at least one non-blank
/// line wins.
pub fn read_message_log(
    config: &GuiConfig,
    main_window: &dyn UiNode,
) -> Result<String, AutomationError> {
    let control = find_message_area(config, main_window).ok_or_else(|| {
        AutomationError::ScrapeNotFound(
            "no descendant matched the message-pane or read-only-edit heuristics; \
             the configured class marker or size minimums may not fit this Abaqus version"
                .to_string(),
        )
    })?;

    extract_content(control.as_ref())
}

/// Reads the control's text a second time for extraction; the tree is live,
/// so what the selection pass saw may already be gone.
fn extract_content(control: &dyn UiNode) -> Result<String, AutomationError> {
    let mut content = flatten_text_blocks(&control.text_blocks());
    if content.is_empty() {
        // grouped text came back empty, fall back to the display text
        content = control.title().trim().to_string();
    }
    if content.is_empty() {
        return Err(AutomationError::ScrapeEmpty(
            "a candidate message area matched the heuristics but yielded no readable text"
                .to_string(),
        ));
    }
    Ok(content)
}

fn find_message_area(config: &GuiConfig, main_window: &dyn UiNode) -> Option<Box<dyn UiNode>> {
    for pane in main_window.descendants(ControlRole::Pane) {
        if !pane.is_visible() {
            continue;
        }
        let bounds = pane.bounds();
        if bounds.height <= config.message_pane_min_height
            || bounds.width <= config.message_pane_min_width
        {
            continue;
        }
        if !pane
            .class_name()
            .contains(&config.message_pane_class_marker)
        {
            continue;
        }
        if has_readable_text(&pane.text_blocks()) {
            debug!("message area found via pane heuristic");
            return Some(pane);
        }
    }

    for edit in main_window.descendants(ControlRole::Edit) {
        if !edit.is_visible() || edit.is_editable() {
            continue;
        }
        if edit.bounds().height <= config.message_edit_min_height {
            continue;
        }
        if has_readable_text(&edit.text_blocks()) {
            debug!("message area found via read-only edit heuristic");
            return Some(edit);
        }
    }

    None
}

/// Flattens the backend's nested line grouping: empty groups and blank
/// lines are dropped, the rest joined with single newlines and trimmed.
pub fn flatten_text_blocks(blocks: &[Vec<String>]) -> String {
    blocks
        .iter()
        .filter(|group| !group.is_empty())
        .flat_map(|group| group.iter())
        .map(String::as_str)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn has_readable_text(blocks: &[Vec<String>]) -> bool {
    blocks
        .iter()
        .flatten()
        .any(|line| !line.trim().is_empty())
}
