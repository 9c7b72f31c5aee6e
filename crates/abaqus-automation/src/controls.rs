//! Tiered control resolution inside the submission dialog.
//!
//! Abaqus dialog controls carry no stable identifiers, so each logical
//! control is resolved through an ordered chain of lookup strategies. A
//! tier is a pure `container -> Option<control>` function; the resolver
//! runs the chain in order and takes the first hit.

use std::thread::sleep;

use tracing::debug;

use crate::backend::{ControlRole, UiNode};
use crate::config::GuiConfig;
use crate::errors::AutomationError;

pub struct Tier {
    pub name: String,
    lookup: Box<dyn Fn(&dyn UiNode) -> Option<Box<dyn UiNode>> + Send + Sync>,
}

impl Tier {
    pub fn new(
        name: impl Into<String>,
        lookup: impl Fn(&dyn UiNode) -> Option<Box<dyn UiNode>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            lookup: Box::new(lookup),
        }
    }
}

/// Runs the tiers in order and returns the first control found, together
/// with the tier that produced it.
pub fn resolve_tiered<'t>(
    container: &dyn UiNode,
    tiers: &'t [Tier],
) -> Option<(Box<dyn UiNode>, &'t Tier)> {
    tiers
        .iter()
        .find_map(|tier| (tier.lookup)(container).map(|control| (control, tier)))
}

fn tier_names(tiers: &[Tier]) -> String {
    tiers
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lookup chain for the dialog's file-name input.
pub fn text_input_tiers(config: &GuiConfig) -> Vec<Tier> {
    let label = config.file_input_label.clone();
    vec![
        Tier::new(format!("edit labeled '{label}'"), move |dialog| {
            dialog.find_by_name(ControlRole::Edit, &label)
        }),
        Tier::new("edit at index 0", |dialog| {
            dialog.find_by_index(ControlRole::Edit, 0)
        }),
        Tier::new("first edit", |dialog| dialog.first_of_role(ControlRole::Edit)),
    ]
}

/// Lookup chain for the dialog's confirm button.
pub fn confirm_button_tiers(config: &GuiConfig) -> Vec<Tier> {
    let labels = config.confirm_button_labels.clone();
    vec![
        Tier::new(format!("button labeled one of {labels:?}"), move |dialog| {
            labels
                .iter()
                .find_map(|label| dialog.find_by_name(ControlRole::Button, label))
        }),
        Tier::new("button at index 0", |dialog| {
            dialog.find_by_index(ControlRole::Button, 0)
        }),
        Tier::new("first button", |dialog| {
            dialog.first_of_role(ControlRole::Button)
        }),
    ]
}

/// Writes the script path into the dialog and confirms it.
///
/// `path` must already use the target's path-separator convention; the
/// caller converts it before handing it over. On any failure the dialog is
/// closed best-effort so a half-open file dialog does not block the GUI.
pub fn submit_path(
    config: &GuiConfig,
    dialog: &dyn UiNode,
    path: &str,
) -> Result<(), AutomationError> {
    let input_tiers = text_input_tiers(config);
    let (input, input_tier) = match resolve_tiered(dialog, &input_tiers) {
        Some(found) => found,
        None => {
            close_best_effort(dialog);
            return Err(AutomationError::ControlNotFound(format!(
                "file name input not found in '{}'; attempted tiers: {}",
                dialog.title(),
                tier_names(&input_tiers)
            )));
        }
    };
    debug!(tier = %input_tier.name, "resolved file name input");

    if let Err(err) = input.set_text(path) {
        close_best_effort(dialog);
        return Err(err);
    }
    sleep(config.delays.post_text_entry);

    let confirm_tiers = confirm_button_tiers(config);
    let (confirm, confirm_tier) = match resolve_tiered(dialog, &confirm_tiers) {
        Some(found) => found,
        None => {
            close_best_effort(dialog);
            return Err(AutomationError::ControlNotFound(format!(
                "confirm button not found in '{}'; attempted tiers: {}",
                dialog.title(),
                tier_names(&confirm_tiers)
            )));
        }
    };
    debug!(tier = %confirm_tier.name, "resolved confirm button");

    if let Err(err) = confirm.invoke() {
        close_best_effort(dialog);
        return Err(err);
    }
    Ok(())
}

fn close_best_effort(dialog: &dyn UiNode) {
    if dialog.exists() {
        if let Err(err) = dialog.close() {
            debug!(%err, "could not close dialog after failure");
        }
    }
}
