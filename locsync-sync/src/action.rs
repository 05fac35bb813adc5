//! The interactive "sync" action: location menus and launch validation.
//!
//! A first launch without form values is answered with [`launch_form`]; the
//! second launch carries the picked values and is turned into a
//! [`LaunchEvent`] by [`build_launch`].

use serde::{Deserialize, Serialize};

use locsync_core::types::{
    EventSource, LaunchEvent, LaunchEventData, LaunchValues, LocationName, SelectionEntry, UserId,
    LAUNCH_TOPIC,
};

use crate::routing::launch_identifier;

/// Form field name of the source picker.
pub const SOURCE_FIELD: &str = "source_location";
/// Form field name of the destination picker.
pub const DESTINATION_FIELD: &str = "dest_location";

/// Answer shown to the user after a launch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    pub fn launched() -> Self {
        Self {
            success: true,
            message: "Sync launched".to_string(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub label: String,
    pub value: String,
}

/// One item of the action form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormItem {
    Label {
        value: String,
    },
    Enumerator {
        label: String,
        name: String,
        data: Vec<MenuOption>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
    },
}

/// Label shown for the action on the machine serving `current`.
pub fn variant(current: &LocationName) -> String {
    format!("Sync @ {current}")
}

/// The action is only offered when something is selected.
pub fn discover(selection: &[SelectionEntry]) -> bool {
    !selection.is_empty()
}

/// Enumerator of every non-reserved location name, sorted.
pub fn location_menu(
    field: &str,
    label: &str,
    names: &[LocationName],
    reserved: &[String],
    default: Option<&LocationName>,
) -> FormItem {
    let mut visible: Vec<&LocationName> = names
        .iter()
        .filter(|name| !reserved.iter().any(|r| r == name.as_str()))
        .collect();
    visible.sort();
    visible.dedup();

    FormItem::Enumerator {
        label: label.to_string(),
        name: field.to_string(),
        data: visible
            .into_iter()
            .map(|name| MenuOption {
                label: name.0.clone(),
                value: name.0.clone(),
            })
            .collect(),
        value: default.map(|name| name.0.clone()),
    }
}

/// The two-picker form shown on the first launch.
pub fn launch_form(
    current: &LocationName,
    names: &[LocationName],
    reserved: &[String],
) -> Vec<FormItem> {
    vec![
        FormItem::Label {
            value: format!("## {current} ##"),
        },
        FormItem::Label {
            value: "Locations".to_string(),
        },
        location_menu(SOURCE_FIELD, "Source", names, reserved, Some(current)),
        location_menu(DESTINATION_FIELD, "Destination", names, reserved, None),
    ]
}

/// Validate submitted form values and build the launch event.
///
/// Rejections carry the message to show the user; nothing has been
/// published at that point.
pub fn build_launch(
    current: &LocationName,
    values: &LaunchValues,
    selection: &[SelectionEntry],
    user: &UserId,
    known: &[LocationName],
) -> Result<LaunchEvent, ActionResponse> {
    if !known.contains(&values.source_location) {
        return Err(ActionResponse::rejected(format!(
            "Source location {} does not exist",
            values.source_location
        )));
    }
    if !known.contains(&values.dest_location) {
        return Err(ActionResponse::rejected(format!(
            "Destination location {} does not exist",
            values.dest_location
        )));
    }
    if !discover(selection) {
        return Err(ActionResponse::rejected("Nothing selected to sync"));
    }

    tracing::info!(
        "sync launched from {} ({} -> {}) for {} version(s)",
        current,
        values.source_location,
        values.dest_location,
        selection.len()
    );

    Ok(LaunchEvent {
        topic: LAUNCH_TOPIC.to_string(),
        data: LaunchEventData {
            action_identifier: launch_identifier(current),
            values: values.clone(),
            selection: selection.to_vec(),
        },
        source: EventSource { user: user.clone() },
    })
}
