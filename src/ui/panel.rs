//! Parameter panel
//!
//! Renders the [`ParameterBus`] as one window with a collapsible folder per
//! [`PanelFolder`]. Edits are returned instead of applied so the caller can
//! route them through the bus.

use super::parameter_bus::{ControlValue, PanelFolder, ParameterBus};

/// A user edit made in the panel this frame
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEdit {
    pub key: &'static str,
    pub value: ControlValue,
}

/// Draws the parameter window and collects edits.
pub fn parameter_panel(ui: &imgui::Ui, bus: &ParameterBus) -> Vec<PanelEdit> {
    let mut edits = Vec::new();

    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return edits;
    }
    let panel_width = (display_size[0] * 0.25).clamp(280.0, 380.0);

    ui.window("Parameters")
        .size([panel_width, 0.0], imgui::Condition::FirstUseEver)
        .position(
            [display_size[0] - panel_width - 16.0, 16.0],
            imgui::Condition::FirstUseEver,
        )
        .always_auto_resize(true)
        .collapsible(true)
        .build(|| {
            for folder in PanelFolder::ALL {
                let mut controls = bus.controls_in(folder).peekable();
                if controls.peek().is_none() {
                    continue;
                }
                if !ui.collapsing_header(folder.title(), imgui::TreeNodeFlags::DEFAULT_OPEN) {
                    continue;
                }

                for control in controls {
                    let _id = ui.push_id(control.key);
                    match control.value {
                        ControlValue::Scalar(current) => {
                            let mut value = current;
                            if ui.slider(control.label, control.min, control.max, &mut value) {
                                edits.push(PanelEdit {
                                    key: control.key,
                                    value: ControlValue::Scalar(value),
                                });
                            }
                        }
                        ControlValue::Color(current) => {
                            let mut rgb = current;
                            if ui.color_edit3(control.label, &mut rgb) {
                                edits.push(PanelEdit {
                                    key: control.key,
                                    value: ControlValue::Color(rgb),
                                });
                            }
                        }
                    }
                }
            }
        });

    edits
}
