use eframe::egui;
use std::collections::BTreeMap;

use crate::color::HexColor;
use crate::gui::constants::*;
use crate::layout::{Configuration, LayoutConfig, LayoutId};

/// Installed layouts ordered by display name, then id
pub fn sorted_layouts(names: &BTreeMap<LayoutId, String>) -> Vec<(LayoutId, String)> {
    let mut rows: Vec<(LayoutId, String)> = names
        .iter()
        .map(|(id, name)| (*id, name.clone()))
        .collect();
    rows.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    rows
}

pub fn layout_label(name: &str, id: LayoutId) -> String {
    format!("{name} ({id})")
}

/// Picker value for a stored color; unparsable colors start from black
pub fn picker_rgb(color: &str) -> [u8; 3] {
    HexColor::parse(color).map(|c| c.rgb()).unwrap_or([0, 0, 0])
}

/// One row per installed layout: name, color picker, flag chooser
pub fn ui(
    ui: &mut egui::Ui,
    config: &mut Configuration,
    rows: &[(LayoutId, String)],
    flag_codes: &[String],
) -> bool {
    let mut changed = false;

    if rows.is_empty() {
        ui.label(NO_LAYOUTS_TEXT);
        return false;
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (id, name) in rows {
            let Some(entry) = config.get_mut(id) else {
                continue;
            };
            ui.group(|ui| {
                ui.label(egui::RichText::new(layout_label(name, *id)).strong());
                ui.add_space(ITEM_SPACING);
                changed |= row_ui(ui, *id, entry, flag_codes);
            });
            ui.add_space(ITEM_SPACING);
        }
    });

    changed
}

fn row_ui(ui: &mut egui::Ui, id: LayoutId, entry: &mut LayoutConfig, flag_codes: &[String]) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Color:");
        let mut rgb = picker_rgb(&entry.color);
        if ui.color_edit_button_srgb(&mut rgb).changed() {
            let [r, g, b] = rgb;
            entry.color = HexColor::from_rgb(r, g, b).to_hex_string();
            changed = true;
        }
        ui.monospace(entry.color.as_str());

        ui.add_space(SECTION_SPACING);

        ui.label("Flag:");
        let before = entry.icon.clone();
        egui::ComboBox::from_id_salt(("flag", id.get()))
            .width(FLAG_COMBO_WIDTH)
            .selected_text(entry.icon.as_deref().unwrap_or(NO_FLAG_LABEL))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut entry.icon, None, NO_FLAG_LABEL);
                for code in flag_codes {
                    ui.selectable_value(&mut entry.icon, Some(code.clone()), code.as_str());
                }
            });
        if entry.icon != before {
            changed = true;
        }
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_sorted_by_name() {
        let names = BTreeMap::from([
            (LayoutId(1049), "русский".to_string()),
            (LayoutId(1033), "English".to_string()),
            (LayoutId(1036), "français".to_string()),
        ]);

        let ids: Vec<u16> = sorted_layouts(&names).into_iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![1033, 1036, 1049]);
    }

    #[test]
    fn test_same_name_sorted_by_id() {
        let names = BTreeMap::from([
            (LayoutId(2057), "English".to_string()),
            (LayoutId(1033), "English".to_string()),
        ]);

        let ids: Vec<u16> = sorted_layouts(&names).into_iter().map(|(id, _)| id.get()).collect();
        assert_eq!(ids, vec![1033, 2057]);
    }

    #[test]
    fn test_layout_label() {
        assert_eq!(layout_label("English", LayoutId(1033)), "English (1033)");
    }

    #[test]
    fn test_picker_rgb() {
        assert_eq!(picker_rgb("#1f77b4"), [0x1f, 0x77, 0xb4]);
        assert_eq!(picker_rgb("not a color"), [0, 0, 0]);
    }

    #[test]
    fn test_idle_frame_changes_nothing() {
        let mut config = Configuration::from([(LayoutId(1033), LayoutConfig::new("#1f77b4", Some("US".to_string())))]);
        let before = config.clone();
        let rows = vec![(LayoutId(1033), "English".to_string())];
        let flags = vec!["FR".to_string(), "US".to_string()];

        let ctx = egui::Context::default();
        let mut changed = true;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                changed = super::ui(ui, &mut config, &rows, &flags);
            });
        });

        assert!(!changed);
        assert_eq!(config, before);
    }
}
