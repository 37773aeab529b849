//! Shared UI chrome: navigation bar, view sidebars, notices, and modals
//!
//! Panels mutate view state directly but never talk to the network; anything
//! that needs a fetch is returned as a [`UiAction`] for the app loop to run.

use crate::app::state::{ActivePage, AppState, NoticeLevel};
use crate::app::table;
use mobility_data::{DatasetId, HeatmapCategory, TravelMode, cell_text};

/// Deferred effects requested by the panels.
#[derive(Clone, Debug, PartialEq)]
pub enum UiAction {
    LoadDataset { dataset: DatasetId, page: u64 },
    LoadHeatmap { category: HeatmapCategory },
    CalculateRoute,
    ExportCsv,
    CopyTable,
}

/// Top navigation bar with one tab per view.
pub fn nav_bar(ctx: &egui::Context, state: &mut AppState) {
    egui::TopBottomPanel::top("nav_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            ui.heading("Mobility Dashboard");
            ui.separator();
            for page in ActivePage::all() {
                ui.selectable_value(&mut state.active_page, *page, page.label());
            }
        });
    });
}

/// Dataset selector and pagination controls for the explorer view.
pub fn explorer_sidebar(ctx: &egui::Context, state: &mut AppState, actions: &mut Vec<UiAction>) {
    egui::SidePanel::left("explorer_sidebar")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Dataset").strong());
            let current = state.explorer.dataset.clone();
            egui::ComboBox::from_id_salt("dataset_select")
                .width(ui.available_width())
                .selected_text(current.display_name().to_string())
                .show_ui(ui, |ui| {
                    for dataset in DatasetId::all() {
                        let selected = *dataset == current;
                        if ui
                            .selectable_label(selected, dataset.display_name())
                            .clicked()
                            && !selected
                        {
                            actions.push(UiAction::LoadDataset {
                                dataset: dataset.clone(),
                                page: 1,
                            });
                        }
                    }
                });

            ui.separator();
            if state.explorer.loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading…");
                });
            }

            if let Some(loaded) = &state.explorer.loaded {
                let cursor = loaded.cursor;
                ui.label(format!(
                    "{} records, page {} of {}",
                    cursor.total_records,
                    cursor.page,
                    cursor.total_pages().max(1)
                ));
                ui.horizontal(|ui| {
                    let prev = state.explorer.prev_page_request();
                    if ui
                        .add_enabled(prev.is_some(), egui::Button::new("◀ Prev"))
                        .clicked()
                        && let Some(page) = prev
                    {
                        actions.push(UiAction::LoadDataset {
                            dataset: state.explorer.dataset.clone(),
                            page,
                        });
                    }
                    let next = state.explorer.next_page_request();
                    if ui
                        .add_enabled(next.is_some(), egui::Button::new("Next ▶"))
                        .clicked()
                        && let Some(page) = next
                    {
                        actions.push(UiAction::LoadDataset {
                            dataset: state.explorer.dataset.clone(),
                            page,
                        });
                    }
                });

                ui.separator();
                ui.label(egui::RichText::new("Table").strong());
                ui.horizontal(|ui| {
                    ui.label("🔍");
                    ui.text_edit_singleline(&mut state.explorer.table.search);
                });
                ui.horizontal(|ui| {
                    if ui.button("Export CSV").clicked() {
                        actions.push(UiAction::ExportCsv);
                    }
                    if ui.button("Copy").clicked() {
                        actions.push(UiAction::CopyTable);
                    }
                });

                if loaded.charts.is_empty() {
                    ui.separator();
                    ui.weak("Charts are not available for this dataset.");
                }
            } else if !state.explorer.loading {
                ui.weak("Pick a dataset to load it.");
            }
        });
}

/// Record table body, rendered below the charts in the explorer scroll area.
pub fn record_table(ui: &mut egui::Ui, state: &mut AppState) {
    let Some(loaded) = &state.explorer.loaded else {
        return;
    };
    let page = &loaded.page;
    let rows = state.explorer.table.visible_rows(page);
    let mut sort_clicked: Option<usize> = None;

    ui.label(egui::RichText::new("Records").strong());
    egui::ScrollArea::horizontal()
        .id_salt("record_table")
        .show(ui, |ui| {
            egui::Grid::new("record_grid")
                .striped(true)
                .min_col_width(80.0)
                .show(ui, |ui| {
                    for (i, field) in page.fields.iter().enumerate() {
                        let arrow = match state.explorer.table.sort {
                            Some((c, true)) if c == i => " ▲",
                            Some((c, false)) if c == i => " ▼",
                            _ => "",
                        };
                        if ui
                            .button(egui::RichText::new(format!("{field}{arrow}")).strong())
                            .clicked()
                        {
                            sort_clicked = Some(i);
                        }
                    }
                    ui.end_row();

                    for &row in &rows {
                        let record = &page.records[row];
                        for field in &page.fields {
                            ui.label(cell_text(record, field));
                        }
                        ui.end_row();
                    }
                });
        });
    if rows.is_empty() {
        ui.weak("No records match the search.");
    }
    if let Some(column) = sort_clicked {
        state.explorer.table.toggle_sort(column);
    }
}

/// Heatmap category, radius, and accident filter controls.
pub fn heatmap_sidebar(ctx: &egui::Context, state: &mut AppState, actions: &mut Vec<UiAction>) {
    egui::SidePanel::left("heatmap_sidebar")
        .default_width(260.0)
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Heat layer").strong());
            let current = state.heatmap.category;
            egui::ComboBox::from_id_salt("heatmap_select")
                .width(ui.available_width())
                .selected_text(current.label())
                .show_ui(ui, |ui| {
                    for category in HeatmapCategory::all() {
                        let selected = *category == current;
                        if ui.selectable_label(selected, category.label()).clicked() && !selected {
                            actions.push(UiAction::LoadHeatmap {
                                category: *category,
                            });
                        }
                    }
                });

            ui.separator();
            ui.label(egui::RichText::new("Radius").strong());
            ui.horizontal(|ui| {
                if ui.button("−").clicked() {
                    state.heatmap.radius.adjust(-1);
                }
                let mut radius = state.heatmap.radius.radius;
                let slider = egui::Slider::new(
                    &mut radius,
                    mobility_data::RADIUS_MIN..=mobility_data::RADIUS_MAX,
                )
                .step_by(f64::from(mobility_data::RADIUS_STEP))
                .suffix(" px");
                if ui.add(slider).changed() {
                    state.heatmap.radius.radius = radius;
                }
                if ui.button("+").clicked() {
                    state.heatmap.radius.adjust(1);
                }
            });
            ui.weak("Shift+scroll over the map also adjusts the radius.");

            if state.heatmap.category.has_filters() {
                ui.separator();
                ui.label(egui::RichText::new("Filters").strong());

                let year_text = state
                    .heatmap
                    .filter
                    .year
                    .clone()
                    .unwrap_or_else(|| "All years".to_string());
                egui::ComboBox::from_label("Year")
                    .selected_text(year_text)
                    .show_ui(ui, |ui| {
                        if ui
                            .selectable_label(state.heatmap.filter.year.is_none(), "All years")
                            .clicked()
                        {
                            state.heatmap.filter.year = None;
                        }
                        let years = state.heatmap.years.clone();
                        for year in years {
                            let selected = state.heatmap.filter.year.as_deref() == Some(&year);
                            if ui.selectable_label(selected, &year).clicked() {
                                state.heatmap.filter.year = Some(year);
                            }
                        }
                    });

                let fatality_text = match state.heatmap.filter.fatality.as_deref() {
                    None => "All severities",
                    Some("Sim") => "Fatal",
                    _ => "Non-fatal",
                };
                egui::ComboBox::from_label("Severity")
                    .selected_text(fatality_text)
                    .show_ui(ui, |ui| {
                        for (label, value) in [
                            ("All severities", None),
                            ("Fatal", Some("Sim")),
                            ("Non-fatal", Some("Não")),
                        ] {
                            let selected = state.heatmap.filter.fatality.as_deref() == value;
                            if ui.selectable_label(selected, label).clicked() {
                                state.heatmap.filter.fatality = value.map(str::to_string);
                            }
                        }
                    });

                if ui.button("Apply filters").clicked() {
                    actions.push(UiAction::LoadHeatmap { category: current });
                }
            }

            ui.separator();
            if state.heatmap.loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Loading…");
                });
            } else {
                ui.label(format!("{} points", state.heatmap.points.len()));
            }
        });
}

/// Address form, travel mode, and route summary.
pub fn route_sidebar(ctx: &egui::Context, state: &mut AppState, actions: &mut Vec<UiAction>) {
    egui::SidePanel::left("route_sidebar")
        .default_width(300.0)
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Addresses").strong());
            let mut remove_request: Option<usize> = None;
            let count = state.route.addresses.len();
            for (i, entry) in state.route.addresses.entries_mut().iter_mut().enumerate() {
                ui.horizontal(|ui| {
                    ui.label(format!("{}.", i + 1));
                    ui.text_edit_singleline(entry);
                    if ui
                        .add_enabled(count > mobility_data::MIN_ADDRESSES, egui::Button::new("✖"))
                        .clicked()
                    {
                        remove_request = Some(i);
                    }
                });
            }
            if let Some(index) = remove_request
                && let Err(err) = state.route.addresses.remove(index)
            {
                // The button is disabled at the minimum, so this only fires on
                // a stale index.
                tracing::warn!("Could not remove address: {err}");
            }
            if ui.button("➕ Add address").clicked() {
                state.route.addresses.add();
            }

            ui.separator();
            ui.label(egui::RichText::new("Travel mode").strong());
            for mode in TravelMode::all() {
                ui.radio_value(&mut state.route.mode, *mode, mode.label());
            }

            ui.separator();
            let calculate = ui.add_enabled(
                !state.route.loading,
                egui::Button::new("Calculate route"),
            );
            if calculate.clicked() {
                actions.push(UiAction::CalculateRoute);
            }
            if state.route.loading {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Calculating…");
                });
            }

            if let Some(planned) = &state.route.planned {
                ui.separator();
                ui.label(egui::RichText::new("Route").strong());
                ui.label(format!(
                    "{:.1} km, {:.0} min total",
                    planned.summary.total_distance_km, planned.summary.total_duration_mins
                ));
                egui::ScrollArea::vertical()
                    .id_salt("route_segments")
                    .show(ui, |ui| {
                        for (i, segment) in planned.summary.segments.iter().enumerate() {
                            ui.label(format!(
                                "{}. {} → {}",
                                i + 1,
                                segment.start,
                                segment.end
                            ));
                            ui.weak(format!("{} · {}", segment.distance, segment.duration));
                        }
                    });
            }
        });
}

/// Blocking alert for the route planner. Returns after rendering; dismissal
/// clears `state.route.modal`.
pub fn route_modal(ctx: &egui::Context, state: &mut AppState) {
    let Some(message) = state.route.modal.clone() else {
        return;
    };
    let mut dismissed = false;
    egui::Modal::new(egui::Id::new("route_modal")).show(ctx, |ui| {
        ui.set_max_width(320.0);
        ui.heading("Route Planner");
        ui.label(&message);
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            if ui.button("OK").clicked() {
                dismissed = true;
            }
        });
    });
    if dismissed {
        state.route.modal = None;
    }
}

/// Transient notices in the top-right corner.
pub fn notices_overlay(ctx: &egui::Context, state: &mut AppState) {
    state.prune_notices();
    if state.notices.is_empty() {
        return;
    }
    let mut dismissed = None;
    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-12.0, 36.0))
        .show(ctx, |ui| {
            for (index, notice) in state.notices.iter().enumerate() {
                let color = match notice.level {
                    NoticeLevel::Info => egui::Color32::from_rgb(52, 152, 219),
                    NoticeLevel::Error => egui::Color32::from_rgb(231, 76, 60),
                };
                egui::Frame::popup(ui.style())
                    .fill(color.gamma_multiply(0.2))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(color, &notice.text);
                            if ui.small_button("✖").clicked() {
                                dismissed = Some(index);
                            }
                        });
                    });
            }
        });
    if let Some(index) = dismissed {
        state.notices.remove(index);
    }
    // Keep repainting while notices are visible so they expire on time
    ctx.request_repaint_after(std::time::Duration::from_millis(250));
}

/// CSV target path via the native save dialog.
pub fn ask_csv_path(dataset_slug: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_file_name(format!("{dataset_slug}.csv"))
        .add_filter("CSV", &["csv"])
        .save_file()
}

///// Run the table export end to end: dialog, then write.
pub fn export_table_csv(state: &mut AppState) {
    let Some(loaded) = &state.explorer.loaded else {
        return;
    };
    let Some(path) = ask_csv_path(loaded.dataset.slug()) else {
        return;
    };
    let rows = state.explorer.table.visible_rows(&loaded.page);
    if let Err(message) = table::export_csv(&loaded.page, &rows, &path) {
        state.push_error(format!("CSV export failed: {message}"));
    }
}
