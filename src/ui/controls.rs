use super::{EnvironmentMap, MaterialParameters, ParameterState, ShadowResolution};
use crate::lod::LodKey;
use crate::scene::RenderStats;
use std::ops::RangeInclusive;

/// What the harness must do after the user edited the parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    SwitchLod(LodKey),
    RefreshMaterials,
    ShadowsChanged,
    EnvironmentChanged(EnvironmentMap),
    EnvironmentIntensityChanged(f32),
    /// Re-fetch a LOD from disk and redisplay it if it is on screen.
    ReloadLod(LodKey),
}

/// Read-only data shown alongside the controls.
#[derive(Debug, Clone, Default)]
pub struct StatsView {
    pub stats: RenderStats,
    pub loaded: Vec<LodKey>,
    pub active: Option<LodKey>,
    pub fps: f32,
    pub status: String,
    pub loading: bool,
}

pub const ROUGHNESS_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const METALNESS_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const CLEARCOAT_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const TRANSMISSION_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const THICKNESS_RANGE: RangeInclusive<f32> = 0.0..=10.0;
pub const IOR_RANGE: RangeInclusive<f32> = 1.0..=2.333;
pub const REFLECTIVITY_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const SHEEN_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const SPECULAR_INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const IRIDESCENCE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const IRIDESCENCE_IOR_RANGE: RangeInclusive<f32> = 1.0..=2.333;
pub const IRIDESCENCE_THICKNESS_RANGE: RangeInclusive<f32> = 0.0..=1000.0;
pub const NORMAL_SCALE_RANGE: RangeInclusive<f32> = -2.0..=2.0;
pub const ENVIRONMENT_INTENSITY_RANGE: RangeInclusive<f32> = 0.0..=3.0;

fn clamp(value: &mut f32, range: &RangeInclusive<f32>) {
    // NaN from a hand-edited preset collapses to the lower bound.
    *value = if value.is_nan() {
        *range.start()
    } else {
        value.clamp(*range.start(), *range.end())
    };
}

fn clamp_color(color: &mut [f32; 3]) {
    for channel in color.iter_mut() {
        clamp(channel, &(0.0..=1.0));
    }
}

/// Pulls every slider-backed value back into its slider range.
pub fn clamp_parameters(state: &mut ParameterState) {
    let m = &mut state.material;
    clamp_color(&mut m.color);
    clamp(&mut m.roughness, &ROUGHNESS_RANGE);
    clamp(&mut m.metalness, &METALNESS_RANGE);
    clamp(&mut m.clearcoat, &CLEARCOAT_RANGE);
    clamp(&mut m.clearcoat_roughness, &ROUGHNESS_RANGE);
    clamp(&mut m.transmission, &TRANSMISSION_RANGE);
    clamp(&mut m.thickness, &THICKNESS_RANGE);
    clamp(&mut m.ior, &IOR_RANGE);
    clamp(&mut m.reflectivity, &REFLECTIVITY_RANGE);
    clamp(&mut m.sheen, &SHEEN_RANGE);
    clamp(&mut m.sheen_roughness, &ROUGHNESS_RANGE);
    clamp_color(&mut m.sheen_color);
    clamp(&mut m.specular_intensity, &SPECULAR_INTENSITY_RANGE);
    clamp_color(&mut m.specular_color);
    clamp(&mut m.iridescence, &IRIDESCENCE_RANGE);
    clamp(&mut m.iridescence_ior, &IRIDESCENCE_IOR_RANGE);
    for bound in m.iridescence_thickness_range.iter_mut() {
        clamp(bound, &IRIDESCENCE_THICKNESS_RANGE);
    }
    if m.iridescence_thickness_range[0] > m.iridescence_thickness_range[1] {
        m.iridescence_thickness_range.swap(0, 1);
    }
    for scale in m.normal_scale.iter_mut() {
        clamp(scale, &NORMAL_SCALE_RANGE);
    }
    clamp(&mut state.environment.intensity, &ENVIRONMENT_INTENSITY_RANGE);
}

/// Compares the state before and after a UI pass, the same way every frame.
pub fn diff_events(before: &ParameterState, after: &ParameterState) -> Vec<ControlEvent> {
    let mut events = Vec::new();
    let switching = before.general.lod != after.general.lod;
    if switching {
        events.push(ControlEvent::SwitchLod(after.general.lod));
    }
    if !switching && before.material != after.material {
        events.push(ControlEvent::RefreshMaterials);
    }
    if before.shadows != after.shadows {
        events.push(ControlEvent::ShadowsChanged);
    }
    if before.environment.map != after.environment.map {
        events.push(ControlEvent::EnvironmentChanged(after.environment.map));
    } else if before.environment.intensity != after.environment.intensity {
        events.push(ControlEvent::EnvironmentIntensityChanged(
            after.environment.intensity,
        ));
    }
    events
}

/// Draws the full control panel and returns the events it caused.
pub fn draw_controls(
    ui: &mut egui::Ui,
    state: &mut ParameterState,
    view: &StatsView,
) -> Vec<ControlEvent> {
    let before = state.clone();

    draw_stats(ui, view);
    ui.separator();

    egui::CollapsingHeader::new("Model")
        .default_open(true)
        .show(ui, |ui| {
            lod_combo(ui, "lod_select", "LOD", &mut state.general.lod, &view.loaded);
            ui.checkbox(&mut state.general.rotate_plane, "Rotate");
        });

    egui::CollapsingHeader::new("Textures")
        .default_open(true)
        .show(ui, |ui| {
            let m = &mut state.material;
            ui.checkbox(&mut m.use_base_color_map, "Base color map");
            ui.checkbox(&mut m.use_aorm_maps, "AORM maps");
            ui.checkbox(&mut m.normal_map_enabled, "Normal map");
            ui.add_enabled_ui(!m.normal_map_tracks_lod, |ui| {
                lod_combo(
                    ui,
                    "normal_map_select",
                    "Normal map source",
                    &mut m.selected_normal_map,
                    &view.loaded,
                );
            });
            ui.checkbox(&mut m.normal_map_tracks_lod, "Normal map follows LOD");
            ui.add(egui::Slider::new(&mut m.normal_scale[0], NORMAL_SCALE_RANGE).text("Normal scale X"));
            ui.add(egui::Slider::new(&mut m.normal_scale[1], NORMAL_SCALE_RANGE).text("Normal scale Y"));
            ui.checkbox(&mut m.wireframe_enabled, "Wireframe");
            ui.checkbox(&mut m.double_sided, "Double sided");
        });

    egui::CollapsingHeader::new("Material")
        .default_open(true)
        .show(ui, |ui| draw_material(ui, &mut state.material));

    egui::CollapsingHeader::new("Shadows")
        .default_open(false)
        .show(ui, |ui| {
            let s = &mut state.shadows;
            ui.checkbox(&mut s.use_shadows, "Shadows");
            ui.checkbox(&mut s.use_directional_light_shadow, "Directional light shadow");
            ui.checkbox(&mut s.use_particle_light_shadow, "Particle light shadow");
            egui::ComboBox::from_id_salt("shadow_resolution")
                .selected_text(format!("{}px", s.resolution.pixels()))
                .show_ui(ui, |ui| {
                    for resolution in ShadowResolution::ALL {
                        ui.selectable_value(
                            &mut s.resolution,
                            resolution,
                            format!("{}px", resolution.pixels()),
                        );
                    }
                });
        });

    egui::CollapsingHeader::new("Environment")
        .default_open(false)
        .show(ui, |ui| {
            let e = &mut state.environment;
            egui::ComboBox::from_id_salt("environment_map")
                .selected_text(e.map.as_str())
                .show_ui(ui, |ui| {
                    for map in EnvironmentMap::ALL {
                        ui.selectable_value(&mut e.map, map, map.as_str());
                    }
                });
            ui.add(egui::Slider::new(&mut e.intensity, ENVIRONMENT_INTENSITY_RANGE).text("Intensity"));
        });

    clamp_parameters(state);
    diff_events(&before, state)
}

fn draw_stats(ui: &mut egui::Ui, view: &StatsView) {
    ui.label(format!("Triangles: {}", view.stats.triangles));
    ui.label(format!("Draw calls: {}", view.stats.draw_calls));
    ui.label(format!("FPS: {:.1}", view.fps));
    let active = view
        .active
        .map(|key| key.to_string())
        .unwrap_or_else(|| "none".to_string());
    ui.label(format!("Showing: {} ({} of {} loaded)", active, view.loaded.len(), LodKey::ALL.len()));
    if view.loading {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label("Loading remaining LODs");
        });
    }
    if !view.status.is_empty() {
        ui.label(view.status.as_str());
    }
}

fn lod_combo(ui: &mut egui::Ui, id: &str, label: &str, value: &mut LodKey, loaded: &[LodKey]) {
    ui.horizontal(|ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(value.as_str())
            .show_ui(ui, |ui| {
                for key in LodKey::ALL {
                    let text = if loaded.contains(&key) {
                        key.to_string()
                    } else {
                        format!("{key} (loading)")
                    };
                    ui.selectable_value(value, key, text);
                }
            });
    });
}

fn draw_material(ui: &mut egui::Ui, m: &mut MaterialParameters) {
    ui.horizontal(|ui| {
        ui.label("Color");
        ui.color_edit_button_rgb(&mut m.color);
    });
    ui.add(egui::Slider::new(&mut m.roughness, ROUGHNESS_RANGE).text("Roughness"));
    ui.add(egui::Slider::new(&mut m.metalness, METALNESS_RANGE).text("Metalness"));
    ui.add(egui::Slider::new(&mut m.clearcoat, CLEARCOAT_RANGE).text("Clearcoat"));
    ui.add(egui::Slider::new(&mut m.clearcoat_roughness, ROUGHNESS_RANGE).text("Clearcoat roughness"));
    ui.add(egui::Slider::new(&mut m.transmission, TRANSMISSION_RANGE).text("Transmission"));
    ui.add(egui::Slider::new(&mut m.thickness, THICKNESS_RANGE).text("Thickness"));
    ui.add(egui::Slider::new(&mut m.ior, IOR_RANGE).text("IOR"));
    ui.add(egui::Slider::new(&mut m.reflectivity, REFLECTIVITY_RANGE).text("Reflectivity"));

    ui.separator();
    ui.add(egui::Slider::new(&mut m.sheen, SHEEN_RANGE).text("Sheen"));
    ui.add(egui::Slider::new(&mut m.sheen_roughness, ROUGHNESS_RANGE).text("Sheen roughness"));
    ui.horizontal(|ui| {
        ui.label("Sheen color");
        ui.color_edit_button_rgb(&mut m.sheen_color);
    });

    ui.separator();
    ui.add(egui::Slider::new(&mut m.specular_intensity, SPECULAR_INTENSITY_RANGE).text("Specular intensity"));
    ui.horizontal(|ui| {
        ui.label("Specular color");
        ui.color_edit_button_rgb(&mut m.specular_color);
    });

    ui.separator();
    ui.add(egui::Slider::new(&mut m.iridescence, IRIDESCENCE_RANGE).text("Iridescence"));
    ui.add(egui::Slider::new(&mut m.iridescence_ior, IRIDESCENCE_IOR_RANGE).text("Iridescence IOR"));
    let [low, high] = &mut m.iridescence_thickness_range;
    ui.add(egui::Slider::new(low, IRIDESCENCE_THICKNESS_RANGE).text("Thin film min (nm)"));
    ui.add(egui::Slider::new(high, IRIDESCENCE_THICKNESS_RANGE).text("Thin film max (nm)"));
}
