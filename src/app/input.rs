use crate::lod::LodKey;

/// Number row shortcuts: 1-4 pick the matching LOD.
pub fn lod_for_key(key: egui::Key) -> Option<LodKey> {
    match key {
        egui::Key::Num1 => Some(LodKey::Lod1),
        egui::Key::Num2 => Some(LodKey::Lod2),
        egui::Key::Num3 => Some(LodKey::Lod3),
        egui::Key::Num4 => Some(LodKey::Lod4),
        _ => None,
    }
}

/// `R` re-fetches the displayed LOD.
pub fn reload_shortcut(ctx: &egui::Context) -> bool {
    !ctx.wants_keyboard_input() && ctx.input(|input| input.key_pressed(egui::Key::R))
}

/// Last LOD shortcut pressed this frame, ignored while a text field has focus.
pub fn lod_shortcut(ctx: &egui::Context) -> Option<LodKey> {
    if ctx.wants_keyboard_input() {
        return None;
    }
    ctx.input(|input| {
        input
            .events
            .iter()
            .filter_map(|event| match event {
                egui::Event::Key {
                    key, pressed: true, ..
                } => lod_for_key(*key),
                _ => None,
            })
            .last()
    })
}
