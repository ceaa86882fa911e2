//! Keeps camera input from reacting to clicks and scrolls meant for the
//! control panel.

use bevy_egui::EguiContexts;

/// Returns `true` when egui wants the pointer: the cursor is over the panel
/// or egui is handling a drag. Camera input systems return early then.
#[inline]
pub fn egui_wants_pointer(contexts: &mut EguiContexts) -> bool {
    let Some(ctx) = contexts.try_ctx_mut() else {
        return false;
    };
    ctx.wants_pointer_input() || ctx.is_pointer_over_area()
}
