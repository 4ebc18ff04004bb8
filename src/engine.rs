use std::time::Duration;

use crate::demo::DemoState;

pub fn update(state: &mut DemoState, ui: &imgui::Ui, dt: Duration) -> anyhow::Result<()> {
    let collapsed = state.panel_collapsed;
    if state.effect.draw_panel(ui, collapsed) {
        log::debug!("Effect parameters changed: {:?}", state.effect);
    }

    state.update(dt);

    Ok(())
}
